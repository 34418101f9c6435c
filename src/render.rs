//! Output rendering for the chat client.
//!
//! The core never draws anything itself.  It issues display instructions
//! through the [`Renderer`] trait: show a message, show a collapsible block,
//! remove an entry, clear the view.  Two implementations ship here: a
//! terminal renderer with optional ANSI styling and an in-memory view model
//! for embedding and tests.

use std::io::{self, Stdout, Write};

use crate::chat::{Message, SessionId};
use crate::types::ContextFile;

/// ANSI escape code for dim text (used for collapsible bodies).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for the session header).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the user label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the assistant label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for yellow text (used for collapsible titles).
const ANSI_YELLOW: &str = "\x1b[33m";

/// Disclosure marker for a collapsed block.
const COLLAPSED_MARKER: &str = "\u{25B6}";

/// Disclosure marker for an expanded block.
const EXPANDED_MARKER: &str = "\u{25BC}";

/// Header text when no session is current.
pub const NO_SESSION_TITLE: &str = "No Session";

/// Shown in place of the context list when the backend holds no documents.
pub const NO_CONTEXTS_NOTICE: &str = "No context files uploaded.";

/// Identifies a displayed entry so it can be removed or toggled later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryHandle(u64);

/// A title-plus-body display unit that can be collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collapsible {
    /// Always-visible title line.
    pub title: String,
    /// Body hidden while collapsed.
    pub body: String,
    /// True when the human wrote it.
    pub is_user: bool,
    /// Initial collapse state.
    pub collapsed: bool,
}

impl Collapsible {
    /// Creates an assistant-side collapsible block.
    pub fn new(title: impl Into<String>, body: impl Into<String>, collapsed: bool) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            is_user: false,
            collapsed,
        }
    }

    /// The flattened form stored in session history.
    pub fn flatten(&self) -> String {
        format!("{}\n{}", self.title, self.body)
    }
}

/// One row of the session list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    /// The session's id.
    pub id: SessionId,
    /// Its display title.
    pub name: String,
    /// True for the current session.
    pub current: bool,
}

/// What the context-document list should show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ContextListing {
    /// Nothing rendered yet.
    #[default]
    Unloaded,
    /// The backend holds no documents; show [`NO_CONTEXTS_NOTICE`].
    Placeholder,
    /// One row per document name.
    Files(Vec<String>),
}

impl ContextListing {
    /// Builds the listing for a set of documents.
    pub fn from_files(files: &[ContextFile]) -> Self {
        if files.is_empty() {
            ContextListing::Placeholder
        } else {
            ContextListing::Files(files.iter().map(|f| f.filename.clone()).collect())
        }
    }
}

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - An in-memory view model driven by some other front end
pub trait Renderer: Send {
    /// Append a flat message to the view.
    fn show_message(&mut self, message: &Message) -> EntryHandle;

    /// Append a collapsible block to the view.
    fn show_collapsible(&mut self, block: &Collapsible) -> EntryHandle;

    /// Remove a displayed entry.
    ///
    /// Returns false when the entry is already gone; that is not an error.
    fn remove_entry(&mut self, handle: EntryHandle) -> bool;

    /// Flip a collapsible block between collapsed and expanded.
    ///
    /// Returns the new collapse state, or `None` for unknown or flat entries.
    fn toggle_collapsed(&mut self, handle: EntryHandle) -> Option<bool>;

    /// Remove every entry from the view.
    fn clear_view(&mut self);

    /// Set the title line; `None` means no session is current.
    fn set_header(&mut self, title: Option<&str>);

    /// Replace the session list.
    fn render_sessions(&mut self, rows: &[SessionRow]);

    /// Replace the context-document list.
    fn render_contexts(&mut self, listing: &ContextListing);

    /// Show or hide the loading affordance.
    fn set_loading(&mut self, visible: bool);

    /// Update the proxy status indicator; `None` clears it.
    fn set_proxy_status(&mut self, status: Option<&str>);

    /// Called once a sent message has been accepted, so the input can be cleared.
    fn clear_input(&mut self) {}

    /// Print local feedback that is not part of any conversation.
    fn print_info(&mut self, _info: &str) {}

    /// Print a local error that is not part of any conversation.
    fn print_error(&mut self, _error: &str) {}
}

/////////////////////////////////////////// PlainText ///////////////////////////////////////////

/// Plain text renderer with optional ANSI styling.
///
/// Writes to stdout.  Removal cannot unprint anything, so removed entries
/// are only forgotten.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    next_handle: u64,
    blocks: Vec<(EntryHandle, Collapsible)>,
    sessions: Vec<SessionRow>,
    loading: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            next_handle: 0,
            blocks: Vec::new(),
            sessions: Vec::new(),
            loading: false,
        }
    }

    /// The session list as last rendered.
    pub fn sessions(&self) -> &[SessionRow] {
        &self.sessions
    }

    /// Flushes stdout to ensure immediate display.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn allocate(&mut self) -> EntryHandle {
        self.next_handle += 1;
        EntryHandle(self.next_handle)
    }

    fn label(&self, is_user: bool) -> String {
        let (name, color) = if is_user {
            ("user", ANSI_CYAN)
        } else {
            ("ai", ANSI_GREEN)
        };
        if self.use_color {
            format!("{color}{name}:{ANSI_RESET}")
        } else {
            format!("{name}:")
        }
    }

    fn print_block(&mut self, block: &Collapsible, collapsed: bool) {
        let marker = if collapsed {
            COLLAPSED_MARKER
        } else {
            EXPANDED_MARKER
        };
        let label = self.label(block.is_user);
        if self.use_color {
            println!("{label} {ANSI_YELLOW}{marker} {}{ANSI_RESET}", block.title);
        } else {
            println!("{label} {marker} {}", block.title);
        }
        if !collapsed {
            for line in block.body.lines() {
                if self.use_color {
                    println!("    {ANSI_DIM}{line}{ANSI_RESET}");
                } else {
                    println!("    {line}");
                }
            }
        }
        self.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn show_message(&mut self, message: &Message) -> EntryHandle {
        let label = self.label(message.is_user);
        println!("{label} {}", message.content);
        self.flush();
        self.allocate()
    }

    fn show_collapsible(&mut self, block: &Collapsible) -> EntryHandle {
        self.print_block(block, block.collapsed);
        let handle = self.allocate();
        self.blocks.push((handle, block.clone()));
        handle
    }

    fn remove_entry(&mut self, handle: EntryHandle) -> bool {
        let before = self.blocks.len();
        self.blocks.retain(|(h, _)| *h != handle);
        before != self.blocks.len()
    }

    fn toggle_collapsed(&mut self, handle: EntryHandle) -> Option<bool> {
        let index = self.blocks.iter().position(|(h, _)| *h == handle)?;
        let collapsed = !self.blocks[index].1.collapsed;
        self.blocks[index].1.collapsed = collapsed;
        let block = self.blocks[index].1.clone();
        self.print_block(&block, collapsed);
        Some(collapsed)
    }

    fn clear_view(&mut self) {
        self.blocks.clear();
        println!();
        self.flush();
    }

    fn set_header(&mut self, title: Option<&str>) {
        let title = title.unwrap_or(NO_SESSION_TITLE);
        if self.use_color {
            println!("{ANSI_BOLD}== {title} =={ANSI_RESET}");
        } else {
            println!("== {title} ==");
        }
        self.flush();
    }

    fn render_sessions(&mut self, rows: &[SessionRow]) {
        self.sessions = rows.to_vec();
    }

    fn render_contexts(&mut self, listing: &ContextListing) {
        match listing {
            ContextListing::Unloaded => {}
            ContextListing::Placeholder => println!("    {NO_CONTEXTS_NOTICE}"),
            ContextListing::Files(files) => {
                println!("    Context files:");
                for file in files {
                    println!("      - {file}");
                }
            }
        }
        self.flush();
    }

    fn set_loading(&mut self, visible: bool) {
        if visible && !self.loading {
            if self.use_color {
                println!("{ANSI_DIM}...{ANSI_RESET}");
            } else {
                println!("...");
            }
            self.flush();
        }
        self.loading = visible;
    }

    fn set_proxy_status(&mut self, status: Option<&str>) {
        if let Some(status) = status {
            println!("[proxy: {status}]");
            self.flush();
        }
    }

    fn print_info(&mut self, info: &str) {
        if self.use_color {
            println!("{ANSI_DIM}{info}{ANSI_RESET}");
        } else {
            println!("{info}");
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        eprintln!("Error: {error}");
    }
}

//////////////////////////////////////////// Memory ////////////////////////////////////////////

/// One entry of an in-memory view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEntry {
    /// A flat message.
    Message {
        /// Handle the entry was issued under.
        handle: EntryHandle,
        /// The message shown.
        message: Message,
    },
    /// A collapsible block and its current collapse state.
    Collapsible {
        /// Handle the entry was issued under.
        handle: EntryHandle,
        /// The block shown.
        block: Collapsible,
    },
}

impl ViewEntry {
    /// The handle this entry was issued under.
    pub fn handle(&self) -> EntryHandle {
        match self {
            ViewEntry::Message { handle, .. } | ViewEntry::Collapsible { handle, .. } => *handle,
        }
    }

    /// The entry's text as it would be stored in history.
    pub fn text(&self) -> String {
        match self {
            ViewEntry::Message { message, .. } => message.content.clone(),
            ViewEntry::Collapsible { block, .. } => block.flatten(),
        }
    }
}

/// A renderer that keeps the whole view in memory.
#[derive(Debug, Default)]
pub struct MemoryRenderer {
    next_handle: u64,
    entries: Vec<ViewEntry>,
    header: Option<String>,
    sessions: Vec<SessionRow>,
    contexts: ContextListing,
    loading: bool,
    proxy_status: Option<String>,
    input_clears: usize,
}

impl MemoryRenderer {
    /// Creates an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Displayed entries, oldest first.
    pub fn entries(&self) -> &[ViewEntry] {
        &self.entries
    }

    /// Displayed entries flattened to text, oldest first.
    pub fn texts(&self) -> Vec<String> {
        self.entries.iter().map(ViewEntry::text).collect()
    }

    /// The displayed collapsible block with this title, if any.
    pub fn collapsible(&self, title: &str) -> Option<&Collapsible> {
        self.entries.iter().find_map(|e| match e {
            ViewEntry::Collapsible { block, .. } if block.title == title => Some(block),
            _ => None,
        })
    }

    /// The title line; `None` means no session is current.
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// The session list as last rendered.
    pub fn sessions(&self) -> &[SessionRow] {
        &self.sessions
    }

    /// The context list as last rendered.
    pub fn contexts(&self) -> &ContextListing {
        &self.contexts
    }

    /// Whether the loading affordance is visible.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The proxy status indicator.
    pub fn proxy_status(&self) -> Option<&str> {
        self.proxy_status.as_deref()
    }

    /// How many times the input was cleared.
    pub fn input_clears(&self) -> usize {
        self.input_clears
    }

    fn allocate(&mut self) -> EntryHandle {
        self.next_handle += 1;
        EntryHandle(self.next_handle)
    }
}

impl Renderer for MemoryRenderer {
    fn show_message(&mut self, message: &Message) -> EntryHandle {
        let handle = self.allocate();
        self.entries.push(ViewEntry::Message {
            handle,
            message: message.clone(),
        });
        handle
    }

    fn show_collapsible(&mut self, block: &Collapsible) -> EntryHandle {
        let handle = self.allocate();
        self.entries.push(ViewEntry::Collapsible {
            handle,
            block: block.clone(),
        });
        handle
    }

    fn remove_entry(&mut self, handle: EntryHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle() != handle);
        before != self.entries.len()
    }

    fn toggle_collapsed(&mut self, handle: EntryHandle) -> Option<bool> {
        self.entries.iter_mut().find_map(|e| match e {
            ViewEntry::Collapsible { handle: h, block } if *h == handle => {
                block.collapsed = !block.collapsed;
                Some(block.collapsed)
            }
            _ => None,
        })
    }

    fn clear_view(&mut self) {
        self.entries.clear();
    }

    fn set_header(&mut self, title: Option<&str>) {
        self.header = title.map(String::from);
    }

    fn render_sessions(&mut self, rows: &[SessionRow]) {
        self.sessions = rows.to_vec();
    }

    fn render_contexts(&mut self, listing: &ContextListing) {
        self.contexts = listing.clone();
    }

    fn set_loading(&mut self, visible: bool) {
        self.loading = visible;
    }

    fn set_proxy_status(&mut self, status: Option<&str>) {
        self.proxy_status = status.map(String::from);
    }

    fn clear_input(&mut self) {
        self.input_clears += 1;
    }
}
