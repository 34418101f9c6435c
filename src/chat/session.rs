//! Session bookkeeping.
//!
//! This module provides the [`SessionStore`], which owns every conversation
//! the client knows about and the identity of the one currently displayed.
//! Sessions live in memory for the lifetime of the client.

use std::fmt;

use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::observability::{SESSIONS_CREATED, SESSIONS_DELETED};

/// Session titles longer than this many characters are truncated.
pub const MAX_TITLE_CHARS: usize = 40;

/// Marker appended to truncated titles.
const TITLE_ELLIPSIS: &str = "...";

/// Opaque session identifier, unique for the lifetime of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// The raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of a session's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Text payload.  Collapsible entries store `"{title}\n{body}"`.
    pub content: String,
    /// True when the human wrote it.
    pub is_user: bool,
}

impl Message {
    /// A message authored by the human.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_user: true,
        }
    }

    /// A message authored by the assistant or the client itself.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_user: false,
        }
    }
}

/// A named, ordered conversation thread.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    name: String,
    created_at: OffsetDateTime,
    messages: Vec<Message>,
}

impl Session {
    /// The session's identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The display title.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the session was created.
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// The history in conversation order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in the history.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// Derive a session title from the first message of a conversation.
///
/// The text is trimmed and cut to [`MAX_TITLE_CHARS`] characters with an
/// ellipsis.  Blank text yields `"Chat {ordinal}"`.
pub fn derive_title(first_message: &str, ordinal: u64) -> String {
    let title = first_message.trim();
    if title.is_empty() {
        return format!("Chat {ordinal}");
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        let mut truncated: String = title.chars().take(MAX_TITLE_CHARS).collect();
        truncated.push_str(TITLE_ELLIPSIS);
        truncated
    } else {
        title.to_string()
    }
}

/// Owns all sessions and the identity of the current one.
///
/// Invariant: `current`, when set, names a session in `sessions`.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Vec<Session>,
    current: Option<SessionId>,
    created: u64,
}

impl SessionStore {
    /// Creates an empty store with no current session.
    pub fn new() -> Self {
        Self::default()
    }

    /// All sessions in creation order.
    pub fn list_sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no sessions exist.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// The current session's id, if any.
    pub fn current_id(&self) -> Option<SessionId> {
        self.current
    }

    /// The current session, if any.
    pub fn current(&self) -> Option<&Session> {
        self.current.and_then(|id| self.get(id))
    }

    /// Looks up a session by id.
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Creates a session titled after `text` and makes it current.
    ///
    /// Callers only do this when no session is current.
    pub fn create_from_message(&mut self, text: &str) -> SessionId {
        self.created += 1;
        let id = SessionId(self.created);
        let name = derive_title(text, self.created);
        tracing::info!(session = %id, title = %name, "created session");
        SESSIONS_CREATED.click();
        self.sessions.push(Session {
            id,
            name,
            created_at: OffsetDateTime::now_utc(),
            messages: Vec::new(),
        });
        self.current = Some(id);
        id
    }

    /// Makes `id` current and returns it for rendering.
    pub fn switch_to(&mut self, id: SessionId) -> Result<&Session> {
        let Some(index) = self.sessions.iter().position(|s| s.id == id) else {
            return Err(Error::not_found(
                "no such session",
                Some("session".to_string()),
                Some(id.to_string()),
            ));
        };
        self.current = Some(id);
        Ok(&self.sessions[index])
    }

    /// Forgets the current session without deleting anything.
    ///
    /// The next message sent will create a fresh session.
    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// Removes a session and returns the session that is current afterwards.
    ///
    /// Deleting the current session moves the selection to the most recently
    /// created survivor.  Deleting the last session leaves nothing current.
    pub fn delete_session(&mut self, id: SessionId) -> Option<&Session> {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.sessions.len() != before {
            tracing::info!(session = %id, "deleted session");
            SESSIONS_DELETED.click();
        }

        if self.sessions.is_empty() {
            self.current = None;
        } else if self.current == Some(id) {
            self.current = self.sessions.last().map(|s| s.id);
        }
        self.current()
    }

    /// Appends to a session's history.
    ///
    /// Returns false, without error, when the session no longer exists.
    pub fn append_message(
        &mut self,
        id: SessionId,
        content: impl Into<String>,
        is_user: bool,
    ) -> bool {
        match self.sessions.iter_mut().find(|s| s.id == id) {
            Some(session) => {
                session.messages.push(Message {
                    content: content.into(),
                    is_user,
                });
                true
            }
            None => {
                tracing::debug!(session = %id, "dropping message for vanished session");
                false
            }
        }
    }
}
