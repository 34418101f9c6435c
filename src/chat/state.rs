//! Shared mutable UI state.
//!
//! [`ChatState`] pairs the [`SessionStore`] with the [`Renderer`] so that
//! every display instruction and every history append go through one place.
//! Components hold it as a [`SharedState`] and never keep the lock across a
//! backend call.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::chat::session::{Message, SessionId, SessionStore};
use crate::render::{Collapsible, EntryHandle, Renderer, SessionRow};

/// The state handle shared by all chat components.
pub type SharedState<R> = Arc<Mutex<ChatState<R>>>;

/// Sessions plus the view they are displayed in.
pub struct ChatState<R: Renderer> {
    store: SessionStore,
    renderer: R,
    loading: usize,
    last_collapsible: Option<EntryHandle>,
}

impl<R: Renderer> ChatState<R> {
    /// Creates an empty state rendering through `renderer`.
    pub fn new(renderer: R) -> Self {
        Self {
            store: SessionStore::new(),
            renderer,
            loading: 0,
            last_collapsible: None,
        }
    }

    /// Wraps the state for sharing between components.
    pub fn shared(renderer: R) -> SharedState<R> {
        Arc::new(Mutex::new(Self::new(renderer)))
    }

    /// The session store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Mutable access to the session store.
    ///
    /// Callers that change which session is current must follow up with
    /// [`ChatState::show_current`] or [`ChatState::refresh_sessions`].
    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Mutable access to the renderer.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Displays a message in the current session, persisting it if asked.
    pub fn add_message(
        &mut self,
        content: impl Into<String>,
        is_user: bool,
        persist: bool,
    ) -> Option<EntryHandle> {
        let target = self.store.current_id();
        self.add_message_to(target, content, is_user, persist)
    }

    /// Displays a message that belongs to `target`.
    ///
    /// The message is appended to `target` when `persist` is set, and shown
    /// only while `target` is the current session.  With no session current
    /// a `None` target is shown and never persisted.
    pub fn add_message_to(
        &mut self,
        target: Option<SessionId>,
        content: impl Into<String>,
        is_user: bool,
        persist: bool,
    ) -> Option<EntryHandle> {
        let message = Message {
            content: content.into(),
            is_user,
        };
        if persist && let Some(id) = target {
            self.store.append_message(id, message.content.clone(), is_user);
        }
        if target == self.store.current_id() {
            Some(self.renderer.show_message(&message))
        } else {
            None
        }
    }

    /// Displays a collapsible block that belongs to `target`.
    ///
    /// Persisting stores the block flattened to `"{title}\n{body}"`.
    pub fn add_collapsible_to(
        &mut self,
        target: Option<SessionId>,
        block: Collapsible,
        persist: bool,
    ) -> Option<EntryHandle> {
        if persist && let Some(id) = target {
            self.store.append_message(id, block.flatten(), block.is_user);
        }
        if target == self.store.current_id() {
            let handle = self.renderer.show_collapsible(&block);
            self.last_collapsible = Some(handle);
            Some(handle)
        } else {
            None
        }
    }

    /// Removes a displayed entry; removing it twice is harmless.
    pub fn remove_entry(&mut self, handle: Option<EntryHandle>) -> bool {
        let Some(handle) = handle else {
            return false;
        };
        if self.last_collapsible == Some(handle) {
            self.last_collapsible = None;
        }
        self.renderer.remove_entry(handle)
    }

    /// Expands or collapses the most recently shown collapsible block.
    ///
    /// Returns the new collapse state, or `None` when that block was removed
    /// or the view was cleared since.
    pub fn toggle_last_collapsible(&mut self) -> Option<bool> {
        let handle = self.last_collapsible?;
        self.renderer.toggle_collapsed(handle)
    }

    /// Empties the view.
    pub fn clear_view(&mut self) {
        self.last_collapsible = None;
        self.renderer.clear_view();
    }

    /// The session list in creation order, with the current one marked.
    pub fn session_rows(&self) -> Vec<SessionRow> {
        let current = self.store.current_id();
        self.store
            .list_sessions()
            .iter()
            .map(|s| SessionRow {
                id: s.id(),
                name: s.name().to_string(),
                current: Some(s.id()) == current,
            })
            .collect()
    }

    /// Re-renders the session list and the header.
    pub fn refresh_sessions(&mut self) {
        let rows = self.session_rows();
        self.renderer.render_sessions(&rows);
        let header = self.store.current().map(|s| s.name().to_string());
        self.renderer.set_header(header.as_deref());
    }

    /// Clears the view and replays the current session's history.
    ///
    /// Collapsible entries replay as flat messages.
    pub fn show_current(&mut self) {
        self.clear_view();
        if let Some(session) = self.store.current() {
            for message in session.messages() {
                self.renderer.show_message(message);
            }
        }
        self.refresh_sessions();
    }

    /// Shows the loading affordance; pair with [`ChatState::end_loading`].
    pub fn begin_loading(&mut self) {
        self.loading += 1;
        self.renderer.set_loading(true);
    }

    /// Hides the loading affordance once no operation still wants it.
    pub fn end_loading(&mut self) {
        self.loading = self.loading.saturating_sub(1);
        if self.loading == 0 {
            self.renderer.set_loading(false);
        }
    }

    /// Whether some operation is showing the loading affordance.
    pub fn is_loading(&self) -> bool {
        self.loading > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MemoryRenderer;

    #[test]
    fn persist_flag_controls_history() {
        let mut state = ChatState::new(MemoryRenderer::new());
        let id = state.store_mut().create_from_message("Hi");
        state.add_message("Hi", true, true);
        state.add_message("Search completed. Processing results...", false, false);
        state.add_collapsible_to(
            Some(id),
            Collapsible::new("Web Search Results", "1. result", true),
            true,
        );
        let history: Vec<&str> = state
            .store()
            .get(id)
            .unwrap()
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(history, vec!["Hi", "Web Search Results\n1. result"]);
        assert_eq!(state.renderer().entries().len(), 3);
    }

    #[test]
    fn message_for_other_session_is_stored_not_shown() {
        let mut state = ChatState::new(MemoryRenderer::new());
        let first = state.store_mut().create_from_message("one");
        state.store_mut().clear_current();
        state.store_mut().create_from_message("two");
        assert!(state.add_message_to(Some(first), "late", false, true).is_none());
        assert!(state.renderer().entries().is_empty());
        assert_eq!(state.store().get(first).unwrap().message_count(), 1);
    }

    #[test]
    fn notice_without_session_is_shown() {
        let mut state = ChatState::new(MemoryRenderer::new());
        assert!(state.add_message("Proxy is not enabled.", false, true).is_some());
        assert_eq!(state.renderer().texts(), vec!["Proxy is not enabled."]);
    }

    #[test]
    fn show_current_replays_flat() {
        let mut state = ChatState::new(MemoryRenderer::new());
        let id = state.store_mut().create_from_message("Hi");
        state.add_message("Hi", true, true);
        let block = Collapsible::new("Web Search Results", "body", true);
        state.add_collapsible_to(Some(id), block, true);
        state.show_current();
        let entries = state.renderer().entries();
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[1], crate::render::ViewEntry::Message { .. }));
        assert_eq!(entries[1].text(), "Web Search Results\nbody");
        assert_eq!(state.renderer().header(), Some("Hi"));
        assert!(state.renderer().sessions()[0].current);
    }

    #[test]
    fn toggle_targets_latest_block() {
        let mut state = ChatState::new(MemoryRenderer::new());
        assert_eq!(state.toggle_last_collapsible(), None);

        let id = state.store_mut().create_from_message("Hi");
        state.add_collapsible_to(Some(id), Collapsible::new("Older", "a", true), true);
        let thinking = state.add_collapsible_to(
            Some(id),
            Collapsible::new("Thinking", "Searching the web...", false),
            false,
        );
        assert_eq!(state.toggle_last_collapsible(), Some(true));

        state.remove_entry(thinking);
        assert_eq!(state.toggle_last_collapsible(), None);

        state.add_collapsible_to(
            Some(id),
            Collapsible::new("Web Search Results", "1. result", true),
            true,
        );
        assert_eq!(state.toggle_last_collapsible(), Some(false));
        assert!(!state.renderer().collapsible("Web Search Results").unwrap().collapsed);
        assert_eq!(state.toggle_last_collapsible(), Some(true));

        state.show_current();
        assert_eq!(state.toggle_last_collapsible(), None);
    }

    #[test]
    fn loading_counter_hides_after_last() {
        let mut state = ChatState::new(MemoryRenderer::new());
        state.begin_loading();
        state.begin_loading();
        state.end_loading();
        assert!(state.renderer().is_loading());
        state.end_loading();
        assert!(!state.renderer().is_loading());
        state.end_loading();
        assert!(!state.is_loading());
    }
}
