//! Session and message orchestration for the chat client.
//!
//! This module provides the client-side core of an interactive chat: several
//! independent conversation sessions, each with an ordered history, and the
//! request/response protocol that sends a message to the backend and renders
//! the reply.  It supports:
//!
//! - Lazy session creation from the first message, switching and deletion
//! - A "thinking" placeholder and collapsible web-search results
//! - Model selection, context documents, and an upstream proxy check
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing, configuration and live options
//! - [`session`]: the session store
//! - [`state`]: sessions plus the view they are rendered into
//! - [`orchestrator`]: the send-message state machine
//! - [`models`], [`contexts`], [`proxy`]: the remaining backend features
//! - [`commands`]: slash command parsing for the REPL
//!
//! [`ChatApp`] wires them together over one backend and one renderer.

pub mod commands;
pub mod config;
pub mod contexts;
pub mod models;
pub mod orchestrator;
pub mod proxy;
pub mod session;
pub mod state;

use std::path::Path;
use std::sync::Arc;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, ConfigState};
pub use contexts::ContextFileManager;
pub use models::ModelSelector;
pub use orchestrator::{ChatOrchestrator, SendOutcome, SendState};
pub use proxy::{ProxyStatus, ProxyTestError, ProxyTester};
pub use session::{Message, Session, SessionId, SessionStore, derive_title};
pub use state::{ChatState, SharedState};

use crate::client::Backend;
use crate::render::{Renderer, SessionRow};
use crate::types::{ContextFile, UploadResponse};

/// The chat client: every component over one backend and one view.
pub struct ChatApp<B: Backend, R: Renderer> {
    state: SharedState<R>,
    config: ConfigState,
    preferred_model: Option<String>,
    orchestrator: ChatOrchestrator<B, R>,
    models: ModelSelector<B, R>,
    contexts: ContextFileManager<B, R>,
    proxy: ProxyTester<B, R>,
}

impl<B: Backend, R: Renderer> ChatApp<B, R> {
    /// Creates a client with no sessions.
    ///
    /// A model in `config` is only a preference: no model is selected until
    /// the backend reports or accepts one in [`ChatApp::start`].
    pub fn new(backend: B, renderer: R, mut config: ChatConfig) -> Self {
        let backend = Arc::new(backend);
        let preferred_model = config.model.take();
        let config = ConfigState::new(config);
        let state = ChatState::shared(renderer);
        Self {
            orchestrator: ChatOrchestrator::new(
                Arc::clone(&backend),
                Arc::clone(&state),
                config.clone(),
            ),
            models: ModelSelector::new(Arc::clone(&backend), Arc::clone(&state), config.clone()),
            contexts: ContextFileManager::new(Arc::clone(&backend), Arc::clone(&state)),
            proxy: ProxyTester::new(backend, Arc::clone(&state)),
            state,
            config,
            preferred_model,
        }
    }

    /// Loads the model catalog and the context list.
    ///
    /// A model requested up front is switched to once the catalog is known.
    pub async fn start(&self) {
        self.state.lock().await.refresh_sessions();
        if self.models.load().await
            && let Some(preferred) = &self.preferred_model
            && self.config.model().as_ref() != Some(preferred)
        {
            let _ = self.models.switch(preferred).await;
        }
        self.contexts.list_all().await;
    }

    /// The live options.
    pub fn config(&self) -> &ConfigState {
        &self.config
    }

    /// The shared state.
    pub fn state(&self) -> SharedState<R> {
        Arc::clone(&self.state)
    }

    /// Runs `f` against the renderer.
    pub async fn with_renderer<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        f(self.state.lock().await.renderer_mut())
    }

    /// Sends a message from the current session.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        self.orchestrator.send_message(text).await
    }

    /// Leaves the current session.
    pub async fn start_new_chat(&self) {
        self.orchestrator.start_new_chat().await;
    }

    /// The sessions in creation order, with the current one marked.
    pub async fn sessions(&self) -> Vec<SessionRow> {
        self.state.lock().await.session_rows()
    }

    /// The id of the session at a 1-based position in [`ChatApp::sessions`].
    pub async fn session_at(&self, position: usize) -> Option<SessionId> {
        let index = position.checked_sub(1)?;
        let state = self.state.lock().await;
        state.store().list_sessions().get(index).map(|s| s.id())
    }

    /// Switches to a session.
    pub async fn switch_session(&self, id: SessionId) -> crate::Result<()> {
        self.orchestrator.switch_session(id).await
    }

    /// Deletes a session.
    pub async fn delete_session(&self, id: SessionId) {
        self.orchestrator.delete_session(id).await;
    }

    /// Expands or collapses the latest collapsible block in the view.
    pub async fn toggle_last_collapsible(&self) -> Option<bool> {
        self.state.lock().await.toggle_last_collapsible()
    }

    /// Model names from the last catalog load.
    pub async fn model_catalog(&self) -> Vec<String> {
        self.models.catalog().await
    }

    /// Switches the backend's model.
    pub async fn switch_model(&self, model: &str) -> crate::Result<()> {
        self.models.switch(model).await
    }

    /// Shows or hides thinking.
    pub fn set_show_thinking(&self, show: bool) {
        self.config.set_show_thinking(show);
    }

    /// Enables or disables web search.
    pub fn set_search(&self, search: bool) {
        self.config.set_search(search);
    }

    /// Enables or disables the proxy; disabling clears its status.
    pub async fn set_proxy_enabled(&self, enabled: bool) {
        self.config.set_proxy_enabled(enabled);
        if !enabled {
            self.proxy.clear_status().await;
        }
    }

    /// Sets the proxy host.
    pub fn set_proxy_host(&self, host: &str) {
        self.config.set_proxy_host(host);
    }

    /// Sets the proxy port.
    pub fn set_proxy_port(&self, port: &str) {
        self.config.set_proxy_port(port);
    }

    /// Tests the configured proxy.
    pub async fn test_proxy(&self) -> ProxyStatus {
        let proxy = self.config.proxy();
        self.proxy.test(proxy.enabled, &proxy.host, &proxy.port).await
    }

    /// Uploads context documents, then refreshes the list.
    pub async fn upload_contexts<P: AsRef<Path>>(&self, paths: &[P]) -> usize {
        self.contexts.upload_all(paths).await
    }

    /// Uploads one in-memory document.
    pub async fn upload_context_bytes(
        &self,
        filename: &str,
        content: Vec<u8>,
    ) -> crate::Result<UploadResponse> {
        self.contexts.upload_bytes(filename, content).await
    }

    /// Fetches and renders the context list.
    pub async fn list_contexts(&self) -> Option<Vec<ContextFile>> {
        self.contexts.list_all().await
    }

    /// Deletes a context document.
    pub async fn delete_context(&self, filename: &str) -> bool {
        self.contexts.delete(filename).await
    }
}
