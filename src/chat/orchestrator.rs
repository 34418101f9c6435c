//! The send-message state machine and session lifecycle.
//!
//! A send moves through `Idle -> Sending -> (AwaitingThinking) -> Completed |
//! Failed -> Idle`.  The user's message is echoed immediately.  The request
//! itself waits behind any earlier request for the same session, so replies
//! land in the order their messages were sent.  Whatever the outcome, the
//! thinking placeholder is removed and the loading affordance released.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use crate::chat::config::ConfigState;
use crate::chat::session::SessionId;
use crate::chat::state::SharedState;
use crate::client::Backend;
use crate::error::Error;
use crate::observability::{CHAT_FAILURES, CHAT_REJECTED, CHAT_ROUND_TRIP, CHAT_SENDS};
use crate::render::{Collapsible, Renderer};
use crate::types::{ChatRequest, ChatResponse};

/// Title of the ephemeral block shown while a searching reply is pending.
pub const THINKING_TITLE: &str = "Thinking";
/// Body of the thinking placeholder.
pub const THINKING_BODY: &str = "Searching the web...";
/// Title of the block carrying search context.
pub const SEARCH_RESULTS_TITLE: &str = "Web Search Results";
/// Shown when a search ran but returned no context.
pub const SEARCH_COMPLETED_NOTICE: &str = "Search completed. Processing results...";
/// Shown when the chat request produced no usable response.
pub const CONNECTION_ERROR: &str = "Error: Could not connect to the server";
/// Shown after starting a new chat.
pub const NEW_CHAT_NOTICE: &str =
    "New blank session. Type a message to create the session and set its title.";

/// Where a send currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    /// Nothing in flight.
    Idle,
    /// The request has been issued.
    Sending,
    /// The request has been issued and a thinking placeholder is showing.
    AwaitingThinking,
    /// A reply was rendered.
    Completed,
    /// An error was rendered.
    Failed,
}

/// How a call to [`ChatOrchestrator::send_message`] ended.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// The text was blank; nothing was sent or recorded.
    Rejected,
    /// The backend replied and the reply was recorded.
    Completed {
        /// The session the message was sent from.
        session: SessionId,
        /// The backend's reply.
        response: ChatResponse,
    },
    /// The backend reported an error or could not be reached.
    Failed {
        /// The session the message was sent from.
        session: SessionId,
        /// What went wrong.
        error: Error,
    },
}

impl SendOutcome {
    /// The session the message landed in, unless rejected.
    pub fn session(&self) -> Option<SessionId> {
        match self {
            SendOutcome::Rejected => None,
            SendOutcome::Completed { session, .. } | SendOutcome::Failed { session, .. } => {
                Some(*session)
            }
        }
    }

    /// The terminal state this outcome corresponds to.
    pub fn state(&self) -> SendState {
        match self {
            SendOutcome::Rejected => SendState::Idle,
            SendOutcome::Completed { .. } => SendState::Completed,
            SendOutcome::Failed { .. } => SendState::Failed,
        }
    }
}

/// Coordinates sessions, configuration and the backend chat endpoint.
pub struct ChatOrchestrator<B: Backend, R: Renderer> {
    backend: Arc<B>,
    state: SharedState<R>,
    config: ConfigState,
    gates: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl<B: Backend, R: Renderer> ChatOrchestrator<B, R> {
    /// Creates an orchestrator over shared components.
    pub fn new(backend: Arc<B>, state: SharedState<R>, config: ConfigState) -> Self {
        Self {
            backend,
            state,
            config,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Sends `text` from the current session, creating one if needed.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let message = text.trim();
        if message.is_empty() {
            CHAT_REJECTED.click();
            tracing::debug!("rejected blank message");
            return SendOutcome::Rejected;
        }

        let config = self.config.snapshot();
        let (session, placeholder, loading) = {
            let mut state = self.state.lock().await;
            let session = match state.store().current_id() {
                Some(id) => id,
                None => {
                    let id = state.store_mut().create_from_message(message);
                    state.clear_view();
                    state.refresh_sessions();
                    id
                }
            };
            state.add_message_to(Some(session), message, true, true);
            state.renderer_mut().clear_input();

            let placeholder = if config.show_thinking && config.search {
                let block = Collapsible::new(THINKING_TITLE, THINKING_BODY, !config.show_thinking);
                state.add_collapsible_to(Some(session), block, false)
            } else {
                None
            };
            if config.show_thinking {
                state.begin_loading();
            }
            (session, placeholder, config.show_thinking)
        };
        let send_state = if placeholder.is_some() {
            SendState::AwaitingThinking
        } else {
            SendState::Sending
        };
        tracing::debug!(session = %session, state = ?send_state, "sending message");

        let gate = self.gate(session).await;
        let _turn = gate.lock().await;

        CHAT_SENDS.click();
        let start = Instant::now();
        let request = ChatRequest::new(message, config.search, config.proxy.clone());
        let result = self.backend.chat(request).await;
        CHAT_ROUND_TRIP.add(start.elapsed().as_secs_f64());

        let mut state = self.state.lock().await;
        state.remove_entry(placeholder);
        let outcome = match result {
            Ok(response) => {
                if response.search_performed {
                    match &response.search_context {
                        Some(context) => {
                            let block =
                                Collapsible::new(SEARCH_RESULTS_TITLE, context.clone(), true);
                            state.add_collapsible_to(Some(session), block, true);
                        }
                        None => {
                            state.add_message_to(
                                Some(session),
                                SEARCH_COMPLETED_NOTICE,
                                false,
                                false,
                            );
                        }
                    }
                }
                state.add_message_to(Some(session), response.reply(), false, true);
                SendOutcome::Completed { session, response }
            }
            Err(error) => {
                CHAT_FAILURES.click();
                let text = if error.is_application() {
                    format!("Error: {}", error.message())
                } else {
                    CONNECTION_ERROR.to_string()
                };
                state.add_message_to(Some(session), text, false, true);
                SendOutcome::Failed { session, error }
            }
        };
        if loading {
            state.end_loading();
        }
        tracing::debug!(session = %session, state = ?outcome.state(), "send finished");
        outcome
    }

    /// Leaves the current session without creating a new one.
    ///
    /// The next message sent creates the session.
    pub async fn start_new_chat(&self) {
        let mut state = self.state.lock().await;
        state.store_mut().clear_current();
        state.clear_view();
        state.refresh_sessions();
        state.add_message(NEW_CHAT_NOTICE, false, false);
    }

    /// Makes `id` current and replays its history.
    ///
    /// Fails with [`Error::NotFound`] when the session no longer exists.
    pub async fn switch_session(&self, id: SessionId) -> crate::Result<()> {
        let mut state = self.state.lock().await;
        state.store_mut().switch_to(id)?;
        state.show_current();
        Ok(())
    }

    /// Deletes a session, moving the view to the fallback selection.
    pub async fn delete_session(&self, id: SessionId) {
        {
            let mut state = self.state.lock().await;
            let was_current = state.store().current_id() == Some(id);
            state.store_mut().delete_session(id);
            if was_current || state.store().is_empty() {
                state.show_current();
            } else {
                state.refresh_sessions();
            }
        }
        self.gates.lock().await.remove(&id);
    }

    async fn gate(&self, session: SessionId) -> Arc<Mutex<()>> {
        let mut gates = self.gates.lock().await;
        Arc::clone(gates.entry(session).or_default())
    }
}
