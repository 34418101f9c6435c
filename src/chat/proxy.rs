//! One-shot connectivity check of the upstream proxy.

use std::fmt;
use std::sync::Arc;

use crate::chat::state::SharedState;
use crate::client::Backend;
use crate::observability::PROXY_TESTS;
use crate::render::Renderer;
use crate::types::{ProxySettings, ProxyTestRequest};

/// Indicator text while a test is running.
pub const STATUS_TESTING: &str = "Testing...";
/// Indicator text after a passing test.
pub const STATUS_OK: &str = "Proxy OK";
/// Indicator text after the backend reported a failing test.
pub const STATUS_FAILED: &str = "Proxy failed";
/// Indicator text after the test request itself failed.
pub const STATUS_ERROR: &str = "Error";

/// Reasons a test is refused before any request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyTestError {
    /// The proxy is switched off.
    NotEnabled,
    /// Host or port is blank.
    MissingFields,
}

impl fmt::Display for ProxyTestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyTestError::NotEnabled => write!(f, "Proxy is not enabled."),
            ProxyTestError::MissingFields => write!(f, "Please provide proxy IP and port."),
        }
    }
}

impl std::error::Error for ProxyTestError {}

/// The terminal state of a proxy test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyStatus {
    /// Refused locally; nothing was sent.
    Refused(ProxyTestError),
    /// The probe went through the proxy.
    Ok,
    /// The backend reported that the probe failed.
    Failed,
    /// The test request got no usable response.
    Error,
}

impl ProxyStatus {
    /// The indicator text for this state, if it sets one.
    pub fn indicator(&self) -> Option<&'static str> {
        match self {
            ProxyStatus::Refused(_) => None,
            ProxyStatus::Ok => Some(STATUS_OK),
            ProxyStatus::Failed => Some(STATUS_FAILED),
            ProxyStatus::Error => Some(STATUS_ERROR),
        }
    }
}

/// Validates the trimmed host and port of a proxy configuration.
pub fn validate(enabled: bool, host: &str, port: &str) -> Result<ProxySettings, ProxyTestError> {
    if !enabled {
        return Err(ProxyTestError::NotEnabled);
    }
    let (host, port) = (host.trim(), port.trim());
    if host.is_empty() || port.is_empty() {
        return Err(ProxyTestError::MissingFields);
    }
    Ok(ProxySettings::new(true, host, port))
}

/// Asks the backend to probe the configured proxy.
pub struct ProxyTester<B: Backend, R: Renderer> {
    backend: Arc<B>,
    state: SharedState<R>,
}

impl<B: Backend, R: Renderer> ProxyTester<B, R> {
    /// Creates a tester over shared components.
    pub fn new(backend: Arc<B>, state: SharedState<R>) -> Self {
        Self { backend, state }
    }

    /// Runs the test and reports the result in the chat and the indicator.
    pub async fn test(&self, enabled: bool, host: &str, port: &str) -> ProxyStatus {
        let proxy = match validate(enabled, host, port) {
            Ok(proxy) => proxy,
            Err(refusal) => {
                tracing::debug!(reason = %refusal, "proxy test refused");
                self.state
                    .lock()
                    .await
                    .add_message(refusal.to_string(), false, true);
                return ProxyStatus::Refused(refusal);
            }
        };

        PROXY_TESTS.click();
        self.state
            .lock()
            .await
            .renderer_mut()
            .set_proxy_status(Some(STATUS_TESTING));
        let result = self.backend.test_proxy(ProxyTestRequest { proxy }).await;

        let (status, notice) = match result {
            Ok(response) if response.success => {
                let mut notice =
                    format!("Proxy test succeeded. Status {}", response.status_text());
                if let Some(details) = &response.details {
                    notice.push_str(". ");
                    notice.push_str(details);
                }
                (ProxyStatus::Ok, notice)
            }
            Ok(_) => (
                ProxyStatus::Failed,
                "Proxy test failed: Unknown error".to_string(),
            ),
            Err(err) if err.is_application() => (
                ProxyStatus::Failed,
                format!("Proxy test failed: {}", err.message()),
            ),
            Err(err) => (
                ProxyStatus::Error,
                format!("Proxy test error: {}", err.message()),
            ),
        };
        tracing::info!(status = ?status, "proxy test finished");
        let mut state = self.state.lock().await;
        state.add_message(notice, false, true);
        state.renderer_mut().set_proxy_status(status.indicator());
        status
    }

    /// Clears the indicator, as when the proxy is switched off.
    pub async fn clear_status(&self) {
        self.state.lock().await.renderer_mut().set_proxy_status(None);
    }
}
