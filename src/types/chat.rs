use serde::{Deserialize, Serialize};

use crate::types::{ProxySettings, falsy_bool, non_empty_string};

/// Body of a `POST /chat` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// The user's message, already trimmed.
    pub message: String,

    /// Whether the backend should run a web search before answering.
    pub search: bool,

    /// Proxy the backend should route its outbound traffic through.
    #[serde(flatten)]
    pub proxy: ProxySettings,
}

impl ChatRequest {
    /// Creates a new chat request.
    pub fn new(message: impl Into<String>, search: bool, proxy: ProxySettings) -> Self {
        Self {
            message: message.into(),
            search,
            proxy,
        }
    }
}

/// Body of a `/chat` response.
///
/// Every field may be absent; absence reads as empty or false.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    /// The assistant's reply.
    #[serde(default)]
    pub response: Option<String>,

    /// True when the backend ran a web search for this message.
    #[serde(
        default,
        rename = "searchPerformed",
        deserialize_with = "falsy_bool"
    )]
    pub search_performed: bool,

    /// Text of the search results the backend fed to the model.
    #[serde(
        default,
        rename = "searchContext",
        deserialize_with = "non_empty_string"
    )]
    pub search_context: Option<String>,

    /// Application-level failure reported by the backend.
    #[serde(default, deserialize_with = "non_empty_string")]
    pub error: Option<String>,

    /// Extra diagnostic text accompanying `error`.
    #[serde(default)]
    pub details: Option<String>,
}

impl ChatResponse {
    /// The reply text, or the empty string when the backend sent none.
    pub fn reply(&self) -> &str {
        self.response.as_deref().unwrap_or("")
    }
}
