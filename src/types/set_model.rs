use serde::{Deserialize, Serialize};

use crate::types::{falsy_bool, non_empty_string};

/// Body of a `POST /set-model` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetModelRequest {
    /// Name of the model to switch to.
    pub model: String,
}

impl SetModelRequest {
    /// Creates a new model-switch request.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

/// Body of a `/set-model` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetModelResponse {
    /// True when the backend accepted the switch.
    #[serde(default, deserialize_with = "falsy_bool")]
    pub success: bool,

    /// The model now in use, if reported.
    #[serde(default)]
    pub current_model: Option<String>,

    /// Application-level failure reported by the backend.
    #[serde(default, deserialize_with = "non_empty_string")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_only_response() {
        let response: SetModelResponse =
            serde_json::from_value(serde_json::json!({"error": "No model name provided"}))
                .unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("No model name provided"));
    }
}
