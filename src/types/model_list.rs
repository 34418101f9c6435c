use serde::{Deserialize, Serialize};

use crate::types::{empty_vec, non_empty_string};

/// One entry of the backend's model catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model name as the backend knows it.
    #[serde(default)]
    pub name: String,

    /// Model tag, when the backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl ModelInfo {
    /// Creates a model entry without a tag.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
        }
    }
}

/// Body of a `GET /models` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelList {
    /// Available models; entries without a name are ignored by consumers.
    #[serde(default, deserialize_with = "empty_vec")]
    pub models: Vec<ModelInfo>,

    /// The model the backend currently answers with.
    #[serde(default)]
    pub current_model: Option<String>,

    /// Application-level failure reported by the backend.
    #[serde(default, deserialize_with = "non_empty_string")]
    pub error: Option<String>,
}

impl ModelList {
    /// Names of all models that carry a non-empty name.
    pub fn names(&self) -> Vec<String> {
        self.models
            .iter()
            .filter(|m| !m.name.is_empty())
            .map(|m| m.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_catalog() {
        let list: ModelList = serde_json::from_value(serde_json::json!({
            "models": [
                {"name": "mistral", "tag": "latest"},
                {"name": "qwen"},
                {"tag": "orphan"},
            ],
            "current_model": "mistral",
        }))
        .unwrap();
        assert_eq!(list.names(), vec!["mistral".to_string(), "qwen".to_string()]);
        assert_eq!(list.current_model.as_deref(), Some("mistral"));
        assert!(list.error.is_none());
    }

    #[test]
    fn null_models_is_empty() {
        let list: ModelList =
            serde_json::from_value(serde_json::json!({"models": null, "current_model": null}))
                .unwrap();
        assert!(list.models.is_empty());
        assert!(list.current_model.is_none());
    }
}
