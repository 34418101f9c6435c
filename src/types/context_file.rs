use serde::{Deserialize, Serialize};

use crate::types::{falsy_bool, non_empty_string};

/// A context document the backend holds for retrieval.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextFile {
    /// Sanitized file name, also the document's identity for deletion.
    #[serde(default)]
    pub filename: String,

    /// Where the backend stored the file, when it says.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ContextFile {
    /// Creates a context file entry with only a name.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            path: None,
        }
    }
}

/// Body of a `GET /contexts` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextList {
    /// Documents currently held; `None` when the field was absent.
    #[serde(default)]
    pub contexts: Option<Vec<ContextFile>>,

    /// Application-level failure reported by the backend.
    #[serde(default, deserialize_with = "non_empty_string")]
    pub error: Option<String>,
}

/// Body of a `/upload-context` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadResponse {
    /// True when the backend stored the file.
    #[serde(default, deserialize_with = "falsy_bool")]
    pub success: bool,

    /// Name the backend stored the file under.
    #[serde(default)]
    pub filename: Option<String>,

    /// Application-level failure reported by the backend.
    #[serde(default, deserialize_with = "non_empty_string")]
    pub error: Option<String>,
}

/// Body of a `POST /delete-context` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteContextRequest {
    /// Name of the document to delete.
    pub filename: String,
}

impl DeleteContextRequest {
    /// Creates a new delete request.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }
}

/// Body of a `/delete-context` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteContextResponse {
    /// True when a document with that name was removed.
    #[serde(default, deserialize_with = "falsy_bool")]
    pub success: bool,

    /// Application-level failure reported by the backend.
    #[serde(default, deserialize_with = "non_empty_string")]
    pub error: Option<String>,
}
