// Public modules
pub mod chat;
pub mod context_file;
pub mod model_list;
pub mod proxy_test;
pub mod set_model;

// Re-exports
pub use chat::{ChatRequest, ChatResponse};
pub use context_file::{
    ContextFile, ContextList, DeleteContextRequest, DeleteContextResponse, UploadResponse,
};
pub use model_list::{ModelInfo, ModelList};
pub use proxy_test::{ProxySettings, ProxyTestRequest, ProxyTestResponse};
pub use set_model::{SetModelRequest, SetModelResponse};

use serde::{Deserialize, Deserializer};

/// Deserialize a boolean that may be absent or `null`, treating both as `false`.
pub(crate) fn falsy_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Deserialize a list that may be absent or `null`, treating both as empty.
pub(crate) fn empty_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize an optional string, treating the empty string like `null`.
pub(crate) fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}
