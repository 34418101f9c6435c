// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod render;
pub mod types;

mod observability;

// Re-exports
pub use chat::ChatApp;
pub use client::{BASE_URL_ENV, Backend, BackendClient, BackendReply, DEFAULT_BASE_URL};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{MemoryRenderer, PlainTextRenderer, Renderer};
pub use types::*;
