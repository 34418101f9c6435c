//! Context documents held by the backend for retrieval.
//!
//! Status notices share the chat display channel.  Listing failures are only
//! logged.

use std::path::Path;
use std::sync::Arc;

use crate::chat::state::SharedState;
use crate::client::Backend;
use crate::error::Error;
use crate::observability::{CONTEXT_DELETES, CONTEXT_UPLOADS};
use crate::render::{ContextListing, Renderer};
use crate::types::{ContextFile, DeleteContextRequest, UploadResponse};

/// Uploads, lists and deletes context documents.
pub struct ContextFileManager<B: Backend, R: Renderer> {
    backend: Arc<B>,
    state: SharedState<R>,
}

impl<B: Backend, R: Renderer> ContextFileManager<B, R> {
    /// Creates a manager over shared components.
    pub fn new(backend: Arc<B>, state: SharedState<R>) -> Self {
        Self { backend, state }
    }

    /// Reads a file from disk and uploads it.
    ///
    /// A path without a file name is rejected before anything is read.
    pub async fn upload(&self, path: &Path) -> crate::Result<UploadResponse> {
        let Some(filename) = path.file_name().map(|name| name.to_string_lossy().into_owned())
        else {
            let err = Error::validation(
                format!("{} does not name a file", path.display()),
                Some("path".to_string()),
            );
            return Err(self.upload_failed(err).await);
        };
        match tokio::fs::read(path).await {
            Ok(content) => self.upload_bytes(&filename, content).await,
            Err(e) => {
                let err = Error::io(format!("could not read {}: {}", path.display(), e), e);
                Err(self.upload_failed(err).await)
            }
        }
    }

    async fn upload_failed(&self, err: Error) -> Error {
        self.state
            .lock()
            .await
            .add_message(format!("Upload failed: {}", err.message()), false, true);
        err
    }

    /// Uploads `content` under `filename`.
    pub async fn upload_bytes(
        &self,
        filename: &str,
        content: Vec<u8>,
    ) -> crate::Result<UploadResponse> {
        if filename.trim().is_empty() {
            let err = Error::validation("filename must not be empty", Some("filename".to_string()));
            return Err(self.upload_failed(err).await);
        }
        CONTEXT_UPLOADS.click();
        let result = self.backend.upload_context(filename, content).await;
        let notice = match &result {
            Ok(response) => {
                let stored = response.filename.as_deref().unwrap_or(filename);
                tracing::info!(filename = stored, "uploaded context");
                format!("Uploaded context: {stored}")
            }
            Err(err) if err.is_application() => {
                format!("Error uploading {filename}: {}", err.message())
            }
            Err(err) => format!("Upload failed: {}", err.message()),
        };
        self.state.lock().await.add_message(notice, false, true);
        result
    }

    /// Uploads each file in turn, then refreshes the list once.
    ///
    /// Returns how many uploads succeeded.
    pub async fn upload_all<P: AsRef<Path>>(&self, paths: &[P]) -> usize {
        let mut uploaded = 0;
        for path in paths {
            if self.upload(path.as_ref()).await.is_ok() {
                uploaded += 1;
            }
        }
        self.list_all().await;
        uploaded
    }

    /// Fetches the documents and re-renders the list.
    ///
    /// A response without a `contexts` field leaves the list as it was.
    pub async fn list_all(&self) -> Option<Vec<ContextFile>> {
        match self.backend.contexts().await {
            Ok(list) => {
                let files = list.contexts?;
                self.state
                    .lock()
                    .await
                    .renderer_mut()
                    .render_contexts(&ContextListing::from_files(&files));
                Some(files)
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not load contexts");
                None
            }
        }
    }

    /// Deletes a document, then refreshes the list whatever happened.
    ///
    /// Returns true when the backend removed it.
    pub async fn delete(&self, filename: &str) -> bool {
        CONTEXT_DELETES.click();
        let result = self
            .backend
            .delete_context(DeleteContextRequest::new(filename))
            .await;
        let deleted = {
            let mut state = self.state.lock().await;
            match result {
                Ok(response) if response.success => {
                    tracing::info!(filename, "deleted context");
                    state.add_message(format!("Deleted context: {filename}"), false, false);
                    true
                }
                Ok(_) => {
                    state.add_message(format!("Failed to delete {filename}"), false, true);
                    false
                }
                Err(err) if err.is_application() => {
                    state.add_message(format!("Failed to delete {filename}"), false, true);
                    false
                }
                Err(err) => {
                    state.add_message(
                        format!("Error deleting context: {}", err.message()),
                        false,
                        true,
                    );
                    false
                }
            }
        };
        self.list_all().await;
        deleted
    }
}
