//! Model catalog loading and switching.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::chat::config::ConfigState;
use crate::chat::state::SharedState;
use crate::client::Backend;
use crate::observability::MODEL_SWITCHES;
use crate::render::Renderer;
use crate::types::SetModelRequest;

/// Loads the backend's model catalog and switches between its entries.
pub struct ModelSelector<B: Backend, R: Renderer> {
    backend: Arc<B>,
    state: SharedState<R>,
    config: ConfigState,
    catalog: RwLock<Vec<String>>,
}

impl<B: Backend, R: Renderer> ModelSelector<B, R> {
    /// Creates a selector with an empty catalog.
    pub fn new(backend: Arc<B>, state: SharedState<R>, config: ConfigState) -> Self {
        Self {
            backend,
            state,
            config,
            catalog: RwLock::new(Vec::new()),
        }
    }

    /// Model names from the last successful load.
    pub async fn catalog(&self) -> Vec<String> {
        self.catalog.read().await.clone()
    }

    /// Fetches the catalog and selects the backend's current model.
    ///
    /// Returns true when at least one model was found.
    pub async fn load(&self) -> bool {
        let (notice, found) = match self.backend.models().await {
            Ok(list) => {
                let names = list.names();
                let found = !names.is_empty();
                *self.catalog.write().await = names;
                if found {
                    let current = list.current_model.unwrap_or_default();
                    if !current.is_empty() {
                        self.config.set_model(current.clone());
                    }
                    tracing::info!(model = %current, "model catalog loaded");
                    (format!("System initialized with model: {current}"), true)
                } else {
                    (
                        "No models found. Please make sure the backend has models installed."
                            .to_string(),
                        false,
                    )
                }
            }
            Err(err) if err.is_application() => {
                tracing::warn!(error = %err, "backend could not list models");
                (format!("Error loading models: {}", err.message()), false)
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not load models");
                (
                    "Error loading models. Please make sure the backend is running.".to_string(),
                    false,
                )
            }
        };
        self.state.lock().await.add_message(notice, false, true);
        found
    }

    /// Asks the backend to answer with `model` from now on.
    ///
    /// The local selection only changes when the backend accepts.
    pub async fn switch(&self, model: &str) -> crate::Result<()> {
        MODEL_SWITCHES.click();
        let result = self.backend.set_model(SetModelRequest::new(model)).await;
        let mut state = self.state.lock().await;
        match result {
            Ok(_) => {
                self.config.set_model(model);
                tracing::info!(model, "model changed");
                state.add_message(format!("Model changed to: {model}"), false, true);
                Ok(())
            }
            Err(err) => {
                let notice = if err.is_application() {
                    format!("Error changing model: {}", err.message())
                } else {
                    "Error changing model".to_string()
                };
                state.add_message(notice, false, true);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::state::ChatState;
    use crate::error::Error;
    use crate::render::MemoryRenderer;
    use crate::types::{
        ChatRequest, ChatResponse, ContextList, DeleteContextRequest, DeleteContextResponse,
        ModelInfo, ModelList, ProxyTestRequest, ProxyTestResponse, SetModelResponse,
        UploadResponse,
    };

    struct MockModels {
        list: crate::Result<ModelList>,
        switch: crate::Result<SetModelResponse>,
    }

    #[async_trait::async_trait]
    impl Backend for MockModels {
        async fn models(&self) -> crate::Result<ModelList> {
            self.list.clone()
        }

        async fn set_model(&self, _: SetModelRequest) -> crate::Result<SetModelResponse> {
            self.switch.clone()
        }

        async fn chat(&self, _: ChatRequest) -> crate::Result<ChatResponse> {
            unimplemented!()
        }

        async fn upload_context(&self, _: &str, _: Vec<u8>) -> crate::Result<UploadResponse> {
            unimplemented!()
        }

        async fn contexts(&self) -> crate::Result<ContextList> {
            unimplemented!()
        }

        async fn delete_context(
            &self,
            _: DeleteContextRequest,
        ) -> crate::Result<DeleteContextResponse> {
            unimplemented!()
        }

        async fn test_proxy(&self, _: ProxyTestRequest) -> crate::Result<ProxyTestResponse> {
            unimplemented!()
        }
    }

    fn make_selector(
        list: crate::Result<ModelList>,
        switch: crate::Result<SetModelResponse>,
    ) -> (
        ModelSelector<MockModels, MemoryRenderer>,
        SharedState<MemoryRenderer>,
        ConfigState,
    ) {
        let state = ChatState::shared(MemoryRenderer::new());
        let config = ConfigState::default();
        let selector = ModelSelector::new(
            Arc::new(MockModels { list, switch }),
            Arc::clone(&state),
            config.clone(),
        );
        (selector, state, config)
    }

    fn catalog() -> ModelList {
        ModelList {
            models: vec![ModelInfo::new("mistral"), ModelInfo::new("qwen")],
            current_model: Some("mistral".to_string()),
            error: None,
        }
    }

    #[tokio::test]
    async fn load_selects_current_model() {
        let (selector, state, config) =
            make_selector(Ok(catalog()), Ok(SetModelResponse::default()));
        assert!(selector.load().await);
        assert_eq!(selector.catalog().await, vec!["mistral", "qwen"]);
        assert_eq!(config.model().as_deref(), Some("mistral"));
        assert_eq!(
            state.lock().await.renderer().texts(),
            vec!["System initialized with model: mistral"]
        );
    }

    #[tokio::test]
    async fn load_empty_catalog() {
        let (selector, state, config) =
            make_selector(Ok(ModelList::default()), Ok(SetModelResponse::default()));
        assert!(!selector.load().await);
        assert!(config.model().is_none());
        assert_eq!(
            state.lock().await.renderer().texts(),
            vec!["No models found. Please make sure the backend has models installed."]
        );
    }

    #[tokio::test]
    async fn load_failures() {
        let (selector, state, _) = make_selector(
            Err(Error::application("ollama unreachable", Some(500))),
            Ok(SetModelResponse::default()),
        );
        assert!(!selector.load().await);
        assert_eq!(
            state.lock().await.renderer().texts(),
            vec!["Error loading models: ollama unreachable"]
        );

        let (selector, state, _) = make_selector(
            Err(Error::connection("refused", None)),
            Ok(SetModelResponse::default()),
        );
        assert!(!selector.load().await);
        assert_eq!(
            state.lock().await.renderer().texts(),
            vec!["Error loading models. Please make sure the backend is running."]
        );
    }

    #[tokio::test]
    async fn switch_updates_selection_on_success() {
        let (selector, state, config) =
            make_selector(Ok(catalog()), Ok(SetModelResponse::default()));
        selector.switch("qwen").await.unwrap();
        assert_eq!(config.model().as_deref(), Some("qwen"));
        assert_eq!(
            state.lock().await.renderer().texts(),
            vec!["Model changed to: qwen"]
        );
    }

    #[tokio::test]
    async fn switch_failure_keeps_selection() {
        let (selector, state, config) = make_selector(
            Ok(catalog()),
            Err(Error::application("Model not found", Some(400))),
        );
        config.set_model("mistral");
        assert!(selector.switch("llama").await.is_err());
        assert_eq!(config.model().as_deref(), Some("mistral"));

        let (selector2, state2, _) = make_selector(
            Ok(catalog()),
            Err(Error::timeout("Request timed out", Some(60.0))),
        );
        assert!(selector2.switch("llama").await.is_err());
        assert_eq!(
            state.lock().await.renderer().texts(),
            vec!["Error changing model: Model not found"]
        );
        assert_eq!(
            state2.lock().await.renderer().texts(),
            vec!["Error changing model"]
        );
    }
}
