use std::env;
use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_APPLICATION_ERRORS, CLIENT_REQUEST_DURATION, CLIENT_REQUESTS, CLIENT_TRANSPORT_ERRORS,
};
use crate::types::{
    ChatRequest, ChatResponse, ContextList, DeleteContextRequest, DeleteContextResponse,
    ModelList, ProxyTestRequest, ProxyTestResponse, SetModelRequest, SetModelResponse,
    UploadResponse,
};

/// Base URL used when neither the caller nor the environment supplies one.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/";
/// Environment variable consulted for the base URL.
pub const BASE_URL_ENV: &str = "CHATTERBOX_BASE_URL";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/////////////////////////////////////////// Backend ///////////////////////////////////////////

/// The chat backend, seen only through its request/response contracts.
///
/// Each method resolves to one of three outcomes:
/// - `Ok(reply)`: a JSON body arrived and carried no `error` field,
/// - `Err(e)` with `e.is_application()`: a JSON body arrived with an `error` field,
/// - `Err(e)` with `e.is_transport()`: no usable body arrived.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// `GET /models`.
    async fn models(&self) -> Result<ModelList>;

    /// `POST /set-model`.
    async fn set_model(&self, request: SetModelRequest) -> Result<SetModelResponse>;

    /// `POST /chat`.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// `POST /upload-context` as a multipart form with a single `file` part.
    async fn upload_context(&self, filename: &str, content: Vec<u8>) -> Result<UploadResponse>;

    /// `GET /contexts`.
    async fn contexts(&self) -> Result<ContextList>;

    /// `POST /delete-context`.
    async fn delete_context(&self, request: DeleteContextRequest)
    -> Result<DeleteContextResponse>;

    /// `POST /test-proxy`.
    async fn test_proxy(&self, request: ProxyTestRequest) -> Result<ProxyTestResponse>;
}

/// A response body that may carry an application-level `error` field.
pub trait BackendReply: DeserializeOwned {
    /// The backend's error message, if it reported one.
    fn application_error(&self) -> Option<&str>;
}

macro_rules! backend_reply {
    ($($ty:ty),* $(,)?) => {
        $(
            impl BackendReply for $ty {
                fn application_error(&self) -> Option<&str> {
                    self.error.as_deref()
                }
            }
        )*
    };
}

backend_reply!(
    ModelList,
    SetModelResponse,
    ChatResponse,
    UploadResponse,
    ContextList,
    DeleteContextResponse,
    ProxyTestResponse,
);

//////////////////////////////////////// BackendClient ////////////////////////////////////////

/// HTTP client for the chat backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// The base URL is read from the CHATTERBOX_BASE_URL environment variable,
    /// falling back to [`DEFAULT_BASE_URL`].
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };
        let base_url = parse_base_url(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The base URL all endpoints are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    async fn get<T: BackendReply>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        let request = self.client.get(url).headers(Self::default_headers());
        self.execute(path, request).await
    }

    async fn post_json<B: Serialize + Sync, T: BackendReply>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        let request = self
            .client
            .post(url)
            .headers(Self::default_headers())
            .json(body);
        self.execute(path, request).await
    }

    async fn execute<T: BackendReply>(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        tracing::debug!(endpoint = path, "backend request");
        let outcome = match request.send().await {
            Ok(response) => Self::decode(response).await,
            Err(e) => Err(self.transport_error(e)),
        };
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        match &outcome {
            Ok(_) => {}
            Err(err) if err.is_application() => {
                CLIENT_APPLICATION_ERRORS.click();
                tracing::debug!(endpoint = path, error = %err, "backend reported an error");
            }
            Err(err) => {
                CLIENT_TRANSPORT_ERRORS.click();
                tracing::warn!(endpoint = path, error = %err, "backend request failed");
            }
        }
        outcome
    }

    /// Decode a response body regardless of HTTP status.
    ///
    /// The backend reports failures as JSON with an `error` field and a non-2xx
    /// status, so the status alone does not decide the outcome.
    async fn decode<T: BackendReply>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::http_client(
                format!("Failed to read response: {}", e),
                Some(Box::new(e)),
            )
        })?;
        let reply: T = serde_json::from_str(&body).map_err(|e| {
            Error::serialization(
                format!("Failed to parse response (status {}): {}", status.as_u16(), e),
                Some(Box::new(e)),
            )
        })?;
        if let Some(message) = reply.application_error() {
            return Err(Error::application(message, Some(status.as_u16())));
        }
        Ok(reply)
    }
}

#[async_trait::async_trait]
impl Backend for BackendClient {
    async fn models(&self) -> Result<ModelList> {
        self.get("models").await
    }

    async fn set_model(&self, request: SetModelRequest) -> Result<SetModelResponse> {
        self.post_json("set-model", &request).await
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.post_json("chat", &request).await
    }

    async fn upload_context(&self, filename: &str, content: Vec<u8>) -> Result<UploadResponse> {
        let url = self.endpoint("upload-context")?;
        let part = Part::bytes(content).file_name(filename.to_string());
        let form = Form::new().part("file", part);
        let request = self
            .client
            .post(url)
            .headers(Self::default_headers())
            .multipart(form);
        self.execute("upload-context", request).await
    }

    async fn contexts(&self) -> Result<ContextList> {
        self.get("contexts").await
    }

    async fn delete_context(
        &self,
        request: DeleteContextRequest,
    ) -> Result<DeleteContextResponse> {
        self.post_json("delete-context", &request).await
    }

    async fn test_proxy(&self, request: ProxyTestRequest) -> Result<ProxyTestResponse> {
        self.post_json("test-proxy", &request).await
    }
}

/// Parse a base URL so that relative endpoint names join beneath it.
fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let url = if raw.ends_with('/') {
        Url::parse(raw)?
    } else {
        Url::parse(&format!("{raw}/"))?
    };
    if url.cannot_be_a_base() {
        return Err(Error::url(
            format!("{raw} cannot serve as a base URL"),
            None,
        ));
    }
    Ok(url)
}
