//! Integration tests for the HTTP backend client.
//! These tests run against a loopback responder and need no network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use chatterbox::chat::ChatConfig;
use chatterbox::render::ContextListing;
use chatterbox::{
    Backend, BackendClient, ChatApp, ChatRequest, DeleteContextRequest, MemoryRenderer,
    ProxySettings, ProxyTestRequest, SetModelRequest,
};

/// One request as the responder saw it.
#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    head: String,
    body: Vec<u8>,
}

impl Recorded {
    fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Answers each connection with the next scripted `(status, body)` pair.
struct Responder {
    base_url: String,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

impl Responder {
    async fn start(script: Vec<(u16, &str)>) -> Self {
        Self::start_at("/", script).await
    }

    async fn start_at(prefix: &str, script: Vec<(u16, &str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let script: Vec<(u16, String)> = script
            .into_iter()
            .map(|(status, body)| (status, body.to_string()))
            .collect();
        let recorder = Arc::clone(&seen);
        tokio::spawn(async move {
            for (status, body) in script {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let request = read_request(&mut stream).await;
                recorder.lock().unwrap().push(request);
                let response = format!(
                    "HTTP/1.1 {status} Scripted\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
        });
        Self {
            base_url: format!("http://{addr}{prefix}"),
            seen,
        }
    }

    fn client(&self) -> BackendClient {
        BackendClient::with_options(Some(self.base_url.clone()), Some(Duration::from_secs(5)))
            .unwrap()
    }

    fn requests(&self) -> Vec<Recorded> {
        self.seen.lock().unwrap().clone()
    }
}

async fn read_request(stream: &mut TcpStream) -> Recorded {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let lower = head.to_lowercase();
    let mut body = buf[header_end..].to_vec();

    if let Some(length) = lower
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .map(|v| v.trim().parse::<usize>().unwrap())
    {
        while body.len() < length {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed mid-body");
            body.extend_from_slice(&chunk[..n]);
        }
    } else if lower.contains("transfer-encoding: chunked") {
        while find(&body, b"0\r\n\r\n").is_none() {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed mid-body");
            body.extend_from_slice(&chunk[..n]);
        }
        body = dechunk(&body);
    }

    let mut request_line = head.lines().next().unwrap_or_default().split(' ');
    Recorded {
        method: request_line.next().unwrap_or_default().to_string(),
        path: request_line.next().unwrap_or_default().to_string(),
        head,
        body,
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn dechunk(mut raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let line_end = find(raw, b"\r\n").unwrap();
        let size = usize::from_str_radix(std::str::from_utf8(&raw[..line_end]).unwrap(), 16)
            .unwrap();
        raw = &raw[line_end + 2..];
        if size == 0 {
            return out;
        }
        out.extend_from_slice(&raw[..size]);
        raw = &raw[size + 2..];
    }
}

/// A base URL nothing listens on.
async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

#[tokio::test]
async fn models_are_fetched_with_get() {
    let server = Responder::start(vec![(
        200,
        r#"{"models": [{"name": "mistral"}, {"name": "qwen"}], "current_model": "qwen"}"#,
    )])
    .await;
    let list = server.client().models().await.unwrap();
    assert_eq!(list.names(), vec!["mistral", "qwen"]);
    assert_eq!(list.current_model.as_deref(), Some("qwen"));

    let requests = server.requests();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/models");
}

#[tokio::test]
async fn chat_request_uses_backend_field_names() {
    let server = Responder::start(vec![(
        200,
        r#"{"response": "hello", "searchPerformed": false}"#,
    )])
    .await;
    let request = ChatRequest::new("hi", true, ProxySettings::new(true, "10.0.0.1", "3128"));
    let response = server.client().chat(request).await.unwrap();
    assert_eq!(response.reply(), "hello");

    let recorded = &server.requests()[0];
    assert_eq!(recorded.method, "POST");
    assert_eq!(recorded.path, "/chat");
    assert_eq!(
        recorded.json(),
        serde_json::json!({
            "message": "hi",
            "search": true,
            "proxyEnabled": true,
            "proxyIp": "10.0.0.1",
            "proxyPort": "3128",
        })
    );
}

#[tokio::test]
async fn error_field_on_failure_status_is_application_error() {
    let server = Responder::start(vec![(
        500,
        r#"{"error": "Ollama returned status 500", "details": "model not loaded"}"#,
    )])
    .await;
    let err = server
        .client()
        .chat(ChatRequest::new("hi", false, ProxySettings::default()))
        .await
        .unwrap_err();
    assert!(err.is_application());
    assert!(!err.is_transport());
    assert_eq!(err.message(), "Ollama returned status 500");
    assert_eq!(err.status_code(), Some(500));
}

#[tokio::test]
async fn error_status_without_error_field_still_decodes() {
    let server = Responder::start(vec![(400, r#"{"success": false}"#)]).await;
    let response = server
        .client()
        .delete_context(DeleteContextRequest::new("missing.txt"))
        .await
        .unwrap();
    assert!(!response.success);
    assert_eq!(server.requests()[0].json(), serde_json::json!({"filename": "missing.txt"}));
}

#[tokio::test]
async fn missing_fields_are_tolerated() {
    let server = Responder::start(vec![(200, "{}"), (200, "{}"), (200, "{}")]).await;
    let client = server.client();
    let chat = client
        .chat(ChatRequest::new("hi", false, ProxySettings::default()))
        .await
        .unwrap();
    assert_eq!(chat.reply(), "");
    assert!(!chat.search_performed);
    assert!(client.contexts().await.unwrap().contexts.is_none());
    let probe = client
        .test_proxy(ProxyTestRequest {
            proxy: ProxySettings::new(true, "h", "1"),
        })
        .await
        .unwrap();
    assert!(!probe.success);
}

#[tokio::test]
async fn malformed_body_is_transport_error() {
    let server = Responder::start(vec![(502, "<html>Bad Gateway</html>")]).await;
    let err = server.client().models().await.unwrap_err();
    assert!(err.is_transport());
    assert!(!err.is_application());
}

#[tokio::test]
async fn refused_connection_is_transport_error() {
    let client =
        BackendClient::with_options(Some(refused_url().await), Some(Duration::from_secs(5)))
            .unwrap();
    let err = client
        .set_model(SetModelRequest::new("mistral"))
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert!(err.is_connection());
}

#[tokio::test]
async fn upload_is_multipart_with_file_field() {
    let server = Responder::start(vec![(
        200,
        r#"{"success": true, "filename": "my_notes.md", "path": "/srv/contexts/my_notes.md"}"#,
    )])
    .await;
    let response = server
        .client()
        .upload_context("notes.md", b"# heading\nbody".to_vec())
        .await
        .unwrap();
    assert_eq!(response.filename.as_deref(), Some("my_notes.md"));

    let recorded = &server.requests()[0];
    assert_eq!(recorded.path, "/upload-context");
    assert!(recorded.head.to_lowercase().contains("multipart/form-data"));
    let body = String::from_utf8_lossy(&recorded.body);
    assert!(body.contains(r#"name="file""#));
    assert!(body.contains(r#"filename="notes.md""#));
    assert!(body.contains("# heading\nbody"));
}

#[tokio::test]
async fn endpoints_resolve_under_base_path() {
    let server = Responder::start_at("/app", vec![(200, r#"{"contexts": []}"#)]).await;
    let list = server.client().contexts().await.unwrap();
    assert_eq!(list.contexts, Some(Vec::new()));
    assert_eq!(server.requests()[0].path, "/app/contexts");
}

#[tokio::test]
async fn first_message_over_http_creates_session() {
    let server = Responder::start(vec![(200, r#"{"response": "Hello! How can I help?"}"#)]).await;
    let app = ChatApp::new(server.client(), MemoryRenderer::new(), ChatConfig::new());
    let outcome = app.send_message("Hi").await;
    let id = outcome.session().unwrap();

    let state = app.state();
    let state = state.lock().await;
    let session = state.store().get(id).unwrap();
    assert_eq!(session.name(), "Hi");
    let history: Vec<(&str, bool)> = session
        .messages()
        .iter()
        .map(|m| (m.content.as_str(), m.is_user))
        .collect();
    assert_eq!(history, vec![("Hi", true), ("Hello! How can I help?", false)]);
}

#[tokio::test]
async fn unreachable_backend_records_connection_error() {
    let client =
        BackendClient::with_options(Some(refused_url().await), Some(Duration::from_secs(5)))
            .unwrap();
    let app = ChatApp::new(
        client,
        MemoryRenderer::new(),
        ChatConfig::new().with_show_thinking(true),
    );
    let id = app.send_message("Hi").await.session().unwrap();

    let state = app.state();
    let state = state.lock().await;
    let messages = state.store().get(id).unwrap().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "Error: Could not connect to the server");
    assert!(!state.renderer().is_loading());
}

#[tokio::test]
async fn startup_loads_models_and_contexts() {
    let server = Responder::start(vec![
        (200, r#"{"models": [{"name": "mistral"}], "current_model": "mistral"}"#),
        (200, r#"{"contexts": []}"#),
    ])
    .await;
    let app = ChatApp::new(server.client(), MemoryRenderer::new(), ChatConfig::new());
    app.start().await;

    assert_eq!(app.config().model().as_deref(), Some("mistral"));
    let state = app.state();
    let state = state.lock().await;
    assert_eq!(
        state.renderer().texts(),
        vec!["System initialized with model: mistral"]
    );
    assert_eq!(state.renderer().contexts(), &ContextListing::Placeholder);
    assert_eq!(state.renderer().header(), None);
}
