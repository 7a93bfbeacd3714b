//! In-process mock backend for integration tests.
//! Bound to an ephemeral localhost port; records every request it receives and answers
//! from a scripted route table (unmatched routes get a FastAPI-style 404).

#![allow(dead_code)]

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use taskdesk_client::{ApiClient, ClientConfig, CredentialStore};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct Scripted {
    method: Method,
    path: String,
    content_type: Option<String>,
    status: StatusCode,
    body: String,
}

type Hook = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Default)]
struct MockState {
    routes: Arc<Mutex<Vec<Scripted>>>,
    seen: Arc<Mutex<Vec<Recorded>>>,
    hooks: Arc<Mutex<Vec<(String, Hook)>>>,
}

pub struct MockBackend {
    pub base_url: String,
    state: MockState,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind 127.0.0.1:0");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("mock backend error: {e:?}");
            }
        });
        Self { base_url: format!("http://{addr}"), state, handle }
    }

    /// Answer `method path` with `status` and `body`; the first matching entry wins.
    pub fn route(&self, method: Method, path: &str, status: u16, body: &str) -> &Self {
        self.push(method, path, None, status, body)
    }

    /// Like `route`, but only for requests whose content type starts with `content_type`.
    pub fn route_for(&self, method: Method, path: &str, content_type: &str, status: u16, body: &str) -> &Self {
        self.push(method, path, Some(content_type), status, body)
    }

    fn push(&self, method: Method, path: &str, content_type: Option<&str>, status: u16, body: &str) -> &Self {
        self.state.routes.lock().push(Scripted {
            method,
            path: path.to_string(),
            content_type: content_type.map(str::to_string),
            status: StatusCode::from_u16(status).expect("status"),
            body: body.to_string(),
        });
        self
    }

    /// Run `f` inside the handler whenever `path` is hit, before the response is sent.
    pub fn on_hit(&self, path: &str, f: impl Fn() + Send + Sync + 'static) -> &Self {
        self.state.hooks.lock().push((path.to_string(), Arc::new(f)));
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.seen.lock().clone()
    }

    pub fn request_lines(&self) -> Vec<String> {
        self.requests().iter().map(|r| format!("{} {}", r.method, r.path)).collect()
    }

    pub fn client(&self) -> ApiClient {
        self.client_with(CredentialStore::in_memory())
    }

    pub fn client_with(&self, store: CredentialStore) -> ApiClient {
        taskdesk_client::logging::init_tracing("debug");
        ApiClient::new(ClientConfig::new(&self.base_url), store).expect("client")
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

async fn handle(State(state): State<MockState>, method: Method, uri: Uri, headers: HeaderMap, body: String) -> Response {
    let content_type = header_str(&headers, header::CONTENT_TYPE);
    state.seen.lock().push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header_str(&headers, header::AUTHORIZATION),
        content_type: content_type.clone(),
        accept: header_str(&headers, header::ACCEPT),
        body,
    });
    let hooks: Vec<Hook> = state
        .hooks
        .lock()
        .iter()
        .filter(|(p, _)| p == uri.path())
        .map(|(_, f)| f.clone())
        .collect();
    for f in hooks {
        f();
    }
    let hit = state
        .routes
        .lock()
        .iter()
        .find(|r| {
            r.method == method
                && r.path == uri.path()
                && r.content_type.as_deref().map_or(true, |want| {
                    content_type.as_deref().is_some_and(|got| got.starts_with(want))
                })
        })
        .cloned();
    match hit {
        Some(r) if r.body.is_empty() => r.status.into_response(),
        Some(r) => (r.status, [(header::CONTENT_TYPE, "application/json")], r.body).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"detail":"Not Found"}"#.to_string(),
        )
            .into_response(),
    }
}

/// Unsigned test token whose payload segment is `claims`.
pub fn token_with_claims(claims: &serde_json::Value) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("claims json"));
    format!("{header}.{payload}.sig")
}
