//! In-process stand-ins for the Hoarder API used by tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};

use crate::config::GatewayConfig;
use crate::error::GatewayResult;
use crate::upstream::{BookmarkApi, UpstreamRequest};

pub(crate) const TEST_TOKEN: &str = "test-token-0123456789";

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

struct MockState {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
    recorded: Mutex<Vec<RecordedRequest>>,
}

/// Real HTTP server on a random local port answering every request with a
/// canned status and body.
pub(crate) struct MockUpstream {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockUpstream {
    pub(crate) async fn respond(status: StatusCode, body: &str) -> Self {
        Self::start(status, body, None).await
    }

    pub(crate) async fn stalled(delay: Duration) -> Self {
        Self::start(StatusCode::OK, "[]", Some(delay)).await
    }

    async fn start(status: StatusCode, body: &str, delay: Option<Duration>) -> Self {
        let state = Arc::new(MockState {
            status,
            body: body.to_string(),
            delay,
            recorded: Mutex::new(Vec::new()),
        });
        let app = Router::new().fallback(record).with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock");
        let addr = listener.local_addr().expect("mock addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });
        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
        }
    }

    pub(crate) fn base_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    pub(crate) fn config(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.base_url(),
            api_token: Some(TEST_TOKEN.to_string()),
            ..GatewayConfig::default()
        }
    }

    pub(crate) async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.recorded.lock().await.clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.send(());
        }
    }
}

async fn record(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };
    state.recorded.lock().await.push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });
    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }
    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.clone(),
    )
        .into_response()
}

/// Address nothing is listening on.
pub(crate) async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    listener.local_addr().expect("addr")
}

/// [`BookmarkApi`] returning a fixed result and counting calls.
pub(crate) struct FakeApi {
    result: GatewayResult<Value>,
    calls: AtomicUsize,
    seen: std::sync::Mutex<Vec<UpstreamRequest>>,
}

impl FakeApi {
    pub(crate) fn returning(result: GatewayResult<Value>) -> Arc<Self> {
        Arc::new(Self {
            result,
            calls: AtomicUsize::new(0),
            seen: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<UpstreamRequest> {
        self.seen.lock().expect("lock").last().cloned()
    }
}

#[async_trait]
impl BookmarkApi for FakeApi {
    async fn call(&self, request: UpstreamRequest) -> GatewayResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().expect("lock").push(request);
        self.result.clone()
    }
}

/// [`BookmarkApi`] that panics, standing in for an unanticipated fault.
pub(crate) struct PanickingApi;

#[async_trait]
impl BookmarkApi for PanickingApi {
    async fn call(&self, _request: UpstreamRequest) -> GatewayResult<Value> {
        panic!("simulated fault in upstream client");
    }
}
