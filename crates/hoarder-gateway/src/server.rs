use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::upstream::HoarderClient;

pub mod command;
pub mod error;
pub mod openapi;
pub mod system;

pub struct Server {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Server {
    /// Build the Hoarder client from `config` and listen on its host/port.
    pub async fn start(config: &GatewayConfig) -> Result<Self, String> {
        let client = HoarderClient::new(config).map_err(|error| error.to_string())?;
        let dispatcher = Dispatcher::new(Arc::new(client));
        Self::bind(config.listen_addr()?, dispatcher).await
    }

    pub async fn bind(addr: SocketAddr, dispatcher: Dispatcher) -> Result<Self, String> {
        let app = router(dispatcher);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|error| format!("failed to bind {addr}: {error}"))?;
        let addr = listener
            .local_addr()
            .map_err(|error| error.to_string())?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                tracing::error!("server error: {error}");
            }
        });

        Ok(Server {
            addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn shutdown(&mut self) -> Result<(), String> {
        if let Some(sender) = self.shutdown.take() {
            sender
                .send(())
                .map_err(|_| "failed to send server shutdown signal".to_string())
        } else {
            Ok(())
        }
    }

    /// Wait for the serve loop to finish after [`Server::shutdown`].
    pub async fn wait(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

pub fn router(dispatcher: Dispatcher) -> Router {
    let state = Arc::new(ServerState { dispatcher });
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/mcp", post(command::handle_command))
        .route("/openapi.json", get(openapi::openapi_json))
        .fallback(not_found)
        .with_state(state)
        .layer(cors)
}

async fn not_found() -> error::ApiError {
    error::ApiError::not_found("no such endpoint")
}

pub(crate) struct ServerState {
    pub(crate) dispatcher: Dispatcher,
}
