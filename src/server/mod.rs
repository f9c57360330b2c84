//! HTTP surface for the agent
//!
//! `POST /api/chat` runs one turn per request. Turns share the agent through
//! an `Arc`; nothing is kept between requests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use crate::agent::Agent;
use crate::error::{AgentError, Result};
use crate::tools::ToolDescriptor;

pub mod error;

use error::ApiError;

const INDEX_HTML: &str = include_str!("index.html");

pub(crate) struct ServerState {
    pub(crate) agent: Arc<Agent>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub ok: bool,
    pub reply: String,
}

/// Build the application router
pub fn router(agent: Arc<Agent>) -> Router {
    let state = Arc::new(ServerState { agent });
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/tools", get(list_tools))
        .route("/api/chat", post(chat))
        .with_state(state)
        .layer(cors)
}

/// A running server; dropping it triggers graceful shutdown
pub struct Server {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Server {
    /// Bind `bind` and start serving in the background
    pub async fn start(agent: Arc<Agent>, bind: &str) -> Result<Self> {
        let listener = TcpListener::bind(bind).await?;
        let addr = listener.local_addr()?;
        let app = router(agent);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                warn!("Server stopped with error: {}", e);
            }
        });

        info!("Listening on http://{}", addr);
        Ok(Self {
            addr,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests
    pub async fn stop(mut self) {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("Server on {} stopped", self.addr);
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.send(());
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn list_tools(State(state): State<Arc<ServerState>>) -> Json<Vec<ToolDescriptor>> {
    Json(state.agent.registry().descriptors().into_iter().cloned().collect())
}

async fn chat(
    State(state): State<Arc<ServerState>>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> std::result::Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let message = request.message.trim();
    if message.is_empty() {
        return Err(AgentError::InvalidRequest("message must not be empty".to_string()).into());
    }

    let reply = state.agent.handle_turn(message).await?;
    Ok(Json(ChatResponse { ok: true, reply }))
}
