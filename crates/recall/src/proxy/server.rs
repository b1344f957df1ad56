//! HTTP server for the Recall gateway
//!
//! Routes:
//! - `/proxy/chat/completions`: memory-augmented, streamed chat proxy
//! - `/proxy/{*subpath}`: buffered passthrough to the active backend
//! - capture, memory CRUD, interest and model routes from [`crate::api`]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, Uri},
    routing::{get, post, put},
};
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use super::adapters::{ResponseMode, UpstreamRequest, UpstreamResponse};
use super::augment::augment_chat_request;
use super::engine::ProxyEngine;
use crate::api::handlers;
use crate::error::{GatewayError, Result};
use crate::interests::Generator;
use crate::memory::MemoryStore;

/// Largest request body accepted; page captures can be large
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

const CHAT_COMPLETIONS: &str = "chat/completions";

/// Shared application state for all handlers
pub struct AppState {
    /// The single logical user memories belong to
    pub user_id: String,
    /// Forwards requests to the backend resolved at startup
    pub engine: ProxyEngine,
    pub store: Arc<dyn MemoryStore>,
    /// Used by the interest summary
    pub generator: Arc<dyn Generator>,
}

/// The main gateway server
pub struct ProxyServer {
    listen_addr: String,
    state: Arc<AppState>,
}

impl ProxyServer {
    pub fn new(listen_addr: impl Into<String>, state: AppState) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            state: Arc::new(state),
        }
    }

    /// Start the server and run until Ctrl+C or SIGTERM
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self
            .listen_addr
            .parse()
            .map_err(|e| GatewayError::Config(format!("Invalid listen address: {e}")))?;

        let descriptor = self.state.engine.descriptor();
        tracing::info!("Starting Recall gateway on {addr}");
        tracing::info!(
            provider = %descriptor.kind,
            model = %descriptor.model,
            "Forwarding to {}{}",
            descriptor.base_url,
            descriptor.path_prefix
        );
        tracing::info!("Memory store: {}", self.state.store.name());

        let app = create_router(self.state);

        let listener = TcpListener::bind(addr).await?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Recall gateway shut down gracefully");
        Ok(())
    }
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/add_page", post(handlers::add_page))
        .route("/add_ocr", post(handlers::add_ocr))
        .route("/get_interests", get(handlers::get_interests))
        .route(
            "/memories",
            get(handlers::list_memories).post(handlers::add_memory),
        )
        .route(
            "/memories/{id}",
            put(handlers::update_memory).delete(handlers::delete_memory),
        )
        .route("/active_model", get(handlers::active_model))
        .route(
            "/proxy/chat/completions",
            post(chat_completions_handler)
                .get(passthrough_handler)
                .options(passthrough_handler),
        )
        .route(
            "/proxy/{*subpath}",
            get(passthrough_handler)
                .post(passthrough_handler)
                .options(passthrough_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Augment the chat request with memories and stream the completion back
async fn chat_completions_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<UpstreamResponse> {
    let augmented = augment_chat_request(state.store.as_ref(), &state.user_id, body).await?;
    tracing::debug!(memories = augmented.memories_used, "Forwarding chat completion");

    let request = UpstreamRequest {
        method,
        subpath: CHAT_COMPLETIONS.to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: augmented.body,
    };

    state.engine.proxy(request, ResponseMode::Streaming).await
}

/// Forward any other `/proxy/...` request as-is and buffer the answer
async fn passthrough_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<UpstreamResponse> {
    let subpath = uri
        .path()
        .strip_prefix("/proxy/")
        .unwrap_or_default()
        .to_string();

    let request = UpstreamRequest {
        method,
        subpath,
        query: uri.query().map(str::to_string),
        headers,
        body,
    };

    state.engine.proxy(request, ResponseMode::Buffered).await
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
