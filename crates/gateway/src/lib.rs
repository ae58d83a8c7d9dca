//! HTTP API gateway for AskRelay.
//!
//! Exposes the chat and history endpoints, the audit proof endpoint, and
//! liveness/introspection routes. Unrouted paths are served from the
//! configured public directory when it exists.
//!
//! Built on Axum.

pub mod api;
pub mod error;

use axum::{
    Router,
    extract::{Query, Request},
    http::header::CONTENT_TYPE,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use askrelay_config::AppConfig;
use askrelay_core::audit::AuditSink;
use askrelay_core::session::SessionStore;
use askrelay_providers::CompletionProvider;

use crate::api::SessionTag;
use crate::error::ApiError;

/// Shared application state.
///
/// The completion variant and the audit sink are fixed at startup; only the
/// session store changes while the process runs.
pub struct AppState {
    pub completion: CompletionProvider,
    pub sessions: SessionStore,
    pub audit: Option<Arc<dyn AuditSink>>,
}

impl AppState {
    pub fn new(completion: CompletionProvider, audit: Option<Arc<dyn AuditSink>>) -> Self {
        Self {
            completion,
            sessions: SessionStore::new(),
            audit,
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS allowing any origin and the `content-type` header
/// - one structured log line per request (see [`request_log_middleware`])
/// - panics turned into a 500 JSON response
/// - HTTP trace spans
pub fn build_router(state: SharedState, public_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods(cors::Any)
        .allow_headers([CONTENT_TYPE]);

    let mut router = Router::new()
        .route("/healthz", get(api::healthz))
        .route("/version", get(api::version))
        .route("/mode", get(api::mode))
        .route("/proof/messages", get(api::proof_messages))
        .route("/api/chat", post(api::chat))
        .route("/api/history", get(api::history))
        .with_state(state);

    if let Some(dir) = public_dir.filter(|d| d.is_dir()) {
        router = router.fallback_service(ServeDir::new(dir));
        info!(path = %dir.display(), "Static file serving enabled");
    }

    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(request_log_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let completion = askrelay_providers::build_from_config(&config)?;
    let audit = askrelay_audit::build_from_config(&config.audit)?;

    info!(
        mode = completion.mode().as_str(),
        provider = completion.provider_name(),
        audit = audit.as_ref().map_or("none", |s| s.name()),
        "Subsystems ready"
    );

    let state = Arc::new(AppState::new(completion, audit));
    let app = build_router(state, Some(&config.gateway.public_dir));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

// --- Request logging ---

#[derive(Deserialize)]
struct SessionQuery {
    session_identifier: Option<String>,
}

/// Emit one log line per request with route, session, status and duration.
///
/// The session identifier comes from the handler (via [`SessionTag`]), else
/// from the query string, else `<none>`.
async fn request_log_middleware(req: Request, next: Next) -> Response {
    let route = format!("{} {}", req.method(), req.uri().path());
    let from_query = Query::<SessionQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(q)| q.session_identifier);

    let start = Instant::now();
    let response = next.run(req).await;

    let session_identifier = response
        .extensions()
        .get::<SessionTag>()
        .map(|t| t.0.clone())
        .or(from_query)
        .unwrap_or_else(|| "<none>".to_string());

    info!(
        route = %route,
        session_identifier = %session_identifier,
        status = response.status().as_u16(),
        ms = start.elapsed().as_millis() as u64,
        "request"
    );

    response
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    ApiError::Internal(detail).into_response()
}
