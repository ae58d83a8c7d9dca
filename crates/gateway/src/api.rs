//! Route handlers.
//!
//! | Method | Path              | Handler          |
//! |--------|-------------------|------------------|
//! | GET    | `/healthz`        | [`healthz`]      |
//! | GET    | `/version`        | [`version`]      |
//! | GET    | `/mode`           | [`mode`]         |
//! | GET    | `/proof/messages` | [`proof_messages`] |
//! | POST   | `/api/chat`       | [`chat`]         |
//! | GET    | `/api/history`    | [`history`]      |

use axum::{
    Extension, Form, Json,
    extract::{FromRequest, Query, Request, State, rejection::QueryRejection},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info_span};

use askrelay_core::audit::{AuditRow, clamp_limit};
use askrelay_core::session::Exchange;
use askrelay_core::time::{iso, now_iso};
use askrelay_providers::{Mode, UsageRecord};

use crate::SharedState;
use crate::error::{ApiError, CHAT_FIELDS_REQUIRED, HISTORY_SESSION_REQUIRED};

/// Version tag reported by `/version`.
pub const VERSION_TAG: &str = "v0.1-local-pass";

/// Session identifier handed to the request log middleware.
#[derive(Debug, Clone)]
pub struct SessionTag(pub String);

// --- Liveness ---

pub async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
    pub time: String,
}

pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: VERSION_TAG.to_string(),
        time: now_iso(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModeResponse {
    pub openai: bool,
}

/// Whether the LLM-backed completion was selected at startup.
pub async fn mode(State(state): State<SharedState>) -> Json<ModeResponse> {
    Json(ModeResponse {
        openai: state.completion.mode() == Mode::Llm,
    })
}

// --- Chat ---

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub session_identifier: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub timestamp: String,
    pub session_identifier: String,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageRecord>,
}

/// Accepts JSON or form-urlencoded bodies.
pub async fn chat(
    State(state): State<SharedState>,
    request: Request,
) -> Result<(Extension<SessionTag>, Json<ChatResponse>), Response> {
    let request = read_chat_request(request).await.unwrap_or_default();
    let session_id = request.session_identifier.filter(|s| !s.is_empty());

    let (Some(question), Some(session_id)) =
        (request.question.filter(|q| !q.is_empty()), session_id.clone())
    else {
        return Err(tagged(ApiError::Validation(CHAT_FIELDS_REQUIRED), session_id));
    };

    let span = info_span!("chat", session_identifier = %session_id);
    let completion = state.completion.complete(&question).instrument(span).await;

    let timestamp = Utc::now();
    state
        .sessions
        .record(&session_id, question, completion.answer.clone(), timestamp);

    Ok((
        Extension(SessionTag(session_id.clone())),
        Json(ChatResponse {
            answer: completion.answer,
            timestamp: iso(&timestamp),
            session_identifier: session_id,
            mode: state.completion.mode(),
            usage: completion.usage,
        }),
    ))
}

/// Decode the chat body by content type. Unreadable bodies yield `None`.
async fn read_chat_request(request: Request) -> Option<ChatRequest> {
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    let parsed = if is_form {
        Form::<ChatRequest>::from_request(request, &())
            .await
            .map(|Form(body)| body)
            .map_err(|e| e.body_text())
    } else {
        Json::<ChatRequest>::from_request(request, &())
            .await
            .map(|Json(body)| body)
            .map_err(|e| e.body_text())
    };

    match parsed {
        Ok(body) => Some(body),
        Err(reason) => {
            debug!(reason = %reason, "Unreadable chat body");
            None
        }
    }
}

/// Render an error, keeping the session identifier for the request log.
fn tagged(error: ApiError, session_id: Option<String>) -> Response {
    let mut response = error.into_response();
    if let Some(id) = session_id {
        response.extensions_mut().insert(SessionTag(id));
    }
    response
}

// --- History ---

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub session_identifier: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_identifier: String,
    pub history: Vec<Exchange>,
    pub count: usize,
}

pub async fn history(
    State(state): State<SharedState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session_id = query
        .ok()
        .and_then(|Query(q)| q.session_identifier)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::Validation(HISTORY_SESSION_REQUIRED))?;

    let history = state.sessions.read(&session_id);
    Ok(Json(HistoryResponse {
        session_identifier: session_id,
        count: history.len(),
        history,
    }))
}

// --- Audit proof ---

#[derive(Debug, Deserialize)]
pub struct ProofQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProofResponse {
    pub ok: bool,
    pub rows: Vec<AuditRow>,
}

/// Most recent rows from the external message store, newest first.
pub async fn proof_messages(
    State(state): State<SharedState>,
    query: Result<Query<ProofQuery>, QueryRejection>,
) -> Result<Json<ProofResponse>, ApiError> {
    let sink = state.audit.as_ref().ok_or(ApiError::NotConfigured)?;
    let raw = query.ok().and_then(|Query(q)| q.limit);
    let limit = clamp_limit(raw.as_deref());

    let rows = sink.recent_messages(limit).await?;
    Ok(Json(ProofResponse { ok: true, rows }))
}
