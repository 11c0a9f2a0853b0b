//! REST API server for the market verdict engine
//!
//! Read-only access to the published verdicts plus the chat assistant.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::assistant::VerdictAssistant;
use crate::audit::{AuditLog, EvaluationRecord};
use crate::error::EngineError;
use crate::store::VerdictStore;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: Option<String>,
}

/// =============================
/// Response Models
/// =============================

#[derive(Debug, Serialize)]
pub struct AuditEntry {
    #[serde(flatten)]
    pub record: EvaluationRecord,
    pub integrity_verified: bool,
}

/// =============================
/// Error Response
/// =============================

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn engine_error_response(e: EngineError) -> Response {
    error!("Request failed: {}", e);
    let status = match e {
        EngineError::LlmError(_) | EngineError::HttpError(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e.to_string())
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn VerdictStore>,
    /// None when no language model is configured
    pub assistant: Option<Arc<VerdictAssistant>>,
    /// Audit trail written by the last simulation run
    pub audit_path: PathBuf,
}

/// =============================
/// Health Endpoints
/// =============================

async fn home() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to the Market Verdict Engine" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// =============================
/// Verdict Endpoints
/// =============================

async fn list_verdicts(State(state): State<ApiState>) -> Response {
    match state.store.load_all().await {
        Ok(verdicts) => Json(verdicts).into_response(),
        Err(e) => engine_error_response(e),
    }
}

async fn get_verdict(State(state): State<ApiState>, Path(ticker): Path<String>) -> Response {
    match state.store.find(&ticker).await {
        Ok(Some(verdict)) => Json(verdict).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            format!("No verdict for ticker '{}'", ticker),
        ),
        Err(e) => engine_error_response(e),
    }
}

/// =============================
/// Audit Endpoint
/// =============================

async fn get_audit(State(state): State<ApiState>, Path(ticker): Path<String>) -> Response {
    match audit_entries(&state, &ticker).await {
        Ok(entries) if entries.is_empty() => error_response(
            StatusCode::NOT_FOUND,
            format!("No audit records for ticker '{}'", ticker),
        ),
        Ok(entries) => Json(entries).into_response(),
        Err(e) => engine_error_response(e),
    }
}

async fn audit_entries(state: &ApiState, ticker: &str) -> crate::Result<Vec<AuditEntry>> {
    let log = AuditLog::load_from(&state.audit_path).await?;

    let mut entries = Vec::new();
    for audit_id in log.list_for_ticker(ticker).await? {
        if let Some(record) = log.get(audit_id).await? {
            entries.push(AuditEntry {
                integrity_verified: log.verify_integrity(audit_id).await?,
                record,
            });
        }
    }
    Ok(entries)
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(State(state): State<ApiState>, Json(req): Json<ChatRequest>) -> Response {
    let Some(question) = req.question.filter(|q| !q.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'question' in request body");
    };

    let Some(assistant) = state.assistant else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Chat assistant is not configured",
        );
    };

    info!("Received chat question ({} chars)", question.len());

    match assistant.answer(&question).await {
        Ok(answer) => (StatusCode::OK, Json(answer)).into_response(),
        Err(e) => engine_error_response(e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/api/health", get(health))
        .route("/api/verdicts", get(list_verdicts))
        .route("/api/verdicts/:ticker", get(get_verdict))
        .route("/api/audit/:ticker", get(get_audit))
        .route("/api/chat", post(chat_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(state: ApiState, port: u16) -> crate::Result<()> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
