//! Axum route handlers for the Interview API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Message, Phase, Reply};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub history: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackReportRequest {
    /// Optional instruction to style the report.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub history: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub response: String,
    /// Tag the client should store on the assistant message it appends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
}

impl From<Reply> for TextResponse {
    fn from(reply: Reply) -> Self {
        Self {
            response: reply.text,
            phase: reply.phase,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /v1/query
///
/// Main entry point: routes the candidate's turn to the current interview phase.
pub async fn handle_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<TextResponse>, AppError> {
    if request.query.trim().is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }

    let request_id = Uuid::new_v4();
    let span = info_span!("interview_query", %request_id);
    async move {
        info!(
            "Received interview query ({} history messages)",
            request.history.len()
        );
        let reply = state
            .orchestrator
            .process(&request.query, request.history)
            .await
            .map_err(|e| AppError::Llm(format!("Interview query failed: {e}")))?;
        Ok::<_, AppError>(Json(TextResponse::from(reply)))
    }
    .instrument(span)
    .await
}

/// POST /feedback-report
///
/// Generates the final performance report from the evaluations in history.
pub async fn handle_feedback_report(
    State(state): State<AppState>,
    Json(request): Json<FeedbackReportRequest>,
) -> Result<Json<TextResponse>, AppError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("feedback_report", %request_id);
    async move {
        info!(
            "Generating feedback report ({} history messages)",
            request.history.len()
        );
        let reply = state
            .orchestrator
            .generate_report(request.history, request.query.as_deref())
            .await
            .map_err(|e| AppError::Llm(format!("Feedback report failed: {e}")))?;
        Ok::<_, AppError>(Json(TextResponse::from(reply)))
    }
    .instrument(span)
    .await
}
