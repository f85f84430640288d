//! HTTP request handlers

use super::types::{
    AnswerResponse, ChatHistoryResponse, ErrorResponse, HealthResponse, QuestionRequest,
    ServiceInfo,
};
use super::AppState;
use crate::runtime::RuntimeError;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        // Submit a question
        .route("/answer", post(answer))
        // Filtered history for a thread
        .route("/chat-history/:thread_id", get(chat_history))
        .with_state(state)
}

// ============================================================
// Service Info
// ============================================================

async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo::current())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

// ============================================================
// Research
// ============================================================

async fn answer(
    State(state): State<AppState>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, AppError> {
    let Json(req) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    tracing::info!(thread_id = ?req.thread_id, "Received research question");

    let outcome = state
        .runtime
        .answer(&req.question, req.thread_id.as_deref())
        .await
        .map_err(|e| {
            if e.is_client_error() {
                AppError::BadRequest(e.to_string())
            } else {
                AppError::Internal(format!("Error processing question: {e}"))
            }
        })?;

    Ok(Json(AnswerResponse {
        answer: outcome.answer,
        question: req.question,
        thread_id: outcome.thread_id,
        chat_history: outcome.chat_history,
    }))
}

async fn chat_history(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<ChatHistoryResponse>, AppError> {
    let messages = state
        .runtime
        .history(&thread_id)
        .await
        .map_err(|e: RuntimeError| {
            AppError::Internal(format!("Error retrieving chat history: {e}"))
        })?;

    Ok(Json(ChatHistoryResponse {
        thread_id,
        total_messages: messages.len(),
        messages,
    }))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
