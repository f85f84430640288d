//! API request and response types

use crate::transcript::HistoryEntry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Request to answer a research question
#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

/// Response for a completed research turn
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub question: String,
    pub thread_id: String,
    pub chat_history: Vec<HistoryEntry>,
}

/// Response with a thread's filtered history
#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub thread_id: String,
    pub messages: Vec<HistoryEntry>,
    pub total_messages: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Service description served at `/`
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Value,
}

impl ServiceInfo {
    pub fn current() -> Self {
        Self {
            message: "Research Agent API",
            version: env!("CARGO_PKG_VERSION"),
            endpoints: json!({
                "/answer": "POST - Submit a research question",
                "/chat-history/{thread_id}": "GET - Get chat history for a thread",
                "/health": "GET - Health check",
            }),
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
