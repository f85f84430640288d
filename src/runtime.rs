//! Research runtime
//!
//! [`ResearchRuntime`] is the long-lived service the HTTP layer talks to. Each
//! call to [`ResearchRuntime::answer`] runs one turn on its own task, holding
//! the thread's lock from the first transcript read until commit.

mod decision;
mod executor;
pub mod traits;


pub use decision::DecisionStep;
pub use executor::TurnExecutor;
pub use traits::*;

use crate::assembler;
use crate::llm::{LlmError, LlmService};
use crate::state_machine::{TransitionError, TurnContext, TurnFailure};
use crate::transcript::{HistoryEntry, StoreError, ThreadLocks, TranscriptStore, DEFAULT_THREAD_ID};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Request-level failures
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Invalid question: {0}")]
    Validation(String),
    #[error("Decision step failed: {0}")]
    Decision(#[source] LlmError),
    #[error("Invalid model reply: {0}")]
    InvalidReply(String),
    #[error("Turn limit of {max_turns} decision calls exceeded")]
    TurnLimitExceeded { max_turns: u32 },
    #[error(transparent)]
    State(#[from] StoreError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RuntimeError {
    /// Whether the caller sent something unusable
    pub fn is_client_error(&self) -> bool {
        matches!(self, RuntimeError::Validation(_))
    }
}

impl From<TurnFailure> for RuntimeError {
    fn from(failure: TurnFailure) -> Self {
        match failure {
            TurnFailure::Decision { kind, message } => {
                RuntimeError::Decision(LlmError::new(kind, message))
            }
            TurnFailure::EmptyReply | TurnFailure::EmptyInvocation => {
                RuntimeError::InvalidReply(failure.to_string())
            }
            TurnFailure::TurnLimitExceeded { max_turns } => {
                RuntimeError::TurnLimitExceeded { max_turns }
            }
        }
    }
}

impl From<TransitionError> for RuntimeError {
    fn from(e: TransitionError) -> Self {
        RuntimeError::Internal(e.to_string())
    }
}

/// Limits applied to every turn
#[derive(Debug, Clone, Copy)]
pub struct RuntimeSettings {
    /// Maximum decision calls per turn
    pub max_turns: u32,
    /// Wall-clock cap on each tool invocation
    pub tool_timeout: Duration,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            max_turns: 12,
            tool_timeout: Duration::from_secs(30),
        }
    }
}

/// Result of a successful turn
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub answer: String,
    pub thread_id: String,
    pub chat_history: Vec<HistoryEntry>,
}

pub struct ResearchRuntime {
    store: Arc<dyn TranscriptStore>,
    decision: DecisionStep,
    tools: Arc<dyn ToolExecutor>,
    locks: ThreadLocks,
    settings: RuntimeSettings,
}

impl ResearchRuntime {
    pub fn new(
        store: Arc<dyn TranscriptStore>,
        llm: Arc<dyn LlmService>,
        tools: Arc<dyn ToolExecutor>,
        settings: RuntimeSettings,
    ) -> Self {
        Self {
            store,
            decision: DecisionStep::new(llm),
            tools,
            locks: ThreadLocks::new(),
            settings,
        }
    }

    /// Answer `question` on `thread_id` (or the default thread)
    pub async fn answer(
        &self,
        question: &str,
        thread_id: Option<&str>,
    ) -> Result<AnswerOutcome, RuntimeError> {
        if question.trim().is_empty() {
            return Err(RuntimeError::Validation(
                "question must not be empty".to_string(),
            ));
        }
        let thread_id = thread_id
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_THREAD_ID)
            .to_string();

        let _thread_guard = self.locks.acquire(&thread_id).await;
        let start = Instant::now();

        let has_history = self.store.has_history(&thread_id).await?;
        let history = if has_history {
            self.store.get(&thread_id).await?
        } else {
            Vec::new()
        };
        let input = assembler::prime(has_history, question);

        tracing::info!(
            thread_id = %thread_id,
            history_messages = history.len(),
            primed = !has_history,
            "Starting research turn"
        );

        let executor = TurnExecutor::new(
            TurnContext::new(thread_id.clone(), self.settings.max_turns),
            history,
            input,
            &self.decision,
            Arc::clone(&self.tools),
            self.store.as_ref(),
            self.settings.tool_timeout,
        );

        let transcript = match executor.run().await {
            Ok(transcript) => transcript,
            Err(e) => {
                tracing::error!(
                    thread_id = %thread_id,
                    duration_ms = %start.elapsed().as_millis(),
                    error = %e,
                    "Research turn failed"
                );
                return Err(e);
            }
        };

        tracing::info!(
            thread_id = %thread_id,
            duration_ms = %start.elapsed().as_millis(),
            "Research turn completed"
        );

        Ok(AnswerOutcome {
            answer: assembler::extract_answer(&transcript),
            chat_history: assembler::filter_history(&transcript),
            thread_id,
        })
    }

    /// Filtered history for a thread; empty for an unseen thread
    ///
    /// Turns commit in a single append, so this never observes half a turn.
    pub async fn history(&self, thread_id: &str) -> Result<Vec<HistoryEntry>, RuntimeError> {
        let transcript = self.store.get(thread_id).await?;
        Ok(assembler::filter_history(&transcript))
    }
}
