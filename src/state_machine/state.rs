//! Turn state types

use crate::llm::LlmErrorKind;
use crate::transcript::ToolInvocation;
use thiserror::Error;

/// State of one research turn
#[derive(Debug, Clone, PartialEq)]
pub enum TurnState {
    /// Waiting on the decision step. `turn` counts decision calls, starting at 1.
    AwaitingDecision { turn: u32 },

    /// Tools requested by decision call `turn` are running
    DispatchingTools {
        turn: u32,
        calls: Vec<ToolInvocation>,
    },

    /// No further events are accepted
    Terminated { outcome: TurnOutcome },
}

impl TurnState {
    pub fn initial() -> Self {
        TurnState::AwaitingDecision { turn: 1 }
    }

    #[cfg(test)]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Terminated { .. })
    }

    /// Decision calls made or in flight so far
    pub fn turn(&self) -> Option<u32> {
        match self {
            TurnState::AwaitingDecision { turn } | TurnState::DispatchingTools { turn, .. } => {
                Some(*turn)
            }
            TurnState::Terminated { .. } => None,
        }
    }
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Success { answer: String },
    Failure(TurnFailure),
}

/// Why a turn ended without an answer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TurnFailure {
    #[error("Decision step failed: {message}")]
    Decision {
        kind: LlmErrorKind,
        message: String,
    },
    #[error("Model returned neither text nor tool calls")]
    EmptyReply,
    #[error("Model requested an empty list of tool calls")]
    EmptyInvocation,
    #[error("Turn limit of {max_turns} decision calls exceeded")]
    TurnLimitExceeded { max_turns: u32 },
}

/// Immutable configuration for one turn
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub thread_id: String,
    /// Maximum decision calls per turn; at least 1
    pub max_turns: u32,
}

impl TurnContext {
    pub fn new(thread_id: impl Into<String>, max_turns: u32) -> Self {
        Self {
            thread_id: thread_id.into(),
            max_turns: max_turns.max(1),
        }
    }
}
