//! Events that drive a turn

use crate::llm::LlmErrorKind;
use crate::tools::ToolResult;
use crate::transcript::ToolInvocation;

/// What the decision step asked for
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    /// Textual reply; ends the turn
    Final(String),
    /// One or more tool calls, with any text the model sent alongside them
    Invoke {
        calls: Vec<ToolInvocation>,
        content: String,
    },
}

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    DecisionMade {
        outcome: DecisionOutcome,
    },
    DecisionFailed {
        kind: LlmErrorKind,
        message: String,
    },
    /// Results for every call of the current dispatch, in request order
    ToolsCompleted {
        results: Vec<ToolResult>,
    },
}
