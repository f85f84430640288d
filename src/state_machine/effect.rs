//! Effects produced by state transitions

use crate::transcript::{Message, ToolInvocation};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Add a message to the turn's pending transcript
    AppendMessage { message: Message },

    /// Call the decision step with the current transcript
    RequestDecision,

    /// Run every call concurrently and report all results together
    DispatchTools { calls: Vec<ToolInvocation> },

    /// Write the pending messages to the thread in one append
    CommitTurn,

    /// Drop the pending messages; the thread is left as it was
    DiscardTurn,
}

impl Effect {
    pub fn append(message: Message) -> Self {
        Effect::AppendMessage { message }
    }
}
