//! Pure state transition function

use super::{DecisionOutcome, Effect, Event, TurnContext, TurnFailure, TurnOutcome, TurnState};
use crate::tools::ToolResult;
use crate::transcript::{Message, ToolInvocation};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: TurnState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: TurnState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    #[error("Turn already terminated")]
    AlreadyTerminated,
    #[error("Tool results do not match dispatched calls: {0}")]
    ResultMismatch(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it produces the same state and effects. The only
/// ambient input is the wall clock, read when messages are stamped.
pub fn transition(
    state: &TurnState,
    context: &TurnContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Decision outcomes
        // ============================================================
        (TurnState::AwaitingDecision { .. }, Event::DecisionMade {
            outcome: DecisionOutcome::Final(text),
        }) => {
            if text.trim().is_empty() {
                return Ok(fail(TurnFailure::EmptyReply));
            }
            Ok(TransitionResult::new(TurnState::Terminated {
                outcome: TurnOutcome::Success {
                    answer: text.clone(),
                },
            })
            .with_effect(Effect::append(Message::assistant_reply(text)))
            .with_effect(Effect::CommitTurn))
        }

        (TurnState::AwaitingDecision { turn }, Event::DecisionMade {
            outcome: DecisionOutcome::Invoke { calls, content },
        }) => {
            if calls.is_empty() {
                return Ok(fail(TurnFailure::EmptyInvocation));
            }
            // Dispatching now would require decision call `turn + 1` to consume the results
            if *turn >= context.max_turns {
                return Ok(fail(TurnFailure::TurnLimitExceeded {
                    max_turns: context.max_turns,
                }));
            }
            Ok(TransitionResult::new(TurnState::DispatchingTools {
                turn: *turn,
                calls: calls.clone(),
            })
            .with_effect(Effect::append(Message::assistant_invocation(
                content,
                calls.clone(),
            )))
            .with_effect(Effect::DispatchTools { calls }))
        }

        (TurnState::AwaitingDecision { .. }, Event::DecisionFailed { kind, message }) => {
            Ok(fail(TurnFailure::Decision { kind, message }))
        }

        // ============================================================
        // Tool completion
        // ============================================================
        (TurnState::DispatchingTools { turn, calls }, Event::ToolsCompleted { results }) => {
            check_results(calls, &results)?;
            Ok(TransitionResult::new(TurnState::AwaitingDecision {
                turn: turn.saturating_add(1),
            })
            .with_effects(
                results
                    .into_iter()
                    .map(|result| Effect::append(result.into_message())),
            )
            .with_effect(Effect::RequestDecision))
        }

        // ============================================================
        // Terminal and invalid combinations
        // ============================================================
        (TurnState::Terminated { .. }, _) => Err(TransitionError::AlreadyTerminated),

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in state {state:?}"
        ))),
    }
}

fn fail(failure: TurnFailure) -> TransitionResult {
    TransitionResult::new(TurnState::Terminated {
        outcome: TurnOutcome::Failure(failure),
    })
    .with_effect(Effect::DiscardTurn)
}

/// Every dispatched call must have exactly one result, in dispatch order
fn check_results(calls: &[ToolInvocation], results: &[ToolResult]) -> Result<(), TransitionError> {
    if calls.len() != results.len() {
        return Err(TransitionError::ResultMismatch(format!(
            "expected {} results, got {}",
            calls.len(),
            results.len()
        )));
    }
    for (call, result) in calls.iter().zip(results) {
        if call.id != result.tool_call_id {
            return Err(TransitionError::ResultMismatch(format!(
                "expected result for {}, got {}",
                call.id, result.tool_call_id
            )));
        }
    }
    Ok(())
}
