//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::llm::LlmErrorKind;
use crate::tools::{ToolOutput, ToolResult};
use crate::transcript::ToolInvocation;
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_tool_call() -> impl Strategy<Value = ToolInvocation> {
    (
        "[a-z]{8}",
        prop_oneof![Just("web_search"), Just("scrape_page")],
        "[a-z ]{1,20}",
    )
        .prop_map(|(id, name, arg)| ToolInvocation::new(id, name, json!({ "query": arg })))
}

fn arb_error_kind() -> impl Strategy<Value = LlmErrorKind> {
    prop_oneof![
        Just(LlmErrorKind::Network),
        Just(LlmErrorKind::RateLimit),
        Just(LlmErrorKind::ServerError),
        Just(LlmErrorKind::Auth),
        Just(LlmErrorKind::InvalidRequest),
        Just(LlmErrorKind::MalformedResponse),
        Just(LlmErrorKind::Unknown),
    ]
}

fn arb_decision() -> impl Strategy<Value = DecisionOutcome> {
    prop_oneof![
        "[a-zA-Z ]{0,30}".prop_map(DecisionOutcome::Final),
        (proptest::collection::vec(arb_tool_call(), 0..4), "[a-z ]{0,10}")
            .prop_map(|(calls, content)| DecisionOutcome::Invoke { calls, content }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_decision().prop_map(|outcome| Event::DecisionMade { outcome }),
        (arb_error_kind(), "[a-z ]{1,20}")
            .prop_map(|(kind, message)| Event::DecisionFailed { kind, message }),
        proptest::collection::vec(arb_tool_call(), 0..3).prop_map(|calls| {
            Event::ToolsCompleted {
                results: calls
                    .into_iter()
                    .map(|c| ToolResult::new(c.id, c.name, ToolOutput::success(json!({}))))
                    .collect(),
            }
        }),
    ]
}

fn arb_terminated_state() -> impl Strategy<Value = TurnState> {
    prop_oneof![
        "[a-z]{1,20}".prop_map(|answer| TurnOutcome::Success { answer }),
        Just(TurnOutcome::Failure(TurnFailure::EmptyReply)),
        Just(TurnOutcome::Failure(TurnFailure::EmptyInvocation)),
        (1u32..20).prop_map(|max_turns| TurnOutcome::Failure(TurnFailure::TurnLimitExceeded {
            max_turns
        })),
    ]
    .prop_map(|outcome| TurnState::Terminated { outcome })
}

fn results_for(calls: &[ToolInvocation]) -> Vec<ToolResult> {
    calls
        .iter()
        .map(|c| ToolResult::new(c.id.clone(), c.name.clone(), ToolOutput::success(json!({}))))
        .collect()
}

fn is_failure(state: &TurnState) -> bool {
    matches!(
        state,
        TurnState::Terminated {
            outcome: TurnOutcome::Failure(_)
        }
    )
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Terminal states absorb nothing
    #[test]
    fn prop_terminal_rejects_all_events(
        state in arb_terminated_state(),
        event in arb_event(),
        max_turns in 1u32..10,
    ) {
        let result = transition(&state, &TurnContext::new("t", max_turns), event);
        prop_assert_eq!(result.err(), Some(TransitionError::AlreadyTerminated));
    }

    // An empty invocation list is never looped on
    #[test]
    fn prop_empty_invocation_fails(
        turn in 1u32..10,
        extra in 0u32..10,
        content in "[a-z ]{0,10}",
    ) {
        let ctx = TurnContext::new("t", turn + extra);
        let event = Event::DecisionMade {
            outcome: DecisionOutcome::Invoke { calls: vec![], content },
        };
        let result = transition(&TurnState::AwaitingDecision { turn }, &ctx, event).unwrap();
        prop_assert_eq!(
            result.new_state,
            TurnState::Terminated { outcome: TurnOutcome::Failure(TurnFailure::EmptyInvocation) }
        );
        prop_assert_eq!(result.effects, vec![Effect::DiscardTurn]);
    }

    // Non-blank final replies always succeed and commit last
    #[test]
    fn prop_final_reply_commits(turn in 1u32..10, text in "[a-zA-Z]{1,30}") {
        let ctx = TurnContext::new("t", 10);
        let event = Event::DecisionMade { outcome: DecisionOutcome::Final(text.clone()) };
        let result = transition(&TurnState::AwaitingDecision { turn }, &ctx, event).unwrap();

        prop_assert_eq!(
            result.new_state,
            TurnState::Terminated { outcome: TurnOutcome::Success { answer: text } }
        );
        prop_assert_eq!(result.effects.last(), Some(&Effect::CommitTurn));
        let appends = result
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::AppendMessage { .. }))
            .count();
        prop_assert_eq!(appends, 1);
    }

    // Failures discard and never commit
    #[test]
    fn prop_failures_never_commit(event in arb_event(), turn in 1u32..5, max_turns in 1u32..5) {
        let ctx = TurnContext::new("t", max_turns);
        if let Ok(result) = transition(&TurnState::AwaitingDecision { turn }, &ctx, event) {
            if is_failure(&result.new_state) {
                prop_assert_eq!(result.effects, vec![Effect::DiscardTurn]);
            } else {
                prop_assert!(!result.effects.contains(&Effect::DiscardTurn));
            }
        }
    }

    // Matching results always return to AwaitingDecision with one append per call
    #[test]
    fn prop_matching_results_advance_turn(
        turn in 1u32..10,
        calls in proptest::collection::vec(arb_tool_call(), 1..5),
    ) {
        let state = TurnState::DispatchingTools { turn, calls: calls.clone() };
        let event = Event::ToolsCompleted { results: results_for(&calls) };
        let result = transition(&state, &TurnContext::new("t", 20), event).unwrap();

        prop_assert_eq!(result.new_state, TurnState::AwaitingDecision { turn: turn + 1 });
        prop_assert_eq!(result.effects.len(), calls.len() + 1);
        prop_assert_eq!(result.effects.last(), Some(&Effect::RequestDecision));
    }

    // Driving a whole turn from a scripted decision sequence always terminates
    // within the cap, never exceeding max_turns decision calls
    #[test]
    fn prop_decision_calls_bounded(
        script in proptest::collection::vec(arb_decision(), 1..30),
        max_turns in 1u32..8,
    ) {
        let ctx = TurnContext::new("t", max_turns);
        let mut state = TurnState::initial();
        let mut decision_calls = 0u32;
        let mut script = script.into_iter();

        while !state.is_terminal() {
            let event = match &state {
                TurnState::AwaitingDecision { .. } => {
                    decision_calls += 1;
                    let outcome = script
                        .next()
                        .unwrap_or_else(|| DecisionOutcome::Final("done".to_string()));
                    Event::DecisionMade { outcome }
                }
                TurnState::DispatchingTools { calls, .. } => Event::ToolsCompleted {
                    results: results_for(calls),
                },
                TurnState::Terminated { .. } => unreachable!(),
            };
            state = transition(&state, &ctx, event).unwrap().new_state;
        }

        prop_assert!(decision_calls <= max_turns);
    }
}
