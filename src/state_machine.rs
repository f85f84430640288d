//! Research turn state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions: the
//! transition function decides, the runtime executor performs the effects and
//! feeds the resulting events back in.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{DecisionOutcome, Event};
pub use state::{TurnContext, TurnFailure, TurnOutcome, TurnState};
pub use transition::{transition, TransitionError, TransitionResult};
