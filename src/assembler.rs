//! Turn input assembly and result post-processing
//!
//! Before a turn: decide whether the thread needs priming. After a turn: pull
//! the answer out of the transcript and project the user-facing history.

use crate::system_prompt::RESEARCH_PROMPT;
use crate::transcript::{HistoryEntry, Message, Role};

/// Answer returned when the transcript holds no usable assistant text
pub const FALLBACK_ANSWER: &str =
    "I apologize, but I couldn't generate a complete response. Please try rephrasing your question.";

/// Messages that open a turn: the priming instructions on a thread's first
/// turn, then the question
pub fn prime(has_history: bool, question: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2);
    if !has_history {
        messages.push(Message::system(RESEARCH_PROMPT));
    }
    messages.push(Message::user(question));
    messages
}

/// One way of locating the answer; strategies run in order until one succeeds
type AnswerStrategy = fn(&[Message]) -> Option<&str>;

const ANSWER_STRATEGIES: &[AnswerStrategy] = &[last_terminal_reply, last_assistant_text];

fn last_terminal_reply(transcript: &[Message]) -> Option<&str> {
    transcript
        .iter()
        .rev()
        .find(|m| m.is_terminal_reply())
        .map(Message::content)
}

/// Any assistant text, even if it accompanied tool calls
fn last_assistant_text(transcript: &[Message]) -> Option<&str> {
    transcript
        .iter()
        .rev()
        .find(|m| m.role() == Role::Assistant && !m.content().is_empty())
        .map(Message::content)
}

pub fn extract_answer(transcript: &[Message]) -> String {
    if let Some(answer) = ANSWER_STRATEGIES.iter().find_map(|strategy| strategy(transcript)) {
        return answer.to_string();
    }
    tracing::warn!(
        messages = transcript.len(),
        "No assistant content found, returning fallback answer"
    );
    FALLBACK_ANSWER.to_string()
}

/// User messages and terminal assistant replies, in transcript order
pub fn filter_history(transcript: &[Message]) -> Vec<HistoryEntry> {
    transcript
        .iter()
        .filter_map(HistoryEntry::from_message)
        .collect()
}
