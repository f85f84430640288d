//! Conversation transcript types
//!
//! A thread's transcript is an ordered, append-only list of [`Message`]s.
//! Order is model input, so it is never rearranged once written.

mod store;

pub use store::{InMemoryTranscriptStore, StoreError, ThreadLocks, TranscriptStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Thread used when a request does not name one
pub const DEFAULT_THREAD_ID: &str = "default";

/// A tool invocation requested by the decision step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Correlates the invocation with its `tool_result` message
    pub id: String,
    pub name: String,
    /// Parsed arguments, or the model's text verbatim when it was not JSON
    pub arguments: Value,
}

impl ToolInvocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Arguments the model sent that did not parse as a JSON document
    pub fn unparsed_arguments(&self) -> Option<&str> {
        self.arguments.as_str()
    }

    /// Arguments as the text sent back to the model
    pub fn arguments_text(&self) -> String {
        match &self.arguments {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        }
    }
}

/// Message role, used for storage columns and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    ToolResult,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::ToolResult => "tool_result",
        }
    }
}

/// A single transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// Priming instructions, written once per thread
    System {
        content: String,
        timestamp: DateTime<Utc>,
    },
    User {
        content: String,
        timestamp: DateTime<Utc>,
    },
    /// Either a terminal reply (`tool_calls` empty) or an invocation request
    Assistant {
        #[serde(default)]
        content: String,
        #[serde(default)]
        tool_calls: Vec<ToolInvocation>,
        timestamp: DateTime<Utc>,
    },
    ToolResult {
        tool_call_id: String,
        name: String,
        content: String,
        #[serde(default)]
        is_error: bool,
        timestamp: DateTime<Utc>,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Terminal assistant reply
    pub fn assistant_reply(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Assistant message carrying tool invocation requests
    pub fn assistant_invocation(content: impl Into<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls,
            timestamp: Utc::now(),
        }
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Message::ToolResult {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            content: content.into(),
            is_error,
            timestamp: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Message::System { .. } => Role::System,
            Message::User { .. } => Role::User,
            Message::Assistant { .. } => Role::Assistant,
            Message::ToolResult { .. } => Role::ToolResult,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System { content, .. }
            | Message::User { content, .. }
            | Message::Assistant { content, .. }
            | Message::ToolResult { content, .. } => content,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Message::System { timestamp, .. }
            | Message::User { timestamp, .. }
            | Message::Assistant { timestamp, .. }
            | Message::ToolResult { timestamp, .. } => *timestamp,
        }
    }

    /// Tool invocations carried by this message (empty unless an invocation-assistant)
    pub fn tool_calls(&self) -> &[ToolInvocation] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// Assistant message with text and no pending tool calls
    pub fn is_terminal_reply(&self) -> bool {
        matches!(
            self,
            Message::Assistant { content, tool_calls, .. }
                if !content.is_empty() && tool_calls.is_empty()
        )
    }
}

/// Role exposed in user-facing history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryRole {
    User,
    Assistant,
}

/// Presentation view of a user message or a terminal assistant reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Project a transcript message; scaffolding (system, tool traffic,
    /// invocation-only assistant turns) has no projection.
    pub fn from_message(message: &Message) -> Option<Self> {
        match message {
            Message::User { content, timestamp } => Some(Self {
                role: HistoryRole::User,
                content: content.clone(),
                timestamp: *timestamp,
            }),
            Message::Assistant {
                content,
                timestamp,
                ..
            } if message.is_terminal_reply() => Some(Self {
                role: HistoryRole::Assistant,
                content: content.clone(),
                timestamp: *timestamp,
            }),
            Message::System { .. } | Message::Assistant { .. } | Message::ToolResult { .. } => None,
        }
    }

    /// Rebuild the transcript message this entry was projected from
    #[cfg(test)]
    pub fn to_message(&self) -> Message {
        match self.role {
            HistoryRole::User => Message::User {
                content: self.content.clone(),
                timestamp: self.timestamp,
            },
            HistoryRole::Assistant => Message::Assistant {
                content: self.content.clone(),
                tool_calls: Vec::new(),
                timestamp: self.timestamp,
            },
        }
    }
}
