//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::db::Database;
use crate::llm::ToolDefinition;
use crate::tools::{ToolContext, ToolOutput, ToolRegistry};
use crate::transcript::{Message, StoreError, TranscriptStore};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Executor for tools
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool by name; failures are reported in the output
    async fn execute(&self, name: &str, input: Value, ctx: ToolContext) -> ToolOutput;

    /// Get tool definitions for LLM
    fn definitions(&self) -> Vec<ToolDefinition>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ToolExecutor + ?Sized> ToolExecutor for Arc<T> {
    async fn execute(&self, name: &str, input: Value, ctx: ToolContext) -> ToolOutput {
        (**self).execute(name, input, ctx).await
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        (**self).definitions()
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, name: &str, input: Value, ctx: ToolContext) -> ToolOutput {
        ToolRegistry::execute(self, name, input, ctx).await
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        ToolRegistry::definitions(self)
    }
}

/// Adapter to use Database as a transcript store
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TranscriptStore for DatabaseStorage {
    async fn get(&self, thread_id: &str) -> Result<Vec<Message>, StoreError> {
        Ok(self.db.get_messages(thread_id)?)
    }

    async fn append(&self, thread_id: &str, messages: &[Message]) -> Result<(), StoreError> {
        Ok(self.db.append_messages(thread_id, messages)?)
    }

    async fn has_history(&self, thread_id: &str) -> Result<bool, StoreError> {
        Ok(self.db.has_messages(thread_id)?)
    }
}
