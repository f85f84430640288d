//! Tool registry and the research tools
//!
//! Tools are stateless singletons; per-call context arrives via [`ToolContext`].
//! A tool never fails past this boundary: every problem becomes a
//! [`ToolOutput`] carrying an `error` field, which the model then reads.

mod scrape_page;
mod web_search;

pub use scrape_page::ScrapePageTool;
pub use web_search::WebSearchTool;

use crate::llm::ToolDefinition;
use crate::transcript::Message;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// HTTP timeout both tools apply to their own requests
pub const TOOL_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Result from tool execution
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub success: bool,
    /// Structured payload handed back to the model
    pub output: Value,
}

impl ToolOutput {
    pub fn success(output: Value) -> Self {
        Self {
            success: true,
            output,
        }
    }

    /// Failure with only an error message
    pub fn error(message: impl Into<String>) -> Self {
        Self::failure(json!({ "error": message.into() }))
    }

    /// Failure with a tool-specific payload; the payload should carry `error`
    pub fn failure(output: Value) -> Self {
        Self {
            success: false,
            output,
        }
    }

    /// Serialized form stored as the `tool_result` message content
    pub fn to_content(&self) -> String {
        self.output.to_string()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.output.get("error").and_then(Value::as_str)
    }
}

/// Output of one invocation, correlated to the call that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub name: String,
    pub output: ToolOutput,
}

impl ToolResult {
    pub fn new(tool_call_id: impl Into<String>, name: impl Into<String>, output: ToolOutput) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            output,
        }
    }

    pub fn into_message(self) -> Message {
        Message::tool_result(
            self.tool_call_id,
            self.name,
            self.output.to_content(),
            !self.output.success,
        )
    }
}

/// All context needed for a tool invocation.
///
/// Created fresh for each tool call.
#[derive(Clone)]
pub struct ToolContext {
    /// Cancellation signal for in-flight requests
    pub cancel: CancellationToken,

    /// The thread this tool is executing within
    pub thread_id: String,
}

impl ToolContext {
    pub fn new(cancel: CancellationToken, thread_id: impl Into<String>) -> Self {
        Self {
            cancel,
            thread_id: thread_id.into(),
        }
    }
}

/// Trait for tools the model can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;

    /// Tool description for LLM
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Execute the tool. Implementations should stop promptly once
    /// `ctx.cancel` fires.
    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput;
}

/// Credentials and endpoints for the standard tools
#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub serper_api_key: String,
    pub serper_endpoint: String,
}

/// Collection of tools advertised to the decision step
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    /// Web search plus page scraping
    pub fn standard(settings: &ToolSettings) -> Result<Self, reqwest::Error> {
        Ok(Self::new(vec![
            Arc::new(WebSearchTool::new(
                settings.serper_api_key.clone(),
                settings.serper_endpoint.clone(),
            )?),
            Arc::new(ScrapePageTool::new()?),
        ]))
    }

    /// Get all tool definitions for LLM
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Execute a tool by name; unknown names produce an error output
    pub async fn execute(&self, name: &str, input: Value, ctx: ToolContext) -> ToolOutput {
        match self.tools.iter().find(|t| t.name() == name) {
            Some(tool) => tool.run(input, ctx).await,
            None => {
                tracing::warn!(tool = %name, "Model requested unknown tool");
                ToolOutput::error(format!("Unknown tool: {name}"))
            }
        }
    }
}
