//! Decision step: one model call per invocation, no retries

use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService, ToolDefinition};
use crate::state_machine::DecisionOutcome;
use crate::transcript::Message;
use std::sync::Arc;

/// Sampling temperature for research turns
const DECISION_TEMPERATURE: f32 = 0.0;

pub struct DecisionStep {
    llm: Arc<dyn LlmService>,
}

impl DecisionStep {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Ask the model what to do next given the transcript so far
    pub async fn decide(
        &self,
        transcript: &[Message],
        capabilities: Vec<ToolDefinition>,
    ) -> Result<DecisionOutcome, LlmError> {
        let request = LlmRequest {
            messages: transcript.to_vec(),
            tools: capabilities,
            temperature: Some(DECISION_TEMPERATURE),
            max_tokens: None,
        };
        let response = self.llm.complete(&request).await?;
        Ok(classify(response))
    }
}

/// Tool calls take precedence over text; a reply with neither becomes an
/// empty `Final`, which the state machine rejects.
pub fn classify(response: LlmResponse) -> DecisionOutcome {
    if response.has_tool_calls() {
        DecisionOutcome::Invoke {
            calls: response.tool_calls,
            content: response.content,
        }
    } else {
        DecisionOutcome::Final(response.content)
    }
}
