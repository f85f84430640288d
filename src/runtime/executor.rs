//! Effect executor for a single research turn

use super::decision::DecisionStep;
use super::traits::ToolExecutor;
use super::RuntimeError;

use crate::state_machine::{transition, Effect, Event, TurnContext, TurnOutcome, TurnState};
use crate::tools::{ToolContext, ToolOutput, ToolResult};
use crate::transcript::{Message, ToolInvocation, TranscriptStore};
use futures::future::join_all;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Drives one turn from the first decision call to commit or discard
///
/// Messages produced during the turn are buffered in `pending` and only reach
/// the store through `Effect::CommitTurn`. Dropping `run` before it finishes
/// leaves the thread untouched and cancels any tools still running.
pub struct TurnExecutor<'a> {
    context: TurnContext,
    state: TurnState,
    /// Prior history followed by everything produced this turn; model input
    transcript: Vec<Message>,
    /// Messages not yet committed
    pending: Vec<Message>,
    decision: &'a DecisionStep,
    tools: Arc<dyn ToolExecutor>,
    store: &'a dyn TranscriptStore,
    tool_timeout: Duration,
    cancel: CancellationToken,
}

impl<'a> TurnExecutor<'a> {
    pub fn new(
        context: TurnContext,
        history: Vec<Message>,
        input: Vec<Message>,
        decision: &'a DecisionStep,
        tools: Arc<dyn ToolExecutor>,
        store: &'a dyn TranscriptStore,
        tool_timeout: Duration,
    ) -> Self {
        let mut transcript = history;
        transcript.extend(input.iter().cloned());
        Self {
            context,
            state: TurnState::initial(),
            transcript,
            pending: input,
            decision,
            tools,
            store,
            tool_timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Run the turn; on success returns the thread's full transcript
    pub async fn run(mut self) -> Result<Vec<Message>, RuntimeError> {
        let _cancel_on_drop = self.cancel.clone().drop_guard();

        let mut events_to_process = Vec::new();
        if let Some(event) = self.execute_effect(Effect::RequestDecision).await? {
            events_to_process.push(event);
        }

        while let Some(event) = events_to_process.pop() {
            // Pure state transition
            let result = transition(&self.state, &self.context, event)?;
            self.state = result.new_state;

            // Execute effects and collect generated events
            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await? {
                    events_to_process.push(generated_event);
                }
            }
        }

        match self.state {
            TurnState::Terminated {
                outcome: TurnOutcome::Success { .. },
            } => Ok(self.transcript),
            TurnState::Terminated {
                outcome: TurnOutcome::Failure(failure),
            } => Err(failure.into()),
            other => Err(RuntimeError::Internal(format!(
                "Turn stopped without terminating: {other:?}"
            ))),
        }
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(&mut self, effect: Effect) -> Result<Option<Event>, RuntimeError> {
        match effect {
            Effect::AppendMessage { message } => {
                self.transcript.push(message.clone());
                self.pending.push(message);
                Ok(None)
            }

            Effect::RequestDecision => {
                tracing::info!(
                    thread_id = %self.context.thread_id,
                    turn = ?self.state.turn(),
                    model = %self.decision.model_id(),
                    "Requesting decision"
                );
                let event = match self
                    .decision
                    .decide(&self.transcript, self.tools.definitions())
                    .await
                {
                    Ok(outcome) => Event::DecisionMade { outcome },
                    Err(e) => Event::DecisionFailed {
                        kind: e.kind,
                        message: e.message,
                    },
                };
                Ok(Some(event))
            }

            Effect::DispatchTools { calls } => {
                let results = self.dispatch(calls).await;
                Ok(Some(Event::ToolsCompleted { results }))
            }

            Effect::CommitTurn => {
                self.store
                    .append(&self.context.thread_id, &self.pending)
                    .await?;
                tracing::info!(
                    thread_id = %self.context.thread_id,
                    messages = self.pending.len(),
                    "Turn committed"
                );
                self.pending.clear();
                Ok(None)
            }

            Effect::DiscardTurn => {
                tracing::warn!(
                    thread_id = %self.context.thread_id,
                    discarded = self.pending.len(),
                    "Turn failed, discarding pending messages"
                );
                self.pending.clear();
                Ok(None)
            }
        }
    }

    /// Run every call concurrently; results come back in request order
    async fn dispatch(&self, calls: Vec<ToolInvocation>) -> Vec<ToolResult> {
        let handles = calls.into_iter().map(|call| {
            let tools = Arc::clone(&self.tools);
            let ctx = ToolContext::new(self.cancel.child_token(), self.context.thread_id.clone());
            let timeout = self.tool_timeout;

            let task = tokio::spawn(run_tool(tools, call.clone(), ctx, timeout));
            async move {
                let output = task.await.unwrap_or_else(|e| {
                    tracing::error!(tool = %call.name, error = %e, "Tool task failed");
                    ToolOutput::error(format!("Tool '{}' failed: {e}", call.name))
                });
                ToolResult::new(call.id, call.name, output)
            }
        });

        join_all(handles).await
    }
}

async fn run_tool(
    tools: Arc<dyn ToolExecutor>,
    call: ToolInvocation,
    ctx: ToolContext,
    timeout: Duration,
) -> ToolOutput {
    let thread_id = ctx.thread_id.clone();
    tracing::info!(thread_id = %thread_id, tool = %call.name, id = %call.id, "Executing tool");

    let start = Instant::now();
    let output = if let Some(raw) = call.unparsed_arguments() {
        invalid_arguments(&call.name, raw)
    } else {
        match tokio::time::timeout(timeout, tools.execute(&call.name, call.arguments, ctx)).await {
            Ok(output) => output,
            Err(_) => ToolOutput::error(format!("Tool '{}' timed out after {timeout:?}", call.name)),
        }
    };

    let duration_ms = start.elapsed().as_millis();
    if output.success {
        tracing::info!(thread_id = %thread_id, tool = %call.name, duration_ms = %duration_ms, "Tool completed");
    } else {
        tracing::warn!(
            thread_id = %thread_id,
            tool = %call.name,
            duration_ms = %duration_ms,
            error = output.error_message().unwrap_or("unknown"),
            "Tool reported an error"
        );
    }
    output
}

/// Result for a call whose arguments were not a JSON object; the tool never runs
fn invalid_arguments(tool: &str, raw: &str) -> ToolOutput {
    let reason = serde_json::from_str::<Value>(raw)
        .err()
        .map_or_else(|| "expected a JSON object".to_string(), |e| e.to_string());
    ToolOutput::failure(json!({
        "error": format!("Invalid arguments for tool '{tool}': {reason}"),
        "arguments": raw,
    }))
}
