//! Agent turn: one specialized agent's dispatch-and-report cycle.
//!
//! 1. Call the model with the agent's instructions, recent history, and its
//!    bound tools.
//! 2. Run every requested tool concurrently; results keep request order.
//! 3. Call the model once more, without tools, to phrase the answer.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info};

use apibot_core::chat::ChatContext;
use apibot_core::types::{Message, ToolCall};
use apibot_core::utils::truncate_string;
use apibot_providers::traits::{LlmProvider, LlmRequestConfig};

use crate::agents::SpecializedAgent;
use crate::toolbox::{run_tool, Toolbox};

/// Reply when the model gives nothing usable.
pub const FALLBACK_REPLY: &str =
    "Sorry, I couldn't work out how to help with that. Could you try rephrasing?";

/// Runs delegated turns for any agent in the roster.
pub struct AgentRunner {
    provider: Arc<dyn LlmProvider>,
    model: String,
    request_config: LlmRequestConfig,
    toolbox: Arc<Toolbox>,
    history_window: usize,
}

impl AgentRunner {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        request_config: LlmRequestConfig,
        toolbox: Arc<Toolbox>,
        history_window: usize,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            request_config,
            toolbox,
            history_window,
        }
    }

    /// Build the message list: instructions, then recent turns (the
    /// current user message is the last of them).
    fn build_messages(&self, agent: &SpecializedAgent, ctx: &ChatContext) -> Vec<Message> {
        let system = format!(
            "{}\n\nYou are the {} helping {}. Use your tools when they are relevant \
             and answer from their results.",
            agent.instructions,
            agent.name,
            ctx.username()
        );

        let mut messages = vec![Message::system(system)];
        messages.extend(ctx.recent(self.history_window).iter().map(|t| t.to_message()));
        messages
    }

    /// Run one turn for `agent` against the conversation so far.
    pub async fn run(&self, agent: &SpecializedAgent, ctx: &ChatContext) -> String {
        let mut messages = self.build_messages(agent, ctx);
        let tool_defs = self.toolbox.definitions_for(&agent.tools);
        let tools = (!tool_defs.is_empty()).then_some(tool_defs.as_slice());

        debug!(agent = %agent.name, tools = tool_defs.len(), "agent LLM call");
        let response = self
            .provider
            .chat(&messages, tools, &self.model, &self.request_config)
            .await;

        if response.is_error {
            error!(agent = %agent.name, error = ?response.content, "agent LLM call failed");
            return FALLBACK_REPLY.to_string();
        }

        if !response.has_tool_calls() {
            return non_empty(response.content).unwrap_or_else(|| FALLBACK_REPLY.to_string());
        }

        let calls = response.tool_calls.clone();
        messages.push(Message::assistant_tool_calls(response.content, calls.clone()));

        let results = self.dispatch(agent, &calls).await;
        for (call, result) in calls.iter().zip(&results) {
            messages.push(Message::tool_result(&call.id, result));
        }

        debug!(agent = %agent.name, "agent report call");
        let report = self
            .provider
            .chat(&messages, None, &self.model, &self.request_config)
            .await;

        if report.is_error || report.has_tool_calls() {
            debug!(agent = %agent.name, "no usable report, returning raw tool output");
            return results.join("\n\n");
        }
        non_empty(report.content).unwrap_or_else(|| results.join("\n\n"))
    }

    /// Execute tool calls concurrently. Calls to tools the agent isn't bound
    /// to are refused.
    async fn dispatch(&self, agent: &SpecializedAgent, calls: &[ToolCall]) -> Vec<String> {
        let handles: Vec<_> = calls
            .iter()
            .map(|call| {
                let name = call.function.name.clone();
                let params: HashMap<String, Value> =
                    serde_json::from_str(&call.function.arguments).unwrap_or_default();
                let tool = agent
                    .tools
                    .contains(&name)
                    .then(|| self.toolbox.resolve(&name))
                    .flatten();

                info!(agent = %agent.name, tool = %name, "executing tool call");
                tokio::spawn(async move {
                    match tool {
                        Some(tool) => run_tool(tool, params).await,
                        None => format!("Error: Tool '{name}' not found"),
                    }
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (handle, call) in handles.into_iter().zip(calls) {
            let result = handle.await.unwrap_or_else(|e| {
                error!(tool = %call.function.name, error = %e, "tool task failed");
                format!("Error executing {}: task failed", call.function.name)
            });
            debug!(
                tool = %call.function.name,
                result = %truncate_string(&result, 200),
                "tool result"
            );
            results.push(result);
        }
        results
    }
}

fn non_empty(content: Option<String>) -> Option<String> {
    content.filter(|c| !c.trim().is_empty())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
