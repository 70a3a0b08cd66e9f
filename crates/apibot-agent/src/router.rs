//! Triage router: picks which specialized agent handles a message.
//!
//! The router model sees the agent list, the user profile, and recent chat
//! history, and is offered one handoff function per agent. Calling one
//! delegates; replying with text answers directly.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use apibot_core::chat::ChatContext;
use apibot_core::types::{Message, ToolDefinition};
use apibot_providers::traits::{LlmProvider, LlmRequestConfig};

use crate::agents::SpecializedAgent;

#[derive(Debug, Error, PartialEq)]
pub enum RoutingError {
    /// The model named a handoff that matches no agent in the roster.
    #[error("router selected unknown agent '{0}'")]
    UnknownAgent(String),

    #[error("router model call failed: {0}")]
    Provider(String),

    #[error("router returned neither a handoff nor a reply")]
    NoDecision,
}

/// Outcome of routing one message.
#[derive(Clone, Debug, PartialEq)]
pub enum RouteDecision {
    /// Hand the turn to this agent.
    Delegate(SpecializedAgent),
    /// The router answered general chat itself.
    Answer(String),
}

pub struct TriageRouter {
    provider: Arc<dyn LlmProvider>,
    model: String,
    request_config: LlmRequestConfig,
    history_window: usize,
}

impl TriageRouter {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        request_config: LlmRequestConfig,
        history_window: usize,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            request_config,
            history_window,
        }
    }

    /// Instructions for the router model.
    pub fn instructions(&self, ctx: &ChatContext, agents: &[SpecializedAgent]) -> String {
        let mut prompt = String::from(
            "You determine which agent to use based on the user's history and current request.\n\n",
        );

        prompt.push_str("USER PROFILE:\n");
        prompt.push_str(&format!(
            "- You're talking to {}, who might ask about various topics\n",
            ctx.username()
        ));
        prompt.push_str("- Route requests to the appropriate specialized agent\n\n");

        prompt.push_str("AVAILABLE AGENTS:\n");
        for agent in agents {
            prompt.push_str(&format!(
                "- {} (call {}): {}\n",
                agent.name,
                agent.handoff_name(),
                agent.description
            ));
        }
        prompt.push_str(
            "\nCall exactly one handoff function when an agent fits. \
             Respond directly for general questions that don't fit these categories.\n",
        );

        let history = ctx.history_text(self.history_window);
        if !history.is_empty() {
            prompt.push('\n');
            prompt.push_str(&history);
        }
        prompt
    }

    /// Decide how to handle the latest user message in `ctx`.
    pub async fn route(
        &self,
        ctx: &ChatContext,
        user_text: &str,
        agents: &[SpecializedAgent],
    ) -> Result<RouteDecision, RoutingError> {
        let messages = vec![
            Message::system(self.instructions(ctx, agents)),
            Message::user(user_text),
        ];
        let handoffs: Vec<ToolDefinition> =
            agents.iter().map(SpecializedAgent::handoff_definition).collect();

        debug!(agents = agents.len(), "routing message");
        let response = self
            .provider
            .chat(&messages, Some(&handoffs), &self.model, &self.request_config)
            .await;

        if response.is_error {
            return Err(RoutingError::Provider(
                response.content.unwrap_or_default(),
            ));
        }

        if let Some(call) = response.tool_calls.first() {
            if response.tool_calls.len() > 1 {
                warn!(
                    count = response.tool_calls.len(),
                    "router requested several handoffs, using the first"
                );
            }
            let name = &call.function.name;
            return match agents.iter().find(|a| a.handoff_name() == *name) {
                Some(agent) => {
                    info!(agent = %agent.name, "delegating turn");
                    Ok(RouteDecision::Delegate(agent.clone()))
                }
                None => Err(RoutingError::UnknownAgent(name.clone())),
            };
        }

        match response.content {
            Some(text) if !text.trim().is_empty() => Ok(RouteDecision::Answer(text)),
            _ => Err(RoutingError::NoDecision),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
