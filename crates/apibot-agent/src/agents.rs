//! Specialized agents and the roster the router chooses from.
//!
//! A roster is recomputed per turn: the configured agents, plus one
//! auto-agent for every dynamic API tool no configured agent binds. An API
//! added mid-conversation is therefore routable on the very next turn.

use serde_json::json;
use std::collections::HashSet;

use apibot_core::config::AgentSpec;
use apibot_core::types::ToolDefinition;
use apibot_core::utils::snake_case;

use crate::tools::api::{DynamicApiToolManager, ToolSignature};

/// Prefix of every handoff function offered to the router.
pub const HANDOFF_PREFIX: &str = "transfer_to_";

/// A named agent with instructions and the tool names it may call.
#[derive(Clone, Debug, PartialEq)]
pub struct SpecializedAgent {
    pub name: String,
    /// Shown to the router when choosing.
    pub description: String,
    pub instructions: String,
    pub tools: Vec<String>,
}

impl SpecializedAgent {
    pub fn from_spec(spec: &AgentSpec) -> Self {
        Self {
            name: spec.name.clone(),
            description: spec.description.clone(),
            instructions: spec.instructions.clone(),
            tools: spec.tools.clone(),
        }
    }

    /// Agent wrapping a single dynamic tool.
    pub fn for_api(sig: &ToolSignature) -> Self {
        let purpose = if sig.description.is_empty() {
            format!("the {} API", sig.name)
        } else {
            sig.description.clone()
        };
        Self {
            name: format!("{} Agent", sig.name),
            description: format!("Use for requests that need {purpose}."),
            instructions: format!(
                "You answer questions using the {} tool: {purpose}. \
                 Call it with the parameters it needs and report the result clearly.",
                sig.name
            ),
            tools: vec![sig.name.clone()],
        }
    }

    /// Name of the handoff function that selects this agent.
    pub fn handoff_name(&self) -> String {
        format!("{HANDOFF_PREFIX}{}", snake_case(&self.name))
    }

    /// The parameterless function the router calls to delegate here.
    pub fn handoff_definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            self.handoff_name(),
            format!("Handoff to the {}. {}", self.name, self.description),
            json!({"type": "object", "properties": {}, "required": []}),
        )
    }
}

/// Configured agents; combined with live API tools into a per-turn roster.
#[derive(Clone, Debug, Default)]
pub struct AgentRoster {
    configured: Vec<SpecializedAgent>,
}

impl AgentRoster {
    pub fn new(specs: &[AgentSpec]) -> Self {
        Self {
            configured: specs.iter().map(SpecializedAgent::from_spec).collect(),
        }
    }

    pub fn configured(&self) -> &[SpecializedAgent] {
        &self.configured
    }

    /// Configured agents followed by auto-agents for unbound API tools.
    ///
    /// Handoff names stay unique: an auto-agent whose handoff would clash
    /// with an earlier agent gets a numeric suffix (`"weather Agent 2"`).
    pub fn snapshot(&self, apis: &DynamicApiToolManager) -> Vec<SpecializedAgent> {
        let bound: HashSet<&str> = self
            .configured
            .iter()
            .flat_map(|a| a.tools.iter().map(String::as_str))
            .collect();
        let mut handoffs: HashSet<String> =
            self.configured.iter().map(SpecializedAgent::handoff_name).collect();

        let mut agents = self.configured.clone();
        for sig in apis.list().iter().filter(|sig| !bound.contains(sig.name.as_str())) {
            let mut agent = SpecializedAgent::for_api(sig);
            let base = agent.name.clone();
            let mut n = 2;
            while handoffs.contains(&agent.handoff_name()) {
                agent.name = format!("{base} {n}");
                n += 1;
            }
            handoffs.insert(agent.handoff_name());
            agents.push(agent);
        }
        agents
    }
}
