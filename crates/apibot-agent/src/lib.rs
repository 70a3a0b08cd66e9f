//! Apibot agent: dynamic API tools, specialized agents, and triage routing.
//!
//! This crate contains:
//! - **tools**: Tool trait, native tools, and API-backed dynamic tools
//!   (definitions, dot-path extraction, the live manager, persistence)
//! - **toolbox**: one lookup over native and dynamic tools
//! - **agents**: specialized agents and the per-turn roster
//! - **router**: the triage router and its handoff functions
//! - **agent_loop**: one agent's dispatch-and-report turn
//! - **session**: chat commands and per-user sessions

pub mod agent_loop;
pub mod agents;
pub mod router;
pub mod session;
pub mod toolbox;
pub mod tools;

#[cfg(test)]
mod testing;

pub use agent_loop::{AgentRunner, FALLBACK_REPLY};
pub use agents::{AgentRoster, SpecializedAgent};
pub use router::{RouteDecision, RoutingError, TriageRouter};
pub use session::{is_exit_command, ChatRuntime, ChatSession};
pub use toolbox::Toolbox;
pub use tools::api::{ApiConfig, ApiStore, ConfigError, DynamicApiToolManager, DynamicTool};
pub use tools::{Tool, ToolRegistry};
