//! Configuration schema.
//!
//! Hierarchy: `Config` → `AgentsConfig`, `ProvidersConfig`, `ToolsConfig`,
//! `ChatConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.apibot/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub agents: AgentsConfig,
    pub providers: ProvidersConfig,
    pub tools: ToolsConfig,
    pub chat: ChatConfig,
}

// ─────────────────────────────────────────────
// Agents
// ─────────────────────────────────────────────

/// Agent configuration: model defaults plus the specialized agent roster.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentsConfig {
    pub defaults: AgentDefaults,
    /// Specialized agents the triage router can hand off to.
    pub roster: Vec<AgentSpec>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            defaults: AgentDefaults::default(),
            roster: default_roster(),
        }
    }
}

/// Default LLM settings shared by the router and every agent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentDefaults {
    /// Default LLM model identifier.
    pub model: String,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// One specialized agent: a name the router can address, a routing hint,
/// instructions for the model, and the tool names it may call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSpec {
    pub name: String,
    /// When the router should pick this agent.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub tools: Vec<String>,
}

impl AgentSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        instructions: impl Into<String>,
        tools: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            instructions: instructions.into(),
            tools: tools.iter().map(|t| t.to_string()).collect(),
        }
    }
}

fn default_roster() -> Vec<AgentSpec> {
    vec![
        AgentSpec::new(
            "Weather Agent",
            "Use for questions about weather in different cities. Always require a city name.",
            "Provide weather information for cities around the world. Always require a city name.",
            &["get_weather"],
        ),
        AgentSpec::new(
            "Joke Agent",
            "Use for requests for jokes or humor.",
            "Tell jokes when requested by the user.",
            &["get_joke"],
        ),
        AgentSpec::new(
            "Bitcoin Agent",
            "Use for questions about Bitcoin prices.",
            "Provide the current Bitcoin price when requested.",
            &["get_bitcoin_price"],
        ),
        AgentSpec::new(
            "Time Agent",
            "Use for questions about the current time.",
            "Provide current time information.",
            &["get_time"],
        ),
    ]
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a single LLM provider (API key, base URL, headers).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    #[serde(default)]
    pub api_key: String,
    /// Custom API base URL (overrides provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// All provider configurations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: ProviderConfig,
    #[serde(default)]
    pub openrouter: ProviderConfig,
    #[serde(default)]
    pub anthropic: ProviderConfig,
    #[serde(default)]
    pub deepseek: ProviderConfig,
    #[serde(default)]
    pub groq: ProviderConfig,
    #[serde(default)]
    pub vllm: ProviderConfig,
}

impl ProvidersConfig {
    fn entries(&self) -> [(&'static str, &ProviderConfig); 6] {
        [
            ("openai", &self.openai),
            ("openrouter", &self.openrouter),
            ("anthropic", &self.anthropic),
            ("deepseek", &self.deepseek),
            ("groq", &self.groq),
            ("vllm", &self.vllm),
        ]
    }

    /// Convert to a map keyed by provider name, for the provider registry.
    pub fn to_map(&self) -> HashMap<String, ProviderConfig> {
        self.entries()
            .into_iter()
            .map(|(name, config)| (name.to_string(), config.clone()))
            .collect()
    }
}

// ─────────────────────────────────────────────
// Tools
// ─────────────────────────────────────────────

/// Tool configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolsConfig {
    /// JSON file holding runtime-registered API definitions.
    pub apis_file: String,
    /// Register the bundled weather/joke/bitcoin API definitions at startup.
    pub builtin_apis: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            apis_file: "~/.apibot/apis.json".to_string(),
            builtin_apis: true,
        }
    }
}

// ─────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────

/// Chat session settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatConfig {
    /// Name the assistant uses for the user.
    pub username: String,
    /// Number of recent turns embedded in routing instructions.
    pub history_window: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            username: "Guest".to_string(),
            history_window: 5,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.agents.defaults.max_tokens, 4096);
        assert_eq!(config.agents.defaults.temperature, 0.7);
        assert_eq!(config.agents.roster.len(), 4);
        assert!(config.tools.builtin_apis);
        assert_eq!(config.chat.history_window, 5);
    }

    #[test]
    fn test_default_roster_binds_builtin_tools() {
        let roster = Config::default().agents.roster;
        let weather = roster.iter().find(|a| a.name == "Weather Agent").unwrap();
        assert_eq!(weather.tools, vec!["get_weather"]);
        let time = roster.iter().find(|a| a.name == "Time Agent").unwrap();
        assert_eq!(time.tools, vec!["get_time"]);
    }

    #[test]
    fn test_config_from_json_camel_case() {
        let json = serde_json::json!({
            "agents": {
                "defaults": { "model": "gpt-4o", "maxTokens": 1024 },
                "roster": [
                    { "name": "Cat Agent", "instructions": "Cats.", "tools": ["cat_fact"] }
                ]
            },
            "tools": { "apisFile": "/tmp/apis.json", "builtinApis": false },
            "chat": { "username": "Ada", "historyWindow": 3 }
        });

        let config: Config = serde_json::from_value(json).unwrap();
        assert_eq!(config.agents.defaults.model, "gpt-4o");
        assert_eq!(config.agents.defaults.max_tokens, 1024);
        assert_eq!(config.agents.defaults.temperature, 0.7);
        assert_eq!(config.agents.roster.len(), 1);
        assert_eq!(config.agents.roster[0].description, "");
        assert_eq!(config.tools.apis_file, "/tmp/apis.json");
        assert!(!config.tools.builtin_apis);
        assert_eq!(config.chat.username, "Ada");
        assert_eq!(config.chat.history_window, 3);
    }

    #[test]
    fn test_config_json_uses_camel_case() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert!(json["agents"]["defaults"].get("maxTokens").is_some());
        assert!(json["tools"].get("apisFile").is_some());
        assert!(json["chat"].get("historyWindow").is_some());
        assert!(json["agents"]["defaults"].get("max_tokens").is_none());
    }

    #[test]
    fn test_provider_config_is_configured() {
        assert!(!ProviderConfig::default().is_configured());
        let with_key = ProviderConfig {
            api_key: "sk-123".to_string(),
            ..Default::default()
        };
        assert!(with_key.is_configured());
    }

    #[test]
    fn test_providers_to_map() {
        let mut providers = ProvidersConfig::default();
        providers.groq.api_key = "gsk-1".to_string();

        let map = providers.to_map();
        assert_eq!(map.len(), 6);
        assert_eq!(map["groq"].api_key, "gsk-1");
    }
}
