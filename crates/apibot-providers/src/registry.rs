//! Provider registry: static specs for the supported LLM providers.
//!
//! Each `ProviderSpec` describes how to connect to a provider:
//! keywords for model matching, env var names, API bases, quirks, etc.

use std::collections::HashMap;

// ─────────────────────────────────────────────
// ProviderSpec: static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name (e.g. `"openrouter"`).
    pub name: &'static str,
    /// Keywords to match in model names (lowercase).
    pub keywords: &'static [&'static str],
    /// Environment variable conventionally holding the API key.
    pub env_key: &'static str,
    /// Human-readable name for logs.
    pub display_name: &'static str,
    /// Prefix to prepend to model names for API routing.
    /// E.g. `Some("deepseek")` → model becomes `"deepseek/deepseek-chat"`.
    pub prefix: Option<&'static str>,
    /// Prefixes that, if already present, mean we skip prepending.
    pub skip_prefixes: &'static [&'static str],
    /// Gateways are used as fallback when no direct match is found.
    pub is_gateway: bool,
    /// Whether this is a local/self-hosted provider (vLLM).
    pub is_local: bool,
    /// If the API key starts with this prefix, auto-detect this provider.
    pub detect_by_key_prefix: Option<&'static str>,
    /// Default API base URL.
    pub default_api_base: Option<&'static str>,
    /// Per-model overrides applied to the request.
    pub model_overrides: &'static [ModelOverride],
}

/// A per-model parameter override.
#[derive(Clone, Debug)]
pub struct ModelOverride {
    /// Substring to match in the lowercase model name.
    pub pattern: &'static str,
    pub field: OverrideField,
    pub value: f64,
}

/// Fields that can be overridden per model.
#[derive(Clone, Debug)]
pub enum OverrideField {
    Temperature,
}

// ─────────────────────────────────────────────
// Providers (in matching priority order)
// ─────────────────────────────────────────────

/// Supported provider specifications, in matching priority order.
pub static PROVIDERS: &[ProviderSpec] = &[
    // OpenRouter: gateway, matched by key prefix "sk-or-"
    ProviderSpec {
        name: "openrouter",
        keywords: &["openrouter"],
        env_key: "OPENROUTER_API_KEY",
        display_name: "OpenRouter",
        prefix: Some("openrouter"),
        skip_prefixes: &[],
        is_gateway: true,
        is_local: false,
        detect_by_key_prefix: Some("sk-or-"),
        default_api_base: Some("https://openrouter.ai/api/v1"),
        model_overrides: &[],
    },
    ProviderSpec {
        name: "anthropic",
        keywords: &["anthropic", "claude"],
        env_key: "ANTHROPIC_API_KEY",
        display_name: "Anthropic",
        prefix: None,
        skip_prefixes: &[],
        is_gateway: false,
        is_local: false,
        detect_by_key_prefix: None,
        default_api_base: Some("https://api.anthropic.com/v1"),
        model_overrides: &[],
    },
    // OpenAI: reasoning models only accept the default temperature
    ProviderSpec {
        name: "openai",
        keywords: &["openai", "gpt", "o1", "o3", "o4"],
        env_key: "OPENAI_API_KEY",
        display_name: "OpenAI",
        prefix: None,
        skip_prefixes: &[],
        is_gateway: false,
        is_local: false,
        detect_by_key_prefix: None,
        default_api_base: None,
        model_overrides: &[
            ModelOverride {
                pattern: "o1",
                field: OverrideField::Temperature,
                value: 1.0,
            },
            ModelOverride {
                pattern: "o3",
                field: OverrideField::Temperature,
                value: 1.0,
            },
            ModelOverride {
                pattern: "o4",
                field: OverrideField::Temperature,
                value: 1.0,
            },
        ],
    },
    ProviderSpec {
        name: "deepseek",
        keywords: &["deepseek"],
        env_key: "DEEPSEEK_API_KEY",
        display_name: "DeepSeek",
        prefix: Some("deepseek"),
        skip_prefixes: &["deepseek/"],
        is_gateway: false,
        is_local: false,
        detect_by_key_prefix: None,
        default_api_base: Some("https://api.deepseek.com/v1"),
        model_overrides: &[],
    },
    ProviderSpec {
        name: "groq",
        keywords: &["groq"],
        env_key: "GROQ_API_KEY",
        display_name: "Groq",
        prefix: Some("groq"),
        skip_prefixes: &["groq/"],
        is_gateway: false,
        is_local: false,
        detect_by_key_prefix: None,
        default_api_base: Some("https://api.groq.com/openai/v1"),
        model_overrides: &[],
    },
    // vLLM (self-hosted)
    ProviderSpec {
        name: "vllm",
        keywords: &["vllm"],
        env_key: "HOSTED_VLLM_API_KEY",
        display_name: "vLLM",
        prefix: Some("hosted_vllm"),
        skip_prefixes: &[],
        is_gateway: false,
        is_local: true,
        detect_by_key_prefix: None,
        default_api_base: None,
        model_overrides: &[],
    },
];

// ─────────────────────────────────────────────
// Matching functions
// ─────────────────────────────────────────────

/// Find a provider spec by matching keywords against a model name.
///
/// Skips gateways and local providers: those are fallback only.
pub fn find_by_model(model: &str) -> Option<&'static ProviderSpec> {
    let model_lower = model.to_lowercase();
    PROVIDERS.iter().find(|spec| {
        !spec.is_gateway
            && !spec.is_local
            && spec.keywords.iter().any(|kw| model_lower.contains(kw))
    })
}

/// Find a provider spec by exact name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.name == name)
}

/// Try to detect a gateway from its API key prefix.
pub fn find_gateway_by_key(api_key: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|s| {
        s.is_gateway
            && s
                .detect_by_key_prefix
                .map_or(false, |pfx| api_key.starts_with(pfx))
    })
}

/// Resolve the model name for API calls, applying prefix logic.
pub fn resolve_model_name(model: &str, spec: &ProviderSpec) -> String {
    match spec.prefix {
        Some(prefix) if !spec.skip_prefixes.iter().any(|sp| model.starts_with(sp)) => {
            format!("{}/{}", prefix, model)
        }
        _ => model.to_string(),
    }
}

/// Apply per-model overrides to request parameters.
pub fn apply_model_overrides(model: &str, spec: &ProviderSpec, temperature: f64) -> f64 {
    let model_lower = model.to_lowercase();
    let mut temp = temperature;

    for ovr in spec.model_overrides {
        if model_lower.starts_with(ovr.pattern) {
            match ovr.field {
                OverrideField::Temperature => temp = ovr.value,
            }
        }
    }

    temp
}

/// Re-export the provider config from core: single source of truth.
pub use apibot_core::config::schema::ProviderConfig;

/// Match a model name to a configured provider.
///
/// 1. Find by keyword match, only if that provider has an API key.
/// 2. A configured local provider (vLLM) with an explicit API base.
/// 3. Fallback to the first configured gateway.
pub fn match_provider<'a>(
    model: &str,
    providers: &'a HashMap<String, ProviderConfig>,
) -> Option<(&'a ProviderConfig, &'static ProviderSpec)> {
    if let Some(spec) = find_by_model(model) {
        if let Some(config) = providers.get(spec.name) {
            if config.is_configured() {
                return Some((config, spec));
            }
        }
    }

    let local = PROVIDERS.iter().filter(|s| s.is_local).find_map(|spec| {
        providers
            .get(spec.name)
            .filter(|c| c.api_base.is_some())
            .map(|c| (c, spec))
    });
    if local.is_some() {
        return local;
    }

    PROVIDERS.iter().filter(|s| s.is_gateway).find_map(|spec| {
        providers
            .get(spec.name)
            .filter(|c| c.is_configured())
            .map(|c| (c, spec))
    })
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_model_gpt() {
        assert_eq!(find_by_model("gpt-4o-mini").unwrap().name, "openai");
    }

    #[test]
    fn test_find_by_model_o3() {
        assert_eq!(find_by_model("o3-mini").unwrap().name, "openai");
    }

    #[test]
    fn test_find_by_model_claude() {
        assert_eq!(find_by_model("claude-sonnet-4-20250514").unwrap().name, "anthropic");
    }

    #[test]
    fn test_find_by_model_skips_gateway() {
        let spec = find_by_model("openrouter/deepseek/deepseek-chat").unwrap();
        assert_eq!(spec.name, "deepseek");
    }

    #[test]
    fn test_find_by_model_unknown() {
        assert!(find_by_model("some-random-model-xyz").is_none());
    }

    #[test]
    fn test_find_gateway_by_key() {
        assert_eq!(find_gateway_by_key("sk-or-abc123").unwrap().name, "openrouter");
        assert!(find_gateway_by_key("sk-regular-key").is_none());
    }

    #[test]
    fn test_resolve_model_prefix() {
        let spec = find_by_name("deepseek").unwrap();
        assert_eq!(resolve_model_name("deepseek-chat", spec), "deepseek/deepseek-chat");
        assert_eq!(resolve_model_name("deepseek/deepseek-chat", spec), "deepseek/deepseek-chat");
    }

    #[test]
    fn test_resolve_model_no_prefix() {
        let spec = find_by_name("openai").unwrap();
        assert_eq!(resolve_model_name("gpt-4o", spec), "gpt-4o");
    }

    #[test]
    fn test_model_override_reasoning_model() {
        let spec = find_by_name("openai").unwrap();
        assert_eq!(apply_model_overrides("o3-mini", spec, 0.7), 1.0);
        assert_eq!(apply_model_overrides("gpt-4o", spec, 0.5), 0.5);
    }

    #[test]
    fn test_match_provider_direct() {
        let mut providers = HashMap::new();
        providers.insert(
            "openai".to_string(),
            ProviderConfig {
                api_key: "sk-123".to_string(),
                ..Default::default()
            },
        );

        let (config, spec) = match_provider("gpt-4o-mini", &providers).unwrap();
        assert_eq!(spec.name, "openai");
        assert_eq!(config.api_key, "sk-123");
    }

    #[test]
    fn test_match_provider_local() {
        let mut providers = HashMap::new();
        providers.insert(
            "vllm".to_string(),
            ProviderConfig {
                api_base: Some("http://localhost:8000/v1".to_string()),
                ..Default::default()
            },
        );

        let (_, spec) = match_provider("meta-llama/Llama-3.1-8B", &providers).unwrap();
        assert_eq!(spec.name, "vllm");
    }

    #[test]
    fn test_match_provider_gateway_fallback() {
        let mut providers = HashMap::new();
        providers.insert(
            "openrouter".to_string(),
            ProviderConfig {
                api_key: "sk-or-fallback".to_string(),
                ..Default::default()
            },
        );

        let (_, spec) = match_provider("some-unknown-model", &providers).unwrap();
        assert_eq!(spec.name, "openrouter");
    }

    #[test]
    fn test_match_provider_no_key() {
        let mut providers = HashMap::new();
        providers.insert("openai".to_string(), ProviderConfig::default());
        assert!(match_provider("gpt-4o", &providers).is_none());
    }

    #[test]
    fn test_all_providers_have_unique_names() {
        let mut names: Vec<&str> = PROVIDERS.iter().map(|s| s.name).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total, "Duplicate provider names found");
    }
}
