//! `DynamicApiToolManager`: the live set of API-backed tools.
//!
//! Registration is all-or-nothing: a definition is validated and built
//! outside the lock, then inserted in one step. Readers never observe a
//! half-registered tool. Registering an existing name replaces it.

use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tracing::info;

use super::config::{ApiConfig, ConfigError};
use super::dynamic::{DynamicTool, ToolSignature};

/// User-Agent sent with every dynamic API request.
const USER_AGENT: &str = concat!("apibot/", env!("CARGO_PKG_VERSION"));

/// Whether a registration added a new tool or replaced one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registered {
    Added,
    Replaced,
}

pub struct DynamicApiToolManager {
    tools: RwLock<HashMap<String, Arc<DynamicTool>>>,
    reserved: HashSet<String>,
    client: Client,
}

impl DynamicApiToolManager {
    /// Empty manager with no reserved names.
    pub fn new() -> Self {
        Self::with_reserved_names(std::iter::empty::<String>())
    }

    /// Empty manager that refuses to register any of `reserved`.
    pub fn with_reserved_names<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tools: RwLock::new(HashMap::new()),
            reserved: reserved.into_iter().map(Into::into).collect(),
            client: Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Validate `config`, build its tool, and make it visible to lookups.
    pub fn register(&self, config: ApiConfig) -> Result<Registered, ConfigError> {
        if self.is_reserved(&config.name) {
            return Err(ConfigError::ReservedName(config.name));
        }

        let tool = Arc::new(DynamicTool::new(config, self.client.clone())?);
        let name = tool.config().name.clone();

        let previous = self
            .tools
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.clone(), tool);

        let outcome = if previous.is_some() {
            Registered::Replaced
        } else {
            Registered::Added
        };
        info!(tool = %name, ?outcome, "registered API tool");
        Ok(outcome)
    }

    /// Parse a JSON definition and register it.
    pub fn register_json(&self, raw: &str) -> Result<(Registered, ApiConfig), ConfigError> {
        let config = ApiConfig::from_json(raw)?;
        let outcome = self.register(config.clone())?;
        Ok((outcome, config))
    }

    /// Signatures of every registered tool, sorted by name.
    pub fn list(&self) -> Vec<ToolSignature> {
        let mut sigs: Vec<ToolSignature> = self
            .tools
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(|t| t.signature())
            .collect();
        sigs.sort_by(|a, b| a.name.cmp(&b.name));
        sigs
    }

    pub fn get(&self, name: &str) -> Option<Arc<DynamicTool>> {
        self.tools
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    pub fn len(&self) -> usize {
        self.tools.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DynamicApiToolManager {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
