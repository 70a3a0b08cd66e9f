//! `Toolbox`: one lookup over native tools and dynamic API tools.
//!
//! Natives win on name lookup; the manager refuses to register their names
//! anyway, so in practice the two sets are disjoint.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use apibot_core::types::ToolDefinition;

use crate::tools::api::DynamicApiToolManager;
use crate::tools::{Tool, ToolRegistry};

pub struct Toolbox {
    natives: ToolRegistry,
    apis: Arc<DynamicApiToolManager>,
}

impl Toolbox {
    /// Native tools plus an API manager that reserves their names.
    pub fn with_natives() -> Self {
        let natives = ToolRegistry::with_natives();
        let apis = Arc::new(DynamicApiToolManager::with_reserved_names(natives.tool_names()));
        Self { natives, apis }
    }

    pub fn natives(&self) -> &ToolRegistry {
        &self.natives
    }

    pub fn apis(&self) -> &Arc<DynamicApiToolManager> {
        &self.apis
    }

    /// Resolve a tool by name, natives first.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.natives
            .get(name)
            .or_else(|| self.apis.get(name).map(|t| t as Arc<dyn Tool>))
    }

    /// Definitions for `names`, in the given order. Unknown names are skipped.
    pub fn definitions_for(&self, names: &[String]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|name| match self.resolve(name) {
                Some(tool) => Some(tool.to_definition()),
                None => {
                    debug!(tool = %name, "bound tool is not registered");
                    None
                }
            })
            .collect()
    }
}

/// Run one resolved tool. The model always gets text back: a failure
/// becomes `"Error executing <name>: <cause>"`.
pub(crate) async fn run_tool(tool: Arc<dyn Tool>, params: HashMap<String, Value>) -> String {
    match tool.execute(params).await {
        Ok(result) => result,
        Err(e) => {
            warn!(tool = tool.name(), error = %e, "tool execution failed");
            format!("Error executing {}: {e}", tool.name())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::api::{ApiConfig, ConfigError, HttpMethod};
    use async_trait::async_trait;
    use serde_json::json;

    #[test]
    fn test_natives_are_reserved() {
        let toolbox = Toolbox::with_natives();
        let err = toolbox
            .apis()
            .register(ApiConfig::new("get_time", "https://e.com", HttpMethod::Get))
            .unwrap_err();
        assert_eq!(err, ConfigError::ReservedName("get_time".into()));
    }

    #[test]
    fn test_resolve_both_kinds() {
        let toolbox = Toolbox::with_natives();
        toolbox
            .apis()
            .register(ApiConfig::new("ping", "https://e.com/ping", HttpMethod::Get))
            .unwrap();

        assert_eq!(toolbox.resolve("get_time").unwrap().name(), "get_time");
        assert_eq!(toolbox.resolve("ping").unwrap().name(), "ping");
        assert!(toolbox.resolve("nope").is_none());
    }

    #[test]
    fn test_definitions_for_skips_unknown() {
        let toolbox = Toolbox::with_natives();
        let defs = toolbox.definitions_for(&["get_time".into(), "missing".into()]);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].function.name, "get_time");
    }

    struct FailTool;

    #[async_trait]
    impl Tool for FailTool {
        fn name(&self) -> &str {
            "fail"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}, "required": []})
        }
        async fn execute(&self, _params: HashMap<String, Value>) -> anyhow::Result<String> {
            anyhow::bail!("intentional failure")
        }
    }

    #[tokio::test]
    async fn test_run_tool_native() {
        let toolbox = Toolbox::with_natives();
        let tool = toolbox.resolve("get_time").unwrap();
        let out = run_tool(tool, HashMap::new()).await;
        assert!(out.starts_with("Current time (UTC): "));
    }

    #[tokio::test]
    async fn test_run_tool_folds_error_into_text() {
        let out = run_tool(Arc::new(FailTool), HashMap::new()).await;
        assert_eq!(out, "Error executing fail: intentional failure");
    }
}
