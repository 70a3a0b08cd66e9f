//! Native tool registry: the fixed set of tools compiled into the binary.
//!
//! Native tool names are reserved: dynamic API tools cannot shadow them.
//! Lookup and dispatch across both kinds of tool go through
//! [`Toolbox`](crate::toolbox::Toolbox).

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::base::Tool;
use super::time::TimeTool;

/// Native tools keyed by name. Filled once at startup, read-only after.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registry preloaded with every native tool.
    pub fn with_natives() -> Self {
        let mut reg = Self::new();
        reg.register(Arc::new(TimeTool));
        reg
    }

    /// Add a native tool. A later tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        info!(tool = tool.name(), "registered native tool");
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Sorted names; these are the names the API manager reserves.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
