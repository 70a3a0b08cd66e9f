//! Tools: the `Tool` trait, native tools, and API-backed dynamic tools.

pub mod api;
pub mod base;
pub mod registry;
pub mod time;

pub use base::{optional_string, Tool};
pub use registry::ToolRegistry;
pub use time::TimeTool;
