//! API-backed tools: definitions, extraction, the live manager, and persistence.

pub mod builtin;
pub mod config;
pub mod dynamic;
pub mod extract;
pub mod manager;
pub mod store;
pub mod template;

pub use builtin::builtin_apis;
pub use config::{ApiConfig, ConfigError, HttpMethod, ParamSpec};
pub use dynamic::{DynamicTool, InvokeError, ToolSignature};
pub use extract::{extract, DotPath};
pub use manager::{DynamicApiToolManager, Registered};
pub use store::{ApiStore, StoreError};
