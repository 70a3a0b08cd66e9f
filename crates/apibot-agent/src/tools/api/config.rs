//! API definitions: the declarative description a dynamic tool is built from.
//!
//! An [`ApiConfig`] is deserialized from JSON (a chat command, the CLI, or
//! the persisted definitions file) and validated before it becomes a tool.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use super::extract::DotPath;
use super::template;

/// Fallback reply when an API call fails and the definition sets no message.
pub const DEFAULT_ERROR_MESSAGE: &str = "Sorry, I couldn't access the API at the moment.";

/// Request timeout in seconds when the definition sets none.
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

/// Why an API definition was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid API definition JSON: {0}")]
    InvalidJson(String),

    #[error("API definition has an empty name")]
    EmptyName,

    #[error("API '{name}' has an empty url")]
    EmptyUrl { name: String },

    #[error("API '{name}' has an invalid timeout {timeout}: must be a positive number of seconds")]
    InvalidTimeout { name: String, timeout: f64 },

    #[error("API '{name}': output field '{field}' has malformed path '{path}'")]
    InvalidDotPath {
        name: String,
        field: String,
        path: String,
    },

    #[error("API '{name}': url placeholder '{{{placeholder}}}' is not declared in input_schema")]
    UndeclaredPlaceholder { name: String, placeholder: String },

    #[error("API name '{0}' is reserved by a built-in tool")]
    ReservedName(String),
}

// ─────────────────────────────────────────────
// HTTP method
// ─────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

// ─────────────────────────────────────────────
// ApiConfig
// ─────────────────────────────────────────────

/// One declared input parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type", default = "default_param_type")]
    pub param_type: String,
    #[serde(default)]
    pub description: String,
}

impl ParamSpec {
    pub fn new(param_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            param_type: param_type.into(),
            description: description.into(),
        }
    }
}

fn default_param_type() -> String {
    "string".to_string()
}

/// Declarative description of one HTTP API exposed as a tool.
///
/// Field names match the JSON accepted by `!add_api` and the definitions
/// file: `name`, `description`, `url`, `method`, `headers`, `params`,
/// `body`, `input_schema`, `output_mapping`, `timeout`, `error_message`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// May contain `{param}` placeholders.
    pub url: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Query parameters; string values may contain placeholders.
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
    /// JSON body template; a string that is exactly `"{param}"` takes the
    /// argument's typed value.
    #[serde(default)]
    pub body: Map<String, Value>,
    #[serde(default)]
    pub input_schema: BTreeMap<String, ParamSpec>,
    /// Output field name → dot-path into the response body.
    #[serde(default)]
    pub output_mapping: BTreeMap<String, String>,
    /// Seconds.
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    #[serde(default = "default_error_message")]
    pub error_message: String,
}

fn default_timeout() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_error_message() -> String {
    DEFAULT_ERROR_MESSAGE.to_string()
}

impl ApiConfig {
    /// Minimal definition with every optional field at its default.
    pub fn new(name: impl Into<String>, url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            url: url.into(),
            method,
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            body: Map::new(),
            input_schema: BTreeMap::new(),
            output_mapping: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT_SECS,
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }

    /// Parse and validate a definition from JSON text.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: ApiConfig =
            serde_json::from_str(raw.trim()).map_err(|e| ConfigError::InvalidJson(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The per-request timeout as a `Duration`. Zero, negative, NaN and
    /// values too large for `Duration` are rejected.
    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        match Duration::try_from_secs_f64(self.timeout) {
            Ok(timeout) if !timeout.is_zero() => Ok(timeout),
            _ => Err(ConfigError::InvalidTimeout {
                name: self.name.clone(),
                timeout: self.timeout,
            }),
        }
    }

    /// Check the invariants a definition must hold before it becomes a tool.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl {
                name: self.name.clone(),
            });
        }
        self.request_timeout()?;

        for (field, path) in &self.output_mapping {
            if path.parse::<DotPath>().is_err() {
                return Err(ConfigError::InvalidDotPath {
                    name: self.name.clone(),
                    field: field.clone(),
                    path: path.clone(),
                });
            }
        }

        if let Some(placeholder) = template::placeholders(&self.url)
            .into_iter()
            .find(|p| !self.input_schema.contains_key(p))
        {
            return Err(ConfigError::UndeclaredPlaceholder {
                name: self.name.clone(),
                placeholder,
            });
        }

        Ok(())
    }

    /// JSON Schema for the tool's parameters; every declared input is required.
    pub fn parameters_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .input_schema
            .iter()
            .map(|(name, spec)| {
                (
                    name.clone(),
                    json!({ "type": spec.param_type, "description": spec.description }),
                )
            })
            .collect();
        let required: Vec<&String> = self.input_schema.keys().collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
