//! `DynamicTool`: an HTTP API exposed as a callable tool.
//!
//! Built from a validated [`ApiConfig`]: renders placeholders from the
//! call's arguments, performs exactly one request, and projects the JSON
//! response through the output mapping. Any failure after input validation
//! collapses to the definition's `error_message`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::config::{ApiConfig, ConfigError, ParamSpec};
use super::extract::OutputMapping;
use super::template::{render_str, render_url, render_value};
use crate::tools::base::Tool;

/// Why a single invocation failed.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// A declared input was absent (or null). No request was made.
    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    /// Network error, timeout, non-success status, or unreadable body.
    #[error("request failed: {0}")]
    Transport(String),
}

/// What callers see of a tool: enough to advertise it to a model.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolSignature {
    pub name: String,
    pub description: String,
    pub input_schema: BTreeMap<String, ParamSpec>,
}

impl ToolSignature {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            name: config.name.clone(),
            description: config.description.clone(),
            input_schema: config.input_schema.clone(),
        }
    }
}

// ─────────────────────────────────────────────
// DynamicTool
// ─────────────────────────────────────────────

pub struct DynamicTool {
    config: ApiConfig,
    output: OutputMapping,
    timeout: Duration,
    client: Client,
}

impl DynamicTool {
    /// Validate `config` and compile its output paths.
    pub fn new(config: ApiConfig, client: Client) -> Result<Self, ConfigError> {
        config.validate()?;
        let timeout = config.request_timeout()?;
        let output = OutputMapping::compile(&config.output_mapping).map_err(|(field, path)| {
            ConfigError::InvalidDotPath {
                name: config.name.clone(),
                field,
                path,
            }
        })?;
        Ok(Self {
            config,
            output,
            timeout,
            client,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn signature(&self) -> ToolSignature {
        ToolSignature::from_config(&self.config)
    }

    /// Every declared input must be present and non-null.
    pub fn check_inputs(&self, args: &HashMap<String, Value>) -> Result<(), InvokeError> {
        match self
            .config
            .input_schema
            .keys()
            .find(|k| args.get(*k).map_or(true, Value::is_null))
        {
            Some(missing) => Err(InvokeError::MissingParameter(missing.clone())),
            None => Ok(()),
        }
    }

    /// Perform one call against the API.
    ///
    /// With an output mapping, returns the projected object (unresolved
    /// fields omitted). Without one, returns the whole JSON body, or the raw
    /// text if the body isn't JSON.
    pub async fn invoke(&self, args: &HashMap<String, Value>) -> Result<Value, InvokeError> {
        self.check_inputs(args)?;

        let url = render_url(&self.config.url, args);
        let query: Vec<(String, String)> = self
            .config
            .params
            .iter()
            .map(|(k, v)| {
                let rendered = match render_value(v, args) {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k.clone(), rendered)
            })
            .collect();

        debug!(
            tool = %self.config.name,
            method = self.config.method.as_str(),
            url = %url,
            "calling API"
        );

        let mut request = self
            .client
            .request(self.config.method.into(), &url)
            .timeout(self.timeout);

        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), render_str(value, args));
        }
        if !query.is_empty() {
            request = request.query(&query);
        }
        if !self.config.body.is_empty() {
            let body = render_value(&Value::Object(self.config.body.clone()), args);
            request = request.json(&body);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| InvokeError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(InvokeError::Transport(format!("API returned {status}")));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| InvokeError::Transport(e.to_string()))?;

        if self.output.is_empty() {
            return Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| InvokeError::Transport(format!("response is not JSON: {e}")))?;
        Ok(Value::Object(self.output.apply(&body)))
    }

    /// Turn an invocation result into the text an agent reads.
    pub fn render_result(result: &Value) -> String {
        match result {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }
}

#[async_trait]
impl Tool for DynamicTool {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn description(&self) -> &str {
        &self.config.description
    }

    fn parameters(&self) -> Value {
        self.config.parameters_schema()
    }

    async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String> {
        match self.invoke(&params).await {
            Ok(result) => Ok(Self::render_result(&result)),
            Err(e) => {
                warn!(tool = %self.config.name, error = %e, "API call failed");
                Ok(self.config.error_message.clone())
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
