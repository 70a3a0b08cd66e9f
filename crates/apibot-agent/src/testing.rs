//! Test doubles shared across this crate's unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use apibot_core::types::{LlmResponse, Message, ToolDefinition};
use apibot_providers::traits::{LlmProvider, LlmRequestConfig};

/// One recorded `chat` call.
#[derive(Clone, Debug)]
pub(crate) struct RecordedCall {
    pub messages: Vec<Message>,
    pub tools: Option<Vec<String>>,
}

/// A mock LLM provider that returns canned responses and records requests.
pub(crate) struct MockProvider {
    /// Responses to return in sequence.
    responses: Mutex<Vec<LlmResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockProvider {
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call(&self, index: usize) -> RecordedCall {
        self.calls.lock().unwrap()[index].clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Tool names offered on call `index`; empty when none were offered.
    pub fn offered_tools(&self, index: usize) -> Vec<String> {
        self.call(index).tools.unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        _model: &str,
        _config: &LlmRequestConfig,
    ) -> LlmResponse {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            tools: tools.map(|t| t.iter().map(|d| d.function.name.clone()).collect()),
        });

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            LlmResponse::text("(no more responses)")
        } else {
            responses.remove(0)
        }
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    fn display_name(&self) -> &str {
        "MockProvider"
    }
}
