use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use shopbot_core::{
    ChatMessage, FunctionCallRequest, FunctionSpec, LLMConfig, LLMError, LLMProvider, LLMResponse,
    TokenUsage,
};

/// Scripted provider for tests.
///
/// Replies are served in order; once the script runs out the last entry
/// repeats. Clones share the script and the call history.
#[derive(Clone)]
pub struct MockLLMProvider {
    inner: Arc<RwLock<MockLLMProviderInner>>,
}

#[derive(Debug, Clone)]
enum Scripted {
    Reply(LLMResponse),
    Fail(String),
}

struct MockLLMProviderInner {
    script: Vec<Scripted>,
    script_index: usize,
    call_history: Vec<MockCall>,
    should_error: bool,
    error_message: String,
}

#[derive(Debug, Clone)]
pub struct MockCall {
    pub messages: Vec<ChatMessage>,
    pub functions: Vec<FunctionSpec>,
    pub config: Option<LLMConfig>,
    pub timestamp: std::time::Instant,
}

impl MockLLMProvider {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MockLLMProviderInner {
                script: Vec::new(),
                script_index: 0,
                call_history: Vec::new(),
                should_error: false,
                error_message: "Mock error".to_string(),
            })),
        }
    }

    pub fn add_response(&self, response: LLMResponse) {
        self.inner.write().script.push(Scripted::Reply(response));
    }

    pub fn add_text(&self, content: impl Into<String>) {
        self.add_response(LLMResponse::text(content));
    }

    pub fn add_call(&self, name: impl Into<String>, arguments: serde_json::Value) {
        self.add_response(LLMResponse::call(FunctionCallRequest::new(name, arguments)));
    }

    /// Queue a failure for one call.
    pub fn add_error(&self, message: impl Into<String>) {
        self.inner.write().script.push(Scripted::Fail(message.into()));
    }

    /// Fail every call until [`clear_error`](Self::clear_error).
    pub fn set_error(&self, error_message: impl Into<String>) {
        let mut inner = self.inner.write();
        inner.should_error = true;
        inner.error_message = error_message.into();
    }

    pub fn clear_error(&self) {
        self.inner.write().should_error = false;
    }

    pub fn call_count(&self) -> usize {
        self.inner.read().call_history.len()
    }

    pub fn call_history(&self) -> Vec<MockCall> {
        self.inner.read().call_history.clone()
    }

    pub fn last_call(&self) -> Option<MockCall> {
        self.inner.read().call_history.last().cloned()
    }

    pub fn clear_history(&self) {
        self.inner.write().call_history.clear();
    }

    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.script.clear();
        inner.script_index = 0;
        inner.call_history.clear();
        inner.should_error = false;
        inner.error_message = "Mock error".to_string();
    }

    fn next_scripted(&self) -> Option<Scripted> {
        let mut inner = self.inner.write();
        let entry = inner.script.get(inner.script_index).cloned()?;
        if inner.script_index + 1 < inner.script.len() {
            inner.script_index += 1;
        }
        Some(entry)
    }

    fn record_call(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionSpec],
        config: Option<&LLMConfig>,
    ) {
        self.inner.write().call_history.push(MockCall {
            messages: messages.to_vec(),
            functions: functions.to_vec(),
            config: config.cloned(),
            timestamp: std::time::Instant::now(),
        });
    }

    fn estimate_tokens(messages: &[ChatMessage]) -> u32 {
        let total_chars: usize = messages.iter().map(|m| m.content.len()).sum();
        (total_chars / 4) as u32
    }
}

impl Default for MockLLMProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMProvider for MockLLMProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionSpec],
        config: Option<&LLMConfig>,
    ) -> Result<LLMResponse, LLMError> {
        self.record_call(messages, functions, config);

        {
            let inner = self.inner.read();
            if inner.should_error {
                return Err(LLMError::Other(inner.error_message.clone()));
            }
        }

        let mut response = match self.next_scripted() {
            Some(Scripted::Reply(response)) => response,
            Some(Scripted::Fail(message)) => return Err(LLMError::Network(message)),
            None => LLMResponse::text("Mock response"),
        };

        if response.model.is_none() {
            response.model = Some("mock-model".to_string());
        }
        if response.usage.is_none() {
            let prompt_tokens = Self::estimate_tokens(messages);
            let completion_tokens = (response.content.len() / 4) as u32;
            response.usage = Some(TokenUsage::new(prompt_tokens, completion_tokens));
        }

        Ok(response)
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
