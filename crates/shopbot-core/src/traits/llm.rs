//! LLM provider trait

use async_trait::async_trait;
use thiserror::Error;

use crate::function::FunctionSpec;
use crate::message::ChatMessage;
use crate::types::{LLMConfig, LLMResponse};

/// Request/response boundary to a language model.
///
/// `functions` is the full advertised capability list, in registration order.
/// Implementations decide how to put it on the wire; the response carries at
/// most one requested call.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionSpec],
        config: Option<&LLMConfig>,
    ) -> Result<LLMResponse, LLMError>;

    fn provider_name(&self) -> &str;
}

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("API error: {message}")]
    API {
        message: String,
        status: Option<u16>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Other error: {0}")]
    Other(String),
}
