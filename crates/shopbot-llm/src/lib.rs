//! LLM providers for the shopbot assistant

pub mod mock;
pub mod prompts;
pub mod providers;

pub use mock::{MockCall, MockLLMProvider};
pub use prompts::{ParsedReply, parse_reply, render_function_instructions};
pub use providers::{ProviderBuilder, ProviderType, UnifiedLLMProvider};
pub use shopbot_core::{
    ChatMessage, FinishReason, FunctionSpec, LLMConfig, LLMError, LLMProvider, LLMResponse, Role,
    TokenUsage,
};
