use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use shopbot_core::{
    ChatMessage, FinishReason, FunctionSpec, LLMConfig, LLMError, LLMProvider, LLMResponse, Role,
    TokenUsage,
};

use crate::prompts::{encode_function_call, parse_reply, render_function_instructions};

/// Provider type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// OpenAI (GPT models)
    OpenAI,
    /// Anthropic (Claude models)
    Anthropic,
    /// Ollama (local models)
    Ollama,
    /// DeepSeek
    DeepSeek,
    /// xAI (Grok)
    XAI,
    /// Groq
    Groq,
    /// Google (Gemini)
    Google,
    /// Mistral
    Mistral,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
            Self::DeepSeek => "deepseek",
            Self::XAI => "xai",
            Self::Groq => "groq",
            Self::Google => "google",
            Self::Mistral => "mistral",
        }
    }

    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::DeepSeek => Some("DEEPSEEK_API_KEY"),
            Self::XAI => Some("XAI_API_KEY"),
            Self::Groq => Some("GROQ_API_KEY"),
            Self::Google => Some("GOOGLE_API_KEY"),
            Self::Mistral => Some("MISTRAL_API_KEY"),
            Self::Ollama => None,
        }
    }

    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::Ollama => Some("http://localhost:11434"),
            _ => None,
        }
    }

    fn to_llm_backend(&self) -> llm::builder::LLMBackend {
        match self {
            Self::OpenAI => llm::builder::LLMBackend::OpenAI,
            Self::Anthropic => llm::builder::LLMBackend::Anthropic,
            Self::Ollama => llm::builder::LLMBackend::Ollama,
            Self::DeepSeek => llm::builder::LLMBackend::DeepSeek,
            Self::XAI => llm::builder::LLMBackend::XAI,
            Self::Google => llm::builder::LLMBackend::Google,
            Self::Groq => llm::builder::LLMBackend::Groq,
            Self::Mistral => llm::builder::LLMBackend::Mistral,
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            "deepseek" => Ok(Self::DeepSeek),
            "xai" => Ok(Self::XAI),
            "groq" => Ok(Self::Groq),
            "google" | "gemini" => Ok(Self::Google),
            "mistral" => Ok(Self::Mistral),
            _ => Err("unknown provider type"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireRole {
    User,
    Assistant,
}

/// Flatten the conversation into the user/assistant turns every backend
/// accepts, with the function instructions folded into the system prompt.
fn wire_messages(messages: &[ChatMessage], functions: &[FunctionSpec]) -> Vec<(WireRole, String)> {
    let instructions = render_function_instructions(functions);
    let mut instructions_placed = instructions.is_empty();
    let mut wire = Vec::with_capacity(messages.len() + 1);

    for msg in messages {
        match msg.role {
            Role::System => {
                let mut content = msg.content.clone();
                if !instructions_placed {
                    content.push_str("\n\n");
                    content.push_str(&instructions);
                    instructions_placed = true;
                }
                wire.push((WireRole::User, content));
            }
            Role::User => wire.push((WireRole::User, msg.content.clone())),
            Role::Assistant => {
                let content = match &msg.function_call {
                    Some(call) if msg.content.trim().is_empty() => encode_function_call(call),
                    Some(call) => format!("{}\n{}", msg.content, encode_function_call(call)),
                    None => msg.content.clone(),
                };
                wire.push((WireRole::Assistant, content));
            }
            Role::Function => wire.push((
                WireRole::User,
                format!(
                    "Function result ({}): {}",
                    msg.name.as_deref().unwrap_or("function"),
                    msg.content
                ),
            )),
        }
    }

    if !instructions_placed {
        wire.insert(0, (WireRole::User, instructions));
    }
    wire
}

/// Chat-completion provider backed by the `llm` crate.
///
/// Function calling is carried in text: see [`crate::prompts`].
#[derive(Debug)]
pub struct UnifiedLLMProvider {
    provider_type: ProviderType,
    model: String,
    api_key: Option<String>,
    base_url: Option<String>,
}

impl UnifiedLLMProvider {
    pub fn new(
        provider_type: ProviderType,
        model: String,
        api_key: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self, LLMError> {
        let actual_api_key = if let Some(key) = api_key {
            key
        } else if let Some(env_var) = provider_type.api_key_env_var() {
            std::env::var(env_var).map_err(|_| {
                LLMError::Config(format!(
                    "API key not found in environment variable {}",
                    env_var
                ))
            })?
        } else {
            String::new()
        };

        let actual_base_url =
            base_url.or_else(|| provider_type.default_base_url().map(|s| s.to_string()));

        Ok(Self {
            provider_type,
            model,
            api_key: Some(actual_api_key),
            base_url: actual_base_url,
        })
    }

    pub fn from_env(
        provider_type: ProviderType,
        model: impl Into<String>,
    ) -> Result<Self, LLMError> {
        Self::new(provider_type, model.into(), None, None)
    }

    pub fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    fn build_llm(&self, config: Option<&LLMConfig>) -> Result<Box<dyn llm::LLMProvider>, LLMError> {
        let mut builder = llm::builder::LLMBuilder::new()
            .backend(self.provider_type.to_llm_backend())
            .model(&self.model);

        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                builder = builder.api_key(key);
            }
        }

        if let Some(ref url) = self.base_url {
            builder = builder.base_url(url);
        }

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                builder = builder.temperature(temp);
            }
            if let Some(max_tok) = cfg.max_tokens {
                builder = builder.max_tokens(max_tok);
            }
            if let Some(top_p) = cfg.top_p {
                builder = builder.top_p(top_p);
            }
        }

        builder
            .build()
            .map_err(|e| LLMError::Config(format!("Failed to build LLM: {}", e)))
    }
}

#[async_trait]
impl LLMProvider for UnifiedLLMProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionSpec],
        config: Option<&LLMConfig>,
    ) -> Result<LLMResponse, LLMError> {
        let llm_messages: Vec<llm::chat::ChatMessage> = wire_messages(messages, functions)
            .into_iter()
            .map(|(role, content)| match role {
                WireRole::User => llm::chat::ChatMessage::user().content(content).build(),
                WireRole::Assistant => llm::chat::ChatMessage::assistant().content(content).build(),
            })
            .collect();

        let llm = self.build_llm(config)?;

        debug!(
            provider = %self.provider_type,
            model = %self.model,
            messages = llm_messages.len(),
            functions = functions.len(),
            "Sending chat request"
        );
        let response = llm.chat(&llm_messages).await.map_err(|e| LLMError::API {
            message: format!("LLM provider error: {}", e),
            status: None,
        })?;

        let content = response.text().unwrap_or_default();
        let usage = response.usage().map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let parsed = parse_reply(&content);
        let mut reply = match parsed.function_call {
            Some(call) => {
                debug!(function = %call.name, "Model requested a function call");
                let mut reply = LLMResponse::call(call);
                reply.content = parsed.text;
                reply
            }
            None => LLMResponse::new(parsed.text, FinishReason::Stop),
        };
        reply.usage = usage;
        Ok(reply.with_model(self.model.clone()))
    }

    fn provider_name(&self) -> &str {
        self.provider_type.as_str()
    }
}

pub struct ProviderBuilder {
    provider_type: Option<ProviderType>,
    model: Option<String>,
    api_key: Option<String>,
    api_key_env: Option<String>,
    base_url: Option<String>,
}

impl ProviderBuilder {
    pub fn new() -> Self {
        Self {
            provider_type: None,
            model: None,
            api_key: None,
            api_key_env: None,
            base_url: None,
        }
    }

    pub fn provider(mut self, provider_type: ProviderType) -> Self {
        self.provider_type = Some(provider_type);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn api_key_env(mut self, env_var: impl Into<String>) -> Self {
        self.api_key_env = Some(env_var.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn build(self) -> Result<UnifiedLLMProvider, LLMError> {
        let provider_type = self
            .provider_type
            .ok_or_else(|| LLMError::Config("Provider type not set".to_string()))?;

        let model = self
            .model
            .ok_or_else(|| LLMError::Config("Model not set".to_string()))?;

        let api_key = if let Some(key) = self.api_key {
            Some(key)
        } else if let Some(env_var) = self.api_key_env {
            Some(std::env::var(&env_var).map_err(|_| {
                LLMError::Config(format!(
                    "API key not found in environment variable {}",
                    env_var
                ))
            })?)
        } else {
            None
        };

        UnifiedLLMProvider::new(provider_type, model, api_key, self.base_url)
    }
}

impl Default for ProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
