//! YAML configuration for a shopbot session

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use shopbot_core::{LLMConfig, Result, ShopError, ShopStorage};
use shopbot_functions::{ShopContext, StoreInfo};
use shopbot_llm::{ProviderBuilder, ProviderType, UnifiedLLMProvider};
use shopbot_storage::StorageConfig;

pub const CONFIG_FILE_NAME: &str = "shopbot.yaml";

pub const DEFAULT_FALLBACK_MESSAGE: &str = "I'm having trouble processing that request. Please try again or contact our support team at support@wrteam.com.";

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful customer service assistant for {{ store.name }}, a sports equipment and apparel store.

Your capabilities include:
- Searching for products by name, category, or price range
- Adding products to cart and managing cart contents
- Tracking orders and providing order history
- Providing customer support and help information
- Answering questions about store policies, shipping, returns, etc.

Key guidelines:
- Always be helpful, friendly, and professional
- Use the available functions to provide accurate, real-time information
- When customers ask about products, search the inventory using the search function
- For order inquiries, use the order tracking functions
- For cart operations, use the cart management functions
- Provide helpful suggestions and recommendations
- If you can't find what a customer is looking for, suggest alternatives or direct them to customer support

Store Information:
- Name: {{ store.name }}
- Hours: {{ store.hours }}
- Address: {{ store.address }}
- Website: {{ store.website }}
- Specializes in sports equipment, apparel, and accessories
- Offers football, baseball, tennis, safety equipment, footwear, and athletic wear
- Free shipping on orders over $50
- 30-day return policy
- Customer service: {{ store.email }}, {{ store.phone }}
{% if user_id %}
The customer you are talking to has user ID {{ user_id }}.
{% endif %}"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default = "default_user")]
    pub default_user: String,

    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub store: StoreInfo,
}

fn default_user() -> String {
    shopbot_functions::DEFAULT_USER.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            default_user: default_user(),
            debug: false,
            llm: LlmSettings::default(),
            engine: EngineSettings::default(),
            store: StoreInfo::default(),
        }
    }
}

impl AppConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ShopError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ShopError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_yaml(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Places searched for a configuration file when none is given.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("shopbot").join("config.yaml"));
        }
        paths
    }

    /// Load the explicit file, else the first candidate that exists, else defaults.
    ///
    /// An explicit path that cannot be read is an error; missing candidates
    /// are skipped.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        Self::discover_from(explicit, &Self::candidate_paths())
    }

    pub fn discover_from(
        explicit: Option<&Path>,
        candidates: &[PathBuf],
    ) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        for path in candidates {
            if path.is_file() {
                return Ok((Self::load(path)?, Some(path.clone())));
            }
            debug!(path = %path.display(), "No configuration file");
        }

        Ok((Self::default(), None))
    }

    pub fn data_dir(&self) -> Option<&str> {
        match &self.storage {
            StorageConfig::File { path } => Some(path),
            StorageConfig::Memory => None,
        }
    }

    pub fn set_data_dir(&mut self, path: impl Into<String>) {
        self.storage = StorageConfig::File { path: path.into() };
    }

    pub fn shop_context(&self, storage: Arc<dyn ShopStorage>) -> ShopContext {
        ShopContext::new(storage)
            .with_default_user(&self.default_user)
            .with_store(self.store.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Overrides the provider's usual API key variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_provider() -> String {
    "google".to_string()
}

fn default_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: None,
            api_key_env: None,
            base_url: None,
        }
    }
}

impl LlmSettings {
    pub fn provider_type(&self) -> Result<ProviderType> {
        ProviderType::from_str(&self.provider)
            .map_err(|e| ShopError::Config(format!("{}: {}", e, self.provider)))
    }

    pub fn to_llm_config(&self) -> LLMConfig {
        let mut config = LLMConfig::new()
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        if let Some(top_p) = self.top_p {
            config = config.with_top_p(top_p);
        }
        config
    }

    pub fn build_provider(&self) -> Result<UnifiedLLMProvider> {
        let mut builder = ProviderBuilder::new()
            .provider(self.provider_type()?)
            .model(&self.model);
        if let Some(ref env_var) = self.api_key_env {
            builder = builder.api_key_env(env_var);
        }
        if let Some(ref url) = self.base_url {
            builder = builder.base_url(url);
        }
        Ok(builder.build()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Past turns sent to the model; `None` sends the whole session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_history_turns: Option<usize>,

    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,

    /// minijinja template with `store` and `user_id` in scope.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_fallback_message() -> String {
    DEFAULT_FALLBACK_MESSAGE.to_string()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_history_turns: None,
            fallback_message: default_fallback_message(),
            system_prompt: default_system_prompt(),
        }
    }
}
