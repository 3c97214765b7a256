//! Conversation engine and configuration for the shopbot assistant

pub mod config;
mod engine;
pub mod format;
pub mod history;
pub mod policy;
mod prompt;

pub use config::{AppConfig, EngineSettings, LlmSettings};
pub use engine::{BLANK_INPUT_REPLY, ConversationEngine, TurnReply, TurnState};
pub use format::{prompt_payload, render_for_user};
pub use history::{ConversationHistory, ConversationTurn, TurnContent, TurnRole};
pub use policy::{should_offer_cart, suggested_products};
pub use prompt::PromptRenderer;
