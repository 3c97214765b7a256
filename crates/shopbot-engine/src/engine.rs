use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use shopbot_core::{
    ChatMessage, FunctionCallResult, LLMConfig, LLMProvider, LLMResponse, Result, ShopStorage,
    TokenUsage,
};
use shopbot_functions::{FunctionRegistry, create_shop_registry};

use crate::config::{AppConfig, DEFAULT_FALLBACK_MESSAGE};
use crate::format::{prompt_payload, render_for_user};
use crate::history::{ConversationHistory, ConversationTurn};
use crate::prompt::PromptRenderer;

pub const BLANK_INPUT_REPLY: &str =
    "Please tell me what you're looking for: products, your cart, an order, or store help.";

/// Where a turn currently is. A turn runs at most one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingUserInput,
    AwaitingModelResponse,
    ExecutingFunction,
    AwaitingFinalResponse,
    TurnComplete,
}

impl TurnState {
    pub fn can_transition_to(&self, next: TurnState) -> bool {
        use TurnState::*;
        matches!(
            (self, next),
            (AwaitingUserInput, AwaitingModelResponse)
                | (AwaitingUserInput, TurnComplete)
                | (AwaitingModelResponse, ExecutingFunction)
                | (AwaitingModelResponse, TurnComplete)
                | (ExecutingFunction, AwaitingFinalResponse)
                | (AwaitingFinalResponse, TurnComplete)
                | (TurnComplete, AwaitingUserInput)
        )
    }
}

/// What one call to [`ConversationEngine::handle_turn`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub text: String,
    pub function_calls: Vec<FunctionCallResult>,
    /// A model call failed and `text` is the fallback message.
    pub model_error: bool,
    /// Tokens over every model call of the turn, when the provider reports them.
    pub usage: Option<TokenUsage>,
}

impl TurnReply {
    fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            function_calls: Vec::new(),
            model_error: false,
            usage: None,
        }
    }
}

fn add_usage(total: Option<TokenUsage>, more: Option<TokenUsage>) -> Option<TokenUsage> {
    match (total, more) {
        (Some(total), Some(more)) => Some(total.combine(more)),
        (total, more) => total.or(more),
    }
}

/// Drives a single customer session against the model and the registry.
pub struct ConversationEngine {
    llm: Arc<dyn LLMProvider>,
    registry: Arc<FunctionRegistry>,
    history: ConversationHistory,
    system_prompt: String,
    llm_config: Option<LLMConfig>,
    fallback_message: String,
    max_history_turns: Option<usize>,
    state: TurnState,
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("provider", &self.llm.provider_name())
            .field("functions", &self.registry.len())
            .field("history_turns", &self.history.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl ConversationEngine {
    pub fn new(llm: Arc<dyn LLMProvider>, registry: Arc<FunctionRegistry>) -> Self {
        Self {
            llm,
            registry,
            history: ConversationHistory::new(),
            system_prompt: String::new(),
            llm_config: None,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            max_history_turns: None,
            state: TurnState::AwaitingUserInput,
        }
    }

    /// Engine with the full shop registry, rendered prompt and model settings
    /// from `config`.
    pub fn from_config(
        config: &AppConfig,
        llm: Arc<dyn LLMProvider>,
        storage: Arc<dyn ShopStorage>,
    ) -> Result<Self> {
        let registry = create_shop_registry(config.shop_context(storage))?;
        let system_prompt = PromptRenderer::new().render(
            &config.engine.system_prompt,
            &config.store,
            &config.default_user,
        )?;

        let mut engine = Self::new(llm, Arc::new(registry))
            .with_system_prompt(system_prompt)
            .with_llm_config(config.llm.to_llm_config())
            .with_fallback_message(&config.engine.fallback_message);
        engine.max_history_turns = config.engine.max_history_turns;
        Ok(engine)
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_llm_config(mut self, config: LLMConfig) -> Self {
        self.llm_config = Some(config);
        self
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    pub fn with_max_history_turns(mut self, max: usize) -> Self {
        self.max_history_turns = Some(max);
        self
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    fn transition(&mut self, next: TurnState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid turn transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = ?self.state, to = ?next, "Turn state");
        self.state = next;
    }

    fn base_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::new();
        if !self.system_prompt.is_empty() {
            messages.push(ChatMessage::system(&self.system_prompt));
        }
        messages.extend(self.history.to_messages(self.max_history_turns));
        messages
    }

    async fn ask_model(&self, messages: &[ChatMessage]) -> Option<LLMResponse> {
        match self
            .llm
            .complete(messages, self.registry.schemas(), self.llm_config.as_ref())
            .await
        {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(error = %e, provider = self.llm.provider_name(), "Model call failed");
                None
            }
        }
    }

    /// Run one customer turn to completion. Never fails: model failures
    /// become the fallback reply and function failures are reported in the
    /// returned results.
    #[instrument(skip(self, user_text), fields(turn = self.history.len()))]
    pub async fn handle_turn(&mut self, user_text: &str) -> TurnReply {
        if self.state == TurnState::TurnComplete {
            self.transition(TurnState::AwaitingUserInput);
        }

        let user_text = user_text.trim();
        if user_text.is_empty() {
            debug!("Blank input, not calling the model");
            self.transition(TurnState::TurnComplete);
            return TurnReply::new(BLANK_INPUT_REPLY);
        }

        info!(input_len = user_text.len(), "Starting turn");
        let mut messages = self.base_messages();
        messages.push(ChatMessage::user(user_text));

        self.transition(TurnState::AwaitingModelResponse);
        let Some(response) = self.ask_model(&messages).await else {
            return self.complete(user_text, None, self.fallback_message.clone(), true, None);
        };
        let mut usage = response.usage;

        let Some(request) = response.function_call else {
            let text = response.content.trim();
            let reply = if text.is_empty() {
                warn!("Model returned an empty reply");
                self.fallback_message.clone()
            } else {
                text.to_string()
            };
            return self.complete(user_text, None, reply, false, usage);
        };

        self.transition(TurnState::ExecutingFunction);
        info!(function = %request.name, "Model requested a function");
        let result = self.registry.dispatch(&request).await;

        self.transition(TurnState::AwaitingFinalResponse);
        let mut call_message = ChatMessage::assistant_call(request);
        call_message.content = response.content.trim().to_string();
        messages.push(call_message);
        messages.push(ChatMessage::function(
            result.function(),
            prompt_payload(&result),
        ));

        let Some(final_response) = self.ask_model(&messages).await else {
            return self.complete(
                user_text,
                Some(result),
                self.fallback_message.clone(),
                true,
                usage,
            );
        };
        usage = add_usage(usage, final_response.usage);

        let text = final_response.content.trim();
        let reply = match final_response.function_call {
            Some(chained) => {
                warn!(function = %chained.name, "Ignoring second function request in one turn");
                if text.is_empty() {
                    render_for_user(&result)
                } else {
                    text.to_string()
                }
            }
            None if text.is_empty() => render_for_user(&result),
            None => text.to_string(),
        };
        self.complete(user_text, Some(result), reply, false, usage)
    }

    fn complete(
        &mut self,
        user_text: &str,
        result: Option<FunctionCallResult>,
        reply: String,
        model_error: bool,
        usage: Option<TokenUsage>,
    ) -> TurnReply {
        self.transition(TurnState::TurnComplete);

        self.history.push(ConversationTurn::user(user_text));
        let function_calls: Vec<FunctionCallResult> = result.into_iter().collect();
        for result in &function_calls {
            self.history.push(ConversationTurn::function(result.clone()));
        }
        self.history.push(ConversationTurn::assistant(&reply));

        info!(
            function_calls = function_calls.len(),
            model_error, "Turn completed"
        );
        TurnReply {
            text: reply,
            function_calls,
            model_error,
            usage,
        }
    }
}
