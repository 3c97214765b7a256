//! Session conversation history

use serde::Serialize;

use shopbot_core::{ChatMessage, FunctionCallRequest, FunctionCallResult};

use crate::format::prompt_payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    Function,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    FunctionResult(FunctionCallResult),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationTurn {
    role: TurnRole,
    content: TurnContent,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: TurnContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: TurnContent::Text(text.into()),
        }
    }

    pub fn function(result: FunctionCallResult) -> Self {
        Self {
            role: TurnRole::Function,
            content: TurnContent::FunctionResult(result),
        }
    }

    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn content(&self) -> &TurnContent {
        &self.content
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            TurnContent::Text(text) => Some(text),
            TurnContent::FunctionResult(_) => None,
        }
    }

    pub fn function_result(&self) -> Option<&FunctionCallResult> {
        match &self.content {
            TurnContent::FunctionResult(result) => Some(result),
            TurnContent::Text(_) => None,
        }
    }

    /// Model messages for this turn. A function turn expands to the
    /// assistant's call followed by the function-role result.
    fn to_messages(&self) -> Vec<ChatMessage> {
        match &self.content {
            TurnContent::FunctionResult(result) => vec![
                ChatMessage::assistant_call(FunctionCallRequest::new(
                    result.function(),
                    result.arguments().clone(),
                )),
                ChatMessage::function(result.function(), prompt_payload(result)),
            ],
            TurnContent::Text(text) if self.role == TurnRole::User => {
                vec![ChatMessage::user(text)]
            }
            TurnContent::Text(text) => vec![ChatMessage::assistant(text)],
        }
    }
}

/// Append-only record of one session. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    pub fn function_results(&self) -> impl Iterator<Item = &FunctionCallResult> {
        self.turns.iter().filter_map(ConversationTurn::function_result)
    }

    /// Messages for the model, limited to the last `max_turns` turns.
    ///
    /// A window never opens on a function turn, since its call belongs to a
    /// user turn that fell outside.
    pub fn to_messages(&self, max_turns: Option<usize>) -> Vec<ChatMessage> {
        let start = max_turns
            .map(|max| self.turns.len().saturating_sub(max))
            .unwrap_or(0);
        self.turns[start..]
            .iter()
            .skip_while(|turn| turn.role == TurnRole::Function)
            .flat_map(ConversationTurn::to_messages)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shopbot_core::Role;

    fn tracked() -> FunctionCallResult {
        FunctionCallResult::success(
            "track_order",
            json!({"order_id": "ORD001"}),
            json!({"order_id": "ORD001", "status": "shipped"}),
        )
    }

    fn session() -> ConversationHistory {
        let mut history = ConversationHistory::new();
        history.push(ConversationTurn::user("Hi"));
        history.push(ConversationTurn::assistant("Hello! How can I help?"));
        history.push(ConversationTurn::user("Where is ORD001?"));
        history.push(ConversationTurn::function(tracked()));
        history.push(ConversationTurn::assistant("It has shipped."));
        history
    }

    #[test]
    fn test_function_turn_expands_to_call_and_result() {
        let messages = session().to_messages(None);
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::Function,
                Role::Assistant
            ]
        );
        assert_eq!(messages[3].function_call.as_ref().unwrap().name, "track_order");
        assert_eq!(messages[4].name.as_deref(), Some("track_order"));
        assert!(messages[4].content.contains("\"ok\":true"));
    }

    #[test]
    fn test_window_skips_orphaned_function_turn() {
        let history = session();
        let messages = history.to_messages(Some(2));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "It has shipped.");

        let messages = history.to_messages(Some(3));
        assert_eq!(messages[0].content, "Where is ORD001?");
        assert_eq!(messages.len(), 4);

        assert!(history.to_messages(Some(0)).is_empty());
        assert_eq!(history.len(), 5);
    }

    #[test]
    fn test_accessors() {
        let history = session();
        assert_eq!(history.last().unwrap().text(), Some("It has shipped."));
        let results: Vec<_> = history.function_results().collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].function(), "track_order");
        assert!(ConversationHistory::new().is_empty());
    }
}
