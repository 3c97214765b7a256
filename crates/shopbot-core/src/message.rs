//! Chat messages exchanged with the model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::function::FunctionCallRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Function name for `Role::Function` messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Set on assistant messages that requested a call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatMessage {
    fn with_role(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            name: None,
            function_call: None,
            timestamp: Some(Utc::now()),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content.into())
    }

    pub fn assistant_call(request: FunctionCallRequest) -> Self {
        let mut msg = Self::with_role(Role::Assistant, String::new());
        msg.function_call = Some(request);
        msg
    }

    pub fn function(name: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::Function, content.into());
        msg.name = Some(name.into());
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let msg = ChatMessage::system("be nice");
        assert_eq!(msg.role, Role::System);
        assert!(msg.timestamp.is_some());

        let msg = ChatMessage::function("track_order", "{}");
        assert_eq!(msg.role, Role::Function);
        assert_eq!(msg.name.as_deref(), Some("track_order"));

        let msg = ChatMessage::assistant_call(FunctionCallRequest::new(
            "view_cart",
            serde_json::json!({}),
        ));
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.function_call.unwrap().name, "view_cart");
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Function).unwrap(), "\"function\"");
    }
}
