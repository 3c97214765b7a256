//! Text encoding of function calls for chat-only backends
//!
//! Backends reached through [`UnifiedLLMProvider`](crate::UnifiedLLMProvider)
//! get the advertised functions as an instruction block and answer with a
//! JSON object naming the function to call.

use serde_json::{Value, json};
use shopbot_core::{FunctionCallRequest, FunctionSpec};

/// Reply text split into prose and an optional function request.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub text: String,
    pub function_call: Option<FunctionCallRequest>,
}

pub fn render_function_instructions(functions: &[FunctionSpec]) -> String {
    if functions.is_empty() {
        return String::new();
    }

    let mut prompt = String::from("Available functions:\n");
    for spec in functions {
        let schema = spec.parameters.to_json_schema();
        let args_desc = serde_json::to_string(&schema["properties"]).unwrap_or_default();
        prompt.push_str(&format!(
            "- {}: {}. Arguments: {}",
            spec.name, spec.description, args_desc
        ));

        let required = spec.parameters.required_names();
        if !required.is_empty() {
            prompt.push_str(&format!(". Required: {}", required.join(", ")));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "\nWhen you need to call a function, respond ONLY with valid JSON in this exact format:\n",
    );
    prompt.push_str("{\"function\": \"function_name\", \"arguments\": {...}}\n");
    prompt.push_str("\nCall at most one function per reply.");
    prompt.push_str(" When you receive a function result, answer the customer naturally using it.\n");
    prompt.push_str("If no function is needed, respond normally.");

    prompt
}

/// Encode a requested call the way the model is asked to write it.
pub fn encode_function_call(request: &FunctionCallRequest) -> String {
    json!({"function": request.name, "arguments": request.arguments}).to_string()
}

/// Extract the first function request from a model reply.
///
/// Accepts a bare JSON object, one inside a fenced code block, or one
/// embedded in prose. The `tool` key is read as a synonym of `function`.
/// Anything else is returned as plain text.
pub fn parse_reply(content: &str) -> ParsedReply {
    let trimmed = content.trim();

    if let Some((request, text)) = fenced_call(trimmed) {
        return ParsedReply {
            text,
            function_call: Some(request),
        };
    }

    if let Some((request, start, end)) = embedded_call(trimmed) {
        return ParsedReply {
            text: join_text(&trimmed[..start], &trimmed[end..]),
            function_call: Some(request),
        };
    }

    ParsedReply {
        text: trimmed.to_string(),
        function_call: None,
    }
}

fn fenced_call(text: &str) -> Option<(FunctionCallRequest, String)> {
    let open = text.find("```")?;
    let body_start = open + 3 + text[open + 3..].find('\n')? + 1;
    let close = body_start + text[body_start..].find("```")?;

    let (request, _, _) = embedded_call(&text[body_start..close])?;
    Some((request, join_text(&text[..open], &text[close + 3..])))
}

/// First JSON object in `text` that names a function, with its byte span.
fn embedded_call(text: &str) -> Option<(FunctionCallRequest, usize, usize)> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        if let Some(Ok(value)) = stream.next() {
            if let Some(request) = call_from_value(&value) {
                return Some((request, start, start + stream.byte_offset()));
            }
        }
        search_from = start + 1;
    }
    None
}

fn call_from_value(value: &Value) -> Option<FunctionCallRequest> {
    let name = value
        .get("function")
        .or_else(|| value.get("tool"))?
        .as_str()?;

    let arguments = match value.get("arguments") {
        None | Some(Value::Null) => json!({}),
        // Some backends send arguments as an encoded JSON string.
        Some(Value::String(encoded)) => {
            serde_json::from_str(encoded).unwrap_or_else(|_| Value::String(encoded.clone()))
        }
        Some(other) => other.clone(),
    };
    Some(FunctionCallRequest::new(name, arguments))
}

fn join_text(before: &str, after: &str) -> String {
    let before = before.trim();
    let after = after.trim();
    match (before.is_empty(), after.is_empty()) {
        (true, _) => after.to_string(),
        (_, true) => before.to_string(),
        _ => format!("{}\n\n{}", before, after),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopbot_core::{ParamType, ParameterSchema};

    fn specs() -> Vec<FunctionSpec> {
        vec![
            FunctionSpec::new(
                "track_order",
                "Track the status of a specific order using order ID",
                ParameterSchema::new().required("order_id", ParamType::String, "Order ID"),
            ),
            FunctionSpec::new(
                "view_cart",
                "View current shopping cart contents",
                ParameterSchema::new().optional("user_id", ParamType::String, "User ID"),
            ),
        ]
    }

    #[test]
    fn test_instructions_list_every_function() {
        let prompt = render_function_instructions(&specs());
        assert!(prompt.starts_with("Available functions:\n"));
        assert!(prompt.contains("- track_order: Track the status"));
        assert!(prompt.contains("Required: order_id"));
        assert!(prompt.contains("- view_cart: View current shopping cart contents"));
        assert!(prompt.contains("{\"function\": \"function_name\""));
        assert!(prompt.find("track_order").unwrap() < prompt.find("view_cart").unwrap());
    }

    #[test]
    fn test_instructions_empty_without_functions() {
        assert!(render_function_instructions(&[]).is_empty());
    }

    #[test]
    fn test_parse_bare_json() {
        let reply = parse_reply(r#"{"function": "track_order", "arguments": {"order_id": "ORD001"}}"#);
        let call = reply.function_call.unwrap();
        assert_eq!(call.name, "track_order");
        assert_eq!(call.arguments, json!({"order_id": "ORD001"}));
        assert!(reply.text.is_empty());
    }

    #[test]
    fn test_parse_tool_key_and_missing_arguments() {
        let reply = parse_reply(r#"{"tool": "view_cart"}"#);
        let call = reply.function_call.unwrap();
        assert_eq!(call.name, "view_cart");
        assert_eq!(call.arguments, json!({}));
    }

    #[test]
    fn test_parse_fenced_block_keeps_prose() {
        let content = "Let me check that order.\n```json\n{\"function\": \"track_order\", \"arguments\": {\"order_id\": \"ORD002\"}}\n```\n";
        let reply = parse_reply(content);
        assert_eq!(reply.function_call.unwrap().arguments["order_id"], "ORD002");
        assert_eq!(reply.text, "Let me check that order.");
    }

    #[test]
    fn test_parse_embedded_first_call_wins() {
        let content = r#"Sure. {"function": "view_cart", "arguments": {}} {"function": "checkout", "arguments": {}}"#;
        let reply = parse_reply(content);
        assert_eq!(reply.function_call.unwrap().name, "view_cart");
        assert!(reply.text.starts_with("Sure."));
    }

    #[test]
    fn test_parse_string_encoded_arguments() {
        let reply = parse_reply(r#"{"function": "add_to_cart", "arguments": "{\"product_id\": \"P1\"}"}"#);
        assert_eq!(
            reply.function_call.unwrap().arguments,
            json!({"product_id": "P1"})
        );
    }

    #[test]
    fn test_parse_plain_text_and_unrelated_json() {
        let reply = parse_reply("  We open at 9AM.  ");
        assert!(reply.function_call.is_none());
        assert_eq!(reply.text, "We open at 9AM.");

        let reply = parse_reply(r#"{"hours": "9AM-9PM"}"#);
        assert!(reply.function_call.is_none());
    }

    #[test]
    fn test_encode_roundtrips_through_parse() {
        let request = FunctionCallRequest::new("track_order", json!({"order_id": "ORD001"}));
        let reply = parse_reply(&encode_function_call(&request));
        assert_eq!(reply.function_call, Some(request));
    }
}
