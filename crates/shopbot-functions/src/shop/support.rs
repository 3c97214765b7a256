use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;
use uuid::Uuid;

use shopbot_core::{BusinessFunction, FunctionError, ParameterSchema};

use crate::{StoreInfo, parameters_for, parse_input, to_payload};

const FAQ: &[(&str, &str)] = &[
    (
        "return_policy",
        "You can return items within 30 days of purchase with original receipt. Items must be in original condition.",
    ),
    (
        "shipping",
        "We offer free shipping on orders over $50. Standard shipping takes 3-5 business days.",
    ),
    (
        "warranty",
        "All sports equipment comes with a 1-year manufacturer warranty. Apparel has a 90-day warranty.",
    ),
    (
        "size_guide",
        "Please check our size guide on the product page. We offer exchanges for wrong sizes within 14 days.",
    ),
    (
        "payment",
        "We accept major credit cards, PayPal, and store credit. Payment is processed securely.",
    ),
    (
        "contact",
        "You can reach us at support@wrteam.com or call 1-800-WRTEAM during business hours 9AM-6PM EST.",
    ),
];

const SIZE_CATEGORIES: &[&str] = &["footwear", "apparel", "equipment"];

/// "Return Policy" and "return-policy" both name `return_policy`.
fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace([' ', '-'], "_")
}

fn size_guide(category: &str) -> Option<Value> {
    let guide = match category {
        "footwear" => json!({
            "sizes": ["6", "7", "8", "9", "10", "11", "12", "13"],
            "guide": "Measure your foot length in inches. Add 0.5 inches for comfort.",
            "tips": "Try shoes in the evening when feet are slightly swollen for best fit.",
        }),
        "apparel" => json!({
            "sizes": ["XS", "S", "M", "L", "XL", "XXL"],
            "guide": {
                "XS": "Chest: 32-34 inches",
                "S": "Chest: 35-37 inches",
                "M": "Chest: 38-40 inches",
                "L": "Chest: 41-43 inches",
                "XL": "Chest: 44-46 inches",
                "XXL": "Chest: 47-49 inches",
            },
            "tips": "Measure around the fullest part of your chest for accurate sizing.",
        }),
        "equipment" => json!({
            "guide": "Equipment sizes vary by sport. Check individual product pages for specific sizing information.",
            "tips": "Consider your skill level and playing style when choosing equipment sizes.",
        }),
        _ => return None,
    };
    Some(guide)
}

#[derive(Debug, Deserialize, JsonSchema)]
struct HelpInput {
    /// Help topic (return_policy, shipping, warranty, size_guide, payment, contact)
    topic: Option<String>,
}

pub struct GetHelp;

impl GetHelp {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GetHelp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusinessFunction for GetHelp {
    fn name(&self) -> &str {
        "get_help"
    }

    fn description(&self) -> &str {
        "Get help information on various topics like return policy, shipping, warranty, etc."
    }

    fn parameters(&self) -> ParameterSchema {
        parameters_for::<HelpInput>()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        let input: HelpInput = parse_input(args)?;
        let topic = input.topic.as_deref().map(normalize_key).unwrap_or_default();

        if let Some((key, information)) = FAQ.iter().find(|(key, _)| *key == topic) {
            return Ok(json!({
                "topic": key,
                "information": information,
                "additional_help": "For more specific questions, contact our support team.",
            }));
        }

        let faq: Map<String, Value> = FAQ
            .iter()
            .map(|(key, text)| (key.to_string(), Value::from(*text)))
            .collect();
        Ok(json!({
            "available_topics": FAQ.iter().map(|(key, _)| *key).collect::<Vec<_>>(),
            "faq": faq,
            "message": "Here are the help topics available. Ask about any specific topic for detailed information.",
        }))
    }
}

pub struct GetStoreInfo {
    store: StoreInfo,
}

impl GetStoreInfo {
    pub fn new(store: StoreInfo) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BusinessFunction for GetStoreInfo {
    fn name(&self) -> &str {
        "get_store_info"
    }

    fn description(&self) -> &str {
        "Get store contact information, hours, and location details"
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
    }

    async fn call(&self, _args: Value) -> Result<Value, FunctionError> {
        to_payload(&self.store)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ReportIssueInput {
    /// Type of issue (order, product, website, other)
    issue_type: String,
    /// Detailed description of the issue
    description: String,
}

pub struct ReportIssue;

impl ReportIssue {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReportIssue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusinessFunction for ReportIssue {
    fn name(&self) -> &str {
        "report_issue"
    }

    fn description(&self) -> &str {
        "Report an issue or problem to customer support"
    }

    fn parameters(&self) -> ParameterSchema {
        parameters_for::<ReportIssueInput>()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        let input: ReportIssueInput = parse_input(args)?;
        let hex = Uuid::new_v4().simple().to_string();
        let ticket_id = format!("TICKET{}", hex.chars().take(8).collect::<String>().to_uppercase());

        info!(ticket_id = %ticket_id, issue_type = %input.issue_type, "Issue reported");
        Ok(json!({
            "success": true,
            "ticket_id": ticket_id,
            "issue_type": input.issue_type,
            "description": input.description,
            "status": "submitted",
            "message": format!(
                "Your issue has been submitted. Ticket ID: {}. Our support team will contact you within 24 hours.",
                ticket_id
            ),
            "next_steps": "Check your email for updates or contact us at support@wrteam.com with your ticket ID.",
        }))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SizeGuideInput {
    /// Product category (footwear, apparel, equipment)
    category: Option<String>,
}

pub struct GetSizeGuide;

impl GetSizeGuide {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GetSizeGuide {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusinessFunction for GetSizeGuide {
    fn name(&self) -> &str {
        "get_size_guide"
    }

    fn description(&self) -> &str {
        "Get size guide information for different product categories"
    }

    fn parameters(&self) -> ParameterSchema {
        parameters_for::<SizeGuideInput>()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        let input: SizeGuideInput = parse_input(args)?;
        let category = input.category.as_deref().map(normalize_key).unwrap_or_default();

        if let Some(size_info) = size_guide(&category) {
            return Ok(json!({"category": category, "size_info": size_info}));
        }

        let all_guides: Map<String, Value> = SIZE_CATEGORIES
            .iter()
            .filter_map(|name| Some((name.to_string(), size_guide(name)?)))
            .collect();
        Ok(json!({
            "available_categories": SIZE_CATEGORIES,
            "all_guides": all_guides,
            "message": "Size guides available for footwear, apparel, and equipment.",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_help_known_topic() {
        let payload = GetHelp::new()
            .call(json!({"topic": "Return Policy"}))
            .await
            .unwrap();
        assert_eq!(payload["topic"], "return_policy");
        assert!(payload["information"].as_str().unwrap().contains("30 days"));
    }

    #[tokio::test]
    async fn test_help_without_topic_lists_faq() {
        let payload = GetHelp::new().call(json!({})).await.unwrap();
        assert_eq!(payload["available_topics"].as_array().unwrap().len(), 6);
        assert_eq!(payload["available_topics"][0], "return_policy");
        assert!(payload["faq"]["shipping"].as_str().unwrap().contains("$50"));

        let payload = GetHelp::new().call(json!({"topic": "gift cards"})).await.unwrap();
        assert!(payload.get("available_topics").is_some());
    }

    #[tokio::test]
    async fn test_store_info() {
        let store = StoreInfo {
            name: "Corner Shop".into(),
            ..StoreInfo::default()
        };
        let payload = GetStoreInfo::new(store).call(json!({})).await.unwrap();
        assert_eq!(payload["name"], "Corner Shop");
        assert_eq!(payload["phone"], "1-800-WRTEAM");
    }

    #[tokio::test]
    async fn test_report_issue_ticket() {
        let payload = ReportIssue::new()
            .call(json!({"issue_type": "order", "description": "Box arrived damaged"}))
            .await
            .unwrap();
        let ticket = payload["ticket_id"].as_str().unwrap();
        assert!(ticket.starts_with("TICKET"));
        assert_eq!(ticket.len(), 14);
        assert!(ticket[6..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_eq!(payload["status"], "submitted");
        assert!(payload["message"].as_str().unwrap().contains(ticket));
    }

    #[tokio::test]
    async fn test_size_guide() {
        let payload = GetSizeGuide::new()
            .call(json!({"category": "Apparel"}))
            .await
            .unwrap();
        assert_eq!(payload["category"], "apparel");
        assert_eq!(payload["size_info"]["guide"]["M"], "Chest: 38-40 inches");

        let payload = GetSizeGuide::new().call(json!({})).await.unwrap();
        assert_eq!(
            payload["available_categories"],
            json!(["footwear", "apparel", "equipment"])
        );
        assert!(payload["all_guides"]["equipment"]["tips"].is_string());
    }

    #[test]
    fn test_report_issue_requires_both_fields() {
        let params = ReportIssue::new().parameters();
        let mut required = params.required_names();
        required.sort();
        assert_eq!(required, vec!["description", "issue_type"]);
    }
}
