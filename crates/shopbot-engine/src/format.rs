//! Renderings of function results for the model and for the customer
//!
//! Both renderings depend only on the result itself: map keys are sorted
//! and money always has two decimals.

use serde_json::{Map, Value};
use std::fmt::Write;

use shopbot_core::{CallOutcome, FunctionCallResult};

const SEARCH_PREVIEW: usize = 3;

/// The exact text sent back to the model for a function result.
pub fn prompt_payload(result: &FunctionCallResult) -> String {
    let mut object = Map::new();
    object.insert("arguments".into(), canonical(result.arguments()));
    match result.outcome() {
        CallOutcome::Success { payload } => {
            object.insert("result".into(), canonical(payload));
        }
        CallOutcome::Failure { kind, message } => {
            let mut error = Map::new();
            error.insert("kind".into(), Value::from(kind.as_str()));
            error.insert("message".into(), Value::from(message.as_str()));
            object.insert("error".into(), Value::Object(error));
        }
    }
    object.insert("function".into(), Value::from(result.function()));
    object.insert("ok".into(), Value::Bool(result.ok()));
    Value::Object(sorted(object)).to_string()
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(sorted(
            map.iter().map(|(k, v)| (k.clone(), canonical(v))).collect(),
        )),
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

fn sorted(map: Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<(String, Value)> = map.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.into_iter().collect()
}

fn money(value: &Value) -> String {
    format!("${:.2}", value.as_f64().unwrap_or(0.0))
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Customer-facing text for a function result.
pub fn render_for_user(result: &FunctionCallResult) -> String {
    let payload = match result.outcome() {
        CallOutcome::Success { payload } => payload,
        CallOutcome::Failure { kind, message } => {
            return format!(
                "I couldn't complete {} ({}): {}",
                result.function(),
                kind,
                message
            );
        }
    };

    match result.function() {
        "search_products" => render_search(payload),
        "get_product_by_id" => render_product(payload),
        "track_order" => render_tracking(payload),
        "get_user_orders" | "get_order_history" => render_orders(payload),
        "view_cart" => render_cart(payload),
        "get_help" => render_help(payload),
        "get_store_info" => render_store(payload),
        "add_to_cart" | "remove_from_cart" | "update_cart_quantity" => {
            let mut out = text(payload, "message").to_string();
            if let Some(total) = payload.get("cart_total") {
                let _ = write!(out, "\nCart total: {}", money(total));
            }
            out
        }
        "checkout" => format!(
            "{}\nOrder ID: {}\nTotal: {}",
            text(payload, "message"),
            text(payload, "order_id"),
            money(&payload["total"])
        ),
        "report_issue" => format!("{}\n{}", text(payload, "message"), text(payload, "next_steps")),
        _ => match payload.get("message").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => serde_json::to_string_pretty(&canonical(payload)).unwrap_or_default(),
        },
    }
}

fn render_search(payload: &Value) -> String {
    let products = payload.as_array().map(Vec::as_slice).unwrap_or_default();
    if products.is_empty() {
        return "I couldn't find any products matching your search. Try different terms or browse our categories: Football, Baseball, Tennis, Apparel, Footwear, Safety.".to_string();
    }

    let mut out = format!(
        "I found {} product{} matching your search:\n",
        products.len(),
        if products.len() == 1 { "" } else { "s" }
    );
    for product in products.iter().take(SEARCH_PREVIEW) {
        let _ = write!(
            out,
            "\n**{}** (ID: {})\n   {} | {} in stock\n",
            text(product, "name"),
            text(product, "id"),
            money(&product["price"]),
            product["stock"].as_u64().unwrap_or(0)
        );
        let description = text(product, "description");
        if !description.is_empty() {
            let _ = writeln!(out, "   {}", description);
        }
    }
    if products.len() > SEARCH_PREVIEW {
        let _ = write!(out, "\n... and {} more.\n", products.len() - SEARCH_PREVIEW);
    }
    out.push_str("\nTo add an item to your cart, tell me 'Add <PRODUCT_ID> to cart'.");
    out
}

fn render_product(product: &Value) -> String {
    let mut out = format!(
        "**{}** (ID: {})\nCategory: {}\nPrice: {}\nStock: {}",
        text(product, "name"),
        text(product, "id"),
        text(product, "category"),
        money(&product["price"]),
        product["stock"].as_u64().unwrap_or(0)
    );
    let brand = text(product, "brand");
    if !brand.is_empty() {
        let _ = write!(out, "\nBrand: {}", brand);
    }
    let description = text(product, "description");
    if !description.is_empty() {
        let _ = write!(out, "\n{}", description);
    }
    out
}

fn render_tracking(order: &Value) -> String {
    let mut out = format!(
        "**Order {}**\nStatus: {}\nTotal: {}\nCreated: {}\n{}\n\nItems:",
        text(order, "order_id"),
        text(order, "status").to_uppercase(),
        money(&order["total"]),
        text(order, "created_at"),
        text(order, "estimated_delivery")
    );
    for item in order["items"].as_array().map(Vec::as_slice).unwrap_or_default() {
        let _ = write!(
            out,
            "\n- Product {}: {} x {}",
            text(item, "product_id"),
            item["quantity"].as_u64().unwrap_or(0),
            money(&item["price"])
        );
    }
    out
}

fn render_orders(payload: &Value) -> String {
    let orders = payload.as_array().map(Vec::as_slice).unwrap_or_default();
    if orders.is_empty() {
        return "You don't have any orders yet.".to_string();
    }

    let mut out = format!("**Your Orders** ({}):\n", orders.len());
    for order in orders {
        let _ = write!(
            out,
            "\n- **{}** - {} - {} ({})",
            text(order, "id"),
            money(&order["total"]),
            text(order, "status").to_uppercase(),
            text(order, "created_at")
        );
    }
    out.push_str("\n\nTo track a specific order, tell me its order ID.");
    out
}

fn render_cart(cart: &Value) -> String {
    let items = cart["items"].as_array().map(Vec::as_slice).unwrap_or_default();
    if items.is_empty() {
        return "Your cart is empty.".to_string();
    }

    let mut out = format!("**Your Cart** ({} items):\n", items.len());
    let _ = write!(out, "\n{:<10} {:<28} {:>4} {:>10} {:>10}", "ID", "Item", "Qty", "Price", "Total");
    for item in items {
        let _ = write!(
            out,
            "\n{:<10} {:<28} {:>4} {:>10} {:>10}",
            text(item, "product_id"),
            text(item, "name"),
            item["quantity"].as_u64().unwrap_or(0),
            money(&item["price"]),
            money(&item["item_total"])
        );
    }
    let _ = write!(out, "\n\n**Total: {}**", money(&cart["total"]));
    out
}

fn render_help(payload: &Value) -> String {
    if let Some(topic) = payload.get("topic").and_then(Value::as_str) {
        return format!(
            "**{} Information:**\n{}\n\n{}",
            title_case(topic),
            text(payload, "information"),
            text(payload, "additional_help")
        );
    }

    let mut out = String::from("Available help topics:");
    for topic in payload["available_topics"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
    {
        let _ = write!(out, "\n- {}", title_case(topic.as_str().unwrap_or_default()));
    }
    out
}

fn render_store(store: &Value) -> String {
    format!(
        "**{}**\nHours: {}\nPhone: {}\nEmail: {}\nAddress: {}\nWebsite: {}",
        text(store, "name"),
        text(store, "hours"),
        text(store, "phone"),
        text(store, "email"),
        text(store, "address"),
        text(store, "website")
    )
}
