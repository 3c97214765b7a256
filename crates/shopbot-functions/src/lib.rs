//! Function registry and store business functions for the shopbot assistant

mod context;
mod registry;
pub mod shop;
mod validate;

pub use context::{DEFAULT_USER, ShopContext, StoreInfo};
pub use registry::FunctionRegistry;
pub use shop::all_shop_functions;
pub use validate::validate_arguments;

use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shopbot_core::{FunctionError, ParamType, ParameterSchema, ShopError};
use thiserror::Error;
use tracing::warn;

/// Names of the functions whose payload is a product listing.
pub const PRODUCT_SEARCH_FUNCTIONS: &[&str] = &["search_products"];

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Function already registered: {0}")]
    DuplicateName(String),
}

impl From<RegistryError> for ShopError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateName(name) => ShopError::DuplicateName(name),
        }
    }
}

pub fn generate_schema<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({}))
}

/// Derive a `ParameterSchema` from an input struct.
///
/// Parameters keep field declaration order. Doc comments on fields become
/// descriptions; non-`Option` fields are required. A nullable type such as `["string", "null"]` maps to its
/// non-null member.
pub fn parameters_for<T: JsonSchema>() -> ParameterSchema {
    parameters_from_json_schema(&generate_schema::<T>())
}

pub fn parameters_from_json_schema(schema: &Value) -> ParameterSchema {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut parameters = ParameterSchema::new();
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return parameters;
    };

    for (name, property) in properties {
        let param_type = match property_type(property) {
            Some(param_type) => param_type,
            None => {
                warn!(parameter = %name, "Unsupported parameter type, advertising as string");
                ParamType::String
            }
        };
        let description = property
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default();

        parameters = if required.contains(&name.as_str()) {
            parameters.required(name.clone(), param_type, description)
        } else {
            parameters.optional(name.clone(), param_type, description)
        };
    }
    parameters
}

fn property_type(property: &Value) -> Option<ParamType> {
    match property.get("type")? {
        Value::String(name) => ParamType::from_json_type(name),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .find_map(ParamType::from_json_type),
        _ => None,
    }
}

/// Deserialize validated arguments into a function's input struct.
pub(crate) fn parse_input<T: DeserializeOwned>(args: Value) -> Result<T, FunctionError> {
    serde_json::from_value(args).map_err(|e| FunctionError::invalid("arguments", e.to_string()))
}

pub(crate) fn to_payload<T: Serialize>(value: T) -> Result<Value, FunctionError> {
    serde_json::to_value(value).map_err(|e| FunctionError::business(format!("Failed to encode result: {}", e)))
}

/// Build the registry holding every store function, in advertised order.
pub fn create_shop_registry(ctx: ShopContext) -> Result<FunctionRegistry, RegistryError> {
    let mut registry = FunctionRegistry::new();
    for function in all_shop_functions(&ctx) {
        registry.register(function)?;
    }
    Ok(registry)
}
