//! Function specs, call requests and call results

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{ErrorKind, FunctionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
        }
    }

    /// Maps a JSON Schema type name; `null` and `object` have no counterpart.
    pub fn from_json_type(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ParamType::String),
            "number" => Some(ParamType::Number),
            "integer" => Some(ParamType::Integer),
            "boolean" => Some(ParamType::Boolean),
            "array" => Some(ParamType::Array),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

/// Named parameters of a function, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(
        mut self,
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            param_type,
            required: true,
            description: description.into(),
        });
        self
    }

    pub fn optional(
        mut self,
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            param_type,
            required: false,
            description: description.into(),
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters.iter()
    }

    pub fn required_names(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Renders the `{"type": "object", "properties": .., "required": ..}` form
    /// understood by function-calling APIs.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.param_type.as_str(),
                    "description": param.description,
                }),
            );
        }

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });

        let required = self.required_names();
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

impl FunctionSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    pub fn to_json_schema(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters.to_json_schema(),
        })
    }
}

/// A function invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl FunctionCallRequest {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallOutcome {
    Success { payload: Value },
    Failure { kind: ErrorKind, message: String },
}

/// Outcome of one dispatched call. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCallResult {
    function: String,
    arguments: Value,
    result: CallOutcome,
}

impl FunctionCallResult {
    pub fn success(function: impl Into<String>, arguments: Value, payload: Value) -> Self {
        Self {
            function: function.into(),
            arguments,
            result: CallOutcome::Success { payload },
        }
    }

    pub fn failure(function: impl Into<String>, arguments: Value, error: &FunctionError) -> Self {
        Self {
            function: function.into(),
            arguments,
            result: CallOutcome::Failure {
                kind: error.kind(),
                message: error.to_string(),
            },
        }
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn arguments(&self) -> &Value {
        &self.arguments
    }

    pub fn outcome(&self) -> &CallOutcome {
        &self.result
    }

    pub fn ok(&self) -> bool {
        matches!(self.result, CallOutcome::Success { .. })
    }

    pub fn payload(&self) -> Option<&Value> {
        match &self.result {
            CallOutcome::Success { payload } => Some(payload),
            CallOutcome::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.result {
            CallOutcome::Success { .. } => None,
            CallOutcome::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.result {
            CallOutcome::Success { .. } => None,
            CallOutcome::Failure { message, .. } => Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_schema() -> ParameterSchema {
        ParameterSchema::new()
            .required("order_id", ParamType::String, "Order to track")
            .optional("verbose", ParamType::Boolean, "Include items")
    }

    #[test]
    fn test_schema_lookup() {
        let schema = order_schema();
        assert_eq!(schema.len(), 2);
        assert!(schema.get("order_id").unwrap().required);
        assert!(!schema.get("verbose").unwrap().required);
        assert!(schema.get("missing").is_none());
        assert_eq!(schema.required_names(), vec!["order_id"]);
    }

    #[test]
    fn test_schema_to_json() {
        let json = order_schema().to_json_schema();
        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["order_id"]["type"], "string");
        assert_eq!(json["properties"]["verbose"]["type"], "boolean");
        assert_eq!(json["required"], json!(["order_id"]));
    }

    #[test]
    fn test_schema_without_required_omits_key() {
        let schema = ParameterSchema::new().optional("topic", ParamType::String, "Topic");
        assert!(schema.to_json_schema().get("required").is_none());
    }

    #[test]
    fn test_function_spec_json() {
        let spec = FunctionSpec::new("track_order", "Track an order", order_schema());
        let json = spec.to_json_schema();
        assert_eq!(json["name"], "track_order");
        assert_eq!(json["parameters"]["required"], json!(["order_id"]));
    }

    #[test]
    fn test_call_result_accessors() {
        let ok = FunctionCallResult::success("search_products", json!({}), json!([1, 2]));
        assert!(ok.ok());
        assert_eq!(ok.payload(), Some(&json!([1, 2])));
        assert!(ok.error_kind().is_none());

        let err = FunctionCallResult::failure(
            "delete_everything",
            json!({}),
            &FunctionError::UnknownFunction("delete_everything".into()),
        );
        assert!(!err.ok());
        assert!(err.payload().is_none());
        assert_eq!(err.error_kind(), Some(ErrorKind::UnknownFunction));
        assert!(err.error_message().unwrap().contains("delete_everything"));
    }

    #[test]
    fn test_call_outcome_serde() {
        let err = FunctionCallResult::failure(
            "track_order",
            json!({}),
            &FunctionError::invalid("order_id", "required parameter is missing"),
        );
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["result"]["status"], "failure");
        assert_eq!(value["result"]["kind"], "invalid_arguments");
    }
}
