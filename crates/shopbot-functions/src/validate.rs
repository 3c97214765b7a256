use serde_json::{Map, Number, Value};
use tracing::debug;

use shopbot_core::{FunctionError, ParamType, ParameterSchema};

/// Check `args` against `schema` and coerce each value to its declared type.
///
/// Returns an object holding only the declared parameters. A `null` value
/// counts as absent. The first failing parameter is reported.
pub fn validate_arguments(schema: &ParameterSchema, args: &Value) -> Result<Value, FunctionError> {
    let empty = Map::new();
    let provided = match args {
        Value::Null => &empty,
        Value::Object(map) => map,
        other => {
            return Err(FunctionError::invalid(
                "arguments",
                format!("expected an object, got {}", json_type_name(other)),
            ));
        }
    };

    let mut validated = Map::new();
    for param in schema.iter() {
        match provided.get(&param.name) {
            None | Some(Value::Null) => {
                if param.required {
                    return Err(FunctionError::invalid(
                        &param.name,
                        "required parameter is missing",
                    ));
                }
            }
            Some(value) => {
                let coerced = coerce(value, param.param_type).ok_or_else(|| {
                    FunctionError::invalid(
                        &param.name,
                        format!("expected {}, got {}", param.param_type, json_type_name(value)),
                    )
                })?;
                if param.required && coerced.as_str().is_some_and(|s| s.trim().is_empty()) {
                    return Err(FunctionError::invalid(&param.name, "must not be empty"));
                }
                validated.insert(param.name.clone(), coerced);
            }
        }
    }

    for name in provided.keys() {
        if schema.get(name).is_none() {
            debug!(parameter = %name, "Dropping undeclared argument");
        }
    }

    Ok(Value::Object(validated))
}

fn coerce(value: &Value, param_type: ParamType) -> Option<Value> {
    match param_type {
        ParamType::String => match value {
            Value::String(_) => Some(value.clone()),
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        ParamType::Number => match value {
            Value::Number(_) => Some(value.clone()),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            _ => None,
        },
        ParamType::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
            Value::Number(n) => n
                .as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                .map(|f| Value::from(f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
            _ => None,
        },
        ParamType::Boolean => match value {
            Value::Bool(_) => Some(value.clone()),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
        ParamType::Array => value.is_array().then(|| value.clone()),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
