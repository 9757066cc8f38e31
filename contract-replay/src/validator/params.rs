//! Coercion of raw string values (parameters, headers) into JSON for schema checks.

use super::{operation::ValueType, schema_violations, ConformanceError, ErrorKind};
use serde_json::{Number, Value};

/// What a named string value must look like.
pub(crate) struct ValueRule<'a> {
    pub subject: String,
    pub required: bool,
    pub explode: bool,
    pub value_type: &'a ValueType,
    pub schema: Option<&'a jsonschema::Validator>,
}

pub(crate) fn check_values(
    rule: &ValueRule<'_>,
    values: &[String],
    missing_kind: ErrorKind,
    invalid_kind: ErrorKind,
) -> Vec<ConformanceError> {
    if values.is_empty() {
        return if rule.required {
            vec![ConformanceError::new(
                missing_kind,
                format!("{} is missing", rule.subject),
                "",
            )]
        } else {
            Vec::new()
        };
    }

    let instance = match coerce(rule.value_type, rule.explode, values) {
        Ok(instance) => instance,
        Err(reason) => {
            return vec![ConformanceError::new(
                invalid_kind,
                format!("{} is invalid", rule.subject),
                reason,
            )]
        }
    };

    match rule.schema {
        Some(schema) => schema_violations(
            schema,
            &instance,
            invalid_kind,
            &format!("{} is invalid", rule.subject),
        ),
        None => Vec::new(),
    }
}

/// Values that cannot be coerced stay strings so the schema reports the type mismatch.
pub(crate) fn coerce(value_type: &ValueType, explode: bool, values: &[String]) -> Result<Value, String> {
    match value_type {
        ValueType::Array(item_type) => {
            let items: Vec<&str> = if explode {
                values.iter().map(String::as_str).collect()
            } else {
                values
                    .first()
                    .map(|value| value.split(',').collect())
                    .unwrap_or_default()
            };
            Ok(Value::Array(
                items
                    .into_iter()
                    .map(|item| coerce_scalar(item_type, item))
                    .collect(),
            ))
        }
        ValueType::Json => {
            let raw = values.first().map(String::as_str).unwrap_or("");
            serde_json::from_str(raw).map_err(|e| format!("value is not valid JSON: {}", e))
        }
        scalar => Ok(coerce_scalar(scalar, values.first().map(String::as_str).unwrap_or(""))),
    }
}

fn coerce_scalar(value_type: &ValueType, raw: &str) -> Value {
    let coerced = match value_type {
        ValueType::Integer => raw.parse::<i64>().ok().map(Value::from),
        ValueType::Number => raw
            .parse::<i64>()
            .ok()
            .map(Value::from)
            .or_else(|| {
                raw.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
            }),
        ValueType::Boolean => match raw {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        ValueType::Json => serde_json::from_str(raw).ok(),
        ValueType::String | ValueType::Array(_) => None,
    };

    coerced.unwrap_or_else(|| Value::String(raw.to_string()))
}
