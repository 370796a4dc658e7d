use serde_json::Value;

use crate::error::{NotebookError, Result};

pub type JsonMap = serde_json::Map<String, Value>;

/// Read an optional object-valued field. Absent or `null` reads as empty.
pub(crate) fn object_field(obj: &JsonMap, key: &str) -> Result<JsonMap> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(JsonMap::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(other) => Err(NotebookError::InvalidFormat(format!(
            "`{}` must be an object, found {}",
            key,
            json_kind(other)
        ))),
    }
}

/// Read `execution_count`, where `null` or absence means "not yet executed".
pub(crate) fn execution_count_field(obj: &JsonMap) -> Result<Option<i64>> {
    match obj.get("execution_count") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| {
            NotebookError::InvalidFormat(format!(
                "`execution_count` must be an integer or null, found {}",
                json_kind(value)
            ))
        }),
    }
}

pub(crate) fn execution_count_value(count: Option<i64>) -> Value {
    count.map(Value::from).unwrap_or(Value::Null)
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
