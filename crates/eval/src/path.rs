//! Slash-delimited path resolution over JSON records.
//!
//! A path such as `Entry/AnswersJson/PAGE/FIELD` or `items/2/name`
//! addresses a value inside a nested record. Segments select object keys,
//! or list indexes when the current value is a list and the segment is a
//! decimal digit string.
//!
//! Resolution stops as soon as an *intermediate* value is falsy (null,
//! `false`, `0`, `""`, `[]`, `{}`): the path is then absent even when a
//! later segment could in principle have been followed. A falsy value at
//! the final segment is returned as-is. Callers therefore cannot tell an
//! absent value from a present falsy one that blocked traversal.

use serde_json::Value;

/// Returns true for the values that block further path traversal.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

/// Resolve `path` against `record`.
///
/// Returns `None` when a segment is missing, an index is out of range,
/// a segment cannot apply to the current value, or an intermediate value
/// is falsy.
pub fn resolve<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split('/') {
        if is_falsy(current) {
            return None;
        }
        current = match current {
            Value::Object(fields) => fields.get(segment)?,
            Value::Array(items) if is_index(segment) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}
