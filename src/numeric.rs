//! Dynamic JSON parsing helper for the multi-typed numeric fields the wire
//! format uses (`spec.md` §9 "Dynamic JSON parsing"): ids and timestamps
//! arrive as integer, long, or string depending on which server sent them.
use crate::error::NetworkError;
use serde_json::Value;

/// Tries integer, then string, failing with `ParsingFailed` if neither works.
pub fn as_i64(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

pub fn as_u64(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

pub fn as_u16(value: &Value) -> Option<u16> {
    as_u64(value).and_then(|v| u16::try_from(v).ok())
}

pub fn require_i64(value: &Value, field: &str) -> Result<i64, NetworkError> {
    as_i64(value).ok_or_else(|| NetworkError::ParsingFailed(format!("field '{field}' is not a valid integer")))
}
