//! Tolerant decoding of schemaless documents.
//!
//! A missing or wrongly typed optional field decodes as `None`. Timestamps
//! are accepted as RFC 3339 strings or integer unix seconds and are always
//! written back as RFC 3339.

use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::application::repos::RepoError;
use crate::infra::store::Fields;

pub(crate) fn opt_string(fields: &Fields, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|value| !value.is_empty())
}

pub(crate) fn string_or_empty(fields: &Fields, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn string_list(fields: &Fields, key: &str) -> Vec<String> {
    match fields.get(key) {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn timestamp(fields: &Fields, key: &str) -> Option<OffsetDateTime> {
    match fields.get(key)? {
        Value::String(raw) => OffsetDateTime::parse(raw, &Rfc3339).ok(),
        Value::Number(number) => number
            .as_i64()
            .and_then(|seconds| OffsetDateTime::from_unix_timestamp(seconds).ok()),
        _ => None,
    }
}

pub(crate) fn encode_timestamp(value: OffsetDateTime) -> Result<Value, RepoError> {
    value
        .format(&Rfc3339)
        .map(Value::String)
        .map_err(|err| RepoError::decode(format!("timestamp could not be formatted: {err}")))
}

pub(crate) fn opt_value(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}
