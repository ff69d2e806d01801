//! Response normalization and serialization
//!
//! Raw engine hits carry internal bookkeeping and loosely typed extras. This
//! module strips the former and renders the latter by fixed rules so that
//! turning a [`SearchResponse`] into JSON cannot fail on value types:
//!
//! - timestamps become RFC 3339 strings
//! - byte sequences become UTF-8 text, or their escaped form if not UTF-8
//! - sets become sorted sequences
//! - non-finite floats become `null`
//! - anything else becomes its string representation

use super::response::SearchResponse;
use super::types::{ExtraValue, RawResult, SearchHit};
use crate::error::SearchError;
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Turn a raw engine hit into its client-facing shape
pub fn clean_hit(raw: RawResult) -> SearchHit {
    let mut extra: BTreeMap<String, Value> = raw
        .extra
        .into_iter()
        .map(|(key, value)| (key, extra_to_json(value)))
        .collect();
    extra.insert(
        "engines".to_string(),
        extra_to_json(ExtraValue::Set(raw.engines)),
    );

    SearchHit {
        url: raw.url,
        title: raw.title,
        content: raw.content.unwrap_or_default(),
        engine: raw.engine,
        template: raw.template.unwrap_or_else(|| "default.html".to_string()),
        score: if raw.score.is_finite() { raw.score } else { 0.0 },
        category: raw.category.unwrap_or_else(|| "general".to_string()),
        extra,
    }
}

/// Render an extra value as JSON
pub fn extra_to_json(value: ExtraValue) -> Value {
    match value {
        ExtraValue::Null => Value::Null,
        ExtraValue::Bool(b) => Value::Bool(b),
        ExtraValue::Int(i) => Value::Number(i.into()),
        ExtraValue::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ExtraValue::Text(s) | ExtraValue::Other(s) => Value::String(s),
        ExtraValue::Timestamp(ts) => Value::String(ts.to_rfc3339()),
        ExtraValue::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::String(text),
            Err(err) => Value::String(format!("b\"{}\"", err.as_bytes().escape_ascii())),
        },
        ExtraValue::Set(items) => {
            let mut items: Vec<String> = items.into_iter().collect();
            items.sort();
            Value::Array(items.into_iter().map(Value::String).collect())
        }
        ExtraValue::List(items) => Value::Array(items.into_iter().map(extra_to_json).collect()),
    }
}

/// Serialize a response to JSON, keeping non-ASCII characters literal
pub fn to_json(response: &SearchResponse) -> Result<String, SearchError> {
    Ok(serde_json::to_string(response)?)
}
