//! Query form building
//!
//! Turns an arbitrary client payload into the canonical [`QueryForm`], and
//! the form into the flat string-keyed map the engine set consumes.
//!
//! Payload keys: `query`, `engines`, `language`, `time_range`, `pageno`,
//! `safesearch`, `max_results`.

use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Normalized request payload as produced by the inbound adapters
pub type Payload = Map<String, Value>;

/// Flat form handed to the engine set
pub type FlatForm = BTreeMap<String, String>;

/// Canonical search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryForm {
    /// Search text, trimmed and non-empty
    pub text: String,
    /// Requested providers in request order, duplicates kept
    pub providers: Vec<String>,
    pub language: Option<String>,
    pub page: Option<String>,
    pub time_range: Option<String>,
    pub safety: Option<String>,
    /// Positive result cap, if the request carried one
    pub max_results: Option<usize>,
}

impl QueryForm {
    /// Build a form from a payload.
    ///
    /// `default_providers` is used when the payload names no engines.
    /// Fails with [`SearchError::Validation`] when the query is empty after
    /// trimming.
    pub fn build(payload: &Payload, default_providers: &[String]) -> Result<Self, SearchError> {
        let text = payload
            .get("query")
            .and_then(coerce)
            .map(|q| q.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(SearchError::missing_query());
        }

        let providers = match payload.get("engines") {
            Some(Value::Array(items)) if !items.is_empty() => {
                items.iter().filter_map(coerce).collect()
            }
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => default_providers.to_vec(),
        };

        Ok(Self {
            text,
            providers,
            language: optional(payload, "language"),
            page: optional(payload, "pageno"),
            time_range: optional(payload, "time_range"),
            safety: optional(payload, "safesearch"),
            max_results: max_results(payload),
        })
    }

    /// Flatten into `{q, engines, language, pageno, time_range, safesearch}`
    pub fn to_form(&self) -> FlatForm {
        let mut form = FlatForm::new();
        form.insert("q".to_string(), self.text.clone());
        if !self.providers.is_empty() {
            form.insert("engines".to_string(), self.providers.join(","));
        }
        let fields = [
            ("language", &self.language),
            ("pageno", &self.page),
            ("time_range", &self.time_range),
            ("safesearch", &self.safety),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                form.insert(key.to_string(), value.clone());
            }
        }
        form
    }
}

/// Parse `max_results` into a positive cap.
///
/// Numbers and numeric strings are accepted; anything else, zero and
/// negatives mean "no cap".
pub fn max_results(payload: &Payload) -> Option<usize> {
    let value = match payload.get("max_results")? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    usize::try_from(value).ok().filter(|n| *n > 0)
}

/// A field counts as present unless it is null or an empty string, so
/// `safesearch: 0` survives as `"0"`.
fn optional(payload: &Payload, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(coerce)
        .filter(|v| !v.is_empty())
}

/// Coerce a JSON value into the string form the engine set expects
fn coerce(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(coerce)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Time range filter for search results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    /// Get the string representation for API calls
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl FromStr for TimeRange {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(SearchError::InvalidParameter(format!(
                "time_range: unknown value {other:?}"
            ))),
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => panic!("payload must be an object"),
        }
    }

    fn defaults() -> Vec<String> {
        vec!["google".to_string(), "bing".to_string()]
    }

    #[test]
    fn test_blank_query_is_rejected() {
        for query in [json!(""), json!("   "), json!("\t\n"), Value::Null] {
            let err = QueryForm::build(&payload(json!({ "query": query })), &defaults())
                .unwrap_err();
            assert!(matches!(err, SearchError::Validation(_)));
        }
        let err = QueryForm::build(&Payload::new(), &defaults()).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_query_is_trimmed_and_numbers_coerced() {
        let form = QueryForm::build(&payload(json!({ "query": "  hello  " })), &defaults())
            .unwrap();
        assert_eq!(form.text, "hello");

        let form = QueryForm::build(&payload(json!({ "query": 42 })), &defaults()).unwrap();
        assert_eq!(form.text, "42");
    }

    #[test]
    fn test_engine_list_keeps_order_and_duplicates() {
        let form = QueryForm::build(
            &payload(json!({ "query": "x", "engines": ["brave", "google", "brave"] })),
            &defaults(),
        )
        .unwrap();
        assert_eq!(form.providers, vec!["brave", "google", "brave"]);
        assert_eq!(form.to_form()["engines"], "brave,google,brave");
    }

    #[test]
    fn test_engine_string_passes_verbatim() {
        let form = QueryForm::build(
            &payload(json!({ "query": "x", "engines": "bing, mojeek" })),
            &defaults(),
        )
        .unwrap();
        assert_eq!(form.to_form()["engines"], "bing, mojeek");
    }

    #[test]
    fn test_missing_engines_use_defaults() {
        for engines in [Value::Null, json!(""), json!([])] {
            let form = QueryForm::build(
                &payload(json!({ "query": "x", "engines": engines })),
                &defaults(),
            )
            .unwrap();
            assert_eq!(form.providers, defaults());
        }
    }

    #[test]
    fn test_zero_values_are_preserved() {
        let form = QueryForm::build(
            &payload(json!({ "query": "x", "safesearch": 0, "pageno": 0 })),
            &defaults(),
        )
        .unwrap();
        let flat = form.to_form();
        assert_eq!(flat["safesearch"], "0");
        assert_eq!(flat["pageno"], "0");
    }

    #[test]
    fn test_empty_optional_fields_are_dropped() {
        let form = QueryForm::build(
            &payload(json!({ "query": "x", "language": "", "time_range": null })),
            &defaults(),
        )
        .unwrap();
        let flat = form.to_form();
        assert!(!flat.contains_key("language"));
        assert!(!flat.contains_key("time_range"));
        assert_eq!(flat["q"], "x");
    }

    #[test]
    fn test_max_results_parsing() {
        let cases = [
            (json!(2), Some(2)),
            (json!("7"), Some(7)),
            (json!(0), None),
            (json!(-3), None),
            (json!("lots"), None),
            (Value::Null, None),
        ];
        for (value, expected) in cases {
            assert_eq!(
                max_results(&payload(json!({ "max_results": value }))),
                expected
            );
        }
    }

    #[test]
    fn test_time_range_parsing() {
        assert_eq!("Week".parse::<TimeRange>().unwrap(), TimeRange::Week);
        assert!("fortnight".parse::<TimeRange>().is_err());
    }
}
