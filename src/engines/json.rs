//! Engines reading a JSON API through dotted field paths

use super::request::{resolve_url, strip_tags, RequestTemplate};
use super::traits::*;
use crate::config::EngineConfig;
use crate::network::accept_json;
use crate::results::{ExtraValue, RawResult};
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

/// A JSON API engine described entirely by its configuration
pub struct JsonEngine {
    name: String,
    categories: Vec<String>,
    weight: f64,
    request: RequestTemplate,
    results: String,
    url: String,
    title: String,
    content: Option<String>,
    published_date: Option<String>,
    url_prefix: Option<String>,
    template: String,
}

/// Follow a dotted path; numeric segments index into arrays
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// RFC 3339 strings or unix seconds
fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}

impl JsonEngine {
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        for (field, path) in [
            ("results", &config.results),
            ("url", &config.url),
            ("title", &config.title),
        ] {
            if path.trim().is_empty() {
                anyhow::bail!("path for {} is empty", field);
            }
        }

        Ok(Self {
            name: config.name.to_lowercase(),
            categories: config.categories.clone(),
            weight: config.weight,
            request: RequestTemplate::from_config(config)?,
            results: config.results.clone(),
            url: config.url.clone(),
            title: config.title.clone(),
            content: config.content.clone(),
            published_date: config.published_date.clone(),
            url_prefix: config.url_prefix.clone(),
            template: config.template.clone(),
        })
    }

    fn parse_item(&self, item: &Value, position: u32) -> Option<RawResult> {
        let title = lookup(item, &self.title).and_then(as_text)?;
        let title = strip_tags(&title);
        if title.is_empty() {
            return None;
        }

        let raw_url = lookup(item, &self.url).and_then(as_text)?;
        let url = resolve_url(self.url_prefix.as_deref(), &raw_url)?;

        let mut result = RawResult::new(url, title, self.name.clone()).with_position(position);

        if let Some(content) = self
            .content
            .as_deref()
            .and_then(|path| lookup(item, path))
            .and_then(as_text)
        {
            result = result.with_content(strip_tags(&content));
        }

        if let Some(published) = self
            .published_date
            .as_deref()
            .and_then(|path| lookup(item, path))
            .and_then(as_timestamp)
        {
            result = result.with_extra("publishedDate", ExtraValue::Timestamp(published));
        }

        result.category = self.categories.first().cloned();
        result.template = Some(self.template.clone());
        Some(result)
    }
}

impl Engine for JsonEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_paging(&self) -> bool {
        self.request.supports_paging()
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn request(&self, params: &RequestParams) -> Result<EngineRequest> {
        Ok(self.request.build(params).header("Accept", accept_json()))
    }

    fn response(&self, response: EngineResponse) -> Result<EngineResults> {
        response.error_for_status()?;
        let body: Value = response.json().context("response is not JSON")?;

        let items = match lookup(&body, &self.results) {
            Some(Value::Array(items)) => items.as_slice(),
            Some(_) => anyhow::bail!("{} is not a list", self.results),
            None => &[][..],
        };

        let mut results = Vec::new();
        for item in items {
            let position = results.len() as u32 + 1;
            if let Some(result) = self.parse_item(item, position) {
                results.push(result);
            }
        }

        Ok(EngineResults::with_results(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn wikipedia() -> EngineConfig {
        EngineConfig {
            name: "wikipedia".to_string(),
            engine: "json".to_string(),
            search_url: "https://en.wikipedia.org/w/api.php".to_string(),
            query_param: "srsearch".to_string(),
            results: "query.search".to_string(),
            url: "title".to_string(),
            title: "title".to_string(),
            content: Some("snippet".to_string()),
            published_date: Some("timestamp".to_string()),
            url_prefix: Some("https://en.wikipedia.org/wiki/".to_string()),
            ..Default::default()
        }
    }

    fn body(value: Value) -> EngineResponse {
        EngineResponse {
            status: 200,
            headers: HashMap::new(),
            text: value.to_string(),
            url: "https://en.wikipedia.org/w/api.php".to_string(),
        }
    }

    #[test]
    fn test_lookup() {
        let value = json!({"a": {"b": [{"c": 1}, {"c": 2}]}});
        assert_eq!(lookup(&value, "a.b.1.c"), Some(&json!(2)));
        assert_eq!(lookup(&value, "a.x"), None);
        assert_eq!(lookup(&value, "a.b.x"), None);
    }

    #[test]
    fn test_parse_wikipedia_shape() {
        let engine = JsonEngine::from_config(&wikipedia()).unwrap();
        let response = body(json!({
            "query": {"search": [
                {
                    "title": "Rust (programming language)",
                    "snippet": "<span class=\"searchmatch\">Rust</span> is a language",
                    "timestamp": "2024-05-01T12:00:00Z"
                },
                {"snippet": "no title"}
            ]}
        }));

        let results = engine.response(response).unwrap().results;
        assert_eq!(results.len(), 1);
        let hit = &results[0];
        assert_eq!(
            hit.url,
            "https://en.wikipedia.org/wiki/Rust_(programming_language)"
        );
        assert_eq!(hit.content.as_deref(), Some("Rust is a language"));
        assert!(matches!(
            hit.extra.get("publishedDate"),
            Some(ExtraValue::Timestamp(_))
        ));
    }

    #[test]
    fn test_unix_timestamps() {
        let ts = as_timestamp(&json!(1_700_000_000)).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert!(as_timestamp(&json!("yesterday")).is_none());
    }

    #[test]
    fn test_missing_result_list_is_empty() {
        let engine = JsonEngine::from_config(&wikipedia()).unwrap();
        let results = engine.response(body(json!({"batchcomplete": ""}))).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_non_json_body_is_an_error() {
        let engine = JsonEngine::from_config(&wikipedia()).unwrap();
        let mut response = body(json!({}));
        response.text = "<html>maintenance</html>".to_string();
        assert!(engine.response(response).is_err());
    }
}
