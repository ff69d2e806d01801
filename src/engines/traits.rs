//! Engine traits and types

use crate::query::TimeRange;
use crate::results::{Answer, InfoBox, RawResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of an engine search
#[derive(Debug, Clone, Default)]
pub struct EngineResults {
    /// Search results
    pub results: Vec<RawResult>,
    /// Direct answers
    pub answers: Vec<Answer>,
    /// Search suggestions
    pub suggestions: Vec<String>,
    /// Information boxes
    pub infoboxes: Vec<InfoBox>,
    /// Number of total results (if known)
    pub number_of_results: Option<u64>,
}

impl EngineResults {
    pub fn with_results(results: Vec<RawResult>) -> Self {
        Self {
            results,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
            && self.answers.is_empty()
            && self.suggestions.is_empty()
            && self.infoboxes.is_empty()
    }
}

/// Parameters for building a search request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestParams {
    /// Search query string
    pub query: String,
    /// Page number (1-indexed)
    pub pageno: u32,
    /// Language code
    pub lang: String,
    /// Safe search level
    pub safesearch: u8,
    /// Time range filter
    pub time_range: Option<TimeRange>,
    /// Category context
    pub category: String,
}

impl RequestParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            pageno: 1,
            lang: "all".to_string(),
            safesearch: 0,
            time_range: None,
            category: "general".to_string(),
        }
    }
}

/// HTTP request to be made by the engine
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub params: HashMap<String, String>,
    /// POST body data
    pub data: Option<RequestBody>,
}

impl EngineRequest {
    fn with_method(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HashMap::new(),
            params: HashMap::new(),
            data: None,
        }
    }

    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::with_method(url, HttpMethod::Get)
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self::with_method(url, HttpMethod::Post)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Move the query parameters into a form-urlencoded body
    pub fn into_form(mut self) -> Self {
        let data = std::mem::take(&mut self.params);
        self.data = Some(RequestBody::Form(data));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Form(HashMap<String, String>),
}

/// HTTP response from engine request
#[derive(Debug)]
pub struct EngineResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl EngineResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Check if response indicates CAPTCHA
    pub fn is_captcha(&self) -> bool {
        self.text.contains("captcha")
            || self.text.contains("CAPTCHA")
            || self.text.contains("unusual traffic")
            || self.text.contains("automated requests")
    }

    /// Turn a non-2xx response into an error the executor can classify
    pub fn error_for_status(&self) -> anyhow::Result<()> {
        if self.is_rate_limited() {
            anyhow::bail!("HTTP error 429 from {}", self.url);
        }
        if self.is_captcha() {
            anyhow::bail!("CAPTCHA page from {}", self.url);
        }
        if !self.is_success() {
            anyhow::bail!("HTTP error {} from {}", self.status, self.url);
        }
        Ok(())
    }
}

/// A search engine that builds requests and parses responses.
///
/// Implementations do no I/O; the executor owns the HTTP client.
pub trait Engine: Send + Sync {
    fn name(&self) -> &str;

    fn supports_paging(&self) -> bool {
        true
    }

    /// Default weight for result scoring
    fn weight(&self) -> f64 {
        1.0
    }

    /// Build the HTTP request for a search
    fn request(&self, params: &RequestParams) -> anyhow::Result<EngineRequest>;

    /// Parse the HTTP response into results
    fn response(&self, response: EngineResponse) -> anyhow::Result<EngineResults>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, text: &str) -> EngineResponse {
        EngineResponse {
            status,
            headers: HashMap::new(),
            text: text.to_string(),
            url: "https://example.org/".to_string(),
        }
    }

    #[test]
    fn test_request_builder() {
        let req = EngineRequest::post("https://example.org/html/")
            .param("q", "rust")
            .header("Accept", "text/html")
            .into_form();

        assert_eq!(req.method, HttpMethod::Post);
        assert!(req.params.is_empty());
        let Some(RequestBody::Form(data)) = req.data else {
            panic!("expected a form body");
        };
        assert_eq!(data.get("q").map(String::as_str), Some("rust"));
    }

    #[test]
    fn test_error_for_status() {
        assert!(response(200, "<html></html>").error_for_status().is_ok());

        let err = response(429, "").error_for_status().unwrap_err();
        assert!(err.to_string().contains("429"));

        let err = response(200, "please solve this captcha").error_for_status().unwrap_err();
        assert!(err.to_string().contains("CAPTCHA"));

        let err = response(503, "").error_for_status().unwrap_err();
        assert!(err.to_string().starts_with("HTTP error"));
    }
}
