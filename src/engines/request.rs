//! Request building and URL cleanup shared by the configured engines

use super::traits::{EngineRequest, HttpMethod, RequestParams};
use crate::config::EngineConfig;
use std::collections::BTreeMap;
use url::Url;

/// Query parameters that carry the real target behind a redirect link
const REDIRECT_PARAMS: &[&str] = &["uddg"];

/// How an engine's search URL is filled in from the request parameters
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: HttpMethod,
    search_url: String,
    query_param: String,
    extra_params: BTreeMap<String, String>,
    page_param: Option<String>,
    page_size: u32,
    lang_param: Option<String>,
    safesearch_param: Option<String>,
    safesearch_values: Vec<String>,
    time_range_param: Option<String>,
    time_range_values: BTreeMap<String, String>,
}

impl RequestTemplate {
    pub fn from_config(config: &EngineConfig) -> anyhow::Result<Self> {
        let parsed = Url::parse(&config.search_url)
            .map_err(|e| anyhow::anyhow!("invalid search_url {:?}: {}", config.search_url, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("search_url must be http(s): {}", config.search_url);
        }
        if config.query_param.is_empty() {
            anyhow::bail!("query_param must not be empty");
        }
        let method = match config.method.to_ascii_uppercase().as_str() {
            "" | "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            other => anyhow::bail!("unsupported method {:?}", other),
        };

        Ok(Self {
            method,
            search_url: config.search_url.clone(),
            query_param: config.query_param.clone(),
            extra_params: config.extra_params.clone(),
            page_param: config.page_param.clone(),
            page_size: config.page_size,
            lang_param: config.lang_param.clone(),
            safesearch_param: config.safesearch_param.clone(),
            safesearch_values: config.safesearch_values.clone(),
            time_range_param: config.time_range_param.clone(),
            time_range_values: config.time_range_values.clone(),
        })
    }

    pub fn supports_paging(&self) -> bool {
        self.page_param.is_some()
    }

    /// Page parameter value: the page number, or the result offset when the
    /// engine pages by offset. None for the first page and for offsets that
    /// do not fit.
    fn page_value(&self, pageno: u32) -> Option<u32> {
        if pageno <= 1 {
            return None;
        }
        if self.page_size == 0 {
            return Some(pageno);
        }
        (pageno - 1).checked_mul(self.page_size)
    }

    /// Build the request for the given parameters. POST engines get the
    /// parameters as a form body.
    pub fn build(&self, params: &RequestParams) -> EngineRequest {
        let request = match self.method {
            HttpMethod::Get => EngineRequest::get(&self.search_url),
            HttpMethod::Post => EngineRequest::post(&self.search_url),
        };
        let mut request = request.param(&self.query_param, &params.query);

        for (key, value) in &self.extra_params {
            request = request.param(key, value);
        }

        if let Some(ref page_param) = self.page_param {
            if let Some(value) = self.page_value(params.pageno) {
                request = request.param(page_param, value.to_string());
            }
        }

        if let Some(ref lang_param) = self.lang_param {
            if !params.lang.is_empty() && params.lang != "all" {
                request = request.param(lang_param, &params.lang);
            }
        }

        if let Some(ref safe_param) = self.safesearch_param {
            if let Some(value) = self.safesearch_values.get(params.safesearch as usize) {
                request = request.param(safe_param, value);
            }
        }

        if let (Some(tr_param), Some(time_range)) = (&self.time_range_param, params.time_range)
        {
            if let Some(value) = self.time_range_values.get(time_range.as_str()) {
                request = request.param(tr_param, value);
            }
        }

        match self.method {
            HttpMethod::Get => request,
            HttpMethod::Post => request.into_form(),
        }
    }
}

/// Turn an extracted link into an absolute http(s) URL.
///
/// With a prefix the raw value is appended to it, spaces becoming
/// underscores. Without one, relative links are dropped. Redirect links
/// carrying their target in a query parameter are unwrapped.
pub fn resolve_url(prefix: Option<&str>, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let candidate = if let Some(prefix) = prefix {
        format!("{}{}", prefix, raw.replace(' ', "_"))
    } else if let Some(rest) = raw.strip_prefix("//") {
        format!("https://{}", rest)
    } else if raw.starts_with('/') || raw.starts_with('#') {
        return None;
    } else {
        raw.to_string()
    };

    let url = Url::parse(&candidate).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let target = url
        .query_pairs()
        .find(|(k, _)| REDIRECT_PARAMS.contains(&k.as_ref()))
        .map(|(_, v)| v.into_owned())
        .filter(|v| v.starts_with("http://") || v.starts_with("https://"));

    Some(target.unwrap_or(candidate))
}

/// Collapse runs of whitespace in extracted text
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove markup from an API-provided snippet
pub fn strip_tags(text: &str) -> String {
    let fragment = scraper::Html::parse_fragment(text);
    clean_text(&fragment.root_element().text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::RequestBody;
    use crate::query::TimeRange;

    fn template() -> RequestTemplate {
        let config = EngineConfig {
            name: "test".to_string(),
            engine: "css".to_string(),
            search_url: "https://search.example/find".to_string(),
            page_param: Some("start".to_string()),
            page_size: 10,
            lang_param: Some("hl".to_string()),
            safesearch_param: Some("safe".to_string()),
            safesearch_values: vec!["off".into(), "medium".into(), "high".into()],
            time_range_param: Some("tbs".to_string()),
            time_range_values: [("week".to_string(), "qdr:w".to_string())].into(),
            extra_params: [("num".to_string(), "10".to_string())].into(),
            ..Default::default()
        };
        RequestTemplate::from_config(&config).unwrap()
    }

    #[test]
    fn test_build_first_page() {
        let req = template().build(&RequestParams::new("rust"));
        assert_eq!(req.url, "https://search.example/find");
        assert_eq!(req.params.get("q").unwrap(), "rust");
        assert_eq!(req.params.get("num").unwrap(), "10");
        assert_eq!(req.params.get("safe").unwrap(), "off");
        assert!(!req.params.contains_key("start"));
        assert!(!req.params.contains_key("hl"));
        assert!(!req.params.contains_key("tbs"));
    }

    #[test]
    fn test_build_with_options() {
        let mut params = RequestParams::new("rust");
        params.pageno = 3;
        params.lang = "de".to_string();
        params.safesearch = 2;
        params.time_range = Some(TimeRange::Week);

        let req = template().build(&params);
        assert_eq!(req.params.get("start").unwrap(), "20");
        assert_eq!(req.params.get("hl").unwrap(), "de");
        assert_eq!(req.params.get("safe").unwrap(), "high");
        assert_eq!(req.params.get("tbs").unwrap(), "qdr:w");
    }

    #[test]
    fn test_huge_page_offset_is_skipped() {
        let mut params = RequestParams::new("rust");
        params.pageno = 500_000_000;
        let req = template().build(&params);
        assert!(!req.params.contains_key("start"));
        assert_eq!(req.params.get("q").unwrap(), "rust");

        params.pageno = u32::MAX;
        let req = template().build(&params);
        assert!(!req.params.contains_key("start"));
    }

    #[test]
    fn test_unknown_time_range_token_is_skipped() {
        let mut params = RequestParams::new("rust");
        params.time_range = Some(TimeRange::Year);
        let req = template().build(&params);
        assert!(!req.params.contains_key("tbs"));
    }

    #[test]
    fn test_invalid_search_url() {
        let config = EngineConfig {
            search_url: "ftp://nope".to_string(),
            ..Default::default()
        };
        assert!(RequestTemplate::from_config(&config).is_err());

        let config = EngineConfig {
            search_url: "https://search.example/find".to_string(),
            method: "PUT".to_string(),
            ..Default::default()
        };
        assert!(RequestTemplate::from_config(&config).is_err());
    }

    #[test]
    fn test_post_sends_form_body() {
        let config = EngineConfig {
            search_url: "https://html.search.example/html/".to_string(),
            method: "post".to_string(),
            lang_param: Some("kl".to_string()),
            ..Default::default()
        };
        let mut params = RequestParams::new("rust");
        params.lang = "de-de".to_string();

        let req = RequestTemplate::from_config(&config).unwrap().build(&params);
        assert_eq!(req.method, HttpMethod::Post);
        assert!(req.params.is_empty());
        let Some(RequestBody::Form(data)) = req.data else {
            panic!("expected a form body");
        };
        assert_eq!(data.get("q").unwrap(), "rust");
        assert_eq!(data.get("kl").unwrap(), "de-de");
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url(None, " https://www.rust-lang.org/ ").as_deref(),
            Some("https://www.rust-lang.org/")
        );
        assert_eq!(resolve_url(None, "/relative"), None);
        assert_eq!(resolve_url(None, "javascript:void(0)"), None);
        assert_eq!(
            resolve_url(Some("https://en.wikipedia.org/wiki/"), "Rust (language)").as_deref(),
            Some("https://en.wikipedia.org/wiki/Rust_(language)")
        );
        assert_eq!(
            resolve_url(
                None,
                "//duckduckgo.com/l/?uddg=https%3A%2F%2Fdoc.rust-lang.org%2Fbook%2F&rut=abc"
            )
            .as_deref(),
            Some("https://doc.rust-lang.org/book/")
        );
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("The <span class=\"searchmatch\">Rust</span>  language"),
            "The Rust language"
        );
    }
}
