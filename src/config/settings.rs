//! Settings structures for the search gateway

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Main settings structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
    pub fallback: FallbackSettings,
    pub engines: Vec<EngineConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            search: SearchSettings::default(),
            outgoing: OutgoingSettings::default(),
            fallback: FallbackSettings::default(),
            engines: default_engines(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with the process environment
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Merge with values from an arbitrary variable source.
    ///
    /// Unparseable numeric or boolean values leave the current setting alone,
    /// as do timeouts that are negative or not finite.
    pub fn merge_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("REQUEST_TIMEOUT").and_then(|v| parse_seconds(&v)) {
            self.outgoing.request_timeout = val;
        }
        if let Some(val) = lookup("MAX_REQUEST_TIMEOUT").and_then(|v| parse_seconds(&v)) {
            self.outgoing.max_request_timeout = val;
        }
        if let Some(val) = lookup("SEARX_OUTGOING_TIMEOUT").and_then(|v| parse_seconds(&v)) {
            self.outgoing.read_timeout = val;
        }
        if let Some(val) = lookup("SEARX_HTTP_MAX_KEEPALIVE").and_then(|v| v.trim().parse().ok())
        {
            self.outgoing.pool_maxsize = val;
        }
        if let Some(val) = lookup("SEARX_FORCE_IPV4") {
            self.outgoing.force_ipv4 = parse_flag(&val);
        }
        if let Some(val) = lookup("SEARX_REQUEST_JITTER_MS").and_then(|v| v.trim().parse().ok()) {
            self.outgoing.jitter_ms = val;
        }
        if let Some(val) = lookup("SEARX_USER_AGENT") {
            self.outgoing.useragent = Some(val);
        }
        if let Some(val) = lookup("DEFAULT_ENGINES") {
            self.search.default_engines = split_list(&val);
        }
        if let Some(val) = lookup("DISABLE_ENGINES") {
            self.search.disabled_engines = split_list(&val);
        }
        if let Some(val) = lookup("SEARXNG_PORT").and_then(|v| v.trim().parse().ok()) {
            self.server.port = val;
        }
        if let Some(val) = lookup("SEARXNG_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8888,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Search behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Engines used when a request names none
    pub default_engines: Vec<String>,
    /// Engines force-disabled at startup
    pub disabled_engines: Vec<String>,
    /// Language used when a request names none
    pub default_lang: String,
    /// Safe search level used when a request names none (0, 1, 2)
    pub safe_search: u8,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_engines: ["google", "bing", "startpage", "brave"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            disabled_engines: [
                "wikipedia",
                "wikidata",
                "github",
                "stackoverflow",
                "hackernews",
                "duckduckgo",
                "qwant",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            default_lang: "all".to_string(),
            safe_search: 0,
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Per-engine request timeout in seconds
    pub request_timeout: f64,
    /// Upper bound for any per-engine timeout
    pub max_request_timeout: f64,
    /// Read timeout for every outbound call
    pub read_timeout: f64,
    /// Connect timeout for every outbound call
    pub connect_timeout: f64,
    /// Idle keep-alive connections kept per host
    pub pool_maxsize: usize,
    /// Bind outgoing sockets to an IPv4 address
    pub force_ipv4: bool,
    /// Upper bound of the random delay before each request, in milliseconds
    pub jitter_ms: u64,
    /// Retries on connection errors
    pub retries: u32,
    /// Fixed User-Agent (none = random browser UA)
    pub useragent: Option<String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 2.5,
            max_request_timeout: 6.0,
            read_timeout: 12.0,
            connect_timeout: 5.0,
            pool_maxsize: 50,
            force_ipv4: true,
            jitter_ms: 0,
            retries: 2,
            useragent: None,
        }
    }
}

/// Fallback path settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackSettings {
    /// Instant-answer API endpoint
    pub instant_answer_url: String,
    /// Timeout for the instant-answer call in seconds
    pub timeout: f64,
    /// Result cap when the request does not carry one
    pub default_max_results: usize,
    /// Base of the URL the synthetic source points at
    pub synthetic_url: String,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            instant_answer_url: "https://api.duckduckgo.com/".to_string(),
            timeout: 10.0,
            default_max_results: 10,
            synthetic_url: "https://example.com/search".to_string(),
        }
    }
}

/// Individual engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine name (unique, case-insensitive)
    pub name: String,
    /// Engine kind: `css` or `json`
    pub engine: String,
    /// Categories this engine belongs to
    pub categories: Vec<String>,
    /// Short name
    pub shortcut: String,
    /// Whether engine is disabled in configuration
    pub disabled: bool,
    /// Custom timeout for this engine
    pub timeout: Option<f64>,
    /// Engine weight for scoring
    pub weight: f64,
    /// HTTP method, `GET` or `POST` (parameters sent as a form body)
    pub method: String,
    /// Search endpoint
    pub search_url: String,
    /// Query string parameter carrying the search text
    pub query_param: String,
    /// Constant parameters sent with every request
    pub extra_params: BTreeMap<String, String>,
    /// Parameter carrying the page (offset when `page_size > 0`)
    pub page_param: Option<String>,
    /// Results per page, used to turn page numbers into offsets
    pub page_size: u32,
    /// Parameter carrying the language code
    pub lang_param: Option<String>,
    /// Parameter carrying the safe search level
    pub safesearch_param: Option<String>,
    /// Values for safe search levels 0, 1 and 2
    pub safesearch_values: Vec<String>,
    /// Parameter carrying the time range
    pub time_range_param: Option<String>,
    /// Engine-specific time range tokens keyed by `day`, `week`, `month`, `year`
    pub time_range_values: BTreeMap<String, String>,
    /// Selector (css) or dotted path (json) of the result list
    pub results: String,
    /// Selector or field of the result URL
    pub url: String,
    /// Selector or field of the result title
    pub title: String,
    /// Selector or field of the result snippet
    pub content: Option<String>,
    /// Field holding a publication timestamp (json only)
    pub published_date: Option<String>,
    /// Prefix joined to extracted URLs
    pub url_prefix: Option<String>,
    /// Rendering template reported with each hit
    pub template: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            engine: String::new(),
            categories: vec!["general".to_string()],
            shortcut: String::new(),
            disabled: false,
            timeout: None,
            weight: 1.0,
            method: "GET".to_string(),
            search_url: String::new(),
            query_param: "q".to_string(),
            extra_params: BTreeMap::new(),
            page_param: None,
            page_size: 0,
            lang_param: None,
            safesearch_param: None,
            safesearch_values: Vec::new(),
            time_range_param: None,
            time_range_values: BTreeMap::new(),
            results: String::new(),
            url: String::new(),
            title: String::new(),
            content: None,
            published_date: None,
            url_prefix: None,
            template: "default.html".to_string(),
        }
    }
}

fn parse_seconds(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
}

/// Longest timeout any outbound call may use
pub const TIMEOUT_CEILING_SECS: f64 = 3600.0;

/// Turn a configured timeout in seconds into a [`Duration`].
///
/// Negative and NaN values become zero; anything above
/// [`TIMEOUT_CEILING_SECS`], infinity included, is clamped to it.
pub fn timeout_duration(secs: f64) -> Duration {
    Duration::from_secs_f64(secs.max(0.0).min(TIMEOUT_CEILING_SECS))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

/// Split a comma-separated list, trimming entries and dropping empty ones
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn time_ranges(day: &str, week: &str, month: &str, year: &str) -> BTreeMap<String, String> {
    [("day", day), ("week", week), ("month", month), ("year", year)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Default engine configurations
fn default_engines() -> Vec<EngineConfig> {
    vec![
        EngineConfig {
            name: "google".to_string(),
            engine: "css".to_string(),
            categories: strings(&["general", "web"]),
            shortcut: "g".to_string(),
            search_url: "https://www.google.com/search".to_string(),
            page_param: Some("start".to_string()),
            page_size: 10,
            lang_param: Some("hl".to_string()),
            safesearch_param: Some("safe".to_string()),
            safesearch_values: strings(&["off", "medium", "high"]),
            time_range_param: Some("tbs".to_string()),
            time_range_values: time_ranges("qdr:d", "qdr:w", "qdr:m", "qdr:y"),
            results: "div.g".to_string(),
            url: "a".to_string(),
            title: "h3".to_string(),
            content: Some("div.VwiC3b, span.aCOpRe".to_string()),
            ..Default::default()
        },
        EngineConfig {
            name: "bing".to_string(),
            engine: "css".to_string(),
            categories: strings(&["general", "web"]),
            shortcut: "bi".to_string(),
            search_url: "https://www.bing.com/search".to_string(),
            page_param: Some("first".to_string()),
            page_size: 10,
            lang_param: Some("setlang".to_string()),
            results: "li.b_algo".to_string(),
            url: "h2 a".to_string(),
            title: "h2".to_string(),
            content: Some("p".to_string()),
            ..Default::default()
        },
        EngineConfig {
            name: "brave".to_string(),
            engine: "css".to_string(),
            categories: strings(&["general", "web"]),
            shortcut: "br".to_string(),
            search_url: "https://search.brave.com/search".to_string(),
            extra_params: [("source".to_string(), "web".to_string())].into(),
            page_param: Some("offset".to_string()),
            page_size: 20,
            safesearch_param: Some("safesearch".to_string()),
            safesearch_values: strings(&["off", "moderate", "strict"]),
            time_range_param: Some("tf".to_string()),
            time_range_values: time_ranges("pd", "pw", "pm", "py"),
            results: "div.snippet".to_string(),
            url: "a.result-header".to_string(),
            title: "a.result-header".to_string(),
            content: Some("p.snippet-description".to_string()),
            ..Default::default()
        },
        EngineConfig {
            name: "startpage".to_string(),
            engine: "css".to_string(),
            categories: strings(&["general", "web"]),
            shortcut: "sp".to_string(),
            search_url: "https://www.startpage.com/do/search".to_string(),
            query_param: "query".to_string(),
            page_param: Some("page".to_string()),
            results: ".w-gl__result".to_string(),
            url: "a".to_string(),
            title: ".w-gl__result-title".to_string(),
            content: Some(".w-gl__description".to_string()),
            ..Default::default()
        },
        EngineConfig {
            name: "mojeek".to_string(),
            engine: "css".to_string(),
            categories: strings(&["general", "web"]),
            shortcut: "mjk".to_string(),
            search_url: "https://www.mojeek.com/search".to_string(),
            page_param: Some("s".to_string()),
            page_size: 10,
            safesearch_param: Some("safe".to_string()),
            safesearch_values: strings(&["0", "1", "1"]),
            results: "ul.results-standard > li".to_string(),
            url: "a.ob".to_string(),
            title: "h2 a".to_string(),
            content: Some("p.s".to_string()),
            ..Default::default()
        },
        EngineConfig {
            name: "duckduckgo".to_string(),
            engine: "css".to_string(),
            categories: strings(&["general", "web"]),
            shortcut: "ddg".to_string(),
            method: "POST".to_string(),
            search_url: "https://html.duckduckgo.com/html/".to_string(),
            lang_param: Some("kl".to_string()),
            safesearch_param: Some("kp".to_string()),
            safesearch_values: strings(&["-2", "-1", "1"]),
            results: "div.result".to_string(),
            url: "a.result__a".to_string(),
            title: "a.result__a".to_string(),
            content: Some("a.result__snippet".to_string()),
            ..Default::default()
        },
        EngineConfig {
            name: "wikipedia".to_string(),
            engine: "json".to_string(),
            categories: strings(&["general"]),
            shortcut: "wp".to_string(),
            search_url: "https://en.wikipedia.org/w/api.php".to_string(),
            query_param: "srsearch".to_string(),
            extra_params: [
                ("action".to_string(), "query".to_string()),
                ("list".to_string(), "search".to_string()),
                ("format".to_string(), "json".to_string()),
            ]
            .into(),
            page_param: Some("sroffset".to_string()),
            page_size: 10,
            results: "query.search".to_string(),
            url: "title".to_string(),
            title: "title".to_string(),
            content: Some("snippet".to_string()),
            published_date: Some("timestamp".to_string()),
            url_prefix: Some("https://en.wikipedia.org/wiki/".to_string()),
            ..Default::default()
        },
        EngineConfig {
            name: "github".to_string(),
            engine: "json".to_string(),
            categories: strings(&["it"]),
            shortcut: "gh".to_string(),
            search_url: "https://api.github.com/search/repositories".to_string(),
            page_param: Some("page".to_string()),
            results: "items".to_string(),
            url: "html_url".to_string(),
            title: "full_name".to_string(),
            content: Some("description".to_string()),
            published_date: Some("updated_at".to_string()),
            ..Default::default()
        },
        EngineConfig {
            name: "stackoverflow".to_string(),
            engine: "json".to_string(),
            categories: strings(&["it"]),
            shortcut: "so".to_string(),
            search_url: "https://api.stackexchange.com/2.3/search/advanced".to_string(),
            extra_params: [
                ("site".to_string(), "stackoverflow".to_string()),
                ("order".to_string(), "desc".to_string()),
                ("sort".to_string(), "relevance".to_string()),
            ]
            .into(),
            page_param: Some("page".to_string()),
            results: "items".to_string(),
            url: "link".to_string(),
            title: "title".to_string(),
            published_date: Some("creation_date".to_string()),
            ..Default::default()
        },
        EngineConfig {
            name: "hackernews".to_string(),
            engine: "json".to_string(),
            categories: strings(&["it", "news"]),
            shortcut: "hn".to_string(),
            search_url: "https://hn.algolia.com/api/v1/search".to_string(),
            query_param: "query".to_string(),
            page_param: Some("page".to_string()),
            results: "hits".to_string(),
            url: "url".to_string(),
            title: "title".to_string(),
            published_date: Some("created_at".to_string()),
            ..Default::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8888);
        assert_eq!(settings.outgoing.request_timeout, 2.5);
        assert_eq!(settings.outgoing.max_request_timeout, 6.0);
        assert_eq!(
            settings.search.default_engines,
            vec!["google", "bing", "startpage", "brave"]
        );
        assert!(settings
            .search
            .disabled_engines
            .contains(&"duckduckgo".to_string()));
    }

    #[test]
    fn test_merge_vars_overrides() {
        let mut settings = Settings::default();
        settings.merge_vars(vars(&[
            ("REQUEST_TIMEOUT", "3.5"),
            ("MAX_REQUEST_TIMEOUT", "9"),
            ("DEFAULT_ENGINES", "bing, brave"),
            ("DISABLE_ENGINES", "google,"),
            ("SEARX_FORCE_IPV4", "no"),
            ("SEARXNG_PORT", "7000"),
        ]));

        assert_eq!(settings.outgoing.request_timeout, 3.5);
        assert_eq!(settings.outgoing.max_request_timeout, 9.0);
        assert_eq!(settings.search.default_engines, vec!["bing", "brave"]);
        assert_eq!(settings.search.disabled_engines, vec!["google"]);
        assert!(!settings.outgoing.force_ipv4);
        assert_eq!(settings.server.port, 7000);
    }

    #[test]
    fn test_merge_vars_ignores_garbage_numbers() {
        let mut settings = Settings::default();
        settings.merge_vars(vars(&[("REQUEST_TIMEOUT", "soon")]));
        assert_eq!(settings.outgoing.request_timeout, 2.5);
    }

    #[test]
    fn test_merge_vars_ignores_unusable_timeouts() {
        let mut settings = Settings::default();
        settings.merge_vars(vars(&[
            ("REQUEST_TIMEOUT", "inf"),
            ("MAX_REQUEST_TIMEOUT", "NaN"),
            ("SEARX_OUTGOING_TIMEOUT", "-3"),
        ]));
        assert_eq!(settings.outgoing.request_timeout, 2.5);
        assert_eq!(settings.outgoing.max_request_timeout, 6.0);
        assert_eq!(settings.outgoing.read_timeout, 12.0);
    }

    #[test]
    fn test_timeout_duration_never_panics() {
        assert_eq!(timeout_duration(2.5), Duration::from_millis(2500));
        assert_eq!(timeout_duration(-1.0), Duration::ZERO);
        assert_eq!(timeout_duration(f64::NAN), Duration::ZERO);
        assert_eq!(timeout_duration(f64::INFINITY), Duration::from_secs(3600));
        assert_eq!(timeout_duration(1e300), Duration::from_secs(3600));
    }

    #[test]
    fn test_yaml_sections_default_independently() {
        let yaml = "search:\n  default_engines: [mojeek]\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.search.default_engines, vec!["mojeek"]);
        assert_eq!(settings.search.default_lang, "all");
        assert_eq!(settings.outgoing.read_timeout, 12.0);
        assert!(!settings.engines.is_empty());
    }
}
