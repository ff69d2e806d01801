//! HTTP client shared by the engines and the fallback sources

use super::user_agent::{accept_html, accept_language, generate_user_agent};
use crate::config::{timeout_duration, OutgoingSettings};
use crate::engines::{EngineRequest, EngineResponse, HttpMethod, RequestBody};
use anyhow::Result;
use rand::Rng;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tracing::debug;

/// HTTP client wrapper carrying the outgoing-request policy
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    read_timeout: Duration,
    user_agent: String,
    jitter_ms: u64,
    retries: u32,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let read_timeout = timeout_duration(settings.read_timeout);
        let mut builder = Client::builder()
            .timeout(read_timeout)
            .connect_timeout(timeout_duration(settings.connect_timeout))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        if settings.force_ipv4 {
            builder = builder.local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            read_timeout,
            user_agent: settings
                .useragent
                .clone()
                .unwrap_or_else(generate_user_agent),
            jitter_ms: settings.jitter_ms,
            retries: settings.retries,
        })
    }

    /// The read timeout every call is bounded by
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Execute a request bounded by the read timeout
    pub async fn execute(&self, request: EngineRequest) -> Result<EngineResponse> {
        self.execute_with_timeout(request, self.read_timeout).await
    }

    /// Execute a request with a custom timeout, never above the read timeout.
    ///
    /// Connection errors are retried; every other failure is returned as-is.
    pub async fn execute_with_timeout(
        &self,
        request: EngineRequest,
        timeout: Duration,
    ) -> Result<EngineResponse> {
        let timeout = timeout.min(self.read_timeout);
        self.jitter().await;

        let mut attempt = 0;
        loop {
            match self.send(&request, timeout).await {
                Err(e) if e.is_connect() && attempt < self.retries => {
                    attempt += 1;
                    debug!("Connection to {} failed, retry {}", request.url, attempt);
                }
                Err(e) => return Err(e.into()),
                Ok(response) => return Self::parse_response(response).await,
            }
        }
    }

    async fn send(
        &self,
        request: &EngineRequest,
        timeout: Duration,
    ) -> std::result::Result<Response, reqwest::Error> {
        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        req_builder = req_builder.timeout(timeout);

        // Defaults first, request-specific headers win
        let mut headers: HashMap<&str, &str> = HashMap::from([
            ("User-Agent", self.user_agent.as_str()),
            ("Accept", accept_html()),
            ("Accept-Encoding", "gzip, deflate, br"),
            ("DNT", "1"),
        ]);
        let language = accept_language("en");
        headers.insert("Accept-Language", &language);
        for (key, value) in &request.headers {
            headers.insert(key.as_str(), value.as_str());
        }
        for (key, value) in headers {
            req_builder = req_builder.header(key, value);
        }

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        if let Some(RequestBody::Form(ref data)) = request.data {
            req_builder = req_builder.form(data);
        }

        req_builder.send().await
    }

    /// Sleep a random amount up to the configured jitter
    async fn jitter(&self) {
        if self.jitter_ms > 0 {
            let delay = rand::thread_rng().gen_range(0..=self.jitter_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    /// Parse response into EngineResponse
    async fn parse_response(response: Response) -> Result<EngineResponse> {
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string(), v.to_string());
            }
        }

        let text = response.text().await?;

        Ok(EngineResponse {
            status,
            headers,
            text,
            url,
        })
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
