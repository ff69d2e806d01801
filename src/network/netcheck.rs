//! Outbound connectivity diagnostic

use super::client::HttpClient;
use crate::engines::EngineRequest;
use serde::Serialize;
use std::time::Duration;
use tokio::net::lookup_host;

const DNS_HOST: &str = "duckduckgo.com";
const TRACE_URL: &str = "https://1.1.1.1/cdn-cgi/trace";
const SEARCH_URL: &str = "https://duckduckgo.com/?q=hello";

/// What the process can reach.
///
/// Failures are reported as strings, never raised.
#[derive(Debug, Default, Serialize)]
pub struct NetReport {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dns_a: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_a_error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dns_aaaa: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_aaaa_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_trace: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_search: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_error: Option<String>,
}

/// Check DNS resolution and HTTP reachability of the usual upstreams
pub async fn connectivity_report(client: &HttpClient) -> NetReport {
    check(client, DNS_HOST, TRACE_URL, SEARCH_URL).await
}

pub(crate) async fn check(
    client: &HttpClient,
    host: &str,
    trace_url: &str,
    search_url: &str,
) -> NetReport {
    let mut report = NetReport::default();

    match lookup_host((host, 443)).await {
        Ok(addrs) => {
            for addr in addrs {
                let ip = addr.ip();
                if ip.is_ipv4() {
                    report.dns_a.push(ip.to_string());
                } else {
                    report.dns_aaaa.push(ip.to_string());
                }
            }
            if report.dns_a.is_empty() {
                report.dns_a_error = Some(format!("no A record for {host}"));
            }
            if report.dns_aaaa.is_empty() {
                report.dns_aaaa_error = Some(format!("no AAAA record for {host}"));
            }
        }
        Err(e) => {
            report.dns_a_error = Some(e.to_string());
            report.dns_aaaa_error = Some(e.to_string());
        }
    }

    let trace = client
        .execute_with_timeout(EngineRequest::get(trace_url), Duration::from_secs(5))
        .await;
    match trace {
        Ok(response) => {
            report.http_trace = Some(response.status);
            let search = client
                .execute_with_timeout(EngineRequest::get(search_url), Duration::from_secs(10))
                .await;
            match search {
                Ok(response) => report.http_search = Some(response.status),
                Err(e) => report.http_error = Some(e.to_string()),
            }
        }
        Err(e) => report.http_error = Some(e.to_string()),
    }

    report
}
