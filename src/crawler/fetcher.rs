//! HTTP fetcher
//!
//! One bounded GET per page: redirects are followed up to the configured
//! limit, the whole request is under a single timeout, and compressed
//! bodies are negotiated transparently. Certificate validation is
//! disabled on purpose: the crawler must be able to audit sites behind
//! self-signed or misconfigured TLS.

use crate::config::CrawlerConfig;
use reqwest::{redirect::Policy, Client};
use std::time::{Duration, Instant};
use thiserror::Error;

/// A completed page fetch
#[derive(Debug, Clone)]
pub struct PageFetch {
    /// HTTP status code of the final response
    pub status_code: u16,
    /// Content-Type header of the final response
    pub content_type: Option<String>,
    /// Raw response headers, one `name: value` per line
    pub headers: String,
    /// Response body
    pub body: String,
    /// Body size in bytes
    pub page_size: i64,
    /// Total elapsed time in milliseconds
    pub load_time_ms: i64,
    /// Final URL when the request was redirected away from the original
    pub redirect_url: Option<String>,
}

impl PageFetch {
    /// Returns true for a 200 response carrying HTML
    pub fn is_ok_html(&self) -> bool {
        self.status_code == 200
            && self
                .content_type
                .as_deref()
                .map(|ct| ct.contains("text/html"))
                .unwrap_or(false)
    }
}

/// Transport-level fetch failure; the page is skipped, the crawl goes on
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("redirect limit exceeded")]
    RedirectLimit,

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_redirect() {
            Self::RedirectLimit
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Builds the HTTP client used for all of a run's requests
pub fn build_http_client(config: &CrawlerConfig, user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.to_string())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(config.max_redirects as usize))
        .danger_accept_invalid_certs(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs one GET and captures timing, size and redirect information
pub async fn fetch_url(client: &Client, url: &str) -> Result<PageFetch, FetchError> {
    let started = Instant::now();

    let response = client.get(url).send().await?;

    let status_code = response.status().as_u16();
    let final_url = response.url().to_string();

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("")))
        .collect::<Vec<_>>()
        .join("\n");

    let body = response.text().await?;
    let load_time_ms = started.elapsed().as_millis() as i64;

    let redirect_url = if final_url != url {
        Some(final_url)
    } else {
        None
    };

    Ok(PageFetch {
        status_code,
        content_type,
        headers,
        page_size: body.len() as i64,
        body,
        load_time_ms,
        redirect_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let config = CrawlerConfig::default();
        assert!(build_http_client(&config, "SitescopeBot/0.3").is_ok());
    }

    #[test]
    fn test_is_ok_html() {
        let fetch = PageFetch {
            status_code: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            headers: String::new(),
            body: String::new(),
            page_size: 0,
            load_time_ms: 0,
            redirect_url: None,
        };
        assert!(fetch.is_ok_html());

        let not_html = PageFetch {
            content_type: Some("application/json".to_string()),
            ..fetch.clone()
        };
        assert!(!not_html.is_ok_html());

        let not_ok = PageFetch {
            status_code: 404,
            ..fetch
        };
        assert!(!not_ok.is_ok_html());
    }
}
