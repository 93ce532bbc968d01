//! HTTP fetcher implementation
//!
//! This module handles all page requests for the agent, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Content-Type checks and HTML rendering
//! - Error classification

use crate::config::UserAgentConfig;
use crate::crawler::render::render_html;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by a page fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Unsupported content type '{content_type}' for {url}")]
    ContentMismatch { url: String, content_type: String },
}

/// Retrieves the text of one page
///
/// Implementations return plain text in which links survive as
/// `[label](href)`, so the link extractor and the oracle see the same thing.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total timeout for one request
///
/// # Example
///
/// ```no_run
/// use prospector::config::UserAgentConfig;
/// use prospector::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "Prospector".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by reqwest
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config, Duration::from_secs(30))?))
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    /// Fetches a URL and renders it to text
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx HTML | Rendered text |
    /// | 2xx text/plain, markdown | Body as-is |
    /// | 2xx other type | ContentMismatch |
    /// | non-2xx | Http |
    /// | Timeout | Timeout |
    /// | Connection or body error | Network |
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();

        let is_html = content_type.contains("text/html") || content_type.contains("xhtml");
        let is_text = content_type.contains("text/plain") || content_type.contains("markdown");

        if !is_html && !is_text {
            return Err(FetchError::ContentMismatch {
                url: url.to_string(),
                content_type,
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if is_html {
            Ok(render_html(&body))
        } else {
            Ok(body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestAgent".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::from_config(&create_test_config()).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        let client = build_http_client(&config, Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_renders_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"<html><body><p>Write to kontakt@example.org</p><a href="/about">About us</a></body></html>"#,
                "text/html; charset=utf-8",
            ))
            .mount(&server)
            .await;

        let text = fetcher().fetch(&format!("{}/", server.uri())).await.unwrap();
        assert!(text.contains("kontakt@example.org"));
        assert!(text.contains("[About us](/about)"));
    }

    #[tokio::test]
    async fn test_fetch_plain_text_as_is() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notes.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("plain <b>text</b>", "text/plain"))
            .mount(&server)
            .await;

        let text = fetcher()
            .fetch(&format!("{}/notes.txt", server.uri()))
            .await
            .unwrap();
        assert_eq!(text, "plain <b>text</b>");
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = fetcher().fetch(&format!("{}/missing", server.uri())).await;
        assert!(matches!(result, Err(FetchError::Http { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_fetch_rejects_binary_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8, 1, 2], "application/pdf"))
            .mount(&server)
            .await;

        let result = fetcher().fetch(&format!("{}/doc.pdf", server.uri())).await;
        assert!(matches!(result, Err(FetchError::ContentMismatch { .. })));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host() {
        let result = fetcher().fetch("http://127.0.0.1:9/").await;
        assert!(matches!(
            result,
            Err(FetchError::Network { .. }) | Err(FetchError::Timeout(_))
        ));
    }
}
