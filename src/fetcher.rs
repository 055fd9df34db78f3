//! The HTTP seam used by link discovery.

use crate::config::Config;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue};
use url::Url;

/// A fetched HTML document.
#[derive(Debug, Clone)]
pub(crate) struct FetchedPage {
    /// The URL after redirects.
    pub final_url: Url,
    pub body: String,
}

#[async_trait]
pub(crate) trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage>;
}

/// `reqwest`-backed fetcher with the configured user agent and timeout.
#[derive(Debug, Clone)]
pub(crate) struct HttpFetcher {
    http_client: Client,
}

impl HttpFetcher {
    pub(crate) fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let accept_language = HeaderValue::from_str(&config.accept_language).map_err(|e| {
            AppError::Config(format!("Invalid Accept-Language '{}': {}", config.accept_language, e))
        })?;
        headers.insert(ACCEPT_LANGUAGE, accept_language);

        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Generic(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        tracing::debug!(target: "discover_task", "Attempting to GET: {}", url);
        let response = self.http_client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|val| val.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        if !is_html_content_type(&content_type) {
            tracing::debug!(target: "discover_task", "Skipping non-HTML content at {} ({})", url, content_type);
            return Err(AppError::NotHtml {
                content_type,
                url: url.to_string(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await?;
        Ok(FetchedPage { final_url, body })
    }
}

/// A missing Content-Type is given the benefit of the doubt.
fn is_html_content_type(content_type: &str) -> bool {
    content_type.is_empty() || content_type.contains("html")
}
