//! Plain HTTP fetcher.
//!
//! Fetches exactly the URL it is given and classifies every failure into a
//! `StageErrorKind` so the controller knows what is worth retrying.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{StageError, StageErrorKind, StageResult};
use crate::traits::fetcher::{FetchCapability, SourceFetcher};
use crate::types::content::RawContent;

pub const DEFAULT_USER_AGENT: &str = "MissionFlowBot/1.0";

/// HTTP fetcher backed by `reqwest`.
///
/// # Example
///
/// ```rust,ignore
/// let fetcher = HttpFetcher::new()
///     .with_user_agent("ResearchBot/2.0")
///     .with_timeout(Duration::from_secs(10));
/// let raw = fetcher.fetch("https://example.com").await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
    timeout: Duration,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Use a preconfigured client (proxies, TLS, connection pools).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Per-request timeout. Exceeding it is a `NetworkTimeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch one page without any link following.
    pub(crate) async fn fetch_page(&self, url: &str) -> StageResult<RawContent> {
        debug!(url = %url, "HTTP fetch starting");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                classify_transport(&e)
            })?;

        let status = response.status();
        if let Some(kind) = classify_status(status) {
            return Err(StageError::new(kind, format!("HTTP {status} from {url}")));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !is_textual(ct) {
                return Err(StageError::permanent(format!(
                    "unsupported content type {ct} from {url}"
                )));
            }
        }

        let mut raw = RawContent::new(url, String::new())
            .with_metadata("http_status", status.as_u16().to_string());
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                raw.metadata
                    .insert(format!("http_{}", name.as_str()), value.to_string());
            }
        }

        raw.body = response.text().await.map_err(|e| classify_transport(&e))?;
        raw.fetched_at = Utc::now();
        if final_url != url {
            raw.final_url = Some(final_url);
        }
        if let Some(ct) = content_type {
            raw.content_type = Some(ct);
        }

        debug!(url = %url, bytes = raw.body.len(), "HTTP fetch finished");
        Ok(raw)
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> StageResult<RawContent> {
        self.fetch_page(url).await
    }

    fn capability(&self) -> FetchCapability {
        FetchCapability::Direct
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Map an HTTP status to a failure kind. `None` means success.
pub fn classify_status(status: StatusCode) -> Option<StageErrorKind> {
    if status.is_success() {
        return None;
    }
    match status.as_u16() {
        408 | 425 | 429 => Some(StageErrorKind::TemporaryServerError),
        500..=599 => Some(StageErrorKind::TemporaryServerError),
        _ => Some(StageErrorKind::PermanentError),
    }
}

/// Map a transport error to a stage error.
fn classify_transport(error: &reqwest::Error) -> StageError {
    if error.is_timeout() || error.is_connect() || error.is_body() {
        StageError::network_timeout(error.to_string())
    } else if let Some(status) = error.status() {
        StageError::new(
            classify_status(status).unwrap_or(StageErrorKind::PermanentError),
            error.to_string(),
        )
    } else if error.is_request() {
        // Reset mid-request, DNS hiccup
        StageError::network_timeout(error.to_string())
    } else {
        StageError::permanent(error.to_string())
    }
}

/// Whether a content type is something an extractor can turn into text.
fn is_textual(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.starts_with("text/")
        || mime == "application/xhtml+xml"
        || mime == "application/xml"
        || mime == "application/json"
        || mime.ends_with("+xml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::OK), None);
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            Some(StageErrorKind::TemporaryServerError)
        );
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            Some(StageErrorKind::TemporaryServerError)
        );
        assert_eq!(
            classify_status(StatusCode::REQUEST_TIMEOUT),
            Some(StageErrorKind::TemporaryServerError)
        );
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND),
            Some(StageErrorKind::PermanentError)
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN),
            Some(StageErrorKind::PermanentError)
        );
    }

    #[test]
    fn test_textual_content_types() {
        assert!(is_textual("text/html; charset=utf-8"));
        assert!(is_textual("application/xhtml+xml"));
        assert!(is_textual("application/rss+xml"));
        assert!(!is_textual("application/pdf"));
        assert!(!is_textual("image/png"));
    }

    #[test]
    fn test_defaults() {
        let fetcher = HttpFetcher::new().with_user_agent("TestBot/0.1");
        assert_eq!(fetcher.user_agent, "TestBot/0.1");
        assert_eq!(fetcher.capability(), FetchCapability::Direct);
        assert_eq!(fetcher.name(), "http");
    }
}
