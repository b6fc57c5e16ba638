// crates/network/src/client.rs
//! HTTP client wrapper

use crate::error::{NetworkError, NetworkResult};
use reqwest::header::RANGE;
use reqwest::Client as ReqwestClient;
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Maximum redirects to follow
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("Taleshelf/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

/// Thin HTTP client for reading the start of remote audio files
#[derive(Debug, Clone)]
pub struct Client {
    inner: ReqwestClient,
    config: ClientConfig,
}

impl Client {
    /// Creates a new client with default configuration
    pub fn new() -> NetworkResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> NetworkResult<Self> {
        let inner = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(NetworkError::Http)?;

        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetches at most `max_bytes` from the start of `url`
    ///
    /// Asks for a byte range; servers that ignore it and send the whole body
    /// are cut off after `max_bytes`.
    pub async fn get_prefix(&self, url: &str, max_bytes: u64) -> NetworkResult<Vec<u8>> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(NetworkError::InvalidUrl(url.to_string()));
        }
        if max_bytes == 0 {
            return Ok(Vec::new());
        }

        let mut response = self
            .inner
            .get(url)
            .header(RANGE, range_header(max_bytes))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let limit = usize::try_from(max_bytes).unwrap_or(usize::MAX);
        let mut body = Vec::with_capacity(limit.min(1024 * 1024));

        while let Some(chunk) = response.chunk().await? {
            let room = limit - body.len();
            body.extend_from_slice(&chunk[..chunk.len().min(room)]);
            if body.len() >= limit {
                break;
            }
        }

        log::debug!("Fetched {} header bytes from {}", body.len(), url);
        Ok(body)
    }
}

fn range_header(max_bytes: u64) -> String {
    format!("bytes=0-{}", max_bytes.saturating_sub(1))
}
