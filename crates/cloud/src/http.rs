//! HTTP client wrapper with retry logic.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{CloudError, Result};

/// Timeout and retry settings for [`HttpClient`].
#[derive(Debug, Clone, Copy)]
pub struct HttpOptions {
    /// Per-request timeout (default 60 s).
    pub request_timeout: Duration,
    /// Retries on connect/timeout failures (default 3).
    pub max_retries: u32,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }
}

/// HTTP client for whole-body downloads and JSON calls.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    options: HttpOptions,
}

impl HttpClient {
    pub fn new(options: HttpOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| CloudError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, options })
    }

    /// GET `url` and return the full body.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.execute_with_retry(self.client.get(url)).await?;
        let resp = check_status(resp, url)?;
        let bytes = resp.bytes().await?;
        debug!(url, len = bytes.len(), "downloaded");
        Ok(bytes.to_vec())
    }

    /// POST `body` as JSON and decode the JSON reply.
    ///
    /// Non-success statuses still have their body decoded when it parses,
    /// so services that report failures as JSON can be inspected by the
    /// caller; otherwise the status becomes a network error.
    pub async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let req = self.client.post(url).json(body);
        let resp = self.execute_with_retry(req).await?;
        let status = resp.status();
        let text = resp.text().await?;

        match serde_json::from_str::<R>(&text) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(CloudError::Network(format!(
                "HTTP {} from {}: {}",
                status,
                url,
                text.chars().take(500).collect::<String>()
            ))),
            Err(e) => Err(CloudError::Network(format!("parsing response from {url}: {e}"))),
        }
    }

    /// Send with exponential backoff (100 ms, 200 ms, ...) on connect and
    /// timeout errors. Other errors and any response return immediately.
    async fn execute_with_retry(&self, request: RequestBuilder) -> Result<Response> {
        let mut attempt = 0;
        loop {
            let Some(cloned) = request.try_clone() else {
                return Ok(request.send().await?);
            };

            match cloned.send().await {
                Ok(resp) => return Ok(resp),
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.options.max_retries => {
                    attempt += 1;
                    let backoff = backoff(attempt);
                    warn!(attempt, ?backoff, error = %e, "request failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Delay before retry number `attempt` (1-based), doubling up to 6.4 s.
fn backoff(attempt: u32) -> Duration {
    let doublings = attempt.saturating_sub(1).min(6);
    Duration::from_millis(100 << doublings)
}

fn check_status(resp: Response, url: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(CloudError::Network(format!("HTTP {} fetching {}", status, url)))
    }
}
