//! HTTP access to the forecast API.
//!
//! [`HttpClient`] is the transport seam, [`BasicClient`] its `reqwest`
//! implementation, and [`ForecastClient`] adapts any client into a
//! [`ForecastSource`] the fetch stage can drive.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Request, Response};
use serde_json::Value;
use tracing::debug;

use crate::tasks::fetching::ForecastSource;

/// Executes a prepared request.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// Plain `reqwest` client without authentication.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    /// Builds a client that gives up on connecting after `connect_timeout`.
    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self(inner))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.0.execute(req).await
    }
}

/// GETs `url` and decodes the body as JSON.
///
/// # Errors
///
/// Fails on an invalid URL, a transport error or timeout, a non-success
/// status, or a body that is not JSON.
pub async fn fetch_json<C: HttpClient>(client: &C, url: &str, timeout: Duration) -> Result<Value> {
    let mut req = Request::new(
        reqwest::Method::GET,
        url.parse().with_context(|| format!("Invalid forecast URL '{url}'"))?,
    );
    *req.timeout_mut() = Some(timeout);

    let resp = client
        .execute(req)
        .await
        .with_context(|| format!("Request to {url} failed"))?
        .error_for_status()
        .with_context(|| format!("Request to {url} returned an error status"))?;

    let body = resp
        .bytes()
        .await
        .with_context(|| format!("Failed to read body from {url}"))?;
    debug!(url, bytes = body.len(), "Forecast body received");

    serde_json::from_slice(&body).with_context(|| format!("Malformed JSON from {url}"))
}

/// Fetches raw forecast JSON through an [`HttpClient`].
pub struct ForecastClient<C> {
    client: C,
}

impl<C: HttpClient> ForecastClient<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: HttpClient + 'static> ForecastSource for ForecastClient<C> {
    type Payload = Value;

    async fn fetch(&self, target: &str, timeout: Duration) -> Result<Value> {
        fetch_json(&self.client, target, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unreachable;

    #[async_trait]
    impl HttpClient for Unreachable {
        async fn execute(&self, _req: Request) -> reqwest::Result<Response> {
            unreachable!("request must not be issued for an invalid URL")
        }
    }

    #[tokio::test]
    async fn test_fetch_json_rejects_invalid_url() {
        let result = fetch_json(&Unreachable, "not a url", Duration::from_secs(1)).await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid forecast URL"));
    }

    #[test]
    fn test_basic_client_with_connect_timeout_builds() {
        assert!(BasicClient::with_connect_timeout(Duration::from_secs(3)).is_ok());
    }
}
