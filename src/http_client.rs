use crate::error::{EtlError, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Shared HTTP client for all source adapters.
///
/// Every failure mode (transport, non-2xx status, undecodable body) surfaces as
/// `EtlError::SourceUnavailable` tagged with the calling source.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    pub async fn get_json<Q: Serialize + ?Sized>(
        &self,
        source: &str,
        url: &str,
        query: &Q,
    ) -> Result<Value> {
        info!("HTTP GET request to: {}", url);
        let request = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .query(query);
        self.send(source, request).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        source: &str,
        url: &str,
        body: &B,
    ) -> Result<Value> {
        info!("HTTP POST request to: {}", url);
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(body);
        self.send(source, request).await
    }

    async fn send(&self, source: &str, request: reqwest::RequestBuilder) -> Result<Value> {
        let started = Instant::now();
        let resp = request
            .send()
            .await
            .map_err(|e| EtlError::unavailable(source, format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(EtlError::unavailable(
                source,
                format!("unexpected status {}", status.as_u16()),
            ));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| EtlError::unavailable(source, format!("failed reading body: {e}")))?;
        debug!(
            "HTTP response: status={}, size={} bytes, elapsed={:.2}s",
            status.as_u16(),
            bytes.len(),
            started.elapsed().as_secs_f64()
        );
        metrics::histogram!("funding_fetch_duration_seconds", "source" => source.to_string())
            .record(started.elapsed().as_secs_f64());

        serde_json::from_slice(&bytes)
            .map_err(|e| EtlError::unavailable(source, format!("malformed JSON payload: {e}")))
    }
}
