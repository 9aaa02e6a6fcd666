//! OpenAI-compatible embedding client.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Embedder;

/// Blocking embeddings client that talks to OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    max_retries: usize,
    batch_size: usize,
}

/// Connection settings for [`OpenAiEmbedder`].
#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    /// Bearer token.
    pub api_key: String,
    /// API base, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Embedding model identifier.
    pub model: String,
    /// Optional output dimension override.
    pub dimensions: Option<usize>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Attempts for transient failures (at least one).
    pub max_retries: usize,
    /// Max inputs per request.
    pub batch_size: usize,
}

impl OpenAiEmbedder {
    /// Builds a new OpenAI embeddings client.
    pub fn new(settings: EmbeddingSettings) -> Result<Self> {
        anyhow::ensure!(!settings.api_key.trim().is_empty(), "missing OpenAI API key");
        anyhow::ensure!(!settings.model.trim().is_empty(), "missing OpenAI model name");
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = format!("Bearer {}", settings.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).context("invalid OpenAI API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(settings.timeout)
            .default_headers(headers)
            .build()
            .context("failed to build OpenAI HTTP client")?;
        let endpoint = format!("{}/embeddings", settings.base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            model: settings.model,
            dimensions: settings.dimensions,
            max_retries: settings.max_retries.max(1),
            batch_size: settings.batch_size.max(1),
        })
    }

    /// Model identifier used for every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn should_retry(&self, status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn is_retryable_error(&self, err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect() || err.is_body() || err.is_request()
    }

    fn retry_backoff(&self, attempt: usize) -> Duration {
        let capped = attempt.min(5) as u32;
        Duration::from_millis(500 * (1 << capped))
    }
}

impl Embedder for OpenAiEmbedder {
    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        anyhow::ensure!(
            inputs.len() <= self.batch_size,
            "batch of {} exceeds configured max {}",
            inputs.len(),
            self.batch_size
        );

        let mut attempt = 0usize;
        loop {
            let request = EmbeddingRequest {
                model: &self.model,
                input: inputs,
                dimensions: self.dimensions,
            };
            let response = self.client.post(&self.endpoint).json(&request).send();
            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let mut parsed: EmbeddingResponse = resp
                            .json()
                            .context("failed to parse OpenAI embedding response")?;
                        parsed.data.sort_by_key(|entry| entry.index);
                        anyhow::ensure!(
                            parsed.data.len() == inputs.len(),
                            "OpenAI returned {} embeddings for {} inputs",
                            parsed.data.len(),
                            inputs.len()
                        );
                        return Ok(parsed
                            .data
                            .into_iter()
                            .map(|entry| entry.embedding)
                            .collect());
                    }

                    let body = resp
                        .text()
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if self.should_retry(status) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        warn!(%status, attempt, "embedding request rejected, retrying");
                        thread::sleep(self.retry_backoff(attempt));
                        continue;
                    }
                    anyhow::bail!("OpenAI embeddings request failed ({}): {}", status, body);
                }
                Err(err) => {
                    if self.is_retryable_error(&err) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        warn!(error = %err, attempt, "embedding request failed, retrying");
                        thread::sleep(self.retry_backoff(attempt));
                        continue;
                    }
                    return Err(err).context("OpenAI embeddings request failed");
                }
            }
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    #[serde(borrow)]
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EmbeddingSettings {
        EmbeddingSettings {
            api_key: "sk-test".to_string(),
            base_url: "http://127.0.0.1:9/v1/".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
            timeout: Duration::from_secs(1),
            max_retries: 0,
            batch_size: 0,
        }
    }

    #[test]
    fn rejects_blank_credentials() {
        let mut blank = settings();
        blank.api_key = "  ".to_string();
        assert!(OpenAiEmbedder::new(blank).is_err());
    }

    #[test]
    fn clamps_limits_and_trims_endpoint() {
        let embedder = OpenAiEmbedder::new(settings()).expect("client");
        assert_eq!(embedder.batch_size(), 1);
        assert_eq!(embedder.max_retries, 1);
        assert_eq!(embedder.endpoint, "http://127.0.0.1:9/v1/embeddings");
    }

    #[test]
    fn empty_batch_skips_network() {
        let embedder = OpenAiEmbedder::new(settings()).expect("client");
        let out = embedder.embed_batch(&[]).expect("empty batch");
        assert!(out.is_empty());
    }

    #[test]
    fn oversized_batch_rejected() {
        let embedder = OpenAiEmbedder::new(settings()).expect("client");
        assert!(embedder.embed_batch(&["a", "b"]).is_err());
    }

    #[test]
    fn request_omits_missing_dimensions() {
        let inputs = ["Doctor"];
        let body = serde_json::to_value(EmbeddingRequest {
            model: "m",
            input: &inputs,
            dimensions: None,
        })
        .expect("serialize");
        assert_eq!(body, serde_json::json!({"model": "m", "input": ["Doctor"]}));
    }
}
