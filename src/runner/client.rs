//! @ai:module:intent HTTP client for inference endpoints
//! @ai:module:layer infrastructure
//! @ai:module:public_api EndpointClient, HttpEndpointClient, MockEndpointClient, InferRequest, InferResponse, FrameStream
//! @ai:module:stateless false

use crate::error::RequestError;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw body chunks of a streamed response.
pub type FrameStream = BoxStream<'static, Result<Bytes, RequestError>>;

/// @ai:intent Request body posted to `{endpoint}/infer`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub stream: bool,
}

/// @ai:intent Body of a non-streamed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferResponse {
    pub output: String,
    /// Server-reported processing time, if the server sends one.
    #[serde(default)]
    pub latency_ms: Option<u64>,
    #[serde(default)]
    pub tokens_in: u64,
    #[serde(default)]
    pub tokens_out: u64,
}

/// @ai:intent Trait for an inference endpoint
#[allow(async_fn_in_trait)]
pub trait EndpointClient: Send + Sync {
    /// @ai:intent Send a request and wait for the complete response
    async fn infer(&self, request: &InferRequest) -> Result<InferResponse, RequestError>;

    /// @ai:intent Send a request and return its body as a chunk stream
    async fn infer_stream(&self, request: &InferRequest) -> Result<FrameStream, RequestError>;
}

/// @ai:intent Client for endpoints speaking the `/infer` JSON + SSE protocol
pub struct HttpEndpointClient {
    client: reqwest::Client,
    infer_url: String,
}

impl HttpEndpointClient {
    /// @ai:intent Create a client for the endpoint rooted at `base_url`
    /// @ai:effects pure
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            infer_url: format!("{}/infer", base_url.trim_end_matches('/')),
        })
    }

    pub fn infer_url(&self) -> &str {
        &self.infer_url
    }

    /// @ai:intent POST the request and turn non-2xx statuses into server errors
    /// @ai:effects network
    async fn post(&self, request: &InferRequest) -> Result<reqwest::Response, RequestError> {
        let response = self
            .client
            .post(&self.infer_url)
            .json(request)
            .send()
            .await
            .map_err(|e| RequestError::Transport(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RequestError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

impl EndpointClient for HttpEndpointClient {
    /// @ai:effects network
    async fn infer(&self, request: &InferRequest) -> Result<InferResponse, RequestError> {
        let response = self.post(request).await?;

        response
            .json::<InferResponse>()
            .await
            .map_err(|e| RequestError::Transport(format!("Invalid response body: {}", e)))
    }

    /// @ai:effects network
    async fn infer_stream(&self, request: &InferRequest) -> Result<FrameStream, RequestError> {
        let response = self.post(request).await?;

        let chunks = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| {
                if e.is_timeout() {
                    RequestError::Transport(format!("Stream timed out: {}", e))
                } else {
                    RequestError::Decode(format!("Stream aborted: {}", e))
                }
            })
        });

        Ok(chunks.boxed())
    }
}

/// @ai:intent Mock endpoint for dry runs and tests
///
/// Answers every request with the same text, one whitespace-separated word
/// per streamed unit.
pub struct MockEndpointClient {
    output: String,
    latency: Duration,
    unit_delay: Duration,
}

impl MockEndpointClient {
    /// @ai:intent Create a mock endpoint that returns a fixed response
    /// @ai:effects pure
    pub fn new(output: &str) -> Self {
        Self {
            output: output.to_string(),
            latency: Duration::ZERO,
            unit_delay: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_unit_delay(mut self, unit_delay: Duration) -> Self {
        self.unit_delay = unit_delay;
        self
    }

    /// @ai:intent Render the fixed output as SSE events
    /// @ai:effects pure
    fn events(&self) -> Vec<Bytes> {
        let words: Vec<&str> = self.output.split_whitespace().collect();
        let mut events: Vec<Bytes> = words
            .iter()
            .enumerate()
            .map(|(index, word)| {
                let token = if index == 0 {
                    word.to_string()
                } else {
                    format!(" {}", word)
                };
                let payload = serde_json::json!({ "token": token, "index": index, "is_last": false });
                Bytes::from(format!("data: {}\n\n", payload))
            })
            .collect();

        let terminal = serde_json::json!({ "token": "", "index": words.len(), "is_last": true });
        events.push(Bytes::from(format!("data: {}\n\n", terminal)));
        events
    }
}

impl EndpointClient for MockEndpointClient {
    /// @ai:effects time
    async fn infer(&self, request: &InferRequest) -> Result<InferResponse, RequestError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        Ok(InferResponse {
            output: self.output.clone(),
            latency_ms: Some(self.latency.as_millis() as u64),
            tokens_in: request.prompt.split_whitespace().count() as u64,
            tokens_out: self.output.split_whitespace().count() as u64,
        })
    }

    /// @ai:effects time
    async fn infer_stream(&self, _request: &InferRequest) -> Result<FrameStream, RequestError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let delay = self.unit_delay;
        let events = futures::stream::iter(self.events()).then(move |event| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok(event)
        });

        Ok(events.boxed())
    }
}
