//! @ai:module:intent Issue one request and measure it
//! @ai:module:layer application
//! @ai:module:public_api RequestExecutor
//! @ai:module:stateless true

use crate::config::{SamplingConfig, WorkloadSpec};
use crate::error::RequestError;
use crate::metrics::{FailureOutcome, RequestOutcome, SuccessDetail, SuccessOutcome};
use crate::runner::client::{EndpointClient, InferRequest};
use crate::runner::decoder::{DecodedStream, FrameStatus, StreamDecoder};
use crate::runner::sse::SseLineBuffer;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_nanos() as f64 / 1_000_000.0
}

/// @ai:intent Executes requests against one endpoint; every call yields an outcome
pub struct RequestExecutor<C: EndpointClient> {
    client: Arc<C>,
    sampling: SamplingConfig,
    timeout: Duration,
}

impl<C: EndpointClient> RequestExecutor<C> {
    /// @ai:intent Create an executor with a per-request timeout
    /// @ai:effects pure
    pub fn new(client: Arc<C>, sampling: SamplingConfig, timeout: Duration) -> Self {
        Self {
            client,
            sampling,
            timeout,
        }
    }

    pub fn client(&self) -> Arc<C> {
        Arc::clone(&self.client)
    }

    /// @ai:intent Build the request body for a prompt
    /// @ai:effects pure
    pub fn build_request(&self, prompt: &str, max_tokens: u32, stream: bool) -> InferRequest {
        InferRequest {
            prompt: prompt.to_string(),
            max_tokens,
            temperature: self.sampling.temperature,
            top_p: self.sampling.top_p,
            stream,
        }
    }

    fn timed_out(&self) -> RequestError {
        RequestError::Transport(format!("Request timed out after {:?}", self.timeout))
    }

    /// @ai:intent Execute a prompt in the mode the workload asks for
    /// @ai:effects network, time
    pub async fn execute(&self, id: u64, prompt: &str, spec: &WorkloadSpec) -> RequestOutcome {
        let request = self.build_request(prompt, spec.gen_tokens, spec.stream);

        if spec.stream {
            self.execute_streaming(id, &request).await
        } else {
            self.execute_atomic(id, &request).await
        }
    }

    /// @ai:intent Send a request and wait for the whole response
    /// @ai:post latency covers send to response body parsed
    /// @ai:effects network, time
    pub async fn execute_atomic(&self, id: u64, request: &InferRequest) -> RequestOutcome {
        let start = Instant::now();

        let result = tokio::time::timeout(self.timeout, self.client.infer(request))
            .await
            .unwrap_or_else(|_| Err(self.timed_out()));

        let latency_ms = elapsed_ms(start);

        match result {
            Ok(response) => RequestOutcome::Success(SuccessOutcome {
                id,
                latency_ms,
                units_in: response.tokens_in,
                units_out: response.tokens_out,
                detail: SuccessDetail::Atomic {
                    server_latency_ms: response.latency_ms,
                },
                evaluation: None,
                output: response.output,
            }),
            Err(e) => {
                tracing::warn!("Request {} failed: {}", id, e);
                RequestOutcome::Failure(FailureOutcome::from_error(id, latency_ms, &e, false))
            }
        }
    }

    /// @ai:intent Send a request and consume its event stream to the terminal marker
    /// @ai:post latency covers send to terminal event; units_in is the prompt word count
    /// @ai:effects network, time
    pub async fn execute_streaming(&self, id: u64, request: &InferRequest) -> RequestOutcome {
        let start = Instant::now();

        let result = tokio::time::timeout(self.timeout, self.consume_stream(request, start))
            .await
            .unwrap_or_else(|_| Err(self.timed_out()));

        let latency_ms = elapsed_ms(start);

        match result {
            Ok(decoded) => {
                if decoded.skipped_frames > 0 {
                    tracing::debug!("Request {} skipped {} malformed events", id, decoded.skipped_frames);
                }

                RequestOutcome::Success(SuccessOutcome {
                    id,
                    latency_ms,
                    units_in: request.prompt.split_whitespace().count() as u64,
                    units_out: decoded.units_out,
                    detail: SuccessDetail::Streamed(decoded.timing),
                    evaluation: None,
                    output: decoded.output,
                })
            }
            Err(e) => {
                tracing::warn!("Streaming request {} failed: {}", id, e);
                RequestOutcome::Failure(FailureOutcome::from_error(id, latency_ms, &e, true))
            }
        }
    }

    /// @ai:intent Read chunks, split them into events and feed the decoder
    /// @ai:effects network, time
    async fn consume_stream(
        &self,
        request: &InferRequest,
        dispatched_at: Instant,
    ) -> Result<DecodedStream, RequestError> {
        let mut chunks = self.client.infer_stream(request).await?;
        let mut lines = SseLineBuffer::new();
        let mut decoder = StreamDecoder::new(dispatched_at);

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            let arrived_at = Instant::now();

            for payload in lines.feed(&chunk)? {
                if decoder.observe(&payload, arrived_at) == FrameStatus::Finished {
                    return decoder.finish();
                }
            }
        }

        if let Some(payload) = lines.finish() {
            decoder.observe(&payload, Instant::now());
        }

        decoder.finish()
    }
}
