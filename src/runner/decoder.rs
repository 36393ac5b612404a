//! @ai:module:intent Turn timestamped stream events into output text and timing
//! @ai:module:layer domain
//! @ai:module:public_api StreamDecoder, DecodedStream, FrameStatus, TimedFrame, decode_frames, DONE_MARKER
//! @ai:module:stateless false

use crate::error::RequestError;
use crate::metrics::StreamTiming;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;

/// Bare terminal payload accepted in addition to `is_last`.
pub const DONE_MARKER: &str = "[DONE]";

/// @ai:intent One event payload as sent by the endpoint
#[derive(Debug, Deserialize)]
struct UnitFrame {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    is_last: bool,
}

/// @ai:intent Whether the decoder still expects events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Continue,
    Finished,
}

/// @ai:intent A raw event payload and the instant it was observed
#[derive(Debug, Clone)]
pub struct TimedFrame {
    pub payload: String,
    pub arrived_at: Instant,
}

/// @ai:intent Fully consumed stream
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedStream {
    /// Content of every unit, concatenated in arrival order.
    pub output: String,
    pub units_out: u64,
    pub timing: StreamTiming,
    /// Events that could not be parsed and were ignored.
    pub skipped_frames: u64,
}

/// @ai:intent Incremental decoder for one streamed response
///
/// Timestamps are supplied by the caller, so decoding the same sequence of
/// `(payload, instant)` pairs always yields the same result.
#[derive(Debug)]
pub struct StreamDecoder {
    dispatched_at: Instant,
    output: String,
    arrivals: Vec<Instant>,
    skipped_frames: u64,
    finished: bool,
}

fn millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

impl StreamDecoder {
    /// @ai:intent Start decoding a response dispatched at `dispatched_at`
    /// @ai:effects pure
    pub fn new(dispatched_at: Instant) -> Self {
        Self {
            dispatched_at,
            output: String::new(),
            arrivals: Vec::new(),
            skipped_frames: 0,
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// @ai:intent Consume one event payload
    /// @ai:edge_cases malformed payloads are skipped; events after the terminal marker are ignored
    /// @ai:effects state:write
    pub fn observe(&mut self, payload: &str, arrived_at: Instant) -> FrameStatus {
        if self.finished {
            return FrameStatus::Finished;
        }

        let payload = payload.trim();

        if payload == DONE_MARKER {
            self.finished = true;
            return FrameStatus::Finished;
        }

        let frame: UnitFrame = match serde_json::from_str(payload) {
            Ok(frame) => frame,
            Err(e) => {
                self.skipped_frames += 1;
                tracing::debug!("Skipping malformed stream event: {}", e);
                return FrameStatus::Continue;
            }
        };

        if let Some(token) = frame.token.filter(|t| !t.is_empty()) {
            self.output.push_str(&token);
            self.arrivals.push(arrived_at);
        }

        if frame.is_last {
            self.finished = true;
            return FrameStatus::Finished;
        }

        FrameStatus::Continue
    }

    /// @ai:intent Derive timing from the recorded arrivals
    /// @ai:effects pure
    fn timing(&self) -> StreamTiming {
        let unit_offsets_ms: Vec<f64> = self
            .arrivals
            .iter()
            .map(|at| millis(at.duration_since(self.dispatched_at)))
            .collect();

        let inter_unit_latencies_ms: Vec<f64> = self
            .arrivals
            .windows(2)
            .map(|pair| millis(pair[1].duration_since(pair[0])))
            .collect();

        let generation_rate = match (self.arrivals.first(), self.arrivals.last()) {
            (Some(first), Some(last)) if self.arrivals.len() > 1 => {
                let span = last.duration_since(*first).as_secs_f64();
                if span > 0.0 {
                    self.arrivals.len() as f64 / span
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };

        StreamTiming {
            ttft_ms: unit_offsets_ms.first().copied().unwrap_or(0.0),
            unit_offsets_ms,
            inter_unit_latencies_ms,
            generation_rate,
        }
    }

    /// @ai:intent Close the decoder once the transport has ended
    /// @ai:post Err(Transport) if no terminal marker was seen
    /// @ai:effects pure
    pub fn finish(self) -> Result<DecodedStream, RequestError> {
        if !self.finished {
            return Err(RequestError::Transport(
                "stream closed before terminal event".to_string(),
            ));
        }

        Ok(DecodedStream {
            timing: self.timing(),
            units_out: self.arrivals.len() as u64,
            output: self.output,
            skipped_frames: self.skipped_frames,
        })
    }
}

/// @ai:intent Decode a complete, already-timestamped event sequence
/// @ai:effects pure
pub fn decode_frames(dispatched_at: Instant, frames: &[TimedFrame]) -> Result<DecodedStream, RequestError> {
    let mut decoder = StreamDecoder::new(dispatched_at);

    for frame in frames {
        if decoder.observe(&frame.payload, frame.arrived_at) == FrameStatus::Finished {
            break;
        }
    }

    decoder.finish()
}
