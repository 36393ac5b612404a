//! @ai:module:intent Request execution, pacing and workload orchestration
//! @ai:module:layer infrastructure
//! @ai:module:public_api EndpointClient, HttpEndpointClient, RequestExecutor, Pacer, StreamDecoder, RunLoop, WorkloadDriver

pub mod client;
pub mod decoder;
pub mod driver;
pub mod executor;
pub mod pacer;
pub mod run_loop;
pub mod sse;

pub use client::{
    EndpointClient, FrameStream, HttpEndpointClient, InferRequest, InferResponse, MockEndpointClient,
};
pub use decoder::{decode_frames, DecodedStream, FrameStatus, StreamDecoder, TimedFrame, DONE_MARKER};
pub use driver::{Endpoint, WorkloadDriver};
pub use executor::RequestExecutor;
pub use pacer::{Pacer, PacerTrait};
pub use run_loop::{run_workload, EvaluationHooks, RunLoop, RunState};
pub use sse::{SseLineBuffer, MAX_LINE_BYTES};
