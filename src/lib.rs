//! @ai:module:intent Paced load generation and latency measurement library
//! @ai:module:layer application
//! @ai:module:public_api config, corpus, error, evaluator, metrics, profiling, report, runner

pub mod config;
pub mod corpus;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod profiling;
pub mod report;
pub mod runner;

pub use config::{BenchmarkConfig, WorkloadSpec};
pub use corpus::{CorpusLoader, PromptSource, ReferenceLookup};
pub use error::{ConfigError, ErrorKind, RequestError};
pub use evaluator::{Evaluator, OverlapEvaluator};
pub use metrics::{summarize, BenchmarkResults, MetricsAggregator, RunResult, Summary};
pub use report::ReportGenerator;
pub use runner::{run_workload, EndpointClient, HttpEndpointClient, RequestExecutor, WorkloadDriver};
