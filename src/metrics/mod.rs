//! @ai:module:intent Outcome records and their statistical aggregation
//! @ai:module:layer application
//! @ai:module:public_api RequestOutcome, RunResult, Summary, BenchmarkResults, MetricsAggregator

pub mod aggregator;
pub mod types;

pub use aggregator::{
    median, min_samples_for, percentile, summarize, MetricsAggregator, MetricsAggregatorTrait,
};
pub use types::{
    BenchmarkResults, EvaluationScores, FailureOutcome, RequestOutcome, RunRecorder, RunResult,
    StreamTiming, StreamingSummary, SuccessDetail, SuccessOutcome, Summary, WorkloadReport,
};
