//! @ai:module:intent Outcome, run and summary types for benchmark results
//! @ai:module:layer domain
//! @ai:module:public_api RequestOutcome, SuccessOutcome, FailureOutcome, StreamTiming, RunResult, RunRecorder, Summary, StreamingSummary, WorkloadReport, BenchmarkResults
//! @ai:module:stateless true

use crate::config::WorkloadSpec;
use crate::error::{ErrorKind, RequestError};
use crate::profiling::ResourceSeries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metric name to score, as returned by an evaluator.
pub type EvaluationScores = BTreeMap<String, f64>;

/// @ai:intent One dispatched request; immutable once recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestOutcome {
    Success(SuccessOutcome),
    Failure(FailureOutcome),
}

/// @ai:intent Completed request with unit counts and optional scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessOutcome {
    pub id: u64,
    /// Client-measured wall time from dispatch to completion.
    pub latency_ms: f64,
    pub units_in: u64,
    pub units_out: u64,
    pub detail: SuccessDetail,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationScores>,
    /// Generated text, kept in memory for evaluation only.
    #[serde(skip)]
    pub output: String,
}

/// @ai:intent Distinguishes atomic responses from streamed ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SuccessDetail {
    Atomic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        server_latency_ms: Option<u64>,
    },
    Streamed(StreamTiming),
}

/// @ai:intent Intra-response timing derived by the stream decoder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamTiming {
    /// Zero when no content arrived before the terminal marker.
    pub ttft_ms: f64,
    /// Arrival of each content-bearing event, relative to dispatch.
    pub unit_offsets_ms: Vec<f64>,
    pub inter_unit_latencies_ms: Vec<f64>,
    /// Units per second between the first and last content event.
    pub generation_rate: f64,
}

/// @ai:intent Failed request; counts and streaming fields are implicitly zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureOutcome {
    pub id: u64,
    /// Wall time up to the failure point.
    pub latency_ms: f64,
    pub kind: ErrorKind,
    pub message: String,
    pub streaming: bool,
}

impl StreamTiming {
    /// @ai:intent Mean gap between consecutive content events, zero without gaps
    /// @ai:effects pure
    pub fn mean_inter_unit_latency_ms(&self) -> f64 {
        if self.inter_unit_latencies_ms.is_empty() {
            return 0.0;
        }

        self.inter_unit_latencies_ms.iter().sum::<f64>() / self.inter_unit_latencies_ms.len() as f64
    }
}

impl FailureOutcome {
    /// @ai:intent Build a failure record from a request error
    /// @ai:effects pure
    pub fn from_error(id: u64, latency_ms: f64, error: &RequestError, streaming: bool) -> Self {
        Self {
            id,
            latency_ms,
            kind: error.kind(),
            message: error.to_string(),
            streaming,
        }
    }
}

impl RequestOutcome {
    pub fn id(&self) -> u64 {
        match self {
            RequestOutcome::Success(s) => s.id,
            RequestOutcome::Failure(f) => f.id,
        }
    }

    pub fn latency_ms(&self) -> f64 {
        match self {
            RequestOutcome::Success(s) => s.latency_ms,
            RequestOutcome::Failure(f) => f.latency_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success(_))
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            RequestOutcome::Success(_) => None,
            RequestOutcome::Failure(f) => Some(f.kind),
        }
    }

    pub fn units_in(&self) -> u64 {
        match self {
            RequestOutcome::Success(s) => s.units_in,
            RequestOutcome::Failure(_) => 0,
        }
    }

    pub fn units_out(&self) -> u64 {
        match self {
            RequestOutcome::Success(s) => s.units_out,
            RequestOutcome::Failure(_) => 0,
        }
    }

    /// @ai:intent Streaming timing, present only on streamed successes
    /// @ai:effects pure
    pub fn stream_timing(&self) -> Option<&StreamTiming> {
        match self {
            RequestOutcome::Success(SuccessOutcome {
                detail: SuccessDetail::Streamed(timing),
                ..
            }) => Some(timing),
            _ => None,
        }
    }

    pub fn evaluation(&self) -> Option<&EvaluationScores> {
        match self {
            RequestOutcome::Success(s) => s.evaluation.as_ref(),
            RequestOutcome::Failure(_) => None,
        }
    }
}

/// @ai:intent Sealed record of one run; outcomes are in dispatch order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub workload: String,
    pub endpoint: String,
    pub spec: WorkloadSpec,
    pub started_at: String,
    outcomes: Vec<RequestOutcome>,
}

impl RunResult {
    /// @ai:intent Assemble a sealed run directly from outcomes
    /// @ai:effects pure
    pub fn from_outcomes(endpoint: &str, spec: &WorkloadSpec, outcomes: Vec<RequestOutcome>) -> Self {
        Self {
            workload: spec.name.clone(),
            endpoint: endpoint.to_string(),
            spec: spec.clone(),
            started_at: chrono::Utc::now().to_rfc3339(),
            outcomes,
        }
    }

    pub fn outcomes(&self) -> &[RequestOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// @ai:intent Single-producer append handle; sealing yields the RunResult
#[derive(Debug)]
pub struct RunRecorder {
    result: RunResult,
}

impl RunRecorder {
    /// @ai:intent Start an empty run record
    /// @ai:effects time
    pub fn new(endpoint: &str, spec: &WorkloadSpec) -> Self {
        Self {
            result: RunResult::from_outcomes(endpoint, spec, Vec::new()),
        }
    }

    pub fn record(&mut self, outcome: RequestOutcome) {
        self.result.outcomes.push(outcome);
    }

    pub fn len(&self) -> usize {
        self.result.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result.outcomes.is_empty()
    }

    pub fn seal(self) -> RunResult {
        self.result
    }
}

/// @ai:intent Derived, read-only statistics for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub error_rate: f64,
    pub p50_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub avg_latency_ms: f64,
    pub total_units_in: u64,
    pub total_units_out: u64,
    /// Output units over the configured duration.
    pub units_per_second: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<StreamingSummary>,
    /// `avg_<metric>` over outcomes carrying that metric.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub evaluation: BTreeMap<String, f64>,
}

/// @ai:intent Streaming-only aggregates over positive per-outcome values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamingSummary {
    pub p50_ttft_ms: f64,
    pub p95_ttft_ms: f64,
    pub avg_ttft_ms: f64,
    pub avg_inter_unit_latency_ms: f64,
    pub avg_generation_rate: f64,
}

/// @ai:intent Result of one (endpoint, workload) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadReport {
    pub result: RunResult,
    pub summary: Summary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceSeries>,
}

/// @ai:intent Complete benchmark results keyed by workload, then endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResults {
    pub run_id: String,
    pub timestamp: String,
    pub endpoints: Vec<String>,
    pub workloads: BTreeMap<String, BTreeMap<String, WorkloadReport>>,
}

impl BenchmarkResults {
    /// @ai:intent Create an empty result set
    /// @ai:effects time
    pub fn new(run_id: &str, endpoints: Vec<String>) -> Self {
        Self {
            run_id: run_id.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            endpoints,
            workloads: BTreeMap::new(),
        }
    }

    /// @ai:intent Attach a report under its workload and endpoint
    /// @ai:effects pure
    pub fn insert(&mut self, report: WorkloadReport) {
        self.workloads
            .entry(report.result.workload.clone())
            .or_default()
            .insert(report.result.endpoint.clone(), report);
    }

    pub fn get(&self, workload: &str, endpoint: &str) -> Option<&WorkloadReport> {
        self.workloads.get(workload).and_then(|by_endpoint| by_endpoint.get(endpoint))
    }
}
