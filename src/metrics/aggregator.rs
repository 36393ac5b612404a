//! @ai:module:intent Statistical reduction of run outcomes into summaries
//! @ai:module:layer application
//! @ai:module:public_api MetricsAggregator, MetricsAggregatorTrait, summarize, percentile, median
//! @ai:module:stateless true

use crate::metrics::types::{RunResult, StreamingSummary, Summary};
use std::collections::BTreeMap;

/// @ai:intent Trait for reducing a sealed run into a summary
pub trait MetricsAggregatorTrait: Send + Sync {
    /// @ai:intent Summarize a run; evaluation means only when enabled
    fn summarize(&self, run: &RunResult, evaluation_enabled: bool) -> Summary;
}

/// @ai:intent Aggregates outcome records into statistical summaries
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// @ai:intent Create a new metrics aggregator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Streaming aggregates over positive values only
    /// @ai:effects pure
    fn streaming_summary(run: &RunResult) -> StreamingSummary {
        let timings: Vec<_> = run
            .outcomes()
            .iter()
            .filter_map(|o| o.stream_timing())
            .collect();

        let ttfts: Vec<f64> = timings
            .iter()
            .map(|t| t.ttft_ms)
            .filter(|v| *v > 0.0)
            .collect();

        let avg_inter_unit_latency_ms = average(
            timings
                .iter()
                .map(|t| t.mean_inter_unit_latency_ms())
                .filter(|v| *v > 0.0),
        );

        let avg_generation_rate = average(
            timings
                .iter()
                .map(|t| t.generation_rate)
                .filter(|v| *v > 0.0),
        );

        StreamingSummary {
            p50_ttft_ms: median(&ttfts),
            p95_ttft_ms: percentile(&ttfts, 0.95),
            avg_ttft_ms: average(ttfts.iter().copied()),
            avg_inter_unit_latency_ms,
            avg_generation_rate,
        }
    }

    /// @ai:intent Per-key means over the outcomes that carry each key
    /// @ai:effects pure
    fn evaluation_means(run: &RunResult) -> BTreeMap<String, f64> {
        let mut totals: BTreeMap<&str, (f64, u32)> = BTreeMap::new();

        for scores in run.outcomes().iter().filter_map(|o| o.evaluation()) {
            for (metric, value) in scores {
                let entry = totals.entry(metric.as_str()).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }

        totals
            .into_iter()
            .map(|(metric, (sum, count))| (format!("avg_{metric}"), sum / count as f64))
            .collect()
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAggregatorTrait for MetricsAggregator {
    /// @ai:intent Reduce a sealed run into its summary
    /// @ai:post error_rate in [0, 1]; p50 <= p95 <= p99
    /// @ai:effects pure
    fn summarize(&self, run: &RunResult, evaluation_enabled: bool) -> Summary {
        let outcomes = run.outcomes();
        let total_requests = outcomes.len() as u64;

        let latencies: Vec<f64> = outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.latency_ms())
            .collect();

        let successful_requests = latencies.len() as u64;
        let failed = total_requests - successful_requests;

        let error_rate = if total_requests == 0 {
            0.0
        } else {
            failed as f64 / total_requests as f64
        };

        let total_units_in: u64 = outcomes.iter().map(|o| o.units_in()).sum();
        let total_units_out: u64 = outcomes.iter().map(|o| o.units_out()).sum();

        let duration_secs = run.spec.duration_secs;
        let units_per_second = if duration_secs > 0.0 {
            total_units_out as f64 / duration_secs
        } else {
            0.0
        };

        let streaming = run.spec.stream.then(|| Self::streaming_summary(run));

        let evaluation = if evaluation_enabled {
            Self::evaluation_means(run)
        } else {
            BTreeMap::new()
        };

        Summary {
            total_requests,
            successful_requests,
            error_rate,
            p50_latency_ms: median(&latencies),
            p95_latency_ms: percentile(&latencies, 0.95),
            p99_latency_ms: percentile(&latencies, 0.99),
            avg_latency_ms: average(latencies.iter().copied()),
            total_units_in,
            total_units_out,
            units_per_second,
            streaming,
            evaluation,
        }
    }
}

/// @ai:intent Summarize a sealed run with the default aggregator
/// @ai:effects pure
pub fn summarize(run: &RunResult, evaluation_enabled: bool) -> Summary {
    MetricsAggregator::new().summarize(run, evaluation_enabled)
}

/// @ai:intent Calculate average of an iterator of f64
/// @ai:effects pure
fn average<I: Iterator<Item = f64>>(iter: I) -> f64 {
    let (sum, count) = iter.fold((0.0, 0u32), |(s, c), v| (s + v, c + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// @ai:intent Conventional median; mean of the two central values on even counts
/// @ai:edge_cases empty -> 0.0
/// @ai:effects pure
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let sorted = sorted(values);
    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// @ai:intent Smallest sample count at which quantile `p` is resolvable
/// @ai:example (0.95) -> 20
/// @ai:example (0.99) -> 100
/// @ai:effects pure
pub fn min_samples_for(p: f64) -> usize {
    if p >= 1.0 {
        return 1;
    }

    (1.0 / (1.0 - p) - 1e-9).ceil().max(1.0) as usize
}

/// @ai:intent Nearest-rank quantile; falls back to max below the resolution threshold
/// @ai:pre 0 < p <= 1
/// @ai:edge_cases empty -> 0.0
/// @ai:edge_cases fewer than min_samples_for(p) -> maximum observed value
/// @ai:effects pure
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let sorted = sorted(values);
    let n = sorted.len();

    if n < min_samples_for(p) {
        return sorted[n - 1];
    }

    let rank = (p * n as f64 - 1e-9).ceil() as usize;
    sorted[rank.clamp(1, n) - 1]
}
