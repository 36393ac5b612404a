//! @ai:module:intent Flat CSV summary, one row per (workload, endpoint)
//! @ai:module:layer infrastructure
//! @ai:module:public_api CsvReporter, CsvReporterTrait
//! @ai:module:stateless true

use crate::metrics::BenchmarkResults;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// @ai:intent Trait for CSV summary generation
pub trait CsvReporterTrait: Send + Sync {
    fn generate(&self, results: &BenchmarkResults, output_path: &Path) -> Result<()>;
}

/// Column order is the header order.
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    workload: &'a str,
    runtime: &'a str,
    p50_latency_ms: f64,
    p95_latency_ms: f64,
    p99_latency_ms: f64,
    tokens_per_second: f64,
    error_rate: f64,
}

/// @ai:intent Writes `summary.csv`; `runtime` is the endpoint name
pub struct CsvReporter;

impl CsvReporter {
    /// @ai:intent Create a new CSV reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Render the summary rows, workloads then endpoints in name order
    /// @ai:effects pure
    pub fn render(&self, results: &BenchmarkResults) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        for (workload, reports) in &results.workloads {
            for (endpoint, report) in reports {
                let s = &report.summary;
                writer.serialize(SummaryRow {
                    workload: workload.as_str(),
                    runtime: endpoint.as_str(),
                    p50_latency_ms: s.p50_latency_ms,
                    p95_latency_ms: s.p95_latency_ms,
                    p99_latency_ms: s.p99_latency_ms,
                    tokens_per_second: s.units_per_second,
                    error_rate: s.error_rate,
                })?;
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV summary: {}", e.error()))?;
        Ok(String::from_utf8(bytes)?)
    }
}

impl Default for CsvReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvReporterTrait for CsvReporter {
    /// @ai:effects fs:write
    fn generate(&self, results: &BenchmarkResults, output_path: &Path) -> Result<()> {
        let content = self.render(results)?;
        std::fs::write(output_path, content)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        Ok(())
    }
}
