//! @ai:module:intent Markdown summary of a benchmark run
//! @ai:module:layer infrastructure
//! @ai:module:public_api MarkdownReporter, MarkdownReporterTrait
//! @ai:module:stateless true

use crate::metrics::{BenchmarkResults, WorkloadReport};
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// @ai:intent Trait for Markdown report generation
pub trait MarkdownReporterTrait: Send + Sync {
    /// @ai:intent Generate Markdown report from results
    fn generate(&self, results: &BenchmarkResults, output_path: &Path) -> Result<()>;
}

/// @ai:intent Generates Markdown reports from benchmark results
pub struct MarkdownReporter;

type ByEndpoint = BTreeMap<String, WorkloadReport>;

impl MarkdownReporter {
    /// @ai:intent Create a new Markdown reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    fn bytes_to_mib(bytes: u64) -> f64 {
        bytes as f64 / (1024.0 * 1024.0)
    }

    fn write_header(output: &mut String, results: &BenchmarkResults) -> std::fmt::Result {
        writeln!(output, "# Benchmark Results: {}", results.run_id)?;
        writeln!(output)?;
        writeln!(output, "**Date:** {}", results.timestamp)?;
        writeln!(output, "**Endpoints:** {}", results.endpoints.join(", "))?;
        writeln!(output)
    }

    /// @ai:intent Latency, error and throughput table for one workload
    fn write_latency_table(output: &mut String, reports: &ByEndpoint) -> std::fmt::Result {
        writeln!(
            output,
            "| Endpoint | Requests | Error Rate | p50 (ms) | p95 (ms) | p99 (ms) | Avg (ms) | Units/s |"
        )?;
        writeln!(
            output,
            "|----------|----------|------------|----------|----------|----------|----------|---------|"
        )?;

        for (endpoint, report) in reports {
            let s = &report.summary;
            writeln!(
                output,
                "| {} | {} | {:.1}% | {:.1} | {:.1} | {:.1} | {:.1} | {:.2} |",
                endpoint,
                s.total_requests,
                s.error_rate * 100.0,
                s.p50_latency_ms,
                s.p95_latency_ms,
                s.p99_latency_ms,
                s.avg_latency_ms,
                s.units_per_second
            )?;
        }

        writeln!(output)
    }

    fn write_streaming_table(output: &mut String, reports: &ByEndpoint) -> std::fmt::Result {
        if reports.values().all(|r| r.summary.streaming.is_none()) {
            return Ok(());
        }

        writeln!(output, "**Streaming**")?;
        writeln!(output)?;
        writeln!(
            output,
            "| Endpoint | p50 TTFT (ms) | p95 TTFT (ms) | Avg TTFT (ms) | Avg Inter-unit (ms) | Avg Units/s |"
        )?;
        writeln!(
            output,
            "|----------|---------------|---------------|---------------|---------------------|-------------|"
        )?;

        for (endpoint, report) in reports {
            if let Some(streaming) = &report.summary.streaming {
                writeln!(
                    output,
                    "| {} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} |",
                    endpoint,
                    streaming.p50_ttft_ms,
                    streaming.p95_ttft_ms,
                    streaming.avg_ttft_ms,
                    streaming.avg_inter_unit_latency_ms,
                    streaming.avg_generation_rate
                )?;
            }
        }

        writeln!(output)
    }

    fn write_evaluation_table(output: &mut String, reports: &ByEndpoint) -> std::fmt::Result {
        let metrics: BTreeSet<&String> = reports
            .values()
            .flat_map(|r| r.summary.evaluation.keys())
            .collect();

        if metrics.is_empty() {
            return Ok(());
        }

        writeln!(output, "**Quality**")?;
        writeln!(output)?;

        let header: Vec<&str> = metrics.iter().map(|m| m.as_str()).collect();
        writeln!(output, "| Endpoint | {} |", header.join(" | "))?;
        writeln!(output, "|----------|{}", "------|".repeat(header.len()))?;

        for (endpoint, report) in reports {
            let cells: Vec<String> = metrics
                .iter()
                .map(|m| {
                    report
                        .summary
                        .evaluation
                        .get(*m)
                        .map(|v| format!("{:.3}", v))
                        .unwrap_or_else(|| "-".to_string())
                })
                .collect();
            writeln!(output, "| {} | {} |", endpoint, cells.join(" | "))?;
        }

        writeln!(output)
    }

    fn write_resource_table(output: &mut String, reports: &ByEndpoint) -> std::fmt::Result {
        if reports.values().all(|r| r.resources.is_none()) {
            return Ok(());
        }

        writeln!(output, "**Memory**")?;
        writeln!(output)?;
        writeln!(output, "| Endpoint | Samples | Peak RSS (MiB) |")?;
        writeln!(output, "|----------|---------|----------------|")?;

        for (endpoint, report) in reports {
            if let Some(resources) = &report.resources {
                writeln!(
                    output,
                    "| {} | {} | {:.1} |",
                    endpoint,
                    resources.len(),
                    Self::bytes_to_mib(resources.peak_rss_bytes)
                )?;
            }
        }

        writeln!(output)
    }

    /// @ai:intent Render the whole document
    /// @ai:effects pure
    pub fn render(&self, results: &BenchmarkResults) -> Result<String> {
        let mut output = String::new();
        Self::write_header(&mut output, results)?;

        for (workload, reports) in &results.workloads {
            writeln!(output, "## {}", workload)?;
            writeln!(output)?;

            Self::write_latency_table(&mut output, reports)?;
            Self::write_streaming_table(&mut output, reports)?;
            Self::write_evaluation_table(&mut output, reports)?;
            Self::write_resource_table(&mut output, reports)?;
        }

        Ok(output)
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownReporterTrait for MarkdownReporter {
    /// @ai:effects fs:write
    fn generate(&self, results: &BenchmarkResults, output_path: &Path) -> Result<()> {
        std::fs::write(output_path, self.render(results)?)?;
        Ok(())
    }
}
