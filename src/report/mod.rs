//! @ai:module:intent Report generation for benchmark results
//! @ai:module:layer infrastructure
//! @ai:module:public_api ReportGenerator, JsonReporter, MarkdownReporter, CsvReporter, ChartGenerator

pub mod charts;
pub mod csv_report;
pub mod json_report;
pub mod markdown_report;

pub use charts::{ChartGenerator, ChartGeneratorTrait};
pub use csv_report::{CsvReporter, CsvReporterTrait};
pub use json_report::{JsonReporter, JsonReporterTrait};
pub use markdown_report::{MarkdownReporter, MarkdownReporterTrait};

use crate::metrics::BenchmarkResults;
use anyhow::Result;
use std::path::Path;

pub const RAW_RESULTS_FILE: &str = "raw.json";
pub const SUMMARY_FILE: &str = "summary.md";
pub const SUMMARY_CSV_FILE: &str = "summary.csv";

/// @ai:intent Combined report generator
pub struct ReportGenerator {
    json: JsonReporter,
    markdown: MarkdownReporter,
    csv: CsvReporter,
    charts: ChartGenerator,
}

impl ReportGenerator {
    /// @ai:intent Create a new report generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            json: JsonReporter::new(),
            markdown: MarkdownReporter::new(),
            csv: CsvReporter::new(),
            charts: ChartGenerator::new(),
        }
    }

    /// @ai:intent Write raw results, the Markdown and CSV summaries and charts
    /// @ai:effects fs:write
    pub fn generate_all(&self, results: &BenchmarkResults, output_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(output_dir)?;

        self.json.generate(results, &output_dir.join(RAW_RESULTS_FILE))?;
        self.generate_derived(results, output_dir)?;

        tracing::info!("Reports generated in {}", output_dir.display());
        Ok(())
    }

    /// @ai:intent Regenerate summary and charts from results already on disk
    /// @ai:effects fs:read, fs:write
    pub fn regenerate(&self, results_path: &Path, output_dir: &Path) -> Result<BenchmarkResults> {
        let results = self.json.load(results_path)?;
        std::fs::create_dir_all(output_dir)?;
        self.generate_derived(&results, output_dir)?;

        tracing::info!("Reports regenerated in {}", output_dir.display());
        Ok(results)
    }

    fn generate_derived(&self, results: &BenchmarkResults, output_dir: &Path) -> Result<()> {
        self.markdown.generate(results, &output_dir.join(SUMMARY_FILE))?;
        self.csv.generate(results, &output_dir.join(SUMMARY_CSV_FILE))?;
        self.charts.generate_all(results, output_dir)?;
        Ok(())
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
