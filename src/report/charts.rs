//! @ai:module:intent Latency charts for benchmark results
//! @ai:module:layer infrastructure
//! @ai:module:public_api ChartGenerator, ChartGeneratorTrait
//! @ai:module:stateless true

use crate::metrics::{BenchmarkResults, WorkloadReport};
use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;

/// @ai:intent Trait for chart generation
pub trait ChartGeneratorTrait: Send + Sync {
    /// @ai:intent Generate all charts; returns the file names written
    fn generate_all(&self, results: &BenchmarkResults, output_dir: &Path) -> Result<Vec<String>>;
}

/// @ai:intent Generates charts from benchmark results
pub struct ChartGenerator;

/// (request id, latency ms) of every successful request.
type Series = Vec<(u64, f64)>;

impl ChartGenerator {
    /// @ai:intent Create a new chart generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent File name for a workload's latency chart
    /// @ai:example ("qa short/v2") -> "latency_qa_short_v2.png"
    /// @ai:effects pure
    pub fn latency_file_name(workload: &str) -> String {
        let safe: String = workload
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("latency_{}.png", safe)
    }

    fn latency_series(report: &WorkloadReport) -> Series {
        report
            .result
            .outcomes()
            .iter()
            .filter(|o| o.is_success())
            .map(|o| (o.id(), o.latency_ms()))
            .collect()
    }

    /// @ai:intent Plot latency against request id, one line per endpoint
    /// @ai:effects fs:write
    fn generate_latency_chart(
        &self,
        workload: &str,
        series: &[(String, Series)],
        output_path: &Path,
    ) -> Result<()> {
        let max_id = series
            .iter()
            .flat_map(|(_, points)| points.iter().map(|(id, _)| *id))
            .max()
            .unwrap_or(0);
        let max_latency = series
            .iter()
            .flat_map(|(_, points)| points.iter().map(|(_, ms)| *ms))
            .fold(0.0_f64, f64::max);

        let root = BitMapBackend::new(output_path, (900, 500)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("Request Latency: {}", workload), ("sans-serif", 25))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0u64..max_id + 1, 0f64..(max_latency * 1.1).max(1.0))?;

        chart
            .configure_mesh()
            .x_desc("Request")
            .y_desc("Latency (ms)")
            .draw()?;

        for (index, (endpoint, points)) in series.iter().enumerate() {
            let color = Palette99::pick(index).to_rgba();

            chart
                .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
                .label(endpoint.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .draw()?;

        root.present()?;
        Ok(())
    }
}

impl Default for ChartGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartGeneratorTrait for ChartGenerator {
    /// @ai:edge_cases workloads without any successful request get no chart
    /// @ai:effects fs:write
    fn generate_all(&self, results: &BenchmarkResults, output_dir: &Path) -> Result<Vec<String>> {
        std::fs::create_dir_all(output_dir)?;

        let mut generated = Vec::new();

        for (workload, reports) in &results.workloads {
            let series: Vec<(String, Series)> = reports
                .iter()
                .map(|(endpoint, report)| (endpoint.clone(), Self::latency_series(report)))
                .filter(|(_, points)| !points.is_empty())
                .collect();

            if series.is_empty() {
                tracing::debug!("No successful requests for {}, skipping chart", workload);
                continue;
            }

            let file_name = Self::latency_file_name(workload);
            self.generate_latency_chart(workload, &series, &output_dir.join(&file_name))?;
            generated.push(file_name);
        }

        Ok(generated)
    }
}
