//! @ai:module:intent Raw JSON results, written and read back
//! @ai:module:layer infrastructure
//! @ai:module:public_api JsonReporter, JsonReporterTrait
//! @ai:module:stateless true

use crate::metrics::BenchmarkResults;
use anyhow::{Context, Result};
use std::path::Path;

/// @ai:intent Trait for JSON report generation
pub trait JsonReporterTrait: Send + Sync {
    /// @ai:intent Write the full result tree, per-request outcomes included
    fn generate(&self, results: &BenchmarkResults, output_path: &Path) -> Result<()>;

    /// @ai:intent Read a previously written result tree
    fn load(&self, path: &Path) -> Result<BenchmarkResults>;
}

/// @ai:intent Generates JSON reports from benchmark results
pub struct JsonReporter;

impl JsonReporter {
    /// @ai:intent Create a new JSON reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporterTrait for JsonReporter {
    /// @ai:effects fs:write
    fn generate(&self, results: &BenchmarkResults, output_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        Ok(())
    }

    /// @ai:effects fs:read
    fn load(&self, path: &Path) -> Result<BenchmarkResults> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read results file: {}", path.display()))?;
        let results = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse results file: {}", path.display()))?;
        Ok(results)
    }
}
