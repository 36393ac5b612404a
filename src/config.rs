//! @ai:module:intent Configuration structs for benchmark runs
//! @ai:module:layer infrastructure
//! @ai:module:public_api BenchmarkConfig, RunConfig, SamplingConfig, EndpointConfig, WorkloadSpec, PathConfig
//! @ai:module:stateless true

use crate::error::ConfigError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// @ai:intent Main configuration for a benchmark run
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
    #[serde(default)]
    pub workloads: Vec<WorkloadSpec>,
    #[serde(default)]
    pub paths: PathConfig,
}

/// @ai:intent Run-wide execution settings
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default = "default_warmup_requests")]
    pub warmup_requests: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Run endpoints concurrently; workloads of one endpoint always run in order.
    #[serde(default)]
    pub concurrent_endpoints: bool,
    #[serde(default = "default_sample_interval")]
    pub memory_sample_interval_ms: u64,
}

/// @ai:intent Sampling parameters forwarded with every request
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

/// @ai:intent A target endpoint; `name` is its identity in results
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    pub url: String,
}

/// @ai:intent Immutable description of one paced run
/// @ai:pre qps > 0 with a representable interval, duration_secs >= 0 and representable
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    pub name: String,
    /// Target request rate in requests per second.
    pub qps: f64,
    pub duration_secs: f64,
    #[serde(default = "default_prompt_len")]
    pub prompt_len: usize,
    /// Requested output size in units.
    #[serde(default = "default_gen_tokens")]
    pub gen_tokens: u32,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub evaluate: bool,
    #[serde(default)]
    pub profile_memory: bool,
}

/// @ai:intent Path configuration for input/output directories
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    #[serde(default)]
    pub corpus_dir: Option<PathBuf>,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            sampling: SamplingConfig::default(),
            endpoints: vec![EndpointConfig {
                name: "local".to_string(),
                url: "http://localhost:8000".to_string(),
            }],
            workloads: vec![
                WorkloadSpec::new("qa-short", 2.0, 30.0),
                WorkloadSpec {
                    prompt_len: 1024,
                    gen_tokens: 512,
                    stream: true,
                    ..WorkloadSpec::new("code-long", 1.0, 60.0)
                },
            ],
            paths: PathConfig::default(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_id: None,
            warmup_requests: default_warmup_requests(),
            request_timeout_secs: default_request_timeout(),
            concurrent_endpoints: false,
            memory_sample_interval_ms: default_sample_interval(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            corpus_dir: None,
            results_dir: default_results_dir(),
        }
    }
}

fn default_warmup_requests() -> u32 {
    5
}

fn default_request_timeout() -> u64 {
    60
}

fn default_sample_interval() -> u64 {
    500
}

fn default_temperature() -> f32 {
    0.2
}

fn default_top_p() -> f32 {
    0.95
}

fn default_prompt_len() -> usize {
    128
}

fn default_gen_tokens() -> u32 {
    128
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

impl RunConfig {
    /// @ai:intent Per-request timeout enforced by the executor
    /// @ai:effects pure
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn memory_sample_interval(&self) -> Duration {
        Duration::from_millis(self.memory_sample_interval_ms.max(1))
    }
}

impl WorkloadSpec {
    /// @ai:intent Create a non-streaming, non-evaluated workload with default sizes
    /// @ai:effects pure
    pub fn new(name: &str, qps: f64, duration_secs: f64) -> Self {
        Self {
            name: name.to_string(),
            qps,
            duration_secs,
            prompt_len: default_prompt_len(),
            gen_tokens: default_gen_tokens(),
            stream: false,
            evaluate: false,
            profile_memory: false,
        }
    }

    /// @ai:intent Reject specs the run loop cannot pace
    /// @ai:effects pure
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.interval()?;
        self.duration()?;
        Ok(())
    }

    /// @ai:intent Time between dispatches at the target rate
    /// @ai:edge_cases a rate so low that 1/qps overflows `Duration` is rejected
    /// @ai:effects pure
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        if !self.qps.is_finite() || self.qps <= 0.0 {
            return Err(ConfigError::NonPositiveRate {
                name: self.name.clone(),
                qps: self.qps,
            });
        }

        Duration::try_from_secs_f64(1.0 / self.qps).map_err(|_| ConfigError::RateTooLow {
            name: self.name.clone(),
            qps: self.qps,
        })
    }

    /// @ai:intent Configured run length
    /// @ai:effects pure
    pub fn duration(&self) -> Result<Duration, ConfigError> {
        let invalid = || ConfigError::InvalidDuration {
            name: self.name.clone(),
            duration_secs: self.duration_secs,
        };

        if !self.duration_secs.is_finite() || self.duration_secs < 0.0 {
            return Err(invalid());
        }

        Duration::try_from_secs_f64(self.duration_secs).map_err(|_| invalid())
    }
}

impl BenchmarkConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @ai:intent Check every precondition before any workload is dispatched
    /// @ai:effects pure
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        let mut seen = HashSet::new();

        for workload in &self.workloads {
            workload.validate()?;

            if !seen.insert(workload.name.as_str()) {
                return Err(ConfigError::DuplicateWorkload(workload.name.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        assert!(BenchmarkConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        let spec = WorkloadSpec::new("zero", 0.0, 10.0);
        assert!(matches!(
            spec.validate(),
            Err(ConfigError::NonPositiveRate { .. })
        ));

        let spec = WorkloadSpec::new("negative", -1.0, 10.0);
        assert!(spec.validate().is_err());

        let spec = WorkloadSpec::new("nan", f64::NAN, 10.0);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_zero_duration_is_valid() {
        let spec = WorkloadSpec::new("empty", 5.0, 0.0);
        assert!(spec.validate().is_ok());
        assert_eq!(spec.duration(), Ok(Duration::ZERO));
    }

    #[test]
    fn test_rejects_unrepresentable_rate_and_duration() {
        let spec = WorkloadSpec::new("slow", 1e-20, 1.0);
        assert!(matches!(spec.validate(), Err(ConfigError::RateTooLow { .. })));
        assert!(spec.interval().is_err());

        let spec = WorkloadSpec::new("long", 1.0, 1e20);
        assert!(matches!(
            spec.validate(),
            Err(ConfigError::InvalidDuration { .. })
        ));
        assert!(spec.duration().is_err());

        let spec = WorkloadSpec::new("ok", 0.5, 3600.0);
        assert_eq!(spec.interval(), Ok(Duration::from_secs(2)));
        assert_eq!(spec.duration(), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn test_rejects_duplicate_workloads() {
        let config = BenchmarkConfig {
            workloads: vec![
                WorkloadSpec::new("a", 1.0, 1.0),
                WorkloadSpec::new("a", 2.0, 1.0),
            ],
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateWorkload("a".to_string()))
        );
    }

    #[test]
    fn test_rejects_missing_endpoints() {
        let config = BenchmarkConfig {
            endpoints: vec![],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoEndpoints));
    }

    #[test]
    fn test_toml_round_trip_applies_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bench.toml");
        std::fs::write(
            &path,
            r#"
[[endpoints]]
name = "vllm"
url = "http://127.0.0.1:9000"

[[workloads]]
name = "qa-short"
qps = 4.0
duration_secs = 10.0
stream = true
"#,
        )
        .unwrap();

        let config = BenchmarkConfig::load(&path).unwrap();
        assert_eq!(config.run.warmup_requests, 5);
        assert_eq!(config.workloads[0].gen_tokens, 128);
        assert!(config.workloads[0].stream);
        assert!(!config.workloads[0].evaluate);
        assert!((config.sampling.top_p - 0.95).abs() < f32::EPSILON);

        config.save(&path).unwrap();
        let reloaded = BenchmarkConfig::load(&path).unwrap();
        assert_eq!(reloaded.workloads, config.workloads);
    }
}
