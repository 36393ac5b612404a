//! @ai:module:intent Run every configured workload against every endpoint
//! @ai:module:layer application
//! @ai:module:public_api WorkloadDriver, Endpoint
//! @ai:module:stateless false

use crate::config::{BenchmarkConfig, WorkloadSpec};
use crate::corpus::{PromptSource, ReferenceLookup, ReferenceTable, SyntheticPrompts};
use crate::evaluator::Evaluator;
use crate::metrics::{BenchmarkResults, MetricsAggregator, MetricsAggregatorTrait, WorkloadReport};
use crate::profiling::{ProcessMemorySampler, ResourceSampler};
use crate::runner::client::EndpointClient;
use crate::runner::executor::RequestExecutor;
use crate::runner::run_loop::{self, EvaluationHooks};
use anyhow::Result;
use std::sync::Arc;

const WARMUP_PROMPT: &str = "This is a warmup request.";
const WARMUP_MAX_TOKENS: u32 = 10;

/// @ai:intent A named endpoint and the client that reaches it
pub struct Endpoint<C> {
    pub name: String,
    pub client: Arc<C>,
}

impl<C> Endpoint<C> {
    pub fn new(name: &str, client: C) -> Self {
        Self {
            name: name.to_string(),
            client: Arc::new(client),
        }
    }
}

/// @ai:intent Orchestrates warmup, workload runs, profiling and summaries
///
/// Workloads of one endpoint always run one after another. Endpoints run
/// one after another unless `run.concurrent_endpoints` is set.
pub struct WorkloadDriver<C: EndpointClient> {
    config: BenchmarkConfig,
    endpoints: Vec<Endpoint<C>>,
    prompts: Box<dyn PromptSource>,
    evaluator: Option<Box<dyn Evaluator>>,
    references: Box<dyn ReferenceLookup>,
    aggregator: MetricsAggregator,
}

impl<C: EndpointClient> WorkloadDriver<C> {
    /// @ai:intent Create a driver with synthetic prompts and built-in references
    /// @ai:effects pure
    pub fn new(config: BenchmarkConfig, endpoints: Vec<Endpoint<C>>) -> Self {
        Self {
            config,
            endpoints,
            prompts: Box::new(SyntheticPrompts::default()),
            evaluator: None,
            references: Box::new(ReferenceTable::builtin()),
            aggregator: MetricsAggregator::new(),
        }
    }

    pub fn with_prompt_source(mut self, prompts: impl PromptSource + 'static) -> Self {
        self.prompts = Box::new(prompts);
        self
    }

    pub fn with_evaluator(mut self, evaluator: impl Evaluator + 'static) -> Self {
        self.evaluator = Some(Box::new(evaluator));
        self
    }

    pub fn with_references(mut self, references: impl ReferenceLookup + 'static) -> Self {
        self.references = Box::new(references);
        self
    }

    fn executor(&self, endpoint: &Endpoint<C>) -> RequestExecutor<C> {
        RequestExecutor::new(
            Arc::clone(&endpoint.client),
            self.config.sampling.clone(),
            self.config.run.request_timeout(),
        )
    }

    /// @ai:intent Send short unmeasured requests so the endpoint is warm
    /// @ai:post failures are logged, never fatal
    /// @ai:effects network
    pub async fn warmup(&self, executor: &RequestExecutor<C>, endpoint: &str) {
        let count = self.config.run.warmup_requests;

        if count == 0 {
            return;
        }

        tracing::info!("Warming up {} with {} requests", endpoint, count);

        let request = executor.build_request(WARMUP_PROMPT, WARMUP_MAX_TOKENS, false);
        let mut failures = 0;

        for id in 0..count {
            if !executor.execute_atomic(u64::from(id), &request).await.is_success() {
                failures += 1;
            }
        }

        if failures > 0 {
            tracing::warn!("{} of {} warmup requests to {} failed", failures, count, endpoint);
        }
    }

    /// @ai:intent Run one workload on one endpoint and summarize it
    /// @ai:effects network, time
    pub async fn run_workload(
        &self,
        executor: &RequestExecutor<C>,
        endpoint: &str,
        spec: &WorkloadSpec,
    ) -> Result<WorkloadReport> {
        let evaluation = match (&self.evaluator, spec.evaluate) {
            (Some(evaluator), true) => Some(EvaluationHooks {
                evaluator: &**evaluator,
                references: &*self.references,
            }),
            (None, true) => {
                tracing::warn!("Workload {} asks for evaluation but no evaluator is set", spec.name);
                None
            }
            _ => None,
        };

        let mut sampler = spec
            .profile_memory
            .then(|| ProcessMemorySampler::new(self.config.run.memory_sample_interval()));

        if let Some(sampler) = sampler.as_mut() {
            sampler.start();
        }

        let outcome =
            run_loop::run_workload(executor, endpoint, spec, &*self.prompts, evaluation).await;

        let resources = match sampler.as_mut() {
            Some(sampler) => Some(sampler.stop().await),
            None => None,
        };

        let result = outcome?;
        let summary = self.aggregator.summarize(&result, spec.evaluate);

        tracing::info!(
            "{} on {}: {} requests, error rate {:.1}%, p50 {:.1} ms",
            spec.name,
            endpoint,
            summary.total_requests,
            summary.error_rate * 100.0,
            summary.p50_latency_ms
        );

        Ok(WorkloadReport {
            result,
            summary,
            resources,
        })
    }

    /// @ai:intent Warm up one endpoint, then run every workload on it in order
    /// @ai:effects network, time
    async fn run_endpoint(&self, endpoint: &Endpoint<C>) -> Result<Vec<WorkloadReport>> {
        let executor = self.executor(endpoint);
        self.warmup(&executor, &endpoint.name).await;

        let mut reports = Vec::with_capacity(self.config.workloads.len());

        for spec in &self.config.workloads {
            reports.push(self.run_workload(&executor, &endpoint.name, spec).await?);
        }

        Ok(reports)
    }

    /// @ai:intent Run the full matrix and collect results keyed by workload then endpoint
    /// @ai:pre configuration passes validation
    /// @ai:effects network, time
    pub async fn run_all(&self, run_id: &str) -> Result<BenchmarkResults> {
        self.config.validate()?;

        let names: Vec<String> = self.endpoints.iter().map(|e| e.name.clone()).collect();
        let mut results = BenchmarkResults::new(run_id, names);

        let per_endpoint = if self.config.run.concurrent_endpoints {
            futures::future::join_all(self.endpoints.iter().map(|e| self.run_endpoint(e))).await
        } else {
            let mut collected = Vec::with_capacity(self.endpoints.len());
            for endpoint in &self.endpoints {
                collected.push(self.run_endpoint(endpoint).await);
            }
            collected
        };

        for reports in per_endpoint {
            for report in reports? {
                results.insert(report);
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;
    use crate::evaluator::OverlapEvaluator;
    use crate::runner::MockEndpointClient;
    use std::time::Duration;

    fn config(workloads: Vec<WorkloadSpec>, names: &[&str]) -> BenchmarkConfig {
        let mut config = BenchmarkConfig {
            workloads,
            endpoints: names
                .iter()
                .map(|n| EndpointConfig {
                    name: n.to_string(),
                    url: format!("http://{}", n),
                })
                .collect(),
            ..Default::default()
        };
        config.run.warmup_requests = 0;
        config
    }

    fn endpoints(names: &[&str]) -> Vec<Endpoint<MockEndpointClient>> {
        names
            .iter()
            .map(|n| {
                Endpoint::new(
                    n,
                    MockEndpointClient::new("Paris is the capital of France.")
                        .with_latency(Duration::from_millis(20)),
                )
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_keyed_by_workload_then_endpoint() {
        let workloads = vec![
            WorkloadSpec::new("qa-short", 5.0, 1.0),
            WorkloadSpec {
                stream: true,
                ..WorkloadSpec::new("code-long", 2.0, 1.0)
            },
        ];
        let driver = WorkloadDriver::new(config(workloads, &["a", "b"]), endpoints(&["a", "b"]));

        let results = driver.run_all("run-1").await.unwrap();

        assert_eq!(results.run_id, "run-1");
        assert_eq!(results.endpoints, vec!["a", "b"]);
        assert_eq!(results.workloads.len(), 2);

        let qa = results.get("qa-short", "b").unwrap();
        assert_eq!(qa.summary.total_requests, 5);
        assert!(qa.summary.streaming.is_none());

        let code = results.get("code-long", "a").unwrap();
        assert_eq!(code.summary.total_requests, 2);
        assert!(code.summary.streaming.is_some());
        assert!(code.resources.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_endpoints_produce_same_shape() {
        let mut config = config(vec![WorkloadSpec::new("qa-short", 4.0, 1.0)], &["a", "b"]);
        config.run.concurrent_endpoints = true;
        let driver = WorkloadDriver::new(config, endpoints(&["a", "b"]));

        let results = driver.run_all("run-2").await.unwrap();

        assert_eq!(results.get("qa-short", "a").unwrap().summary.total_requests, 4);
        assert_eq!(results.get("qa-short", "b").unwrap().summary.total_requests, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_config_is_rejected_before_dispatch() {
        let driver = WorkloadDriver::new(
            config(vec![WorkloadSpec::new("bad", 0.0, 1.0)], &["a"]),
            endpoints(&["a"]),
        );

        assert!(driver.run_all("run-3").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluation_and_memory_profile() {
        let spec = WorkloadSpec {
            evaluate: true,
            profile_memory: true,
            prompt_len: 0,
            ..WorkloadSpec::new("qa-short", 2.0, 2.0)
        };
        let mut config = config(vec![spec], &["a"]);
        config.run.memory_sample_interval_ms = 100;
        config.run.warmup_requests = 2;

        let driver = WorkloadDriver::new(config, endpoints(&["a"]))
            .with_evaluator(OverlapEvaluator::new().unwrap());

        let results = driver.run_all("run-4").await.unwrap();
        let report = results.get("qa-short", "a").unwrap();

        assert!(report.summary.evaluation.contains_key("avg_factual_accuracy"));
        assert!(!report.resources.as_ref().unwrap().is_empty());
    }
}
