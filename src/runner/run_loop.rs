//! @ai:module:intent Paced, serial execution of one workload against one endpoint
//! @ai:module:layer application
//! @ai:module:public_api RunLoop, RunState, run_workload
//! @ai:module:stateless false

use crate::config::WorkloadSpec;
use crate::corpus::{PromptSource, ReferenceLookup};
use crate::error::ConfigError;
use crate::evaluator::Evaluator;
use crate::metrics::{RequestOutcome, RunRecorder, RunResult};
use crate::runner::client::EndpointClient;
use crate::runner::executor::RequestExecutor;
use crate::runner::pacer::{Pacer, PacerTrait};
use tokio::time::Instant;

/// @ai:intent Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
}

/// @ai:intent Optional scoring hooks applied to successful outcomes
#[derive(Clone, Copy)]
pub struct EvaluationHooks<'a> {
    pub evaluator: &'a dyn Evaluator,
    pub references: &'a dyn ReferenceLookup,
}

/// @ai:intent Drives one workload: dispatch, record, pace, repeat until the deadline
///
/// At most one request is in flight. A request already dispatched when the
/// deadline passes is allowed to finish and is recorded.
pub struct RunLoop<'a, C: EndpointClient> {
    executor: &'a RequestExecutor<C>,
    endpoint: &'a str,
    spec: &'a WorkloadSpec,
    evaluation: Option<EvaluationHooks<'a>>,
    state: RunState,
}

impl<'a, C: EndpointClient> RunLoop<'a, C> {
    pub fn new(executor: &'a RequestExecutor<C>, endpoint: &'a str, spec: &'a WorkloadSpec) -> Self {
        Self {
            executor,
            endpoint,
            spec,
            evaluation: None,
            state: RunState::NotStarted,
        }
    }

    /// @ai:intent Score successful outcomes; only used when the workload enables evaluation
    pub fn with_evaluation(mut self, hooks: EvaluationHooks<'a>) -> Self {
        self.evaluation = Some(hooks);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// @ai:intent Attach scores to a successful outcome that has a reference
    /// @ai:edge_cases evaluator errors are logged and leave the outcome unscored
    /// @ai:effects state:write
    fn score(&self, outcome: &mut RequestOutcome, prompt: &str) {
        let Some(hooks) = self.evaluation else {
            return;
        };

        let RequestOutcome::Success(success) = outcome else {
            return;
        };

        let Some(reference) = hooks.references.lookup(prompt) else {
            return;
        };

        match hooks
            .evaluator
            .evaluate(&success.output, reference.text.as_deref(), &reference.facts)
        {
            Ok(scores) if !scores.is_empty() => success.evaluation = Some(scores),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Evaluation of request {} failed: {}", success.id, e);
            }
        }
    }

    /// @ai:intent Execute the workload and seal its result
    /// @ai:pre state is NotStarted; prompts non-empty unless duration is zero
    /// @ai:post outcomes are in dispatch order with ids 0..n
    /// @ai:effects network, time
    pub async fn run(&mut self, prompts: &[String]) -> Result<RunResult, ConfigError> {
        let pacer = Pacer::for_workload(self.spec)?;
        let duration = self.spec.duration()?;

        if prompts.is_empty() && !duration.is_zero() {
            return Err(ConfigError::EmptyCorpus(self.spec.name.clone()));
        }

        let deadline = Instant::now()
            .checked_add(duration)
            .ok_or_else(|| ConfigError::InvalidDuration {
                name: self.spec.name.clone(),
                duration_secs: self.spec.duration_secs,
            })?;
        let mut recorder = RunRecorder::new(self.endpoint, self.spec);
        let mut next_id: u64 = 0;

        self.state = RunState::Running;
        tracing::info!(
            "Running {} against {} ({} req/s for {:?})",
            self.spec.name,
            self.endpoint,
            self.spec.qps,
            duration
        );

        while Instant::now() < deadline {
            let prompt = &prompts[next_id as usize % prompts.len()];
            let dispatched_at = Instant::now();

            let mut outcome = self.executor.execute(next_id, prompt, self.spec).await;

            if self.spec.evaluate {
                self.score(&mut outcome, prompt);
            }

            recorder.record(outcome);
            next_id += 1;

            pacer.wait(dispatched_at.elapsed(), deadline).await;
        }

        self.state = RunState::Completed;
        tracing::debug!("{} on {}: {} requests", self.spec.name, self.endpoint, recorder.len());

        Ok(recorder.seal())
    }
}

/// @ai:intent Run one workload with prompts from `prompts`
/// @ai:effects network, time
pub async fn run_workload<C: EndpointClient>(
    executor: &RequestExecutor<C>,
    endpoint: &str,
    spec: &WorkloadSpec,
    prompts: &dyn PromptSource,
    evaluation: Option<EvaluationHooks<'_>>,
) -> Result<RunResult, ConfigError> {
    let prompt_list = prompts.prompts(spec);
    let mut run_loop = RunLoop::new(executor, endpoint, spec);

    if let Some(hooks) = evaluation {
        run_loop = run_loop.with_evaluation(hooks);
    }

    run_loop.run(&prompt_list).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingConfig;
    use crate::corpus::{Reference, ReferenceTable, SyntheticPrompts};
    use crate::error::{ErrorKind, RequestError};
    use crate::evaluator::OverlapEvaluator;
    use crate::metrics::{EvaluationScores, MetricsAggregator, MetricsAggregatorTrait};
    use crate::runner::executor::tests::ScriptedClient;
    use crate::runner::MockEndpointClient;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn executor<C: EndpointClient>(client: C) -> RequestExecutor<C> {
        RequestExecutor::new(Arc::new(client), SamplingConfig::default(), Duration::from_secs(30))
    }

    fn prompts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("prompt {}", i)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_endpoint_hits_target_rate() {
        let executor = executor(ScriptedClient::atomic(50));
        let spec = WorkloadSpec::new("paced", 10.0, 1.0);

        let mut run_loop = RunLoop::new(&executor, "ep", &spec);
        assert_eq!(run_loop.state(), RunState::NotStarted);

        let result = run_loop.run(&prompts(3)).await.unwrap();
        assert_eq!(run_loop.state(), RunState::Completed);

        assert_eq!(result.len(), 10);
        assert!(result.outcomes().iter().all(|o| o.is_success()));

        let ids: Vec<u64> = result.outcomes().iter().map(|o| o.id()).collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());

        let summary = MetricsAggregator::new().summarize(&result, false);
        assert_eq!(summary.total_requests, 10);
        assert_eq!(summary.error_rate, 0.0);
        assert_eq!(summary.p50_latency_ms, 50.0);
        assert_eq!(summary.p95_latency_ms, 50.0);
        assert_eq!(summary.avg_latency_ms, 50.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_endpoint_degrades_rate() {
        // 200ms latency against a 100ms interval: one request every 200ms.
        let executor = executor(ScriptedClient::atomic(200));
        let spec = WorkloadSpec::new("slow", 10.0, 1.0);

        let result = RunLoop::new(&executor, "ep", &spec)
            .run(&prompts(1))
            .await
            .unwrap();

        assert_eq!(result.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_request_finishes_past_deadline() {
        // The fourth request is dispatched at 900ms and completes at 1200ms.
        let executor = executor(ScriptedClient::atomic(300));
        let spec = WorkloadSpec::new("overrun", 10.0, 1.0);

        let start = Instant::now();
        let result = RunLoop::new(&executor, "ep", &spec)
            .run(&prompts(2))
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(1200));
        assert_eq!(result.len(), 4);

        let last = &result.outcomes()[3];
        assert!(last.is_success());
        assert_eq!(last.id(), 3);
        assert_eq!(last.latency_ms(), 300.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_overflow_is_rejected() {
        let executor = executor(ScriptedClient::atomic(10));

        // Fits in a Duration but not past the current instant.
        let spec = WorkloadSpec::new("forever", 1.0, 1.5e19);
        let err = RunLoop::new(&executor, "ep", &spec).run(&prompts(1)).await.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration { .. }));

        let spec = WorkloadSpec::new("trickle", 1e-20, 1.0);
        let err = RunLoop::new(&executor, "ep", &spec).run(&prompts(1)).await.unwrap_err();
        assert!(matches!(err, ConfigError::RateTooLow { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_dispatches_nothing() {
        let executor = executor(ScriptedClient::atomic(10));
        let spec = WorkloadSpec::new("empty", 10.0, 0.0);

        let result = RunLoop::new(&executor, "ep", &spec).run(&[]).await.unwrap();
        assert!(result.is_empty());

        let summary = MetricsAggregator::new().summarize(&result, false);
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.error_rate, 0.0);
        assert_eq!(summary.avg_latency_ms, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_bad_specs() {
        let executor = executor(ScriptedClient::atomic(10));

        let spec = WorkloadSpec::new("no-rate", 0.0, 1.0);
        let err = RunLoop::new(&executor, "ep", &spec).run(&prompts(1)).await.unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveRate { .. }));

        let spec = WorkloadSpec::new("no-prompts", 1.0, 1.0);
        let err = RunLoop::new(&executor, "ep", &spec).run(&[]).await.unwrap_err();
        assert_eq!(err, ConfigError::EmptyCorpus("no-prompts".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_recorded_not_fatal() {
        let executor = executor(ScriptedClient::failing(RequestError::Transport(
            "connection refused".to_string(),
        )));
        let spec = WorkloadSpec::new("down", 5.0, 1.0);

        let result = RunLoop::new(&executor, "ep", &spec)
            .run(&prompts(2))
            .await
            .unwrap();

        assert_eq!(result.len(), 5);
        assert!(result
            .outcomes()
            .iter()
            .all(|o| o.error_kind() == Some(ErrorKind::TransportError)));

        let summary = MetricsAggregator::new().summarize(&result, false);
        assert_eq!(summary.error_rate, 1.0);
        assert_eq!(summary.p50_latency_ms, 0.0);
    }

    /// Records which prompts were dispatched.
    struct RecordingClient {
        seen: std::sync::Mutex<Vec<String>>,
        calls: AtomicU64,
    }

    impl EndpointClient for RecordingClient {
        async fn infer(
            &self,
            request: &crate::runner::InferRequest,
        ) -> Result<crate::runner::InferResponse, RequestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.prompt.clone());
            Ok(crate::runner::InferResponse {
                output: String::new(),
                latency_ms: None,
                tokens_in: 0,
                tokens_out: 0,
            })
        }

        async fn infer_stream(
            &self,
            _request: &crate::runner::InferRequest,
        ) -> Result<crate::runner::FrameStream, RequestError> {
            Err(RequestError::Transport("unsupported".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompts_are_used_round_robin() {
        let client = RecordingClient {
            seen: std::sync::Mutex::new(Vec::new()),
            calls: AtomicU64::new(0),
        };
        let executor = executor(client);
        let spec = WorkloadSpec::new("rr", 4.0, 1.0);

        RunLoop::new(&executor, "ep", &spec)
            .run(&prompts(3))
            .await
            .unwrap();

        let client = executor.client();
        assert_eq!(client.calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            *client.seen.lock().unwrap(),
            vec!["prompt 0", "prompt 1", "prompt 2", "prompt 0"]
        );
    }

    struct FixedEvaluator;

    impl Evaluator for FixedEvaluator {
        fn evaluate(
            &self,
            generated: &str,
            _reference: Option<&str>,
            _facts: &[String],
        ) -> anyhow::Result<EvaluationScores> {
            if generated.contains("fail") {
                anyhow::bail!("scoring failed");
            }
            Ok(EvaluationScores::from([("factual_accuracy".to_string(), 0.5)]))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluation_attaches_scores_when_reference_exists() {
        let executor = executor(MockEndpointClient::new("Paris is the capital of France."));
        let spec = WorkloadSpec {
            evaluate: true,
            ..WorkloadSpec::new("qa-short", 2.0, 1.0)
        };

        let mut references = ReferenceTable::new();
        references.insert(
            "prompt 0",
            Reference {
                text: Some("The capital of France is Paris.".to_string()),
                facts: vec!["Paris".to_string()],
            },
        );
        let hooks = EvaluationHooks {
            evaluator: &FixedEvaluator,
            references: &references,
        };

        let result = RunLoop::new(&executor, "ep", &spec)
            .with_evaluation(hooks)
            .run(&["prompt 0".to_string(), "unmatched".to_string()])
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.outcomes()[0].evaluation().is_some());
        assert!(result.outcomes()[1].evaluation().is_none());

        let summary = MetricsAggregator::new().summarize(&result, true);
        assert_eq!(summary.evaluation.get("avg_factual_accuracy"), Some(&0.5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluator_errors_leave_outcome_unscored() {
        let executor = executor(MockEndpointClient::new("this will fail"));
        let spec = WorkloadSpec {
            evaluate: true,
            ..WorkloadSpec::new("qa-short", 1.0, 1.0)
        };
        let mut references = ReferenceTable::new();
        references.insert(
            "p",
            Reference {
                text: None,
                facts: vec!["x".to_string()],
            },
        );
        let hooks = EvaluationHooks {
            evaluator: &FixedEvaluator,
            references: &references,
        };

        let result = RunLoop::new(&executor, "ep", &spec)
            .with_evaluation(hooks)
            .run(&["p".to_string()])
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert!(result.outcomes()[0].is_success());
        assert!(result.outcomes()[0].evaluation().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_workload_with_synthetic_prompts() {
        let executor = executor(MockEndpointClient::new("Paris is the capital of France."));
        let spec = WorkloadSpec {
            evaluate: true,
            prompt_len: 0,
            ..WorkloadSpec::new("qa-short", 2.0, 2.0)
        };
        let evaluator = OverlapEvaluator::new().unwrap();
        let references = ReferenceTable::builtin();

        let result = run_workload(
            &executor,
            "mock",
            &spec,
            &SyntheticPrompts::default(),
            Some(EvaluationHooks {
                evaluator: &evaluator,
                references: &references,
            }),
        )
        .await
        .unwrap();

        assert_eq!(result.len(), 4);
        let first = result.outcomes()[0].evaluation().unwrap();
        assert_eq!(first.get("factual_accuracy"), Some(&1.0));
    }
}
