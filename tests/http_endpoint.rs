use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::StreamExt;
use serde::Deserialize;
use tempfile::TempDir;
use tokenforge_bench::config::{BenchmarkConfig, EndpointConfig, SamplingConfig, WorkloadSpec};
use tokenforge_bench::error::ErrorKind;
use tokenforge_bench::metrics::{RequestOutcome, SuccessDetail};
use tokenforge_bench::report::{
    CsvReporter, CsvReporterTrait, JsonReporter, JsonReporterTrait, MarkdownReporter,
    MarkdownReporterTrait,
};
use tokenforge_bench::runner::{Endpoint, HttpEndpointClient, RequestExecutor, WorkloadDriver};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

const ANSWER_UNITS: [&str; 3] = ["Paris", " is", " lovely."];

#[derive(Debug, Deserialize)]
struct InferBody {
    prompt: String,
    max_tokens: u32,
    stream: bool,
}

fn sse_event(token: &str, index: usize, is_last: bool) -> Bytes {
    let payload = serde_json::json!({ "token": token, "index": index, "is_last": is_last });
    Bytes::from(format!("data: {}\n\n", payload))
}

fn event_stream(events: Vec<Bytes>) -> Response {
    let body = futures::stream::iter(events).then(|event| async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok::<_, std::convert::Infallible>(event)
    });

    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(body),
    )
        .into_response()
}

async fn infer(Json(body): Json<InferBody>) -> Response {
    if body.prompt.contains("fail") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "model crashed").into_response();
    }

    if !body.stream {
        tokio::time::sleep(Duration::from_millis(10)).await;
        return Json(serde_json::json!({
            "output": ANSWER_UNITS.concat(),
            "latency_ms": 10,
            "tokens_in": body.prompt.split_whitespace().count(),
            "tokens_out": body.max_tokens.min(ANSWER_UNITS.len() as u32),
        }))
        .into_response();
    }

    let mut events: Vec<Bytes> = ANSWER_UNITS
        .iter()
        .enumerate()
        .map(|(i, token)| sse_event(token, i, false))
        .collect();

    if body.prompt.contains("truncate") {
        return event_stream(events);
    }

    // Malformed frame and a frame split across two chunks.
    events.insert(1, Bytes::from_static(b"data: {not json}\n\n"));
    let terminal = sse_event("", ANSWER_UNITS.len(), true);
    let (head, tail) = terminal.split_at(10);
    events.push(Bytes::copy_from_slice(head));
    events.push(Bytes::copy_from_slice(tail));

    event_stream(events)
}

struct InferServer {
    base_url: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl InferServer {
    async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = Router::new().route("/infer", post(infer));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

fn executor(base_url: &str) -> RequestExecutor<HttpEndpointClient> {
    RequestExecutor::new(
        Arc::new(HttpEndpointClient::new(base_url).unwrap()),
        SamplingConfig::default(),
        Duration::from_secs(5),
    )
}

fn streaming_spec(name: &str) -> WorkloadSpec {
    WorkloadSpec {
        stream: true,
        ..WorkloadSpec::new(name, 1.0, 1.0)
    }
}

#[tokio::test]
async fn atomic_request_records_client_and_server_latency() {
    let server = InferServer::start().await.unwrap();
    let executor = executor(&server.base_url);

    let outcome = executor
        .execute(0, "what is the capital", &WorkloadSpec::new("qa", 1.0, 1.0))
        .await;

    let RequestOutcome::Success(success) = outcome else {
        panic!("expected success, got {:?}", outcome);
    };
    assert_eq!(success.output, "Paris is lovely.");
    assert_eq!(success.units_in, 4);
    assert_eq!(success.units_out, 3);
    assert!(success.latency_ms >= 10.0);
    assert_eq!(
        success.detail,
        SuccessDetail::Atomic {
            server_latency_ms: Some(10)
        }
    );

    server.shutdown().await;
}

#[tokio::test]
async fn streamed_request_is_decoded_across_chunks() {
    let server = InferServer::start().await.unwrap();
    let executor = executor(&server.base_url);

    let outcome = executor.execute(1, "tell me", &streaming_spec("chat")).await;

    let RequestOutcome::Success(success) = outcome else {
        panic!("expected success, got {:?}", outcome);
    };
    assert_eq!(success.output, "Paris is lovely.");
    assert_eq!(success.units_in, 2);
    assert_eq!(success.units_out, 3);

    let SuccessDetail::Streamed(timing) = &success.detail else {
        panic!("expected streamed detail");
    };
    assert!(timing.ttft_ms > 0.0);
    assert!(timing.ttft_ms <= success.latency_ms);
    assert_eq!(timing.inter_unit_latencies_ms.len(), 2);
    assert!(timing.generation_rate > 0.0);

    server.shutdown().await;
}

#[tokio::test]
async fn server_error_status_is_classified() {
    let server = InferServer::start().await.unwrap();
    let executor = executor(&server.base_url);

    let atomic = executor.execute(0, "please fail", &WorkloadSpec::new("qa", 1.0, 1.0)).await;
    assert_eq!(atomic.error_kind(), Some(ErrorKind::ServerError));

    let streamed = executor.execute(1, "please fail", &streaming_spec("chat")).await;
    assert_eq!(streamed.error_kind(), Some(ErrorKind::ServerError));
    assert_eq!(streamed.units_out(), 0);

    server.shutdown().await;
}

#[tokio::test]
async fn stream_closed_without_terminal_is_transport_error() {
    let server = InferServer::start().await.unwrap();
    let executor = executor(&server.base_url);

    let outcome = executor.execute(0, "truncate me", &streaming_spec("chat")).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::TransportError));

    server.shutdown().await;
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let executor = executor(&format!("http://{addr}"));
    let outcome = executor.execute(0, "hello", &WorkloadSpec::new("qa", 1.0, 1.0)).await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::TransportError));
}

#[tokio::test]
async fn driver_runs_workloads_over_http_and_writes_reports() {
    let server = InferServer::start().await.unwrap();

    let config = BenchmarkConfig {
        endpoints: vec![EndpointConfig {
            name: "local".to_string(),
            url: server.base_url.clone(),
        }],
        workloads: vec![
            WorkloadSpec::new("qa-short", 4.0, 0.5),
            WorkloadSpec {
                stream: true,
                ..WorkloadSpec::new("code-long", 4.0, 0.5)
            },
        ],
        ..Default::default()
    };

    let endpoint = Endpoint::new("local", HttpEndpointClient::new(&server.base_url).unwrap());
    let driver = WorkloadDriver::new(config, vec![endpoint]);
    let results = driver.run_all("http-run").await.unwrap();

    let qa = results.get("qa-short", "local").unwrap();
    assert_eq!(qa.summary.total_requests, 2);
    assert_eq!(qa.summary.error_rate, 0.0);

    let code = results.get("code-long", "local").unwrap();
    assert_eq!(code.summary.total_units_out, 6);
    assert!(code.summary.streaming.as_ref().unwrap().avg_ttft_ms > 0.0);

    let temp = TempDir::new().unwrap();
    JsonReporter::new()
        .generate(&results, &temp.path().join("raw.json"))
        .unwrap();
    MarkdownReporter::new()
        .generate(&results, &temp.path().join("summary.md"))
        .unwrap();

    let summary = std::fs::read_to_string(temp.path().join("summary.md")).unwrap();
    assert!(summary.contains("## qa-short"));
    assert!(summary.contains("## code-long"));

    CsvReporter::new()
        .generate(&results, &temp.path().join("summary.csv"))
        .unwrap();
    let csv = std::fs::read_to_string(temp.path().join("summary.csv")).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.lines().any(|l| l.starts_with("qa-short,local,")));

    server.shutdown().await;
}
