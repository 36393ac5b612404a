//! @ai:module:intent CLI for paced endpoint benchmarks
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokenforge_bench::{
    config::{BenchmarkConfig, EndpointConfig},
    corpus::{CorpusEntry, CorpusLoader, CorpusLoaderTrait, CorpusPrompts, ReferenceTable},
    evaluator::OverlapEvaluator,
    metrics::BenchmarkResults,
    report::ReportGenerator,
    runner::{Endpoint, EndpointClient, HttpEndpointClient, MockEndpointClient, WorkloadDriver},
};

#[derive(Parser)]
#[command(name = "tokenforge-bench")]
#[command(about = "Paced load generation and latency measurement for inference endpoints")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every configured workload against every endpoint
    Run {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Identifier for this run (defaults to a timestamp)
        #[arg(long)]
        run_id: Option<String>,

        /// Output directory for results (overrides paths.results_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Endpoint as name=url; repeatable, replaces configured endpoints
        #[arg(short, long = "endpoint", value_parser = parse_endpoint)]
        endpoints: Vec<EndpointConfig>,

        /// Skip warmup requests
        #[arg(long)]
        no_warmup: bool,

        /// Run against an in-process mock endpoint instead of the network
        #[arg(long)]
        dry_run: bool,
    },

    /// Regenerate summary and charts from an existing raw.json
    Report {
        /// Path to results JSON file
        #[arg(short, long)]
        results: PathBuf,

        /// Output directory for reports (defaults to the results file's directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load and validate a configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "benchmark.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tokenforge_bench=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            run_id,
            output,
            endpoints,
            no_warmup,
            dry_run,
        } => {
            run_benchmarks(RunArgs {
                config,
                run_id,
                output,
                endpoints,
                no_warmup,
                dry_run,
            })
            .await
        }
        Commands::Report { results, output } => generate_reports(results, output),
        Commands::Validate { config } => validate(config),
        Commands::Init { output } => init_config(output),
    }
}

struct RunArgs {
    config: Option<PathBuf>,
    run_id: Option<String>,
    output: Option<PathBuf>,
    endpoints: Vec<EndpointConfig>,
    no_warmup: bool,
    dry_run: bool,
}

/// @ai:intent Parse a `name=url` endpoint argument
/// @ai:example ("vllm=http://localhost:9000") -> EndpointConfig { name: "vllm", url: "http://localhost:9000" }
/// @ai:effects pure
fn parse_endpoint(value: &str) -> std::result::Result<EndpointConfig, String> {
    match value.split_once('=') {
        Some((name, url)) if !name.is_empty() && !url.is_empty() => Ok(EndpointConfig {
            name: name.to_string(),
            url: url.to_string(),
        }),
        _ => Err(format!("expected name=url, got '{}'", value)),
    }
}

/// @ai:intent Run benchmark suite
/// @ai:effects network, fs:read, fs:write
async fn run_benchmarks(args: RunArgs) -> Result<()> {
    let mut config = load_or_default_config(args.config)?;

    if !args.endpoints.is_empty() {
        config.endpoints = args.endpoints;
    }

    if args.no_warmup {
        config.run.warmup_requests = 0;
    }

    config.validate()?;

    let run_id = args
        .run_id
        .or_else(|| config.run.run_id.clone())
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string());

    let output_dir = args
        .output
        .unwrap_or_else(|| config.paths.results_dir.clone())
        .join(&run_id);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    tracing::info!("Output directory: {}", output_dir.display());

    let entries = load_corpus(&config)?;

    let results = if args.dry_run {
        tracing::info!("Running in dry-run mode");
        let endpoints = config
            .endpoints
            .iter()
            .map(|e| {
                Endpoint::new(
                    &e.name,
                    MockEndpointClient::new("This is a dry run response from the mock endpoint.")
                        .with_latency(std::time::Duration::from_millis(5))
                        .with_unit_delay(std::time::Duration::from_millis(2)),
                )
            })
            .collect();
        execute(config, endpoints, entries, &run_id).await?
    } else {
        let endpoints = config
            .endpoints
            .iter()
            .map(|e| Ok(Endpoint::new(&e.name, HttpEndpointClient::new(&e.url)?)))
            .collect::<Result<Vec<_>>>()?;
        execute(config, endpoints, entries, &run_id).await?
    };

    ReportGenerator::new().generate_all(&results, &output_dir)?;
    print_summary(&results);

    Ok(())
}

/// @ai:intent Build the driver for a client type and run the full matrix
/// @ai:effects network
async fn execute<C: EndpointClient>(
    config: BenchmarkConfig,
    endpoints: Vec<Endpoint<C>>,
    entries: Vec<CorpusEntry>,
    run_id: &str,
) -> Result<BenchmarkResults> {
    let mut references = ReferenceTable::builtin();
    references.extend_from_corpus(&entries);

    let driver = WorkloadDriver::new(config, endpoints)
        .with_prompt_source(CorpusPrompts::new(entries))
        .with_references(references)
        .with_evaluator(OverlapEvaluator::new()?);

    driver.run_all(run_id).await
}

/// @ai:intent Load corpus entries if a corpus directory is configured
/// @ai:effects fs:read
fn load_corpus(config: &BenchmarkConfig) -> Result<Vec<CorpusEntry>> {
    let Some(corpus_dir) = &config.paths.corpus_dir else {
        return Ok(Vec::new());
    };

    tracing::info!("Loading corpus from {}", corpus_dir.display());
    let entries = CorpusLoader::new().load_all(corpus_dir)?;
    tracing::info!("Loaded {} corpus entries", entries.len());
    Ok(entries)
}

/// @ai:intent Regenerate reports from a results file
/// @ai:effects fs:read, fs:write
fn generate_reports(results_path: PathBuf, output_dir: Option<PathBuf>) -> Result<()> {
    let output_dir = output_dir.unwrap_or_else(|| {
        results_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let results = ReportGenerator::new().regenerate(&results_path, &output_dir)?;
    print_summary(&results);
    Ok(())
}

/// @ai:intent Validate configuration and report what would run
/// @ai:effects fs:read
fn validate(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_or_default_config(config_path)?;
    config.validate()?;

    let entries = load_corpus(&config)?;

    println!("Configuration is valid.");
    println!("Endpoints: {}", config.endpoints.len());

    for endpoint in &config.endpoints {
        println!("  - {} ({})", endpoint.name, endpoint.url);
    }

    println!("Workloads: {}", config.workloads.len());

    for w in &config.workloads {
        let corpus_prompts = entries.iter().filter(|e| e.workload == w.name).count();
        println!(
            "  - {} ({} req/s for {}s, {}{}{}, {} corpus prompts)",
            w.name,
            w.qps,
            w.duration_secs,
            if w.stream { "streaming" } else { "atomic" },
            if w.evaluate { ", evaluated" } else { "" },
            if w.profile_memory { ", memory profiled" } else { "" },
            corpus_prompts
        );
    }

    Ok(())
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    let config = BenchmarkConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent Load configuration or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<BenchmarkConfig> {
    match path {
        Some(p) => BenchmarkConfig::load(&p),
        None => {
            let default_path = PathBuf::from("benchmark.toml");

            if default_path.exists() {
                BenchmarkConfig::load(&default_path)
            } else {
                Ok(BenchmarkConfig::default())
            }
        }
    }
}

/// @ai:intent Print a compact per-workload table to stdout
/// @ai:effects io
fn print_summary(results: &BenchmarkResults) {
    println!();
    println!("Benchmark Results: {}", results.run_id);
    println!("==================");

    for (workload, reports) in &results.workloads {
        println!();
        println!("{}", workload);
        println!(
            "  {:<16} {:>8} {:>8} {:>10} {:>10} {:>10} {:>10}",
            "endpoint", "requests", "errors", "p50 ms", "p95 ms", "p99 ms", "units/s"
        );
        println!("  {}", "-".repeat(78));

        for (endpoint, report) in reports {
            let s = &report.summary;
            println!(
                "  {:<16} {:>8} {:>7.1}% {:>10.1} {:>10.1} {:>10.1} {:>10.2}",
                endpoint,
                s.total_requests,
                s.error_rate * 100.0,
                s.p50_latency_ms,
                s.p95_latency_ms,
                s.p99_latency_ms,
                s.units_per_second
            );

            if let Some(streaming) = &s.streaming {
                println!(
                    "  {:<16} ttft p50 {:.1} ms, p95 {:.1} ms, {:.1} units/s",
                    "", streaming.p50_ttft_ms, streaming.p95_ttft_ms, streaming.avg_generation_rate
                );
            }
        }
    }

    println!();
}
