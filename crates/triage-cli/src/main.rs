//! Triage CLI
//!
//! Reads requests from the command line or stdin, one at a time, and prints
//! which handler answered each of them.

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use triage_core::{CompletionClient, CompletionConfig, OpenAiCompletionClient};
use triage_router::{Orchestrator, TriageConfig};
use triage_telemetry::RunTrace;

mod session;

/// Events kept by `--trace`; older ones are evicted
const TRACE_CAPACITY: usize = 10_000;

#[derive(Parser, Debug)]
#[command(name = "triage")]
#[command(about = "Classify requests and hand them to specialized handlers", long_about = None)]
struct Cli {
    /// Pipeline configuration file
    #[arg(short, long, default_value = "triage.yaml", env = "TRIAGE_CONFIG")]
    config: String,

    /// Process a single request and exit
    #[arg(short, long)]
    input: Option<String>,

    /// Completion model override
    #[arg(short, long)]
    model: Option<String>,

    /// Completion API base URL override
    #[arg(long)]
    api_base: Option<String>,

    /// Print Prometheus metrics on exit
    #[arg(long)]
    metrics: bool,

    /// Print the state transition trace on exit
    #[arg(long)]
    trace: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let metrics_handle = if cli.metrics {
        Some(init_metrics()?)
    } else {
        None
    };

    let config = TriageConfig::from_file(&cli.config)
        .with_context(|| format!("loading pipeline config from {}", cli.config))?;
    info!("Configuration loaded from {}", cli.config);

    let client = if config.needs_completion() {
        Some(completion_client(&cli)?)
    } else {
        None
    };

    let mut orchestrator = config.build(client)?;
    let trace = cli
        .trace
        .then(|| Arc::new(Mutex::new(RunTrace::with_max_events(TRACE_CAPACITY))));
    if let Some(trace) = &trace {
        orchestrator = orchestrator.with_trace(Arc::clone(trace));
    }

    match &cli.input {
        Some(input) => {
            let line = session::process_line(&orchestrator, input).await;
            println!("{}", line);
        }
        None => interactive(&orchestrator).await?,
    }

    let snapshot = orchestrator.metrics().snapshot();
    info!(
        total = snapshot.total_requests,
        completed = snapshot.completed,
        rejected = snapshot.rejected,
        failed = snapshot.failed,
        avg_latency_us = snapshot.avg_latency_us(),
        "Session finished"
    );

    if let Some(trace) = trace {
        print_trace(&trace)?;
    }

    if let Some(handle) = metrics_handle {
        print!("{}", handle.render());
    }

    Ok(())
}

async fn interactive(orchestrator: &Orchestrator) -> Result<()> {
    println!(
        "Routing to: {} (type 'exit' to quit)",
        orchestrator.router().labels().join(", ")
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let processed = session::run(orchestrator, stdin, &mut stdout).await?;
    info!("Processed {} requests", processed);
    Ok(())
}

/// Build the completion client from the environment and CLI overrides
fn completion_client(cli: &Cli) -> Result<Arc<dyn CompletionClient>> {
    let mut settings = CompletionConfig::from_env();
    if let Some(model) = &cli.model {
        settings = settings.with_model(model.clone());
    }
    if let Some(api_base) = &cli.api_base {
        settings = settings.with_api_base(api_base.clone());
    }

    info!(model = %settings.model, api_base = %settings.api_base, "Completion service configured");
    Ok(Arc::new(OpenAiCompletionClient::new(&settings)?))
}

fn print_trace(trace: &Mutex<RunTrace>) -> Result<()> {
    let trace = trace.lock().unwrap_or_else(|poisoned| {
        warn!("Run trace lock poisoned, printing recorded events");
        poisoned.into_inner()
    });
    if !trace.verify() {
        warn!("Run trace failed verification");
    }
    for event in trace.events() {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("triage=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("triage=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Install the Prometheus recorder and return a handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!("triage_requests_total", "Total number of requests received");
    metrics::describe_counter!(
        "triage_handoffs_total",
        "Requests handed to a handler, by label"
    );
    metrics::describe_counter!(
        "triage_outcomes_total",
        "Terminal pipeline states by outcome and stage"
    );
    metrics::describe_histogram!(
        "triage_run_latency_us",
        metrics::Unit::Microseconds,
        "End-to-end pipeline latency in microseconds"
    );

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "triage",
            "--config",
            "config/support.yaml",
            "--input",
            "I was charged twice",
            "--model",
            "gemini-2.0-flash",
            "--metrics",
        ])
        .unwrap();

        assert_eq!(cli.config, "config/support.yaml");
        assert_eq!(cli.input.as_deref(), Some("I was charged twice"));
        assert_eq!(cli.model.as_deref(), Some("gemini-2.0-flash"));
        assert!(cli.metrics);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_shipped_configs_parse() {
        let homework = TriageConfig::from_yaml(include_str!("../config/homework.yaml")).unwrap();
        assert!(homework.needs_completion());

        let support = TriageConfig::from_yaml(include_str!("../config/support.yaml")).unwrap();
        assert!(!support.needs_completion());
    }

    #[tokio::test]
    async fn test_support_config_offline() {
        let orchestrator = TriageConfig::from_yaml(include_str!("../config/support.yaml"))
            .unwrap()
            .build(None)
            .unwrap();

        let line = session::process_line(&orchestrator, "I want my money back").await;
        assert_eq!(line, "[refunds] Refunds are processed within 5-7 business days.");

        let line = session::process_line(&orchestrator, "you stupid bot").await;
        assert_eq!(
            line,
            "[rejected] Please keep the conversation respectful. (matched 'stupid bot')"
        );
    }
}
