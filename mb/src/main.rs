//! MatrixBus - scatter-gather data exchange
//!
//! CLI entry point for planning and simulating fetch/push over in-process workers.

use std::path::Path;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use matrixbus::cli::{Cli, Command, OutputFormat};
use matrixbus::config::Config;
use matrixbus::{
    ClusterSpec, DataBus, KeySet, KeyedMatrix, LocalWorker, Matrix, PartitionDescriptor, WorkerStats, as_remotes,
    plan_fetch, plan_push,
};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > WARN
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        },
        None => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    debug!(?config, "main: loaded config");

    match cli.command {
        Command::Plan {
            cluster,
            fetch,
            push,
            cols,
            format,
        } => {
            debug!("main: matched Plan command");
            cmd_plan(&cluster, fetch, push, &cols, format)
        }
        Command::Simulate {
            cluster,
            push,
            fetch,
            cols,
            initialize_only,
            format,
        } => {
            debug!("main: matched Simulate command");
            cmd_simulate(&config, &cluster, &push, &fetch, &cols, initialize_only, format).await
        }
    }
}

/// One planned request, as printed
#[derive(serde::Serialize)]
struct PlannedRequest {
    remote: String,
    rows: String,
}

fn cmd_plan(
    cluster_path: &Path,
    fetch: Option<KeySet>,
    push: Option<KeySet>,
    cols: &KeySet,
    format: OutputFormat,
) -> Result<()> {
    debug!(cluster = %cluster_path.display(), ?fetch, ?push, "cmd_plan: called");
    let spec = ClusterSpec::load(cluster_path)?;
    let partition = spec.partition.as_ref();
    let worker_name = |i: usize| format!("worker-{}", i);

    let (operation, requests, unowned_rows, unowned) = match (fetch, push) {
        (Some(rows), _) => {
            let plan = plan_fetch(&spec.matrix, &rows, cols, partition, spec.workers)?;
            let replicated = PartitionDescriptor::Replicated;
            let unowned = partition.unwrap_or(&replicated).unowned_keys(&rows);
            let requests: Vec<PlannedRequest> = plan
                .dispatches
                .iter()
                .map(|d| PlannedRequest {
                    remote: worker_name(d.remote),
                    rows: d.request.row_keys.to_string(),
                })
                .collect();
            ("fetch", requests, plan.unowned_rows, unowned)
        }
        (None, Some(rows)) => {
            let payload = spec.generate(&rows)?;
            let plan = plan_push(&spec.matrix, false, payload, partition, spec.workers)?;
            let requests: Vec<PlannedRequest> = plan
                .dispatches
                .iter()
                .map(|d| PlannedRequest {
                    remote: worker_name(d.remote),
                    rows: d.request.matrix.row_keys().to_string(),
                })
                .collect();
            ("push", requests, plan.unowned_rows, Some(KeySet::empty()))
        }
        (None, None) => return Err(eyre::eyre!("Give --fetch or --push")),
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "operation": operation,
                "matrix": spec.matrix,
                "requests": requests,
                "unowned-rows": unowned_rows,
                "unowned-keys": unowned.as_ref().map(KeySet::to_string),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!(
                "{} plan for '{}': {} request(s)",
                operation.bold(),
                spec.matrix,
                requests.len()
            );
            for request in &requests {
                println!("  -> {} rows {}", request.remote.cyan(), request.rows);
            }
            match &unowned {
                Some(keys) if keys.is_empty() => {}
                Some(keys) => println!("  {} rows {} owned by no partition", "dropped".yellow(), keys),
                None => println!("  unbounded request; unowned rows not listed"),
            }
        }
    }
    Ok(())
}

async fn cmd_simulate(
    config: &Config,
    cluster_path: &Path,
    push: &KeySet,
    fetch: &KeySet,
    cols: &KeySet,
    initialize_only: bool,
    format: OutputFormat,
) -> Result<()> {
    debug!(cluster = %cluster_path.display(), %push, %fetch, %cols, initialize_only, "cmd_simulate: called");
    let spec = ClusterSpec::load(cluster_path)?;
    let workers = spec.spawn_workers();
    let remotes = as_remotes(&workers);
    let bus = DataBus::new(config.databus.clone());
    let partition = spec.partition.as_ref();

    let outcome = async {
        let payload = spec.generate(push)?;
        let pushed = bus
            .push(&spec.matrix, initialize_only, payload, partition, &remotes)
            .await
            .context("Push failed")?;
        let fetched = bus
            .fetch(&spec.matrix, fetch, cols, partition, &remotes)
            .await
            .context("Fetch failed")?;

        let mut stats = Vec::with_capacity(workers.len());
        for (i, worker) in workers.iter().enumerate() {
            stats.push((format!("worker-{}", i), worker.stats().await?));
        }
        Ok::<_, eyre::Report>((pushed, fetched, stats))
    }
    .await;
    shutdown_all(&workers).await;
    let (pushed, fetched, stats) = outcome?;

    match format {
        OutputFormat::Json => {
            let workers: Vec<serde_json::Value> = stats
                .iter()
                .map(|(id, s)| serde_json::json!({ "id": id, "stats": s }))
                .collect();
            let json = serde_json::json!({
                "matrix": spec.matrix,
                "pushed": pushed,
                "fetched": fetched,
                "workers": workers,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => print_simulation(&spec.matrix, pushed, &fetched, &stats),
    }
    Ok(())
}

fn print_simulation(matrix: &str, pushed: bool, fetched: &KeyedMatrix, stats: &[(String, WorkerStats)]) {
    let outcome = if pushed { "ok".green() } else { "refused".yellow() };
    println!("{} '{}': {}", "push".bold(), matrix, outcome);
    println!("{} '{}': {} row(s)", "fetch".bold(), matrix, fetched.row_count());
    for (row, values) in fetched.rows() {
        let cells: Vec<String> = values.iter().map(|(col, v)| format!("{}={}", col, v)).collect();
        println!("  {:>6}  {}", row, cells.join(" "));
    }
    println!("{}", "workers".bold());
    for (id, s) in stats {
        println!(
            "  {}  fetches={} pushes={} refused={} rows-stored={} rows-served={}",
            id.cyan(),
            s.fetches,
            s.pushes,
            s.refused_pushes,
            s.rows_stored,
            s.rows_served
        );
    }
}

async fn shutdown_all(workers: &[LocalWorker]) {
    for worker in workers {
        if let Err(e) = worker.shutdown().await {
            debug!(error = %e, "shutdown_all: worker already stopped");
        }
    }
}
