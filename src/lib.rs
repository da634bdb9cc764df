// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::{execution_order, ExecutionSession, SessionLimits, TaskGraph};
use crate::engine::aggregate::{summarize, OverallStatus};
use crate::engine::Scheduler;
use crate::errors::{Result, VerirunError};
use crate::exec::ProcessVerifier;
use crate::report::{write_summary, PlainReporter, Reporter};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - graph construction and order resolution
/// - the scheduler with the process verifier
/// - aggregation, summary persistence, and plain reporting
///
/// Returns the session's overall status; `Err` means the run aborted before
/// (or without) producing a verdict.
pub async fn run(args: CliArgs) -> Result<OverallStatus> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let graph = Arc::new(TaskGraph::from_config(&cfg)?);

    let requested_names: Vec<String> = if args.all {
        cfg.task.keys().cloned().collect()
    } else {
        match &args.task {
            Some(name) => vec![name.clone()],
            None => {
                return Err(VerirunError::ConfigError(
                    "specify a task name or --all".to_string(),
                ));
            }
        }
    };

    let requested: Vec<_> = requested_names
        .iter()
        .map(|name| {
            graph
                .id_of(name)
                .ok_or_else(|| VerirunError::UnknownTask(name.clone()))
        })
        .collect::<Result<_>>()?;

    let closure = graph.transitive_closure(&requested_names)?;
    let order = execution_order(&graph, &closure)?;

    if args.dry_run {
        print_dry_run(&cfg, &graph, &order);
        return Ok(OverallStatus::Success);
    }

    let jobs = resolve_jobs(&args, &cfg)?;
    let timeouts = resolve_timeouts(&args, &cfg, &graph);
    let session = ExecutionSession::new(
        Arc::clone(&graph),
        requested,
        order,
        SessionLimits { jobs, timeouts },
    );

    let verifier = Arc::new(ProcessVerifier::from_config(&cfg));
    let started = Instant::now();
    let session = Scheduler::new(session, verifier, args.fail_fast).run().await?;

    let summary = summarize(&session, started.elapsed())?;

    let summary_path = args
        .summary_out
        .clone()
        .unwrap_or_else(|| cfg.config.summary_path.clone());
    write_summary(&summary, Path::new(&summary_path))?;

    PlainReporter.render(&summary)?;
    info!(overall = ?summary.overall, "session complete");

    Ok(summary.overall)
}

/// Concurrency limit: CLI flag, then `[config].jobs`, then the machine's
/// available parallelism; always at least 1.
fn resolve_jobs(args: &CliArgs, cfg: &ConfigFile) -> Result<usize> {
    if args.jobs == Some(0) {
        return Err(VerirunError::ConfigError(
            "--jobs must be >= 1 (got 0)".to_string(),
        ));
    }

    let jobs = args
        .jobs
        .or(cfg.config.jobs)
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });

    Ok(jobs.max(1))
}

/// Per-task timeouts: a task's own `timeout_secs` wins, then the CLI
/// `--timeout`, then `[config].timeout_secs`. A value of 0 disables the
/// timeout at any level.
fn resolve_timeouts(args: &CliArgs, cfg: &ConfigFile, graph: &TaskGraph) -> Vec<Option<Duration>> {
    let default_secs = args.timeout.unwrap_or(cfg.config.timeout_secs);

    graph
        .task_ids()
        .map(|id| {
            let name = graph.name_of(id);
            let secs = cfg
                .task
                .get(name)
                .and_then(|task| task.timeout_secs)
                .unwrap_or(default_secs);
            (secs > 0).then(|| Duration::from_secs(secs))
        })
        .collect()
}

/// Simple dry-run output: resolved execution order with deps and timeouts.
fn print_dry_run(cfg: &ConfigFile, graph: &TaskGraph, order: &[dag::TaskId]) {
    println!("verirun dry-run: {} task(s) would run", order.len());
    for &id in order {
        let name = graph.name_of(id);
        println!("  - {name}");
        if let Some(task) = cfg.task.get(name) {
            println!("      kind: {:?}", task.check);
            if !task.after.is_empty() {
                println!("      after: {:?}", task.after);
            }
            if let Some(secs) = task.timeout_secs {
                println!("      timeout_secs: {secs}");
            }
        }
    }
}
