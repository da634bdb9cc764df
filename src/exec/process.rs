// src/exec/process.rs

//! Production verifier that runs the configured tool for each task kind.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::model::{CheckKind, ConfigFile, ToolsSection};
use crate::errors::{Result, VerirunError};
use crate::exec::verifier::{Verifier, VerifierReport};

/// Immutable invocation table shared by all in-flight executions.
#[derive(Debug)]
struct Inner {
    tools: ToolsSection,
    checks: BTreeMap<String, CheckKind>,
    log_dir: PathBuf,
}

/// Runs one external tool process per task, capturing output to a per-task
/// log file. Children are spawned with `kill_on_drop`, so dropping an
/// execution future (the executor's timeout path) terminates the process.
#[derive(Debug, Clone)]
pub struct ProcessVerifier {
    inner: Arc<Inner>,
}

impl ProcessVerifier {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let checks = cfg
            .task
            .iter()
            .map(|(name, task)| (name.clone(), task.check.clone()))
            .collect();

        Self {
            inner: Arc::new(Inner {
                tools: cfg.tools.clone(),
                checks,
                log_dir: PathBuf::from(&cfg.config.log_dir),
            }),
        }
    }

    /// Build the command line for a check kind from the `[tools]` section.
    fn command_for(tools: &ToolsSection, check: &CheckKind) -> Command {
        match check {
            CheckKind::ModelCheck { spec, config } => {
                let mut cmd = Command::new(&tools.model_checker);
                if let Some(config) = config {
                    cmd.arg("-config").arg(config);
                }
                cmd.arg(spec);
                cmd
            }
            CheckKind::Proof { module } => {
                let mut cmd = Command::new(&tools.proof_checker);
                cmd.arg(module);
                cmd
            }
            CheckKind::Harness { binary, args } => {
                let mut cmd = Command::new(binary);
                cmd.args(args);
                cmd
            }
        }
    }
}

impl Verifier for ProcessVerifier {
    fn execute(
        &self,
        task: &str,
        timeout: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = Result<VerifierReport>> + Send + 'static>> {
        let inner = Arc::clone(&self.inner);
        let task = task.to_string();

        Box::pin(async move {
            let check = inner
                .checks
                .get(&task)
                .cloned()
                .ok_or_else(|| VerirunError::UnknownTask(task.clone()))?;

            std::fs::create_dir_all(&inner.log_dir)?;
            let log_path = inner.log_dir.join(format!("{task}.log"));
            let log_file = std::fs::File::create(&log_path)
                .with_context(|| format!("creating log file for task '{task}'"))?;
            let err_file = log_file.try_clone()?;

            let mut cmd = Self::command_for(&inner.tools, &check);
            cmd.stdout(Stdio::from(log_file))
                .stderr(Stdio::from(err_file))
                .kill_on_drop(true);

            if let Some(timeout) = timeout {
                // Tools that understand this can stop themselves before the
                // executor has to force-terminate them.
                cmd.env("VERIRUN_TIMEOUT_SECS", timeout.as_secs().to_string());
            }

            info!(task = %task, ?check, "starting verifier process");
            let started = Instant::now();

            let status = cmd
                .status()
                .await
                .with_context(|| format!("spawning verifier process for task '{task}'"))?;

            let exit_code = status.code().unwrap_or(-1);
            debug!(
                task = %task,
                exit_code,
                success = status.success(),
                "verifier process exited"
            );

            Ok(VerifierReport {
                exit_code,
                duration: started.elapsed(),
                log_path: Some(log_path),
            })
        })
    }
}
