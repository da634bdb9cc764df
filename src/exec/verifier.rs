// src/exec/verifier.rs

//! Pluggable verifier abstraction.
//!
//! The scheduler talks to a `Verifier` instead of spawning processes itself.
//! This keeps the orchestration core free of tool-specific knowledge and
//! makes it easy to swap in a scripted verifier in tests.
//!
//! - [`crate::exec::process::ProcessVerifier`] is the production
//!   implementation, running the configured tool for each task kind.
//! - Tests provide their own `Verifier` that returns scripted reports
//!   without spawning real processes.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use crate::errors::Result;

/// What a single verifier invocation reports back.
///
/// The orchestrator classifies `exit_code` but never interprets the contents
/// behind `log_path`.
#[derive(Debug, Clone)]
pub struct VerifierReport {
    pub exit_code: i32,
    pub duration: Duration,
    pub log_path: Option<PathBuf>,
}

/// Trait abstracting how one task's check is performed.
///
/// Contract: the returned future either resolves within `timeout` plus a
/// small grace period or is dropped by the executor; implementations must
/// make dropping the future terminate the underlying work (the process
/// implementation uses `kill_on_drop`). `timeout` is also passed through so
/// tools that can self-limit do so first.
pub trait Verifier: Send + Sync + 'static {
    fn execute(
        &self,
        task: &str,
        timeout: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = Result<VerifierReport>> + Send + 'static>>;
}
