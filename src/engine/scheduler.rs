// src/engine/scheduler.rs

//! Bounded-concurrency scheduler loop.
//!
//! The loop owns the [`ExecutionSession`] exclusively and is the only writer
//! of task state. Workers run off-loop in spawned tasks and report back with
//! one [`CompletionEvent`] each; the loop processes one event at a time, so
//! no lock is needed anywhere in the session.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::{ExecutionSession, TaskStatus};
use crate::engine::{CompletionEvent, Outcome};
use crate::errors::{Result, VerirunError};
use crate::exec::executor::{run_check, ScheduledCheck};
use crate::exec::verifier::Verifier;

/// Drives one session to completion under the configured concurrency limit.
pub struct Scheduler<V: Verifier> {
    session: ExecutionSession,
    verifier: Arc<V>,
    fail_fast: bool,
}

impl<V: Verifier> Scheduler<V> {
    pub fn new(session: ExecutionSession, verifier: Arc<V>, fail_fast: bool) -> Self {
        Self {
            session,
            verifier,
            fail_fast,
        }
    }

    /// Run every task in the session to a terminal status and return the
    /// finished session for aggregation.
    ///
    /// Dependency order is always respected: a task is launched only after
    /// the session moved it to `Ready`, which requires every dependency to
    /// have succeeded. Launch order among unordered ready tasks follows
    /// declaration order.
    pub async fn run(mut self) -> Result<ExecutionSession> {
        let jobs = self.session.jobs();
        info!(
            tasks = self.session.order().len(),
            jobs,
            fail_fast = self.fail_fast,
            "session started"
        );

        // One slot of headroom per worker keeps sends from ever blocking.
        let (events_tx, mut events_rx) = mpsc::channel::<CompletionEvent>(jobs.max(1) * 2);

        loop {
            self.launch_ready(&events_tx);

            if self.session.all_terminal() {
                break;
            }

            if self.session.running_count() == 0 {
                // Nothing running and nothing launchable, yet tasks remain
                // non-terminal: the session state machine is broken.
                return Err(VerirunError::Inconsistency(
                    "no running tasks but session is not terminal".to_string(),
                ));
            }

            let event = events_rx.recv().await.ok_or_else(|| {
                VerirunError::Inconsistency(
                    "completion channel closed with tasks outstanding".to_string(),
                )
            })?;

            self.on_completion(event)?;
        }

        info!("session finished; all tasks terminal");
        Ok(self.session)
    }

    /// Launch ready tasks onto free worker slots up to the concurrency limit.
    fn launch_ready(&mut self, events_tx: &mpsc::Sender<CompletionEvent>) {
        while self.session.running_count() < self.session.jobs() {
            let Some(id) = self.session.next_ready() else {
                break;
            };

            let check = ScheduledCheck {
                id,
                name: self.session.graph().name_of(id).to_string(),
                timeout: self.session.timeout_of(id),
            };

            debug!(
                task = %check.name,
                timeout = ?check.timeout,
                running = self.session.running_count(),
                "launching task"
            );

            let verifier = Arc::clone(&self.verifier);
            let tx = events_tx.clone();
            tokio::spawn(run_check(check, verifier, tx));
        }
    }

    /// Apply one completion event to the session.
    fn on_completion(&mut self, event: CompletionEvent) -> Result<()> {
        let name = self.session.graph().name_of(event.task).to_string();

        let effects = self.session.record_completion(
            event.task,
            event.outcome,
            event.duration,
            event.log_path,
        )?;

        match event.outcome {
            Outcome::Succeeded => {
                debug!(task = %name, newly_ready = effects.newly_ready.len(), "task succeeded");
            }
            Outcome::Failed(code) => {
                warn!(
                    task = %name,
                    exit_code = code,
                    cascaded = effects.cascaded.len(),
                    "task failed; dependents cascaded"
                );
            }
            Outcome::TimedOut => {
                warn!(
                    task = %name,
                    cascaded = effects.cascaded.len(),
                    "task timed out; dependents cascaded"
                );
            }
        }

        if self.fail_fast && event.outcome != Outcome::Succeeded {
            let aborted = self.session.abort_pending();
            if !aborted.is_empty() {
                warn!(
                    aborted = aborted.len(),
                    "fail-fast: remaining unstarted tasks marked failed"
                );
            }
        }

        debug_assert!(
            self.session
                .order()
                .iter()
                .filter(|&&id| self.session.status_of(id) == Some(TaskStatus::Running))
                .count()
                <= self.session.jobs()
        );

        Ok(())
    }
}
