// src/dag/session.rs

//! Per-session task state: the single-writer status table.
//!
//! An [`ExecutionSession`] is created per invocation and owned exclusively by
//! the scheduler loop. Workers never touch it; they report completions over a
//! channel and the loop applies them here one at a time, so no state in this
//! module needs a lock.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use crate::dag::graph::{TaskGraph, TaskId};
use crate::engine::Outcome;
use crate::errors::{Result, VerirunError};

/// Lifecycle of a task within a session.
///
/// `Pending -> Ready -> Running -> {Succeeded | Failed | TimedOut}`, except
/// that a cascade failure moves `Pending`/`Ready` straight to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting on at least one dependency.
    Pending,
    /// All dependencies succeeded; eligible for a free worker slot.
    Ready,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::TimedOut
        )
    }
}

/// Mutable per-task slot. Tasks outside the session have no slot.
#[derive(Debug, Clone)]
pub struct TaskSlot {
    pub status: TaskStatus,
    /// Present only for tasks that actually ran; cascaded failures never get
    /// an outcome.
    pub outcome: Option<Outcome>,
    pub started_at: Option<Instant>,
    /// Wall-clock duration of the verifier invocation, as measured by the
    /// worker.
    pub duration: Option<Duration>,
    pub log_path: Option<PathBuf>,
}

impl TaskSlot {
    fn new() -> Self {
        Self {
            status: TaskStatus::Pending,
            outcome: None,
            started_at: None,
            duration: None,
            log_path: None,
        }
    }
}

/// Concurrency limit and resolved per-task timeouts for one session.
#[derive(Debug, Clone)]
pub struct SessionLimits {
    /// Maximum number of concurrently running tasks (>= 1).
    pub jobs: usize,
    /// Timeout per task id; `None` disables the timeout for that task.
    pub timeouts: Vec<Option<Duration>>,
}

/// Effects of recording one completion: which dependents became ready, and
/// which were failed by cascade.
#[derive(Debug, Default)]
pub struct CompletionEffects {
    pub newly_ready: Vec<TaskId>,
    pub cascaded: Vec<TaskId>,
}

/// Live state of one scheduling session.
#[derive(Debug)]
pub struct ExecutionSession {
    graph: Arc<TaskGraph>,
    /// The tasks the caller asked for (before dependency expansion).
    requested: Vec<TaskId>,
    /// Resolved execution order over the dependency closure.
    order: Vec<TaskId>,
    limits: SessionLimits,
    /// One slot per graph id; `None` for tasks outside the session.
    slots: Vec<Option<TaskSlot>>,
    /// Min-heap of ready tasks, popped in declaration order.
    ready: BinaryHeap<Reverse<TaskId>>,
    running: usize,
}

impl ExecutionSession {
    /// Create a session over `order` (as produced by the resolver for the
    /// dependency closure of `requested`) and seed the ready queue with all
    /// tasks having zero in-session dependencies.
    pub fn new(
        graph: Arc<TaskGraph>,
        requested: Vec<TaskId>,
        order: Vec<TaskId>,
        limits: SessionLimits,
    ) -> Self {
        let mut slots: Vec<Option<TaskSlot>> = vec![None; graph.len()];
        for &id in &order {
            slots[id] = Some(TaskSlot::new());
        }

        let mut session = Self {
            graph,
            requested,
            order,
            limits,
            slots,
            ready: BinaryHeap::new(),
            running: 0,
        };

        for &id in &session.order.clone() {
            if session.deps_satisfied(id) {
                session.mark_ready(id);
            }
        }

        session
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn requested(&self) -> &[TaskId] {
        &self.requested
    }

    pub fn order(&self) -> &[TaskId] {
        &self.order
    }

    pub fn jobs(&self) -> usize {
        self.limits.jobs.max(1)
    }

    pub fn timeout_of(&self, id: TaskId) -> Option<Duration> {
        self.limits.timeouts.get(id).copied().flatten()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.slots.get(id).is_some_and(|s| s.is_some())
    }

    pub fn slot(&self, id: TaskId) -> Option<&TaskSlot> {
        self.slots.get(id).and_then(|s| s.as_ref())
    }

    pub fn status_of(&self, id: TaskId) -> Option<TaskStatus> {
        self.slot(id).map(|s| s.status)
    }

    pub fn running_count(&self) -> usize {
        self.running
    }

    /// Whether every task in the session reached a terminal status.
    pub fn all_terminal(&self) -> bool {
        self.order
            .iter()
            .all(|&id| self.status_of(id).is_some_and(TaskStatus::is_terminal))
    }

    /// Pop the next ready task (declaration order) and mark it `Running`.
    pub fn next_ready(&mut self) -> Option<TaskId> {
        while let Some(Reverse(id)) = self.ready.pop() {
            let Some(slot) = self.slots.get_mut(id).and_then(|s| s.as_mut()) else {
                warn!(id, "ready queue contained a task without a slot; skipping");
                continue;
            };
            slot.status = TaskStatus::Running;
            slot.started_at = Some(Instant::now());
            self.running += 1;
            return Some(id);
        }
        None
    }

    /// Record the outcome of one executed task and update dependents.
    ///
    /// Fails with [`VerirunError::Inconsistency`] if the task is not part of
    /// the session or is not currently `Running` (a terminal task reporting
    /// completion twice is a scheduler bug, not a verification failure).
    pub fn record_completion(
        &mut self,
        id: TaskId,
        outcome: Outcome,
        duration: Duration,
        log_path: Option<PathBuf>,
    ) -> Result<CompletionEffects> {
        let name = self.graph.name_of(id).to_string();
        let slot = self.slots.get_mut(id).and_then(|s| s.as_mut()).ok_or_else(|| {
            VerirunError::Inconsistency(format!(
                "completion reported for task '{name}' outside the session"
            ))
        })?;

        if slot.status != TaskStatus::Running {
            return Err(VerirunError::Inconsistency(format!(
                "completion reported for task '{name}' in status {:?}",
                slot.status
            )));
        }

        slot.status = match outcome {
            Outcome::Succeeded => TaskStatus::Succeeded,
            Outcome::Failed(_) => TaskStatus::Failed,
            Outcome::TimedOut => TaskStatus::TimedOut,
        };
        slot.outcome = Some(outcome);
        slot.duration = Some(duration);
        slot.log_path = log_path;
        self.running -= 1;

        let mut effects = CompletionEffects::default();
        match outcome {
            Outcome::Succeeded => self.promote_dependents(id, &mut effects),
            Outcome::Failed(_) | Outcome::TimedOut => {
                self.cascade_failure(id, &mut effects.cascaded)
            }
        }

        Ok(effects)
    }

    /// Fail every task that has not started yet. Used for fail-fast; running
    /// tasks are left to drain.
    pub fn abort_pending(&mut self) -> Vec<TaskId> {
        let mut aborted = Vec::new();
        for id in self.order.clone() {
            let Some(slot) = self.slots.get_mut(id).and_then(|s| s.as_mut()) else {
                continue;
            };
            if matches!(slot.status, TaskStatus::Pending | TaskStatus::Ready) {
                slot.status = TaskStatus::Failed;
                aborted.push(id);
            }
        }
        self.ready.clear();
        aborted
    }

    fn deps_satisfied(&self, id: TaskId) -> bool {
        self.graph.dependencies_of(id).iter().all(|&dep| {
            // Dependencies outside the session (possible when the caller
            // passes a non-closed set) do not gate readiness.
            match self.status_of(dep) {
                Some(status) => status == TaskStatus::Succeeded,
                None => true,
            }
        })
    }

    fn mark_ready(&mut self, id: TaskId) {
        let Some(slot) = self.slots.get_mut(id).and_then(|s| s.as_mut()) else {
            warn!(id, "attempted to mark a task outside the session as ready");
            return;
        };
        debug_assert_eq!(slot.status, TaskStatus::Pending);
        slot.status = TaskStatus::Ready;
        self.ready.push(Reverse(id));
        debug!(task = %self.graph.name_of(id), "task ready");
    }

    /// After `id` succeeded, move dependents whose remaining dependencies are
    /// all satisfied into the ready queue.
    fn promote_dependents(&mut self, id: TaskId, effects: &mut CompletionEffects) {
        // Decide first, then mutate.
        let candidates: Vec<TaskId> = self
            .graph
            .dependents_of(id)
            .iter()
            .copied()
            .filter(|&dep| {
                self.status_of(dep) == Some(TaskStatus::Pending) && self.deps_satisfied(dep)
            })
            .collect();

        for candidate in candidates {
            self.mark_ready(candidate);
            effects.newly_ready.push(candidate);
        }
    }

    /// Mark all in-session dependents of a failed or timed-out task as
    /// `Failed`, transitively. Tasks outside the dependent subtree are never
    /// touched.
    fn cascade_failure(&mut self, failed: TaskId, cascaded: &mut Vec<TaskId>) {
        let mut stack: Vec<TaskId> = self
            .graph
            .dependents_of(failed)
            .iter()
            .copied()
            .collect();

        while let Some(id) = stack.pop() {
            let Some(slot) = self.slots.get_mut(id).and_then(|s| s.as_mut()) else {
                continue;
            };
            match slot.status {
                TaskStatus::Pending | TaskStatus::Ready => {
                    slot.status = TaskStatus::Failed;
                    debug!(
                        task = %self.graph.name_of(id),
                        "failing dependent due to upstream failure"
                    );
                    cascaded.push(id);
                    stack.extend(self.graph.dependents_of(id).iter().copied());
                }
                // Running dependents are impossible (a task only runs once
                // every dependency succeeded); terminal ones stay as they are.
                _ => {}
            }
        }

        // A cascaded task can never sit in the ready queue.
        self.rebuild_ready_queue();
    }

    fn rebuild_ready_queue(&mut self) {
        let still_ready: BinaryHeap<Reverse<TaskId>> = self
            .ready
            .iter()
            .copied()
            .filter(|&Reverse(id)| self.status_of(id) == Some(TaskStatus::Ready))
            .collect();
        self.ready = still_ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::resolver::execution_order;

    fn decl(name: &str, deps: &[&str]) -> (String, Vec<String>) {
        (
            name.to_string(),
            deps.iter().map(|d| d.to_string()).collect(),
        )
    }

    fn session_over(declarations: &[(String, Vec<String>)], requested: &[&str]) -> ExecutionSession {
        let graph = Arc::new(TaskGraph::build(declarations).unwrap());
        let closure = graph.transitive_closure(requested).unwrap();
        let order = execution_order(&graph, &closure).unwrap();
        let limits = SessionLimits {
            jobs: 4,
            timeouts: vec![None; graph.len()],
        };
        ExecutionSession::new(graph, closure.clone(), order, limits)
    }

    #[test]
    fn seeds_ready_queue_with_root_tasks_only() {
        let mut s = session_over(
            &[decl("a", &[]), decl("b", &["a"]), decl("c", &[])],
            &["a", "b", "c"],
        );
        assert_eq!(s.status_of(0), Some(TaskStatus::Ready));
        assert_eq!(s.status_of(1), Some(TaskStatus::Pending));
        assert_eq!(s.status_of(2), Some(TaskStatus::Ready));

        // Declaration order: a before c.
        assert_eq!(s.next_ready(), Some(0));
        assert_eq!(s.next_ready(), Some(2));
        assert_eq!(s.next_ready(), None);
    }

    #[test]
    fn success_promotes_dependents() {
        let mut s = session_over(&[decl("a", &[]), decl("b", &["a"])], &["b"]);
        let a = s.next_ready().unwrap();
        let effects = s
            .record_completion(a, Outcome::Succeeded, Duration::from_millis(1), None)
            .unwrap();
        assert_eq!(effects.newly_ready, vec![1]);
        assert_eq!(s.status_of(1), Some(TaskStatus::Ready));
    }

    #[test]
    fn failure_cascades_to_transitive_dependents_only() {
        let mut s = session_over(
            &[
                decl("a", &[]),
                decl("b", &["a"]),
                decl("c", &["b"]),
                decl("unrelated", &[]),
            ],
            &["c", "unrelated"],
        );
        let a = s.next_ready().unwrap();
        assert_eq!(a, 0);

        let effects = s
            .record_completion(a, Outcome::Failed(2), Duration::from_millis(1), None)
            .unwrap();
        let mut cascaded = effects.cascaded.clone();
        cascaded.sort_unstable();
        assert_eq!(cascaded, vec![1, 2]);

        assert_eq!(s.status_of(1), Some(TaskStatus::Failed));
        assert_eq!(s.status_of(2), Some(TaskStatus::Failed));
        // The unrelated branch is untouched and still runnable.
        assert_eq!(s.status_of(3), Some(TaskStatus::Ready));
        assert!(s.slot(1).unwrap().outcome.is_none());
    }

    #[test]
    fn timeout_cascades_like_failure() {
        let mut s = session_over(&[decl("a", &[]), decl("b", &["a"])], &["b"]);
        let a = s.next_ready().unwrap();
        s.record_completion(a, Outcome::TimedOut, Duration::from_secs(2), None)
            .unwrap();
        assert_eq!(s.status_of(0), Some(TaskStatus::TimedOut));
        assert_eq!(s.status_of(1), Some(TaskStatus::Failed));
        assert!(s.all_terminal());
    }

    #[test]
    fn double_completion_is_an_inconsistency() {
        let mut s = session_over(&[decl("a", &[])], &["a"]);
        let a = s.next_ready().unwrap();
        s.record_completion(a, Outcome::Succeeded, Duration::from_millis(1), None)
            .unwrap();
        let err = s
            .record_completion(a, Outcome::Succeeded, Duration::from_millis(1), None)
            .unwrap_err();
        assert!(matches!(err, VerirunError::Inconsistency(_)));
    }

    #[test]
    fn completion_for_task_outside_session_is_an_inconsistency() {
        let mut s = session_over(&[decl("a", &[]), decl("b", &[])], &["a"]);
        let err = s
            .record_completion(1, Outcome::Succeeded, Duration::from_millis(1), None)
            .unwrap_err();
        assert!(matches!(err, VerirunError::Inconsistency(_)));
    }

    #[test]
    fn abort_pending_fails_unstarted_tasks_and_clears_queue() {
        let mut s = session_over(
            &[decl("a", &[]), decl("b", &["a"]), decl("c", &[])],
            &["b", "c"],
        );
        let a = s.next_ready().unwrap();
        assert_eq!(a, 0);

        let mut aborted = s.abort_pending();
        aborted.sort_unstable();
        assert_eq!(aborted, vec![1, 2]);
        assert_eq!(s.next_ready(), None);
        // The running task is left alone.
        assert_eq!(s.status_of(0), Some(TaskStatus::Running));
    }
}
