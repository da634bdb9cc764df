#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use verirun::dag::{execution_order, ExecutionSession, SessionLimits, TaskGraph};

/// Builder for an [`ExecutionSession`] over an ad-hoc task graph, to keep
/// scheduler tests free of config plumbing.
pub struct SessionBuilder {
    declarations: Vec<(String, Vec<String>)>,
    requested: Vec<String>,
    jobs: usize,
    default_timeout: Option<Duration>,
    timeouts: HashMap<String, Duration>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            declarations: Vec::new(),
            requested: Vec::new(),
            jobs: 4,
            default_timeout: None,
            timeouts: HashMap::new(),
        }
    }

    /// Declare a task with no dependencies.
    pub fn task(self, name: &str) -> Self {
        self.task_after(name, &[])
    }

    /// Declare a task depending on the given tasks.
    pub fn task_after(mut self, name: &str, after: &[&str]) -> Self {
        self.declarations.push((
            name.to_string(),
            after.iter().map(|d| d.to_string()).collect(),
        ));
        self
    }

    /// Request this task (plus its dependency closure). If never called, all
    /// declared tasks are requested.
    pub fn request(mut self, name: &str) -> Self {
        self.requested.push(name.to_string());
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Default timeout applied to every task without an override.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Per-task timeout override.
    pub fn timeout(mut self, name: &str, timeout: Duration) -> Self {
        self.timeouts.insert(name.to_string(), timeout);
        self
    }

    pub fn build(self) -> (Arc<TaskGraph>, ExecutionSession) {
        let graph =
            Arc::new(TaskGraph::build(&self.declarations).expect("builder produced invalid graph"));

        let requested: Vec<String> = if self.requested.is_empty() {
            self.declarations.iter().map(|(name, _)| name.clone()).collect()
        } else {
            self.requested
        };

        let closure = graph
            .transitive_closure(&requested)
            .expect("requested task not declared");
        let order = execution_order(&graph, &closure).expect("builder graph has a cycle");

        let requested_ids: Vec<_> = requested
            .iter()
            .map(|name| graph.id_of(name).expect("requested task not declared"))
            .collect();

        let timeouts = graph
            .task_ids()
            .map(|id| {
                self.timeouts
                    .get(graph.name_of(id))
                    .copied()
                    .or(self.default_timeout)
            })
            .collect();

        let session = ExecutionSession::new(
            Arc::clone(&graph),
            requested_ids,
            order,
            SessionLimits {
                jobs: self.jobs,
                timeouts,
            },
        );

        (graph, session)
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
