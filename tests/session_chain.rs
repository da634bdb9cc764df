// tests/session_chain.rs

use std::sync::Arc;

use verirun::dag::TaskStatus;
use verirun::engine::aggregate::{summarize, OverallStatus};
use verirun::engine::Scheduler;
use verirun_test_utils::builders::SessionBuilder;
use verirun_test_utils::fake_verifier::FakeVerifier;
use verirun_test_utils::{init_tracing, with_timeout};

fn chain_builder() -> SessionBuilder {
    SessionBuilder::new()
        .task("types")
        .task_after("utils", &["types"])
        .task_after("safety", &["utils"])
        .task_after("liveness", &["safety"])
        .task_after("resilience", &["liveness"])
        .task_after("theorems", &["resilience"])
}

#[tokio::test]
async fn requesting_mid_chain_task_runs_exactly_its_upstream_in_order() {
    init_tracing();

    let (graph, session) = chain_builder().request("safety").build();
    let verifier = Arc::new(FakeVerifier::new());

    let scheduler = Scheduler::new(session, Arc::clone(&verifier), false);
    let session = with_timeout(scheduler.run()).await.unwrap();

    assert_eq!(verifier.executed(), vec!["types", "utils", "safety"]);

    for name in ["types", "utils", "safety"] {
        let id = graph.id_of(name).unwrap();
        assert_eq!(session.status_of(id), Some(TaskStatus::Succeeded));
    }
    // Tasks outside the requested closure are not part of the session.
    for name in ["liveness", "resilience", "theorems"] {
        let id = graph.id_of(name).unwrap();
        assert!(!session.contains(id));
    }

    let summary = summarize(&session, std::time::Duration::from_millis(5)).unwrap();
    assert_eq!(summary.overall, OverallStatus::Success);
    assert_eq!(summary.counts.succeeded, 3);
}

#[tokio::test]
async fn repeated_sessions_are_deterministic() {
    init_tracing();

    let mut runs = Vec::new();
    for _ in 0..2 {
        let (graph, session) = SessionBuilder::new()
            .task("base")
            .task_after("left", &["base"])
            .task_after("right", &["base"])
            .task_after("top", &["left", "right"])
            .jobs(1)
            .build();

        let verifier = Arc::new(FakeVerifier::new().fail("right", 7));
        let scheduler = Scheduler::new(session, Arc::clone(&verifier), false);
        let session = with_timeout(scheduler.run()).await.unwrap();

        let statuses: Vec<(String, TaskStatus)> = session
            .order()
            .iter()
            .map(|&id| {
                (
                    graph.name_of(id).to_string(),
                    session.status_of(id).unwrap(),
                )
            })
            .collect();
        let summary = summarize(&session, std::time::Duration::ZERO).unwrap();

        runs.push((verifier.executed(), statuses, summary.overall));
    }

    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[0].2, OverallStatus::Failure);
}
