// src/dag/resolver.rs

//! Deterministic execution-order resolution.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::dag::graph::{TaskGraph, TaskId};
use crate::errors::{Result, VerirunError};

/// Produce a total order over `task_set` such that every task appears after
/// all of its dependencies within the set.
///
/// Iterative Kahn's algorithm: repeatedly pick the node with zero remaining
/// unresolved dependencies. Ties are broken by declaration order (smallest
/// id first), so the result is deterministic for identical input.
///
/// `task_set` is expected to be dependency-closed (as produced by
/// [`TaskGraph::transitive_closure`]); dependencies outside the set are
/// ignored. A cycle inside the set yields [`VerirunError::CycleDetected`],
/// which cannot happen for a graph that passed construction-time validation.
pub fn execution_order(graph: &TaskGraph, task_set: &[TaskId]) -> Result<Vec<TaskId>> {
    let mut in_set = vec![false; graph.len()];
    for &id in task_set {
        in_set[id] = true;
    }

    // Remaining unresolved dependency count, restricted to the set.
    let mut remaining = vec![0usize; graph.len()];
    let mut heap: BinaryHeap<Reverse<TaskId>> = BinaryHeap::new();

    for &id in task_set {
        let count = graph
            .dependencies_of(id)
            .iter()
            .filter(|&&dep| in_set[dep])
            .count();
        remaining[id] = count;
        if count == 0 {
            heap.push(Reverse(id));
        }
    }

    let mut order = Vec::with_capacity(task_set.len());

    while let Some(Reverse(id)) = heap.pop() {
        order.push(id);

        for &dependent in graph.dependents_of(id) {
            if !in_set[dependent] {
                continue;
            }
            remaining[dependent] -= 1;
            if remaining[dependent] == 0 {
                heap.push(Reverse(dependent));
            }
        }
    }

    if order.len() != task_set.len() {
        // Unreachable for validated graphs; never return a partial order.
        return Err(VerirunError::CycleDetected(
            "task set contains a dependency cycle".to_string(),
        ));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, deps: &[&str]) -> (String, Vec<String>) {
        (
            name.to_string(),
            deps.iter().map(|d| d.to_string()).collect(),
        )
    }

    #[test]
    fn chain_orders_upstream_first() {
        let g = TaskGraph::build(&[
            decl("types", &[]),
            decl("utils", &["types"]),
            decl("safety", &["utils"]),
        ])
        .unwrap();
        let closure = g.transitive_closure(&["safety"]).unwrap();
        let order = execution_order(&g, &closure).unwrap();
        let names: Vec<&str> = order.iter().map(|&id| g.name_of(id)).collect();
        assert_eq!(names, vec!["types", "utils", "safety"]);
    }

    #[test]
    fn independent_tasks_keep_declaration_order() {
        let g = TaskGraph::build(&[
            decl("b_first_declared", &[]),
            decl("a_second_declared", &[]),
        ])
        .unwrap();
        let order = execution_order(&g, &[0, 1]).unwrap();
        // Declaration order wins over any other ordering of unrelated tasks.
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn diamond_respects_both_branches() {
        let g = TaskGraph::build(&[
            decl("base", &[]),
            decl("left", &["base"]),
            decl("right", &["base"]),
            decl("top", &["left", "right"]),
        ])
        .unwrap();
        let order = execution_order(&g, &[0, 1, 2, 3]).unwrap();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn order_ignores_dependencies_outside_the_set() {
        let g = TaskGraph::build(&[decl("a", &[]), decl("b", &["a"])]).unwrap();
        // Only "b" in the set: its dependency on "a" is outside and ignored.
        let order = execution_order(&g, &[1]).unwrap();
        assert_eq!(order, vec![1]);
    }
}
