// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::ConfigFile;
use crate::errors::{Result, VerirunError};

/// Index of a task in the graph arena.
///
/// Task names are resolved to ids once at construction; everything downstream
/// (session state, completion events, summaries) works with ids.
pub type TaskId = usize;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct TaskNode {
    name: String,
    /// Direct dependencies: tasks that must succeed before this one can run.
    deps: Vec<TaskId>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<TaskId>,
}

/// In-memory task graph with an arena of nodes and a name index.
///
/// Ids follow declaration order, which is what makes launch-order tie
/// breaking deterministic.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: Vec<TaskNode>,
    index: HashMap<String, TaskId>,
}

impl TaskGraph {
    /// Build a graph from raw `(name, dependency names)` declarations.
    ///
    /// Fails with [`VerirunError::UnknownDependency`] if a dependency is not
    /// itself declared, and with [`VerirunError::CycleDetected`] if the
    /// dependency relation contains a cycle.
    pub fn build(declarations: &[(String, Vec<String>)]) -> Result<Self> {
        let graph = Self::resolve(declarations)?;
        graph.check_acyclic()?;
        Ok(graph)
    }

    /// Build a graph from a validated [`ConfigFile`].
    ///
    /// `config::validate` has already checked `after` references and
    /// acyclicity; the residual error path only exists because `build`
    /// re-checks regardless of where the declarations came from.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let declarations: Vec<(String, Vec<String>)> = cfg
            .task
            .iter()
            .map(|(name, task)| (name.clone(), task.after.clone()))
            .collect();

        Self::build(&declarations)
    }

    /// Resolve names to ids and fill adjacency in both directions.
    fn resolve(declarations: &[(String, Vec<String>)]) -> Result<Self> {
        let mut index: HashMap<String, TaskId> = HashMap::new();

        // First pass: assign ids in declaration order.
        for (id, (name, _)) in declarations.iter().enumerate() {
            index.insert(name.clone(), id);
        }

        // Second pass: resolve dependency names against the index.
        let mut nodes: Vec<TaskNode> = Vec::with_capacity(declarations.len());
        for (name, deps) in declarations {
            let mut dep_ids = Vec::with_capacity(deps.len());
            for dep in deps {
                let dep_id = index.get(dep).copied().ok_or_else(|| {
                    VerirunError::UnknownDependency {
                        task: name.clone(),
                        dependency: dep.clone(),
                    }
                })?;
                dep_ids.push(dep_id);
            }
            nodes.push(TaskNode {
                name: name.clone(),
                deps: dep_ids,
                dependents: Vec::new(),
            });
        }

        // Third pass: populate dependents from deps.
        for id in 0..nodes.len() {
            let deps = nodes[id].deps.clone();
            for dep in deps {
                nodes[dep].dependents.push(id);
            }
        }

        Ok(Self { nodes, index })
    }

    fn check_acyclic(&self) -> Result<()> {
        // Edge direction: dep -> task.
        let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();

        for id in 0..self.nodes.len() {
            graph.add_node(id);
        }
        for (id, node) in self.nodes.iter().enumerate() {
            for &dep in &node.deps {
                graph.add_edge(dep, id, ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => {
                let node = cycle.node_id();
                Err(VerirunError::CycleDetected(format!(
                    "dependency cycle involving task '{}'",
                    self.nodes[node].name
                )))
            }
        }
    }

    /// Number of declared tasks.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve a task name to its id.
    pub fn id_of(&self, name: &str) -> Option<TaskId> {
        self.index.get(name).copied()
    }

    pub fn name_of(&self, id: TaskId) -> &str {
        &self.nodes[id].name
    }

    /// All task ids in declaration order.
    pub fn task_ids(&self) -> std::ops::Range<TaskId> {
        0..self.nodes.len()
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, id: TaskId) -> &[TaskId] {
        &self.nodes[id].deps
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, id: TaskId) -> &[TaskId] {
        &self.nodes[id].dependents
    }

    /// Full set of tasks that must run to satisfy `names`: the named tasks
    /// plus all of their direct and indirect dependencies.
    ///
    /// The result is sorted by declaration order. Fails with
    /// [`VerirunError::UnknownTask`] if a requested name is not declared.
    pub fn transitive_closure<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<TaskId>> {
        let mut included = vec![false; self.nodes.len()];
        let mut stack: Vec<TaskId> = Vec::new();

        for name in names {
            let id = self
                .id_of(name.as_ref())
                .ok_or_else(|| VerirunError::UnknownTask(name.as_ref().to_string()))?;
            stack.push(id);
        }

        while let Some(id) = stack.pop() {
            if included[id] {
                continue;
            }
            included[id] = true;
            stack.extend(self.nodes[id].deps.iter().copied());
        }

        Ok((0..self.nodes.len()).filter(|&id| included[id]).collect())
    }
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

    fn chain() -> TaskGraph {
        TaskGraph::build(&[
            decl("types", &[]),
            decl("utils", &["types"]),
            decl("safety", &["utils"]),
            decl("liveness", &["safety"]),
            decl("resilience", &["liveness"]),
            decl("theorems", &["resilience"]),
        ])
        .unwrap()
    }

    #[test]
    fn build_resolves_names_to_declaration_order_ids() {
        let g = chain();
        assert_eq!(g.id_of("types"), Some(0));
        assert_eq!(g.id_of("theorems"), Some(5));
        assert_eq!(g.dependencies_of(2), &[1]);
        assert_eq!(g.dependents_of(2), &[3]);
    }

    #[test]
    fn build_rejects_unknown_dependency() {
        let err = TaskGraph::build(&[decl("a", &["ghost"])]).unwrap_err();
        assert!(matches!(err, VerirunError::UnknownDependency { .. }));
    }

    #[test]
    fn build_rejects_cycle() {
        let err =
            TaskGraph::build(&[decl("a", &["b"]), decl("b", &["a"])]).unwrap_err();
        assert!(matches!(err, VerirunError::CycleDetected(_)));
    }

    #[test]
    fn build_rejects_longer_cycle() {
        let err = TaskGraph::build(&[
            decl("a", &["c"]),
            decl("b", &["a"]),
            decl("c", &["b"]),
        ])
        .unwrap_err();
        assert!(matches!(err, VerirunError::CycleDetected(_)));
    }

    #[test]
    fn closure_of_mid_chain_task_pulls_in_upstream_only() {
        let g = chain();
        let closure = g.transitive_closure(&["safety"]).unwrap();
        let names: Vec<&str> = closure.iter().map(|&id| g.name_of(id)).collect();
        assert_eq!(names, vec!["types", "utils", "safety"]);
    }

    #[test]
    fn closure_rejects_unknown_task() {
        let g = chain();
        let err = g.transitive_closure(&["nope"]).unwrap_err();
        assert!(matches!(err, VerirunError::UnknownTask(_)));
    }

    #[test]
    fn closure_of_diamond_includes_each_dependency_once() {
        let g = TaskGraph::build(&[
            decl("base", &[]),
            decl("left", &["base"]),
            decl("right", &["base"]),
            decl("top", &["left", "right"]),
        ])
        .unwrap();
        let closure = g.transitive_closure(&["top"]).unwrap();
        assert_eq!(closure, vec![0, 1, 2, 3]);
    }
}
