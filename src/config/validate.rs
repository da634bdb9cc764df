// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, VerirunError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::VerirunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.tools, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(VerirunError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.jobs == Some(0) {
        return Err(VerirunError::ConfigError(
            "[config].jobs must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if dep == name {
                return Err(VerirunError::ConfigError(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            if !cfg.task.contains_key(dep) {
                return Err(VerirunError::UnknownDependency {
                    task: name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Build a petgraph graph from the tasks and their dependencies.
    //
    // Edge direction: dep -> task
    // For:
    //   [task.b]
    //   after = ["a"]
    // we add edge a -> b.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(VerirunError::CycleDetected(format!(
                "dependency cycle involving task '{}'",
                node
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::config::model::{CheckKind, ConfigSection, TaskConfig, ToolsSection};
    use crate::errors::VerirunError;

    use super::*;

    fn harness(after: &[&str]) -> TaskConfig {
        TaskConfig {
            check: CheckKind::Harness {
                binary: "true".to_string(),
                args: vec![],
            },
            after: after.iter().map(|s| s.to_string()).collect(),
            timeout_secs: None,
        }
    }

    fn raw(tasks: Vec<(&str, TaskConfig)>) -> RawConfigFile {
        let mut task = BTreeMap::new();
        for (name, cfg) in tasks {
            task.insert(name.to_string(), cfg);
        }
        RawConfigFile {
            config: ConfigSection::default(),
            tools: ToolsSection::default(),
            task,
        }
    }

    #[test]
    fn empty_task_table_is_rejected() {
        let err = ConfigFile::try_from(raw(vec![])).unwrap_err();
        assert!(matches!(err, VerirunError::ConfigError(_)));
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let err = ConfigFile::try_from(raw(vec![("a", harness(&["ghost"]))])).unwrap_err();
        match err {
            VerirunError::UnknownDependency { task, dependency } => {
                assert_eq!(task, "a");
                assert_eq!(dependency, "ghost");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn self_dependency_is_rejected() {
        let err = ConfigFile::try_from(raw(vec![("a", harness(&["a"]))])).unwrap_err();
        assert!(matches!(err, VerirunError::ConfigError(_)));
    }

    #[test]
    fn two_task_cycle_is_rejected() {
        let err = ConfigFile::try_from(raw(vec![
            ("a", harness(&["b"])),
            ("b", harness(&["a"])),
        ]))
        .unwrap_err();
        assert!(matches!(err, VerirunError::CycleDetected(_)));
    }

    #[test]
    fn valid_chain_is_accepted() {
        let cfg = ConfigFile::try_from(raw(vec![
            ("a", harness(&[])),
            ("b", harness(&["a"])),
            ("c", harness(&["b"])),
        ]))
        .unwrap();
        assert_eq!(cfg.task.len(), 3);
    }

    #[test]
    fn zero_jobs_is_rejected() {
        let mut r = raw(vec![("a", harness(&[]))]);
        r.config.jobs = Some(0);
        let err = ConfigFile::try_from(r).unwrap_err();
        assert!(matches!(err, VerirunError::ConfigError(_)));
    }
}
