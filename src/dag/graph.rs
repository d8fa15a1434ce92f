// src/dag/graph.rs

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::ConfigFile;
use crate::errors::{BuildwatchError, Result};

/// Simple in-memory DAG keyed by task name.
///
/// Acyclicity is already validated in `config::validate`; cycles are still
/// reported as errors rather than assumed away.
#[derive(Debug, Clone)]
pub struct DagGraph {
    deps: HashMap<String, Vec<String>>,
}

impl DagGraph {
    /// Build a DAG from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let deps = cfg
            .tasks()
            .iter()
            .map(|(name, task)| (name.clone(), task.after.clone()))
            .collect();
        Self { deps }
    }

    /// Immediate dependencies of a task (the tasks listed in its `after`).
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.deps.get(name).map(|d| d.as_slice()).unwrap_or(&[])
    }

    /// Tasks to run, dependencies first.
    ///
    /// With an empty `requested` list every task runs. Otherwise only the
    /// requested tasks and everything they transitively depend on.
    pub fn execution_order(&self, requested: &[String]) -> Result<Vec<String>> {
        let selected: BTreeSet<&str> = if requested.is_empty() {
            self.deps.keys().map(String::as_str).collect()
        } else {
            let mut selected = BTreeSet::new();
            let mut stack: Vec<&str> = Vec::new();
            for name in requested {
                if !self.deps.contains_key(name) {
                    return Err(BuildwatchError::TaskNotFound(name.clone()));
                }
                stack.push(name.as_str());
            }
            while let Some(name) = stack.pop() {
                if selected.insert(name) {
                    stack.extend(self.dependencies_of(name).iter().map(String::as_str));
                }
            }
            selected
        };

        // Edge direction: dep -> task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for &name in selected.iter() {
            graph.add_node(name);
        }
        for &name in selected.iter() {
            for dep in self.dependencies_of(name) {
                graph.add_edge(dep.as_str(), name, ());
            }
        }

        toposort(&graph, None)
            .map(|order| order.into_iter().map(str::to_string).collect())
            .map_err(|cycle| {
                BuildwatchError::DagCycle(format!(
                    "cycle detected in task graph involving task '{}'",
                    cycle.node_id()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{RawConfigFile, TaskConfig, WatchSection};

    fn task(after: &[&str]) -> TaskConfig {
        TaskConfig {
            cmd: "true".to_string(),
            after: after.iter().map(|s| s.to_string()).collect(),
            inputs: vec![],
        }
    }

    fn graph() -> DagGraph {
        let raw = RawConfigFile {
            watch: WatchSection::default(),
            task: [
                ("generate".to_string(), task(&[])),
                ("compile".to_string(), task(&["generate"])),
                ("test".to_string(), task(&["compile"])),
                ("docs".to_string(), task(&[])),
            ]
            .into_iter()
            .collect(),
        };
        DagGraph::from_config(&ConfigFile::try_from(raw).unwrap())
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn dependencies_run_first() {
        let order = graph().execution_order(&[]).unwrap();
        assert_eq!(order.len(), 4);
        assert!(position(&order, "generate") < position(&order, "compile"));
        assert!(position(&order, "compile") < position(&order, "test"));
    }

    #[test]
    fn requested_tasks_pull_in_their_dependencies_only() {
        let order = graph().execution_order(&["compile".to_string()]).unwrap();
        assert_eq!(order, vec!["generate".to_string(), "compile".to_string()]);
    }

    #[test]
    fn unknown_task_is_reported() {
        let err = graph().execution_order(&["deploy".to_string()]).unwrap_err();
        assert!(matches!(err, BuildwatchError::TaskNotFound(name) if name == "deploy"));
    }
}
