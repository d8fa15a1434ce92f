// tests/properties.rs

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;

use buildwatch::cancel::CancellationToken;
use buildwatch::config::ConfigFile;
use buildwatch::dag::DagGraph;
use buildwatch::files::{DirectoryTree, FileCollection, MinimalFileTree};
use buildwatch::fs::mock::MockFileSystem;
use buildwatch::launcher::collect_inputs;
use buildwatch::trigger::{BlockingTriggerListener, TriggerDetails, TriggerListener, WaitOutcome};
use buildwatch::watch::{WatchInputSet, WatchTargetKind};
use buildwatch_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

// Acyclic by construction: task N may only depend on tasks 0..N-1.
fn dag_config_strategy(max_tasks: usize) -> impl Strategy<Value = ConfigFile> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), num_tasks)
            .prop_map(move |raw_deps| {
                let mut builder = ConfigFileBuilder::new();
                for (i, potential) in raw_deps.into_iter().enumerate() {
                    let name = format!("task_{i}");
                    let mut task = TaskConfigBuilder::new(&format!("echo {name}"));
                    if i > 0 {
                        let deps: HashSet<usize> = potential.into_iter().map(|d| d % i).collect();
                        for dep in deps {
                            task = task.after(&format!("task_{dep}"));
                        }
                    }
                    builder = builder.with_task(&name, task.build());
                }
                builder.build()
            })
    })
}

// A small fixed universe keeps duplicates likely.
fn leaf_strategy() -> impl Strategy<Value = FileCollection> {
    let name = prop::sample::select(vec!["a", "b", "c", "d"]);
    prop_oneof![
        name.clone().prop_map(|n| FileCollection::directory(DirectoryTree::new(format!("/p/{n}")))),
        name.clone().prop_map(|n| {
            FileCollection::Adapter(MinimalFileTree::Singleton(PathBuf::from(format!("/p/{n}"))))
        }),
        proptest::collection::vec(name, 0..3).prop_map(|ns| {
            FileCollection::Files(ns.into_iter().map(|n| PathBuf::from(format!("/p/{n}"))).collect())
        }),
    ]
}

fn collection_strategy() -> impl Strategy<Value = FileCollection> {
    leaf_strategy().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(FileCollection::Union),
            proptest::collection::vec(inner, 0..4).prop_map(FileCollection::Composite),
        ]
    })
}

proptest! {
    #[test]
    fn execution_order_respects_dependencies(cfg in dag_config_strategy(12)) {
        let graph = DagGraph::from_config(&cfg);
        let order = graph.execution_order(&[]).unwrap();

        prop_assert_eq!(order.len(), cfg.tasks().len());
        let position = |name: &str| order.iter().position(|t| t == name).unwrap();
        for (name, task) in cfg.tasks() {
            for dep in &task.after {
                prop_assert!(position(dep) < position(name));
            }
        }
    }

    #[test]
    fn requesting_a_task_pulls_in_its_dependencies(cfg in dag_config_strategy(12)) {
        let graph = DagGraph::from_config(&cfg);
        let last = format!("task_{}", cfg.tasks().len() - 1);
        let order = graph.execution_order(&[last.clone()]).unwrap();

        prop_assert_eq!(order.last(), Some(&last));
        for name in &order {
            for dep in &cfg.tasks()[name].after {
                prop_assert!(order.contains(dep));
            }
        }
    }

    #[test]
    fn flattening_keeps_one_entry_per_path_and_kind(collection in collection_strategy()) {
        let fs = MockFileSystem::new();
        let mut inputs = WatchInputSet::new();
        collect_inputs(&collection, &mut inputs, &fs).unwrap();

        let mut keys = HashSet::new();
        for target in inputs.targets() {
            prop_assert!(keys.insert((target.path().to_path_buf(), target.kind())));
        }

        // Collecting the same expression again changes nothing.
        let before = inputs.len();
        collect_inputs(&collection, &mut inputs, &fs).unwrap();
        prop_assert_eq!(inputs.len(), before);

        // Directory adapters always become trees; nothing else does.
        for target in inputs.targets() {
            if target.kind() == WatchTargetKind::DirectoryTree {
                prop_assert!(target.path().starts_with("/p"));
            }
        }
    }

    #[test]
    fn latest_trigger_wins(reasons in proptest::collection::vec("[a-z]{1,8}", 1..10)) {
        let listener = BlockingTriggerListener::new(0);
        for reason in &reasons {
            listener.triggered(TriggerDetails::new(reason.clone()));
        }

        let outcome = listener.wait_for_trigger(&CancellationToken::new()).unwrap();
        match outcome {
            WaitOutcome::Triggered(details) => {
                prop_assert_eq!(details.reason(), reasons.last().unwrap().as_str());
            }
            WaitOutcome::Cancelled => prop_assert!(false, "unexpected cancellation"),
        }

        // The slot is now empty: a cancelled token returns immediately.
        let cancel = CancellationToken::new();
        cancel.cancel();
        prop_assert!(matches!(listener.wait_for_trigger(&cancel).unwrap(), WaitOutcome::Cancelled));
    }
}

#[test]
fn concurrent_triggers_wake_a_single_waiter() {
    let listener = Arc::new(BlockingTriggerListener::new(0));
    let writers: Vec<_> = (0..8)
        .map(|i| {
            let listener = Arc::clone(&listener);
            thread::spawn(move || listener.triggered(TriggerDetails::new(format!("writer {i}"))))
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let outcome = listener.wait_for_trigger(&CancellationToken::new()).unwrap();
    assert!(matches!(outcome, WaitOutcome::Triggered(details) if details.reason().starts_with("writer ")));
}
