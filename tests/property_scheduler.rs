// tests/property_scheduler.rs

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;
use taskgate::dag::{DagGraph, RunStatus, Scheduler, SchedulerStep};
use taskgate::engine::TaskOutcome;
use taskgate::events::EventTable;

#[derive(Debug, Clone)]
struct Case {
    deps: Vec<Vec<usize>>,
    events: Vec<Vec<usize>>,
    failing: Vec<bool>,
    picks: Vec<usize>,
}

fn task_name(i: usize) -> String {
    format!("task_{}", i)
}

// Acyclic by construction: task i may only depend on tasks 0..i.
fn case_strategy(max_tasks: usize) -> impl Strategy<Value = Case> {
    (1..=max_tasks).prop_flat_map(|n| {
        (
            proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..n), n),
            proptest::collection::vec(proptest::collection::vec(0..n, 1..=n), 0..4),
            proptest::collection::vec(proptest::bool::weighted(0.15), n),
            proptest::collection::vec(any::<usize>(), 4 * n),
        )
            .prop_map(|(raw_deps, events, failing, picks)| {
                let deps = raw_deps
                    .into_iter()
                    .enumerate()
                    .map(|(i, raw)| {
                        let set: BTreeSet<usize> =
                            raw.into_iter().filter(|_| i > 0).map(|d| d % i.max(1)).collect();
                        set.into_iter().collect()
                    })
                    .collect();
                Case {
                    deps,
                    events,
                    failing,
                    picks,
                }
            })
    })
}

fn build(case: &Case) -> Scheduler {
    let graph = DagGraph::from_reliance(case.deps.iter().enumerate().map(|(i, deps)| {
        (
            task_name(i),
            deps.iter().map(|d| task_name(*d)).collect::<Vec<_>>(),
        )
    }))
    .unwrap();
    graph.validate().unwrap();

    let events = EventTable::from_pairs(case.events.iter().enumerate().map(|(i, conds)| {
        (
            format!("event_{}", i),
            conds.iter().map(|c| task_name(*c)).collect::<Vec<_>>(),
        )
    }))
    .unwrap();

    Scheduler::new(graph, events)
}

struct Tracker {
    running: Vec<String>,
    launched: HashSet<String>,
    finished: Vec<String>,
    fired: Vec<String>,
}

impl Tracker {
    fn apply(&mut self, scheduler: &Scheduler, case: &Case, step: SchedulerStep) {
        for key in &step.newly_scheduled {
            assert!(self.launched.insert(key.clone()), "{} launched twice", key);
            for dep in scheduler.graph().dependencies_of(key) {
                assert!(
                    self.finished.contains(dep),
                    "{} launched before dependency {} finished",
                    key,
                    dep
                );
            }
            self.running.push(key.clone());
        }

        for event in &step.satisfied_events {
            assert!(!self.fired.contains(event), "{} fired twice", event);
            let index: usize = event.trim_start_matches("event_").parse().unwrap();
            for cond in &case.events[index] {
                assert!(self.finished.contains(&task_name(*cond)));
            }
            self.fired.push(event.clone());
        }
    }
}

proptest! {
    #[test]
    fn scheduler_respects_dependencies_and_events(case in case_strategy(12)) {
        let mut scheduler = build(&case);
        let mut tracker = Tracker {
            running: Vec::new(),
            launched: HashSet::new(),
            finished: Vec::new(),
            fired: Vec::new(),
        };

        let step = scheduler.advance();
        tracker.apply(&scheduler, &case, step);

        let mut picks = case.picks.iter().cycle();
        while !tracker.running.is_empty() {
            let pick = picks.next().copied().unwrap_or(0) % tracker.running.len();
            let key = tracker.running.remove(pick);
            let index: usize = key.trim_start_matches("task_").parse().unwrap();

            let outcome = if case.failing[index] {
                TaskOutcome::Failed
            } else {
                TaskOutcome::Success
            };

            let before = scheduler.snapshot().finished;
            let step = scheduler.complete(&key, outcome).unwrap();
            let after = scheduler.snapshot().finished;
            prop_assert!(after.starts_with(&before), "finished set shrank");

            if outcome.is_success() {
                tracker.finished.push(key.clone());
                prop_assert!(step.newly_failed.is_empty());
            } else {
                prop_assert!(step.newly_scheduled.is_empty());
                prop_assert!(step.satisfied_events.is_empty());
                prop_assert_eq!(step.newly_failed.first(), Some(&key));
            }
            prop_assert_eq!(&after, &tracker.finished);

            tracker.apply(&scheduler, &case, step);
        }

        let any_failure = case.failing.iter().any(|f| *f);
        let status = scheduler.status();
        if any_failure {
            prop_assert!(
                matches!(status, RunStatus::Failed { .. }),
                "expected Failed, got {:?}",
                status
            );
            if let RunStatus::Failed { blocked, .. } = status {
                for key in blocked {
                    prop_assert!(!tracker.launched.contains(&key), "blocked {} was launched", key);
                }
            }
        } else {
            prop_assert_eq!(status, RunStatus::Finished);
            prop_assert_eq!(tracker.launched.len(), case.deps.len());
            prop_assert_eq!(tracker.fired.len(), case.events.len());
        }
    }

    #[test]
    fn retrying_every_failure_eventually_finishes(case in case_strategy(10)) {
        let mut scheduler = build(&case);
        let mut failed_once: HashSet<String> = HashSet::new();
        let mut running = scheduler.advance().newly_scheduled;

        // Bound the loop: each task fails at most once and finishes once.
        for _ in 0..(4 * case.deps.len() + 4) {
            let Some(key) = running.pop() else {
                break;
            };
            let index: usize = key.trim_start_matches("task_").parse().unwrap();

            if case.failing[index] && failed_once.insert(key.clone()) {
                let step = scheduler.complete(&key, TaskOutcome::Failed).unwrap();
                prop_assert!(step.newly_scheduled.is_empty());
                let step = scheduler.retry(&key).unwrap();
                prop_assert_eq!(&step.newly_scheduled, &vec![key.clone()]);
                running.extend(step.newly_scheduled);
            } else {
                let step = scheduler.complete(&key, TaskOutcome::Success).unwrap();
                running.extend(step.newly_scheduled);
            }
        }

        prop_assert!(running.is_empty());
        prop_assert_eq!(scheduler.status(), RunStatus::Finished);
    }
}
