use super::common::*;
use crate::engine::{
    DrainOutcome, EngineConfig, EngineEvent, EngineState, HostDriven, OutputSpec, Scope, TimeBudget,
};
use crate::test_tree::TestTree;
use std::time::Duration;

/// Five unrelated nodes, so nothing propagates between them.
fn independent() -> TestTree {
    let mut tree = TestTree::new();
    for i in 0..5 {
        tree = tree
            .with_input(&format!("v{i}"), &i.to_string())
            .with_output(OutputSpec::new(format!("out{i}"), format!("v{i} * 10")));
    }
    tree
}

#[test]
fn host_driven_drain_yields_between_batches() {
    let mut tree = independent();
    let config = EngineConfig::default().with_batch_size(2);
    let (mut engine, _) = engine_with(config, &tree, Scope::All);
    let events = record_events(&mut engine);

    assert_eq!(engine.tick(&mut tree, &mut HostDriven), DrainOutcome::Yielded { remaining: 3 });
    assert_eq!(engine.state(), EngineState::Queued);
    assert_eq!(tree.write_count(), 2);

    assert_eq!(engine.resume(&mut tree, &mut HostDriven), DrainOutcome::Yielded { remaining: 1 });
    assert_eq!(engine.resume(&mut tree, &mut HostDriven), DrainOutcome::Idle);
    assert_eq!(engine.state(), EngineState::Idle);
    assert_eq!(tree.text("out4"), Some("40"));

    let events = events.borrow();
    let batches: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::BatchCompleted { evaluated, .. } => Some(*evaluated),
            _ => None,
        })
        .collect();
    assert_eq!(batches, vec![2, 2, 1]);
    assert!(matches!(events.last(), Some(EngineEvent::Stabilized { .. })));
}

#[test]
fn exhausted_time_budget_yields_after_one_batch() {
    let mut tree = independent();
    let config = EngineConfig::default().with_batch_size(2);
    let (mut engine, _) = engine_with(config, &tree, Scope::All);

    let outcome = engine.tick(&mut tree, &mut TimeBudget::new(Duration::ZERO));
    assert_eq!(outcome, DrainOutcome::Yielded { remaining: 3 });
    assert_eq!(engine.pending(), 3);

    let outcome = engine.resume(&mut tree, &mut TimeBudget::new(Duration::from_secs(1)));
    assert_eq!(outcome, DrainOutcome::Idle);
    assert_eq!(engine.pending(), 0);
}

#[test]
fn queue_overflow_drops_work_without_failing() {
    let mut tree = independent();
    let config = EngineConfig::default().with_max_queue_len(3);
    let (mut engine, _) = engine_with(config, &tree, Scope::All);
    assert_eq!(engine.pending(), 3);

    engine.flush(&mut tree);
    assert_eq!(tree.write_count(), 3);
    assert_eq!(engine.state(), EngineState::Idle);
}

#[test]
fn schedule_recompute_enqueues_without_draining() {
    let mut tree = independent();
    let (mut engine, _) = settled(&mut tree);
    engine.schedule_recompute();
    assert_eq!(engine.pending(), 5);
    assert_eq!(engine.state(), EngineState::Queued);

    tree.clear_writes();
    engine.flush(&mut tree);
    assert_eq!(tree.write_count(), 0);
    assert_eq!(engine.pending(), 0);
}
