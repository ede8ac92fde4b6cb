//! Common test helpers
use crate::engine::{EngineConfig, EngineEvent, ManualClock, ReactiveEngine, Scope};
use crate::test_tree::TestTree;
use std::cell::RefCell;
use std::rc::Rc;

pub type TestEngine = ReactiveEngine<ManualClock>;

pub fn engine_with(config: EngineConfig, tree: &TestTree, scope: Scope) -> (TestEngine, ManualClock) {
    crate::test_utils::init_logging();
    let clock = ManualClock::new();
    let mut engine = ReactiveEngine::with_clock(config, clock.clone());
    engine.attach(tree, scope);
    (engine, clock)
}

pub fn engine_for(tree: &TestTree) -> (TestEngine, ManualClock) {
    engine_with(EngineConfig::default(), tree, Scope::All)
}

/// Attach and drain the initial evaluation.
pub fn settled(tree: &mut TestTree) -> (TestEngine, ManualClock) {
    let (mut engine, clock) = engine_for(tree);
    engine.flush(tree);
    (engine, clock)
}

pub fn record_events(engine: &mut TestEngine) -> Rc<RefCell<Vec<EngineEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    engine.subscribe(move |e| sink.borrow_mut().push(e.clone()));
    events
}
