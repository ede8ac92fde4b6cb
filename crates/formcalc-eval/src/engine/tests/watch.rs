use super::common::*;
use crate::engine::{ChangeOrigin, EngineEvent, OutputSpec};
use crate::test_tree::TestTree;
use crate::Value;
use std::cell::RefCell;
use std::rc::Rc;

fn invoice() -> TestTree {
    TestTree::new()
        .with_input("harga", "10000")
        .with_input("qty", "2")
        .with_output(OutputSpec::new("total", "harga * qty").with_format("currency"))
}

#[test]
fn watchers_see_new_and_old_values() {
    let mut tree = invoice();
    let (mut engine, _) = engine_for(&tree);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let id = engine.watch("total", move |new, old| {
        sink.borrow_mut().push((new.clone(), old.clone()))
    });

    engine.flush(&mut tree);
    tree.set_input("qty", "3");
    engine.notify_input_changed("qty", ChangeOrigin::User);
    engine.flush(&mut tree);

    assert_eq!(
        *seen.borrow(),
        vec![
            (Value::Number(20000.0), Value::Empty),
            (Value::Number(30000.0), Value::Number(20000.0)),
        ]
    );

    assert!(engine.unwatch(id));
    assert!(!engine.unwatch(id));
    tree.set_input("qty", "4");
    engine.notify_input_changed("qty", ChangeOrigin::User);
    engine.flush(&mut tree);
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn unchanged_values_do_not_notify() {
    let mut tree = invoice();
    let (mut engine, _) = settled(&mut tree);
    let calls = Rc::new(RefCell::new(0));
    let sink = calls.clone();
    engine.watch("total", move |_, _| *sink.borrow_mut() += 1);

    // harga and qty swap, the product stays the same.
    tree.set_input("harga", "2");
    tree.set_input("qty", "10000");
    engine.notify_input_changed("harga", ChangeOrigin::User);
    engine.notify_input_changed("qty", ChangeOrigin::User);
    engine.flush(&mut tree);
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn subscribers_get_batch_and_stabilized_events() {
    let mut tree = invoice();
    let (mut engine, _) = settled(&mut tree);
    let events = record_events(&mut engine);

    tree.set_input("qty", "3");
    engine.notify_input_changed("qty", ChangeOrigin::User);
    engine.flush(&mut tree);

    let cycle = engine.cycle();
    assert_eq!(
        *events.borrow(),
        vec![
            EngineEvent::BatchCompleted {
                cycle,
                evaluated: 1,
                written: vec!["total".to_string()],
            },
            EngineEvent::Stabilized { cycle },
        ]
    );
}
