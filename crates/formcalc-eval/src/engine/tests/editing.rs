use super::common::*;
use crate::engine::{ChangeOrigin, OutputSpec};
use crate::test_tree::TestTree;
use std::time::Duration;

fn editable_total() -> TestTree {
    TestTree::new()
        .with_input("harga", "10000")
        .with_input("qty", "2")
        .with_output(
            OutputSpec::new("total", "harga * qty")
                .named("total")
                .skip_while_editing(true),
        )
}

fn change_qty(engine: &mut TestEngine, tree: &mut TestTree, qty: &str) {
    tree.set_input("qty", qty);
    engine.notify_input_changed("qty", ChangeOrigin::Programmatic);
    engine.flush(tree);
}

#[test]
fn focused_node_is_left_alone() {
    let mut tree = editable_total();
    let (mut engine, _) = settled(&mut tree);
    assert_eq!(tree.text("total"), Some("20000"));

    tree.focus("total");
    change_qty(&mut engine, &mut tree, "3");
    assert_eq!(tree.text("total"), Some("20000"));
    assert!(engine.stats().skipped > 0);

    tree.blur();
    change_qty(&mut engine, &mut tree, "4");
    assert_eq!(tree.text("total"), Some("40000"));
}

#[test]
fn focus_only_matters_when_the_node_opts_in() {
    let mut tree = TestTree::new()
        .with_input("qty", "2")
        .with_output(OutputSpec::new("double", "qty * 2"));
    let (mut engine, _) = settled(&mut tree);
    tree.focus("double");
    change_qty(&mut engine, &mut tree, "5");
    assert_eq!(tree.text("double"), Some("10"));
}

#[test]
fn manual_edit_holds_off_recomputation_for_the_cooldown() {
    let mut tree = editable_total();
    let (mut engine, clock) = settled(&mut tree);

    tree.set_output_text("total", "12345");
    engine.notify_input_changed("total", ChangeOrigin::User);
    engine.flush(&mut tree);
    assert_eq!(engine.node("total").and_then(|n| n.last_manual_edit), Some(Duration::ZERO));

    clock.advance(Duration::from_millis(100));
    change_qty(&mut engine, &mut tree, "3");
    assert_eq!(tree.text("total"), Some("12345"));

    clock.advance(Duration::from_millis(250));
    change_qty(&mut engine, &mut tree, "3");
    assert_eq!(tree.text("total"), Some("30000"));
}

#[test]
fn programmatic_writes_do_not_start_a_cooldown() {
    let mut tree = editable_total();
    let (mut engine, _) = settled(&mut tree);
    tree.set_output_text("total", "1");
    engine.notify_input_changed("total", ChangeOrigin::Programmatic);
    engine.flush(&mut tree);
    assert_eq!(engine.node("total").and_then(|n| n.last_manual_edit), None);

    change_qty(&mut engine, &mut tree, "3");
    assert_eq!(tree.text("total"), Some("30000"));
}
