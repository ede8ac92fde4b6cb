use super::common::*;
use crate::engine::{ChangeOrigin, EngineConfig, OutputSpec, Scope};
use crate::test_tree::TestTree;
use crate::Value;

fn invoice() -> TestTree {
    TestTree::new()
        .with_input("harga", "10000")
        .with_input("qty", "2")
        .with_output(OutputSpec::new("total", "harga * qty").named("total"))
}

#[test]
fn added_output_nodes_are_evaluated() {
    let mut tree = invoice();
    let (mut engine, _) = settled(&mut tree);

    tree.upsert_output(OutputSpec::new("ppn", "total * 0.11").named("ppn"));
    engine.notify_structure_changed();
    engine.flush(&mut tree);

    assert_eq!(engine.node_count(), 2);
    assert_eq!(tree.text("ppn"), Some("2200"));
    let total = engine.node_id("total");
    let ppn = engine.node_id("ppn");
    assert!(engine.graph().is_linked(total.unwrap(), ppn.unwrap()));
}

#[test]
fn removed_output_nodes_are_dropped() {
    let mut tree = invoice().with_output(OutputSpec::new("double", "qty * 2"));
    let (mut engine, _) = settled(&mut tree);
    assert_eq!(engine.node_count(), 2);

    assert!(tree.remove_output("double"));
    engine.notify_structure_changed();
    engine.flush(&mut tree);

    assert_eq!(engine.node_count(), 1);
    assert!(engine.node("double").is_none());
    assert_eq!(engine.graph().dependents_of("qty").len(), 1);
}

#[test]
fn changed_expression_is_recompiled() {
    let mut tree = invoice();
    let (mut engine, _) = settled(&mut tree);

    tree.upsert_output(OutputSpec::new("total", "harga * qty * 2").named("total"));
    engine.notify_structure_changed();
    engine.flush(&mut tree);
    assert_eq!(tree.text("total"), Some("40000"));
}

#[test]
fn unchanged_rescan_does_not_enqueue() {
    let mut tree = invoice();
    let (mut engine, _) = settled(&mut tree);
    tree.clear_writes();
    assert_eq!(engine.rescan(&tree), 0);
    assert_eq!(engine.pending(), 0);
}

#[test]
fn rows_coming_and_going_update_aggregates() {
    let mut tree = TestTree::new()
        .with_input("rows[0][amount]", "100")
        .with_input("rows[1][amount]", "250")
        .with_output(OutputSpec::new("grand", "sum(rows_?_amount)"));
    let (mut engine, _) = settled(&mut tree);
    assert_eq!(engine.rows().indices_for("rows"), vec![0, 1]);

    tree.set_input("rows[2][amount]", "50");
    engine.notify_structure_changed();
    engine.flush(&mut tree);
    assert_eq!(tree.text("grand"), Some("400"));

    tree.remove_input("rows[0][amount]");
    engine.notify_structure_changed();
    engine.flush(&mut tree);
    assert_eq!(tree.text("grand"), Some("300"));
    assert_eq!(engine.rows().indices_for("rows"), vec![1, 2]);
}

#[test]
fn per_row_products_are_summed() {
    let mut tree = TestTree::new()
        .with_input("lines[0][qty]", "2")
        .with_input("lines[0][price]", "100")
        .with_input("lines[1][qty]", "3")
        .with_input("lines[1][price]", "50")
        .with_output(OutputSpec::new("grand", "sum(lines_?_qty * lines_?_price)"));
    let (mut engine, _) = settled(&mut tree);
    assert_eq!(tree.text("grand"), Some("350"));

    tree.set_input("lines[1][qty]", "4");
    engine.notify_input_changed("lines[1][qty]", ChangeOrigin::Programmatic);
    engine.flush(&mut tree);
    assert_eq!(tree.text("grand"), Some("400"));
    assert_eq!(engine.stats().failures, 0);
}

fn two_sections() -> TestTree {
    TestTree::new()
        .with_input("x", "1")
        .with_input("y", "1")
        .with_output_in("left", OutputSpec::new("a", "x * 2"))
        .with_output_in("right", OutputSpec::new("b", "y * 3"))
}

#[test]
fn attach_to_a_subtree_only_sees_its_nodes() {
    let mut tree = two_sections();
    let (mut engine, _) = engine_with(
        EngineConfig::default(),
        &tree,
        Scope::Subtree("left".into()),
    );
    engine.flush(&mut tree);

    assert_eq!(engine.node_count(), 1);
    assert_eq!(tree.text("a"), Some("2"));
    assert_eq!(tree.text("b"), Some(""));
}

#[test]
fn recompute_limited_to_a_subtree() {
    let mut tree = two_sections();
    let (mut engine, _) = settled(&mut tree);
    assert_eq!(tree.text("b"), Some("3"));

    // Changed behind the engine's back.
    tree.set_input("x", "5");
    tree.set_input("y", "5");
    engine.recompute(&mut tree, &Scope::Subtree("left".into()));

    assert_eq!(tree.text("a"), Some("10"));
    assert_eq!(tree.text("b"), Some("3"));
    assert_eq!(engine.value_of("b"), Some(&Value::Number(3.0)));
}
