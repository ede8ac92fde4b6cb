#![cfg(test)]

use crate::rows::RowIndexSet;
use crate::{Evaluator, EvalError, Value};
use std::collections::HashMap;

/// Route `tracing` output through the test harness. `RUST_LOG` applies.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn vars(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Evaluate with a fresh evaluator; row indices come from the variable names.
pub fn eval_with(expr: &str, pairs: &[(&str, Value)]) -> Result<Value, EvalError> {
    let table = vars(pairs);
    let rows = RowIndexSet::from_names(table.keys());
    Evaluator::default().evaluate(expr, &table, &rows)
}
