use formcalc_common::Value;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Supplies values for expression variables.
///
/// Missing names resolve to [`Value::Empty`]; expressions over half-filled
/// forms must still evaluate.
pub trait VariableResolver {
    fn resolve(&self, name: &str) -> Value;
}

impl<S: BuildHasher> VariableResolver for HashMap<String, Value, S> {
    fn resolve(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or_default()
    }
}

impl VariableResolver for BTreeMap<String, Value> {
    fn resolve(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or_default()
    }
}

/// Adapts a closure into a resolver.
pub struct FnResolver<F>(pub F);

impl<F> VariableResolver for FnResolver<F>
where
    F: Fn(&str) -> Value,
{
    fn resolve(&self, name: &str) -> Value {
        (self.0)(name)
    }
}
