//! In-memory bound tree for unit and integration tests.
//!
//! Inputs are plain name → text pairs. Output nodes carry their spec, their
//! displayed text and optionally the key of the subtree they live in. An
//! output with a name is also readable as an input binding, the same way a
//! computed field in a form is still a field.
use std::collections::BTreeMap;

use crate::engine::host::{BoundTree, OutputSpec, Scope};

#[derive(Debug, Clone)]
struct TestOutput {
    spec: OutputSpec,
    text: String,
    scope: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct TestTree {
    inputs: BTreeMap<String, String>,
    outputs: BTreeMap<String, TestOutput>,
    focused: Option<String>,
    writes: Vec<(String, String)>,
}

impl TestTree {
    /* ─────────────── constructors ─────────────── */
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, name: &str, text: &str) -> Self {
        self.set_input(name, text);
        self
    }

    pub fn with_output(self, spec: OutputSpec) -> Self {
        self.insert_output(spec, None)
    }

    pub fn with_output_in(self, scope: &str, spec: OutputSpec) -> Self {
        self.insert_output(spec, Some(scope.to_string()))
    }

    fn insert_output(mut self, spec: OutputSpec, scope: Option<String>) -> Self {
        self.outputs.insert(
            spec.key.clone(),
            TestOutput {
                spec,
                text: String::new(),
                scope,
            },
        );
        self
    }

    /* ─────────────── mutation ─────────────── */
    pub fn set_input(&mut self, name: &str, text: &str) {
        self.inputs.insert(name.to_string(), text.to_string());
    }

    pub fn remove_input(&mut self, name: &str) -> bool {
        self.inputs.remove(name).is_some()
    }

    /// Replace a node's spec (or add it) without touching its text.
    pub fn upsert_output(&mut self, spec: OutputSpec) {
        match self.outputs.get_mut(&spec.key) {
            Some(out) => out.spec = spec,
            None => {
                self.outputs.insert(
                    spec.key.clone(),
                    TestOutput {
                        spec,
                        text: String::new(),
                        scope: None,
                    },
                );
            }
        }
    }

    /// Type into an output field as the user would. Not recorded as a write.
    pub fn set_output_text(&mut self, key: &str, text: &str) {
        if let Some(out) = self.outputs.get_mut(key) {
            out.text = text.to_string();
        }
    }

    pub fn remove_output(&mut self, key: &str) -> bool {
        self.outputs.remove(key).is_some()
    }

    pub fn focus(&mut self, key: &str) {
        self.focused = Some(key.to_string());
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    /* ─────────────── inspection ─────────────── */
    pub fn text(&self, key: &str) -> Option<&str> {
        self.outputs.get(key).map(|o| o.text.as_str())
    }

    pub fn input(&self, name: &str) -> Option<&str> {
        self.inputs.get(name).map(String::as_str)
    }

    /// Every `(key, text)` written by the engine, in order.
    pub fn writes(&self) -> &[(String, String)] {
        &self.writes
    }

    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    pub fn writes_to(&self, key: &str) -> usize {
        self.writes.iter().filter(|(k, _)| k == key).count()
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl BoundTree for TestTree {
    fn output_nodes(&self, scope: &Scope) -> Vec<OutputSpec> {
        self.outputs
            .values()
            .filter(|o| match scope {
                Scope::All => true,
                Scope::Subtree(root) => o.scope.as_deref() == Some(root.as_str()),
            })
            .map(|o| o.spec.clone())
            .collect()
    }

    fn input_bindings(&self, _scope: &Scope) -> Vec<String> {
        self.inputs
            .keys()
            .cloned()
            .chain(self.outputs.values().filter_map(|o| o.spec.name.clone()))
            .collect()
    }

    fn read_input(&self, binding: &str) -> Option<String> {
        if let Some(text) = self.inputs.get(binding) {
            return Some(text.clone());
        }
        self.outputs
            .values()
            .find(|o| o.spec.name.as_deref() == Some(binding))
            .map(|o| o.text.clone())
    }

    fn is_focused(&self, key: &str) -> bool {
        self.focused.as_deref() == Some(key)
    }

    fn read_output(&self, key: &str) -> Option<String> {
        self.outputs.get(key).map(|o| o.text.clone())
    }

    fn write_output(&mut self, key: &str, text: &str) {
        if let Some(out) = self.outputs.get_mut(key) {
            out.text = text.to_string();
            self.writes.push((key.to_string(), text.to_string()));
        }
    }
}
