//! The host side of the engine: a tree of bindable fields and output nodes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Part of the tree an operation applies to.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    All,
    /// Everything below the host element with this key.
    Subtree(String),
}

/// An output node as declared by the host.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub key: String,
    /// Binding name of the field the node writes to, if it has one.
    pub name: Option<String>,
    pub expression: String,
    pub format: Option<String>,
    pub auto_apply: bool,
    pub skip_while_editing: bool,
    /// Extra names that trigger recomputation without appearing in the
    /// expression.
    pub trigger_variables: Vec<String>,
}

impl OutputSpec {
    pub fn new(key: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: None,
            expression: expression.into(),
            format: None,
            auto_apply: true,
            skip_while_editing: false,
            trigger_variables: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn auto_apply(mut self, auto_apply: bool) -> Self {
        self.auto_apply = auto_apply;
        self
    }

    pub fn skip_while_editing(mut self, skip: bool) -> Self {
        self.skip_while_editing = skip;
        self
    }

    pub fn with_trigger(mut self, variable: impl Into<String>) -> Self {
        self.trigger_variables.push(variable.into());
        self
    }
}

/// Read/write access to the host tree.
///
/// Change notifications flow the other way: the host calls
/// `ReactiveEngine::notify_input_changed` / `notify_structure_changed`.
pub trait BoundTree {
    fn output_nodes(&self, scope: &Scope) -> Vec<OutputSpec>;

    /// Raw binding names of readable fields (`rows[0][amount]`, `harga`).
    fn input_bindings(&self, scope: &Scope) -> Vec<String>;

    /// Current raw text of an input field.
    fn read_input(&self, binding: &str) -> Option<String>;

    fn is_focused(&self, key: &str) -> bool;

    /// Currently displayed text of an output node.
    fn read_output(&self, key: &str) -> Option<String>;

    fn write_output(&mut self, key: &str, text: &str);
}
