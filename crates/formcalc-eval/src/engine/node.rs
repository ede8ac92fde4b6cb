use super::host::OutputSpec;
use crate::format::FormatKind;
use formcalc_common::{Value, normalize_binding_name};
use formcalc_parse::extract_dependencies;
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::time::Duration;

/// Generational handle into the node registry. A handle to a removed node
/// never aliases the node that later reuses its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputNode {
    pub key: String,
    /// Normalized binding name of the field this node writes to.
    pub name: Option<String>,
    pub expression: String,
    pub dependencies: BTreeSet<String>,
    pub format: Option<FormatKind>,
    pub auto_apply: bool,
    pub skip_while_editing: bool,
    pub last_written: Option<String>,
    pub last_value: Value,
    pub last_manual_edit: Option<Duration>,
    /// Graph peers, refreshed on every structural rebuild.
    pub linked: SmallVec<[NodeId; 4]>,
}

impl OutputNode {
    pub fn from_spec(spec: &OutputSpec) -> Self {
        let mut node = OutputNode {
            key: spec.key.clone(),
            name: None,
            expression: String::new(),
            dependencies: BTreeSet::new(),
            format: None,
            auto_apply: true,
            skip_while_editing: false,
            last_written: None,
            last_value: Value::Empty,
            last_manual_edit: None,
            linked: SmallVec::new(),
        };
        node.apply_spec(spec);
        node
    }

    /// Update declared attributes. Returns true when anything that affects
    /// the computed or displayed value changed.
    pub fn apply_spec(&mut self, spec: &OutputSpec) -> bool {
        let name = spec
            .name
            .as_deref()
            .map(normalize_binding_name)
            .filter(|n| !n.is_empty());
        let format = spec.format.as_deref().map(FormatKind::parse_or_plain);
        let mut dependencies = extract_dependencies(&spec.expression);
        dependencies.extend(
            spec.trigger_variables
                .iter()
                .map(|v| normalize_binding_name(v))
                .filter(|v| !v.is_empty()),
        );

        let changed = self.name != name
            || self.expression != spec.expression
            || self.dependencies != dependencies
            || self.format != format
            || self.auto_apply != spec.auto_apply;

        self.name = name;
        self.expression = spec.expression.clone();
        self.dependencies = dependencies;
        self.format = format;
        self.auto_apply = spec.auto_apply;
        self.skip_while_editing = spec.skip_while_editing;
        changed
    }

    pub fn depends_on(&self, variable: &str) -> bool {
        self.dependencies.contains(variable)
    }

    pub fn within_cooldown(&self, now: Duration, cooldown: Duration) -> bool {
        self.last_manual_edit
            .is_some_and(|edited| now.saturating_sub(edited) < cooldown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_changes_are_detected() {
        let spec = OutputSpec::new("total", "harga * qty").named("total").with_format("currency");
        let mut node = OutputNode::from_spec(&spec);
        assert_eq!(node.format, Some(FormatKind::Currency));
        assert!(node.depends_on("harga"));

        assert!(!node.apply_spec(&spec));
        assert!(node.apply_spec(&spec.clone().with_trigger("rows[0][qty]")));
        assert!(node.depends_on("rows_0_qty"));
    }
}
