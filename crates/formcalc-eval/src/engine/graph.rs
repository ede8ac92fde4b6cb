//! Variable → node dependency map and the symmetric link set between nodes.
//!
//! Two nodes are linked when their footprints (dependencies plus the node's
//! own binding name) intersect. A wildcard dependency such as `rows_?_total`
//! also matches every concrete member `rows_<i>_total`. When a node writes a
//! new value only the linked nodes that read its name are re-enqueued.

use super::node::{NodeId, OutputNode};
use formcalc_common::wildcard_of;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

#[derive(Debug, Default)]
pub struct DependencyGraph {
    dependency_map: FxHashMap<String, Vec<NodeId>>,
    links: FxHashMap<NodeId, SmallVec<[NodeId; 4]>>,
    /// Linked nodes that reference a node's name, keyed by the node read.
    readers: FxHashMap<NodeId, SmallVec<[NodeId; 4]>>,
    /// Pairs where each side references the other's name, stored `(lo, hi)`.
    confirmed: FxHashSet<(NodeId, NodeId)>,
    names: FxHashMap<String, NodeId>,
}

fn references(from: &OutputNode, to: &OutputNode) -> bool {
    let Some(name) = to.name.as_deref() else {
        return false;
    };
    from.depends_on(name) || wildcard_of(name).is_some_and(|w| from.depends_on(&w))
}

fn shares_dependency(a: &OutputNode, b: &OutputNode) -> bool {
    // Iterate the smaller set.
    let (small, large) = if a.dependencies.len() <= b.dependencies.len() {
        (a, b)
    } else {
        (b, a)
    };
    small.dependencies.iter().any(|d| large.depends_on(d))
}

fn ordered(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl DependencyGraph {
    /// Build from scratch. Pairwise, so quadratic in the node count; output
    /// node counts in a form stay small.
    pub fn build<'a, I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, &'a OutputNode)>,
    {
        let mut nodes: Vec<(NodeId, &OutputNode)> = nodes.into_iter().collect();
        nodes.sort_by_key(|(id, _)| *id);

        let mut graph = DependencyGraph::default();
        for (id, node) in &nodes {
            for dep in &node.dependencies {
                graph.dependency_map.entry(dep.clone()).or_default().push(*id);
            }
            if let Some(name) = &node.name {
                graph.names.insert(name.clone(), *id);
            }
        }

        for (i, (a_id, a)) in nodes.iter().enumerate() {
            for (b_id, b) in nodes.iter().skip(i + 1) {
                let a_refs_b = references(a, b);
                let b_refs_a = references(b, a);
                if !(a_refs_b || b_refs_a || shares_dependency(a, b)) {
                    continue;
                }
                graph.links.entry(*a_id).or_default().push(*b_id);
                graph.links.entry(*b_id).or_default().push(*a_id);
                if a_refs_b {
                    graph.readers.entry(*b_id).or_default().push(*a_id);
                }
                if b_refs_a {
                    graph.readers.entry(*a_id).or_default().push(*b_id);
                }
                if a_refs_b && b_refs_a {
                    graph.confirmed.insert(ordered(*a_id, *b_id));
                }
            }
        }
        for peers in graph.links.values_mut().chain(graph.readers.values_mut()) {
            peers.sort();
        }
        graph
    }

    /// Nodes whose dependencies include `variable`, in id order.
    pub fn dependents_of(&self, variable: &str) -> &[NodeId] {
        self.dependency_map
            .get(variable)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn node_named(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn linked(&self, id: NodeId) -> &[NodeId] {
        self.links.get(&id).map(|p| p.as_slice()).unwrap_or(&[])
    }

    /// Nodes whose expressions read `id`'s name, sorted.
    pub fn readers_of(&self, id: NodeId) -> &[NodeId] {
        self.readers.get(&id).map(|p| p.as_slice()).unwrap_or(&[])
    }

    pub fn is_linked(&self, a: NodeId, b: NodeId) -> bool {
        self.linked(a).contains(&b)
    }

    pub fn is_confirmed_pair(&self, a: NodeId, b: NodeId) -> bool {
        self.confirmed.contains(&ordered(a, b))
    }

    /// Confirmed bidirectional pairs, sorted.
    pub fn bidirectional_pairs(&self) -> Vec<(NodeId, NodeId)> {
        let mut pairs: Vec<_> = self.confirmed.iter().copied().collect();
        pairs.sort();
        pairs
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.dependency_map.keys().map(String::as_str)
    }

    pub fn edge_count(&self) -> usize {
        self.links.values().map(|p| p.len()).sum::<usize>() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::host::OutputSpec;
    use crate::engine::registry::NodeRegistry;

    fn registry(specs: &[OutputSpec]) -> (NodeRegistry, Vec<NodeId>) {
        let mut reg = NodeRegistry::new();
        let ids = specs
            .iter()
            .map(|s| reg.insert(OutputNode::from_spec(s)))
            .collect();
        (reg, ids)
    }

    #[test]
    fn mutual_references_form_a_confirmed_pair() {
        let (reg, ids) = registry(&[
            OutputSpec::new("a", "b + 1").named("a"),
            OutputSpec::new("b", "a - 1").named("b"),
            OutputSpec::new("c", "x * 2").named("c"),
        ]);
        let g = DependencyGraph::build(reg.iter());
        assert!(g.is_confirmed_pair(ids[0], ids[1]));
        assert!(g.is_confirmed_pair(ids[1], ids[0]));
        assert_eq!(g.linked(ids[2]), &[] as &[NodeId]);
        assert_eq!(g.bidirectional_pairs(), vec![(ids[0], ids[1])]);
        assert_eq!(g.readers_of(ids[0]), &[ids[1]]);
        assert_eq!(g.readers_of(ids[1]), &[ids[0]]);
    }

    #[test]
    fn one_way_and_shared_dependencies_link_without_confirming() {
        let (reg, ids) = registry(&[
            OutputSpec::new("subtotal", "harga * qty").named("subtotal"),
            OutputSpec::new("total", "subtotal * 1.1").named("total"),
            OutputSpec::new("discount", "harga * 0.1").named("discount"),
        ]);
        let g = DependencyGraph::build(reg.iter());
        assert_eq!(g.linked(ids[0]), &[ids[1], ids[2]]);
        assert!(!g.is_confirmed_pair(ids[0], ids[1]));
        assert_eq!(g.dependents_of("harga"), &[ids[0], ids[2]]);
        assert_eq!(g.node_named("total"), Some(ids[1]));
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.readers_of(ids[0]), &[ids[1]]);
        assert_eq!(g.readers_of(ids[1]), &[] as &[NodeId]);
        assert_eq!(g.readers_of(ids[2]), &[] as &[NodeId]);
    }

    #[test]
    fn wildcards_link_to_row_members() {
        let (reg, ids) = registry(&[
            OutputSpec::new("row0", "rows_0_qty * 2").named("rows[0][total]"),
            OutputSpec::new("grand", "sum(rows_?_total)").named("grand"),
        ]);
        let g = DependencyGraph::build(reg.iter());
        assert!(g.is_linked(ids[0], ids[1]));
        assert_eq!(g.dependents_of("rows_?_total"), &[ids[1]]);
        assert_eq!(g.readers_of(ids[0]), &[ids[1]]);
    }
}
