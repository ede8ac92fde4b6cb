use super::node::{NodeId, OutputNode};
use rustc_hash::FxHashMap;

struct Slot {
    generation: u32,
    node: Option<OutputNode>,
}

/// Arena of output nodes addressed by [`NodeId`], with a lookup by host key.
#[derive(Default)]
pub struct NodeRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_key: FxHashMap<String, NodeId>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing any node registered under the same key.
    pub fn insert(&mut self, node: OutputNode) -> NodeId {
        if let Some(existing) = self.by_key.get(&node.key).copied() {
            self.remove(existing);
        }
        let key = node.key.clone();
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId::new(index, 0)
            }
        };
        self.by_key.insert(key, id);
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Option<OutputNode> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.by_key.remove(&node.key);
        Some(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&OutputNode> {
        self.slots
            .get(id.index() as usize)
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut OutputNode> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.node.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn id_of(&self, key: &str) -> Option<NodeId> {
        self.by_key.get(key).copied()
    }

    pub fn by_key(&self, key: &str) -> Option<&OutputNode> {
        self.id_of(key).and_then(|id| self.get(id))
    }

    /// Live nodes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &OutputNode)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.node
                .as_ref()
                .map(|n| (NodeId::new(i as u32, s.generation), n))
        })
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
