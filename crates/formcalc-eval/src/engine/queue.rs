use super::node::NodeId;
use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    /// Structural rescans.
    Low,
    /// Direct input edits.
    Normal,
    /// Propagation between linked nodes.
    High,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub node: NodeId,
    pub priority: Priority,
    /// The node whose change started this chain of updates, if any.
    pub source: Option<NodeId>,
    /// The node whose write enqueued this entry. `None` for entries created
    /// directly by input or structural changes.
    pub via: Option<NodeId>,
    pub enqueued_at: Duration,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Inserted,
    /// A pending entry for the same node and priority was superseded.
    Replaced,
    /// The queue was full; the returned entry made room.
    Evicted(QueueEntry),
    /// The queue was full of higher-priority work.
    Rejected,
}

/// Pending evaluations ordered by priority (highest first), then by enqueue
/// order. At most one entry per `(node, priority)`.
#[derive(Debug)]
pub struct UpdateQueue {
    entries: BTreeMap<(Reverse<Priority>, u64), QueueEntry>,
    index: FxHashMap<(NodeId, Priority), u64>,
    next_seq: u64,
    capacity: usize,
    dropped: u64,
}

impl UpdateQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            index: FxHashMap::default(),
            next_seq: 0,
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn enqueue(
        &mut self,
        node: NodeId,
        priority: Priority,
        source: Option<NodeId>,
        via: Option<NodeId>,
        now: Duration,
    ) -> EnqueueOutcome {
        let mut outcome = EnqueueOutcome::Inserted;
        if let Some(seq) = self.index.remove(&(node, priority)) {
            self.entries.remove(&(Reverse(priority), seq));
            outcome = EnqueueOutcome::Replaced;
        } else if self.entries.len() >= self.capacity {
            match self.evict_for(priority) {
                Some(victim) => outcome = EnqueueOutcome::Evicted(victim),
                None => {
                    self.dropped += 1;
                    return EnqueueOutcome::Rejected;
                }
            }
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert((node, priority), seq);
        self.entries.insert(
            (Reverse(priority), seq),
            QueueEntry {
                node,
                priority,
                source,
                via,
                enqueued_at: now,
                seq,
            },
        );
        outcome
    }

    /// Remove the oldest entry of the lowest class, unless the incoming
    /// entry would itself be the lowest.
    fn evict_for(&mut self, incoming: Priority) -> Option<QueueEntry> {
        let (Reverse(lowest), _) = *self.entries.keys().next_back()?;
        if incoming < lowest {
            return None;
        }
        let key = *self
            .entries
            .range((Reverse(lowest), 0)..=(Reverse(lowest), u64::MAX))
            .next()?
            .0;
        let victim = self.entries.remove(&key)?;
        self.index.remove(&(victim.node, victim.priority));
        self.dropped += 1;
        Some(victim)
    }

    pub fn pop(&mut self) -> Option<QueueEntry> {
        let (_, entry) = self.entries.pop_first()?;
        self.index.remove(&(entry.node, entry.priority));
        Some(entry)
    }

    pub fn peek(&self) -> Option<&QueueEntry> {
        self.entries.values().next()
    }

    /// Drop every pending entry for a node. Returns how many were removed.
    pub fn remove_node(&mut self, node: NodeId) -> usize {
        let mut removed = 0;
        for priority in [Priority::Low, Priority::Normal, Priority::High] {
            if let Some(seq) = self.index.remove(&(node, priority)) {
                self.entries.remove(&(Reverse(priority), seq));
                removed += 1;
            }
        }
        removed
    }

    pub fn contains(&self, node: NodeId, priority: Priority) -> bool {
        self.index.contains_key(&(node, priority))
    }

    /// Pending entries in pop order.
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries evicted or rejected because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}
