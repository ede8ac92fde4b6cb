use rustc_hash::FxHashMap;
use std::time::Duration;

/// What a debounced notification is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DebounceKey {
    /// A normalized input binding name.
    Input(String),
    Structure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Direct user edits.
    Immediate,
    /// Programmatic cascades and structural changes.
    Settle,
}

/// Two-tier debounce. Scheduling a key that is already pending replaces its
/// deadline, so only the last of a burst of notifications is released.
#[derive(Debug)]
pub struct Debouncer {
    pending: FxHashMap<DebounceKey, Duration>,
    immediate: Duration,
    settle: Duration,
}

impl Debouncer {
    pub fn new(immediate: Duration, settle: Duration) -> Self {
        Self {
            pending: FxHashMap::default(),
            immediate,
            settle,
        }
    }

    pub fn window(&self, tier: Tier) -> Duration {
        match tier {
            Tier::Immediate => self.immediate,
            Tier::Settle => self.settle,
        }
    }

    pub fn schedule(&mut self, key: DebounceKey, tier: Tier, now: Duration) {
        let deadline = now + self.window(tier);
        self.pending.insert(key, deadline);
    }

    pub fn cancel(&mut self, key: &DebounceKey) -> bool {
        self.pending.remove(key).is_some()
    }

    /// Release every key whose deadline has passed, earliest first.
    pub fn due(&mut self, now: Duration) -> Vec<DebounceKey> {
        let mut ready: Vec<(Duration, DebounceKey)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(k, d)| (*d, k.clone()))
            .collect();
        ready.sort();
        for (_, key) in &ready {
            self.pending.remove(key);
        }
        ready.into_iter().map(|(_, k)| k).collect()
    }

    /// Release everything regardless of deadlines.
    pub fn flush_all(&mut self) -> Vec<DebounceKey> {
        let mut all: Vec<(Duration, DebounceKey)> =
            self.pending.drain().map(|(k, d)| (d, k)).collect();
        all.sort();
        all.into_iter().map(|(_, k)| k).collect()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.values().min().copied()
    }

    pub fn is_pending(&self, key: &DebounceKey) -> bool {
        self.pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
