use super::clock::{Clock, SystemClock};
use super::convergence::{ConvergenceDetector, Verdict};
use super::debounce::{DebounceKey, Debouncer, Tier};
use super::events::{
    ChangeOrigin, EngineEvent, EngineState, EngineStats, Subscriber, WatchId, Watcher,
};
use super::graph::DependencyGraph;
use super::host::{BoundTree, Scope};
use super::node::{NodeId, OutputNode};
use super::queue::{EnqueueOutcome, Priority, QueueEntry, UpdateQueue};
use super::registry::NodeRegistry;
use super::scheduler::{DrainOutcome, RunToCompletion, Scheduler, YieldPoint};
use super::EngineConfig;
use crate::coercion::classify_input;
use crate::evaluator::Evaluator;
use crate::format::format_value;
use crate::rows::RowIndexSet;
use crate::traits::VariableResolver;
use formcalc_common::{Value, is_wildcard, normalize_binding_name, wildcard_of};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, debug_span, info_span, trace, warn};

/// Resolves expression variables against the host tree.
///
/// Bound fields are read live from the tree. Nodes that never write
/// (`auto_apply = false`) and nodes without a bound field contribute their
/// last computed value instead.
struct TreeResolver<'a> {
    tree: &'a dyn BoundTree,
    bindings: &'a FxHashMap<String, String>,
    registry: &'a NodeRegistry,
    graph: &'a DependencyGraph,
}

impl VariableResolver for TreeResolver<'_> {
    fn resolve(&self, name: &str) -> Value {
        let node = self
            .graph
            .node_named(name)
            .and_then(|id| self.registry.get(id));
        if let Some(node) = node
            && !node.auto_apply
        {
            return node.last_value.clone();
        }
        if let Some(raw) = self.bindings.get(name) {
            return self
                .tree
                .read_input(raw)
                .map(|text| classify_input(&text))
                .unwrap_or_default();
        }
        node.map(|n| n.last_value.clone()).unwrap_or_default()
    }
}

/// Keeps a tree's output nodes in sync with its inputs.
///
/// Input notifications are debounced, turned into queue entries for the
/// affected nodes and drained in priority-ordered batches. A node whose
/// written value changed re-enqueues its graph peers; the convergence
/// detector and a per-origin iteration cap stop circular definitions from
/// looping.
pub struct ReactiveEngine<C: Clock = SystemClock> {
    config: EngineConfig,
    clock: C,
    scope: Scope,
    registry: NodeRegistry,
    graph: DependencyGraph,
    /// Normalized binding name → raw host name.
    bindings: FxHashMap<String, String>,
    rows: RowIndexSet,
    evaluator: Evaluator,
    detector: ConvergenceDetector,
    queue: UpdateQueue,
    scheduler: Scheduler,
    debouncer: Debouncer,
    state: EngineState,
    cycle: u64,
    /// Propagated evaluations this cycle, per `(node, origin)`.
    propagations: FxHashMap<(NodeId, Option<NodeId>), u32>,
    watchers: FxHashMap<String, Vec<(WatchId, Watcher)>>,
    subscribers: Vec<Subscriber>,
    next_watch: u64,
    stats: EngineStats,
}

impl ReactiveEngine<SystemClock> {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_clock(config, SystemClock::default())
    }
}

impl Default for ReactiveEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ReactiveEngine<C> {
    pub fn with_clock(config: EngineConfig, clock: C) -> Self {
        Self {
            evaluator: Evaluator::new(config.compile_cache_capacity, config.precision),
            detector: ConvergenceDetector::new(
                config.history_len,
                config.abs_tolerance,
                config.rel_tolerance,
                config.relaxed_tolerance_factor,
            ),
            queue: UpdateQueue::new(config.max_queue_len),
            scheduler: Scheduler::new(config.batch_size),
            debouncer: Debouncer::new(config.immediate_window, config.settle_window),
            config,
            clock,
            scope: Scope::All,
            registry: NodeRegistry::new(),
            graph: DependencyGraph::default(),
            bindings: FxHashMap::default(),
            rows: RowIndexSet::new(),
            state: EngineState::Idle,
            cycle: 0,
            propagations: FxHashMap::default(),
            watchers: FxHashMap::default(),
            subscribers: Vec::new(),
            next_watch: 0,
            stats: EngineStats::default(),
        }
    }

    /* ─────────────── inspection ─────────────── */

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn node_count(&self) -> usize {
        self.registry.len()
    }

    /// Queued evaluations plus debounced notifications not yet released.
    pub fn pending(&self) -> usize {
        self.queue.len() + self.debouncer.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.debouncer.next_deadline()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn rows(&self) -> &RowIndexSet {
        &self.rows
    }

    pub fn node_id(&self, key: &str) -> Option<NodeId> {
        self.registry.id_of(key)
    }

    pub fn node(&self, key: &str) -> Option<&OutputNode> {
        self.registry.by_key(key)
    }

    /// Last value computed for the node with this key.
    pub fn value_of(&self, key: &str) -> Option<&Value> {
        self.node(key).map(|n| &n.last_value)
    }

    pub fn history(&self, key: &str) -> Option<&VecDeque<Value>> {
        self.node_id(key).and_then(|id| self.detector.history(id))
    }

    /* ─────────────── callbacks ─────────────── */

    /// Call `callback(new, old)` whenever the node's value changes.
    pub fn watch<F>(&mut self, key: &str, callback: F) -> WatchId
    where
        F: FnMut(&Value, &Value) + 'static,
    {
        let id = WatchId(self.next_watch);
        self.next_watch += 1;
        self.watchers
            .entry(key.to_string())
            .or_default()
            .push((id, Box::new(callback)));
        id
    }

    pub fn unwatch(&mut self, id: WatchId) -> bool {
        let mut removed = false;
        for list in self.watchers.values_mut() {
            let before = list.len();
            list.retain(|(w, _)| *w != id);
            removed |= list.len() != before;
        }
        self.watchers.retain(|_, list| !list.is_empty());
        removed
    }

    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    fn emit(&mut self, event: EngineEvent) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&event);
        }
    }

    fn notify_watchers(&mut self, key: &str, new: &Value, old: &Value) {
        if let Some(list) = self.watchers.get_mut(key) {
            for (_, watcher) in list.iter_mut() {
                watcher(new, old);
            }
        }
    }

    /* ─────────────── structure ─────────────── */

    /// Bind to a tree and schedule every node for a first evaluation.
    pub fn attach(&mut self, tree: &dyn BoundTree, scope: Scope) -> usize {
        self.scope = scope;
        self.rescan(tree)
    }

    /// Reconcile the registry with the tree's current output nodes and
    /// rebuild bindings, row indices and the dependency graph. New or
    /// changed nodes are enqueued at low priority; returns how many.
    pub fn rescan(&mut self, tree: &dyn BoundTree) -> usize {
        let _span = debug_span!("rescan").entered();
        let specs = tree.output_nodes(&self.scope);
        self.bindings = tree
            .input_bindings(&self.scope)
            .into_iter()
            .map(|raw| (normalize_binding_name(&raw), raw))
            .filter(|(name, _)| !name.is_empty())
            .collect();

        let mut seen = FxHashSet::default();
        let mut touched = Vec::new();
        for spec in &specs {
            seen.insert(spec.key.as_str());
            match self.registry.id_of(&spec.key) {
                Some(id) => {
                    if let Some(node) = self.registry.get_mut(id)
                        && node.apply_spec(spec)
                    {
                        touched.push(id);
                    }
                }
                None => touched.push(self.registry.insert(OutputNode::from_spec(spec))),
            }
        }
        let stale: Vec<(NodeId, String)> = self
            .registry
            .iter()
            .filter(|(_, node)| !seen.contains(node.key.as_str()))
            .map(|(id, node)| (id, node.key.clone()))
            .collect();
        for (id, key) in &stale {
            self.remove_node(*id, key);
        }

        let rows = RowIndexSet::from_names(
            self.bindings
                .keys()
                .map(String::as_str)
                .chain(self.registry.iter().filter_map(|(_, n)| n.name.as_deref())),
        );
        if rows != self.rows {
            // Rows came or went: every aggregate over a family may change.
            for (id, node) in self.registry.iter() {
                if node.dependencies.iter().any(|d| is_wildcard(d)) && !touched.contains(&id) {
                    touched.push(id);
                }
            }
        }
        self.rows = rows;
        self.graph = DependencyGraph::build(self.registry.iter());
        for id in self.registry.ids() {
            let peers = SmallVec::from_slice(self.graph.linked(id));
            if let Some(node) = self.registry.get_mut(id) {
                node.linked = peers;
            }
        }

        for id in &touched {
            self.enqueue(*id, Priority::Low, None, None);
        }
        debug!(
            nodes = self.registry.len(),
            touched = touched.len(),
            removed = stale.len(),
            "rescanned tree"
        );
        touched.len()
    }

    fn remove_node(&mut self, id: NodeId, key: &str) {
        self.registry.remove(id);
        self.queue.remove_node(id);
        self.detector.forget(id);
        self.watchers.remove(key);
        self.propagations
            .retain(|(node, source), _| *node != id && *source != Some(id));
    }

    /* ─────────────── notifications ─────────────── */

    /// A bound field changed. User edits are released after the immediate
    /// debounce window, programmatic ones after the settle window.
    pub fn notify_input_changed(&mut self, name: &str, origin: ChangeOrigin) {
        let name = normalize_binding_name(name);
        if name.is_empty() {
            return;
        }
        let now = self.clock.now();
        if origin == ChangeOrigin::User
            && let Some(id) = self.graph.node_named(&name)
        {
            // The user overrode a computed field: forget what the engine
            // last wrote there and hold off recomputing it.
            self.detector.reset(id);
            if let Some(node) = self.registry.get_mut(id) {
                node.last_manual_edit = Some(now);
                node.last_written = None;
            }
        }
        let tier = match origin {
            ChangeOrigin::User => Tier::Immediate,
            ChangeOrigin::Programmatic => Tier::Settle,
        };
        self.mark_queued();
        self.debouncer.schedule(DebounceKey::Input(name), tier, now);
    }

    pub fn notify_structure_changed(&mut self) {
        let now = self.clock.now();
        self.mark_queued();
        self.debouncer
            .schedule(DebounceKey::Structure, Tier::Settle, now);
    }

    /// Enqueue every node for re-evaluation without draining.
    pub fn schedule_recompute(&mut self) {
        for id in self.registry.ids() {
            self.enqueue(id, Priority::Low, None, None);
        }
    }

    fn release(&mut self, tree: &dyn BoundTree, keys: Vec<DebounceKey>) {
        // Structure first so input changes are routed through the new graph.
        if keys.contains(&DebounceKey::Structure) {
            self.rescan(tree);
        }
        for key in keys {
            if let DebounceKey::Input(name) = key {
                self.enqueue_dependents(&name);
            }
        }
    }

    fn enqueue_dependents(&mut self, name: &str) {
        let source = self.graph.node_named(name);
        let mut targets: Vec<NodeId> = self.graph.dependents_of(name).to_vec();
        if let Some(pattern) = wildcard_of(name) {
            targets.extend_from_slice(self.graph.dependents_of(&pattern));
        }
        trace!(name, targets = targets.len(), "input released");
        for id in targets {
            if Some(id) != source {
                self.enqueue(id, Priority::Normal, source, None);
            }
        }
    }

    fn enqueue(&mut self, node: NodeId, priority: Priority, source: Option<NodeId>, via: Option<NodeId>) {
        self.mark_queued();
        let now = self.clock.now();
        match self.queue.enqueue(node, priority, source, via, now) {
            EnqueueOutcome::Evicted(victim) => {
                warn!(evicted = %victim.node, "update queue full, evicted oldest low-priority entry")
            }
            EnqueueOutcome::Rejected => {
                warn!(node = %node, "update queue full, dropped entry")
            }
            EnqueueOutcome::Inserted | EnqueueOutcome::Replaced => {}
        }
    }

    /// Idle → Queued starts a new cycle. Histories and iteration counts are
    /// per cycle, so a user flipping a field back and forth is never taken
    /// for an oscillation.
    fn mark_queued(&mut self) {
        if self.state == EngineState::Idle {
            self.cycle += 1;
            self.detector.clear();
            self.propagations.clear();
            self.state = EngineState::Queued;
            trace!(cycle = self.cycle, "cycle started");
        }
    }

    fn settle_state(&mut self) {
        self.state = if self.queue.is_empty() && self.debouncer.is_empty() {
            EngineState::Idle
        } else {
            EngineState::Queued
        };
    }

    /* ─────────────── driving ─────────────── */

    /// Release debounced notifications that are due, then drain.
    pub fn tick(&mut self, tree: &mut dyn BoundTree, yielder: &mut dyn YieldPoint) -> DrainOutcome {
        let due = self.debouncer.due(self.clock.now());
        self.release(&*tree, due);
        self.drain(tree, yielder)
    }

    /// Release everything debounced and drain to completion.
    pub fn flush(&mut self, tree: &mut dyn BoundTree) -> DrainOutcome {
        let all = self.debouncer.flush_all();
        self.release(&*tree, all);
        self.drain(tree, &mut RunToCompletion)
    }

    /// Continue a drain that previously yielded.
    pub fn resume(&mut self, tree: &mut dyn BoundTree, yielder: &mut dyn YieldPoint) -> DrainOutcome {
        self.drain(tree, yielder)
    }

    /// Re-evaluate every node in `scope` and drain to completion.
    pub fn recompute(&mut self, tree: &mut dyn BoundTree, scope: &Scope) -> DrainOutcome {
        let all = self.debouncer.flush_all();
        self.release(&*tree, all);
        let targets: Vec<NodeId> = match scope {
            Scope::All => self.registry.ids(),
            Scope::Subtree(_) => tree
                .output_nodes(scope)
                .iter()
                .filter_map(|spec| self.registry.id_of(&spec.key))
                .collect(),
        };
        for id in targets {
            self.enqueue(id, Priority::Normal, None, None);
        }
        self.drain(tree, &mut RunToCompletion)
    }

    fn drain(&mut self, tree: &mut dyn BoundTree, yielder: &mut dyn YieldPoint) -> DrainOutcome {
        if self.queue.is_empty() {
            self.settle_state();
            return DrainOutcome::Idle;
        }
        let span = info_span!("drain", cycle = self.cycle);
        let _guard = span.enter();

        self.state = EngineState::Evaluating;
        let started = self.clock.now();
        let mut processed = 0;
        loop {
            let batch = self.scheduler.next_batch(&mut self.queue);
            if batch.is_empty() {
                break;
            }
            let evaluated = batch.len();
            let mut written = Vec::new();
            for entry in &batch {
                if let Some(key) = self.process(tree, entry) {
                    written.push(key);
                }
            }
            processed += evaluated;
            debug!(evaluated, written = written.len(), "batch completed");
            self.emit(EngineEvent::BatchCompleted {
                cycle: self.cycle,
                evaluated,
                written,
            });

            if self.queue.is_empty() {
                break;
            }
            let elapsed = self.clock.now().saturating_sub(started);
            if yielder.should_yield(processed, elapsed) {
                self.state = EngineState::Queued;
                return DrainOutcome::Yielded {
                    remaining: self.queue.len(),
                };
            }
        }

        debug!(processed, "stabilized");
        self.emit(EngineEvent::Stabilized { cycle: self.cycle });
        self.settle_state();
        DrainOutcome::Idle
    }

    /// Evaluate one entry. Returns the node key when its text was written.
    fn process(&mut self, tree: &mut dyn BoundTree, entry: &QueueEntry) -> Option<String> {
        let id = entry.node;
        let now = self.clock.now();
        let Some(node) = self.registry.get(id) else {
            self.stats.skipped += 1;
            return None;
        };
        let key = node.key.clone();
        let expression = node.expression.clone();
        let editing = node.skip_while_editing
            && (tree.is_focused(&key) || node.within_cooldown(now, self.config.edit_cooldown));

        if entry.source == Some(id) {
            trace!(key = %key, "not re-evaluating the origin of a propagation");
            self.stats.skipped += 1;
            return None;
        }
        if entry.via.is_some() {
            let count = self.propagations.entry((id, entry.source)).or_insert(0);
            *count += 1;
            if *count > self.config.max_iterations {
                warn!(
                    key = %key,
                    max_iterations = self.config.max_iterations,
                    "iteration cap reached, dropping update"
                );
                self.stats.capped += 1;
                self.emit(EngineEvent::IterationCapReached { key });
                return None;
            }
        }
        if editing {
            debug!(key = %key, "node is being edited, skipping");
            self.stats.skipped += 1;
            return None;
        }

        let result = {
            let resolver = TreeResolver {
                tree: &*tree,
                bindings: &self.bindings,
                registry: &self.registry,
                graph: &self.graph,
            };
            self.evaluator.evaluate(&expression, &resolver, &self.rows)
        };
        self.stats.evaluations += 1;
        let value = match result {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %key, expression = %expression, error = %err, "evaluation failed");
                self.stats.failures += 1;
                Value::Empty
            }
        };

        let relaxed = entry
            .via
            .is_some_and(|via| self.graph.is_confirmed_pair(via, id));
        let verdict = self.detector.observe(id, &value, relaxed);

        let node = self.registry.get_mut(id)?;
        let old = std::mem::replace(&mut node.last_value, value.clone());
        let value_changed = !self.detector.converged(&old, &value, false);
        let auto_apply = node.auto_apply;
        let peers: SmallVec<[NodeId; 4]> = SmallVec::from_slice(self.graph.readers_of(id));

        let mut wrote = false;
        if verdict == Verdict::Oscillating {
            debug!(key = %key, value = %value, "oscillation detected, keeping displayed value");
        } else if auto_apply {
            let text = format_value(&value, node.format, &self.config.locale);
            let current = node.last_written.clone().or_else(|| tree.read_output(&key));
            if current.as_deref() != Some(text.as_str()) {
                trace!(key = %key, text = %text, "write");
                tree.write_output(&key, &text);
                wrote = true;
            }
            node.last_written = Some(text);
        }

        match verdict {
            Verdict::Oscillating => self.stats.oscillations += 1,
            _ if wrote => self.stats.writes += 1,
            _ => {}
        }
        if value_changed {
            self.notify_watchers(&key, &value, &old);
        }

        let propagate = verdict == Verdict::Changed && (wrote || (!auto_apply && value_changed));
        if propagate {
            let source = entry.source.or(Some(id));
            for peer in peers {
                if Some(peer) != source {
                    self.enqueue(peer, Priority::High, source, Some(id));
                }
            }
        }
        wrote.then_some(key)
    }
}
