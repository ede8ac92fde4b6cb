use formcalc_common::Value;

/// Notification delivered to `subscribe` callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    BatchCompleted {
        cycle: u64,
        evaluated: usize,
        /// Keys of the nodes whose displayed text was written.
        written: Vec<String>,
    },
    /// The queue drained; nothing more will change without new input.
    Stabilized { cycle: u64 },
    /// A propagated update was dropped after `max_iterations`.
    IterationCapReached { key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Idle,
    Queued,
    Evaluating,
}

/// Where an input change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// The user typed or picked a value.
    User,
    /// Script or host code set the value.
    Programmatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(pub(crate) u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub evaluations: u64,
    pub writes: u64,
    pub skipped: u64,
    pub capped: u64,
    pub oscillations: u64,
    pub failures: u64,
}

pub type Watcher = Box<dyn FnMut(&Value, &Value)>;
pub type Subscriber = Box<dyn FnMut(&EngineEvent)>;
