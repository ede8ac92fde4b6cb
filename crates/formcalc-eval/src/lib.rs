pub mod builtins;
pub mod coercion;
pub mod compile_cache;
pub mod criteria;
pub mod engine;
pub mod evaluator;
pub mod format;
pub mod interpreter;
pub mod locale;
pub mod rows;
pub mod test_tree;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod tests;

pub use engine::{
    BoundTree, ChangeOrigin, DrainOutcome, EngineConfig, EngineEvent, EngineState, EngineStats,
    HostDriven, ManualClock, OutputSpec, ReactiveEngine, RunToCompletion, Scope, SystemClock,
    TimeBudget, WatchId, YieldPoint,
};
pub use evaluator::Evaluator;
pub use format::{FormatKind, format_value};
pub use locale::Locale;
pub use rows::RowIndexSet;
pub use traits::{FnResolver, VariableResolver};

pub use formcalc_common::{EvalError, Value};

/// Install a `tracing` fmt subscriber filtered by `RUST_LOG` (default
/// `warn`). Safe to call more than once.
#[cfg(feature = "log-init")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
