//! Meta crate that re-exports the formcalc building blocks. Depend on this
//! crate and pick layers with feature flags, or reach into the underlying
//! crates for deeper integration.

#[cfg(feature = "common")]
pub use formcalc_common as common;

#[cfg(feature = "parse")]
pub use formcalc_parse as parse;

#[cfg(feature = "eval")]
pub use formcalc_eval as eval;

#[cfg(feature = "common")]
pub use formcalc_common::{EvalError, Value};

#[cfg(feature = "parse")]
pub use formcalc_parse::{ASTNode, ParseError, extract_dependencies, parse as parse_expression};

#[cfg(feature = "eval")]
pub use formcalc_eval::{
    BoundTree, ChangeOrigin, DrainOutcome, EngineConfig, EngineEvent, EngineState, Evaluator,
    FormatKind, Locale, OutputSpec, ReactiveEngine, RowIndexSet, Scope, VariableResolver,
};

#[cfg(feature = "log-init")]
pub use formcalc_eval::init_tracing;
