//! The fixed function library.
//!
//! Calls are dispatched on [`Builtin`]; there is no registry hosts can add
//! to. Arguments arrive unevaluated so `if` stays lazy and aggregates can see
//! wildcard patterns before they would collapse to `Empty`.

pub mod aggregate;
pub mod datetime;
pub mod math;

use crate::interpreter::Interpreter;
use formcalc_common::{Builtin, EvalError, Value};
use formcalc_parse::ASTNode;
use tracing::warn;

pub fn call(interp: &Interpreter<'_>, name: &str, args: &[ASTNode]) -> Result<Value, EvalError> {
    let Some(builtin) = Builtin::lookup(name) else {
        if args.iter().any(|a| aggregate::wildcard_family(a).is_some()) {
            warn!(function = name, "unknown aggregate, treating as empty");
            return Ok(Value::Number(0.0));
        }
        return Err(EvalError::UnknownFunction(name.to_string()));
    };
    check_arity(builtin, args.len())?;

    match builtin {
        Builtin::Sum
        | Builtin::Avg
        | Builtin::Min
        | Builtin::Max
        | Builtin::Count => aggregate::reduce(interp, builtin, args),
        Builtin::SumIf => aggregate::sumif(interp, args),
        Builtin::DaysBetween
        | Builtin::WeeksBetween
        | Builtin::MonthsBetween
        | Builtin::YearsBetween => {
            let start = interp.evaluate_ast(&args[0])?;
            let end = interp.evaluate_ast(&args[1])?;
            Ok(datetime::date_range(builtin, &start, &end))
        }
        Builtin::If => math::if_(interp, args),
        Builtin::Round | Builtin::Abs | Builtin::Floor | Builtin::Ceil => {
            let values = args
                .iter()
                .map(|a| interp.evaluate_ast(a))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(math::unary_numeric(builtin, &values))
        }
    }
}

fn check_arity(builtin: Builtin, got: usize) -> Result<(), EvalError> {
    let (min, max) = builtin.arity();
    if got < min || max.is_some_and(|m| got > m) {
        return Err(EvalError::Arity {
            name: builtin.name().to_string(),
            expected: builtin.arity_label(),
            got,
        });
    }
    Ok(())
}
