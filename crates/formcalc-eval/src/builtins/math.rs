use crate::coercion::{round_to, truthy, value_to_number};
use crate::interpreter::Interpreter;
use formcalc_common::{Builtin, EvalError, Value};
use formcalc_parse::ASTNode;

/// `if(cond, a, b)`: only the taken branch is evaluated.
pub fn if_(interp: &Interpreter<'_>, args: &[ASTNode]) -> Result<Value, EvalError> {
    if truthy(&interp.evaluate_ast(&args[0])?) {
        interp.evaluate_ast(&args[1])
    } else {
        interp.evaluate_ast(&args[2])
    }
}

pub fn unary_numeric(builtin: Builtin, args: &[Value]) -> Value {
    let x = args.first().map(value_to_number).unwrap_or(0.0);
    let n = match builtin {
        Builtin::Round => {
            let places = args.get(1).map(value_to_number).unwrap_or(0.0);
            round_to(x, places.clamp(0.0, 15.0) as u32)
        }
        Builtin::Abs => x.abs(),
        Builtin::Floor => x.floor(),
        Builtin::Ceil => x.ceil(),
        _ => x,
    };
    Value::Number(n)
}
