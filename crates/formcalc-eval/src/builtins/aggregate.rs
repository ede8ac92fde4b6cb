use crate::coercion::value_to_number;
use crate::criteria::Criterion;
use crate::interpreter::Interpreter;
use formcalc_common::{Builtin, EvalError, Value, split_wildcard};
use formcalc_parse::{ASTNode, ASTNodeType};

/// One argument value, tagged with its row index when it came from a
/// wildcard expansion.
type Cell = (Option<u32>, Value);

/// First row family named by a wildcard anywhere inside `node`.
pub(crate) fn wildcard_family(node: &ASTNode) -> Option<&str> {
    match &node.node_type {
        ASTNodeType::Variable(name) => split_wildcard(name).map(|(family, _)| family),
        ASTNodeType::Number(_) | ASTNodeType::Text(_) | ASTNodeType::Boolean(_) => None,
        ASTNodeType::UnaryOp { expr, .. } => wildcard_family(expr),
        ASTNodeType::BinaryOp { left, right, .. } => {
            wildcard_family(left).or_else(|| wildcard_family(right))
        }
        ASTNodeType::Conditional {
            condition,
            then,
            otherwise,
        } => wildcard_family(condition)
            .or_else(|| wildcard_family(then))
            .or_else(|| wildcard_family(otherwise)),
        ASTNodeType::Function { args, .. } => args.iter().find_map(wildcard_family),
    }
}

/// Evaluate an aggregate argument. An argument mentioning `rows_?_x` is
/// evaluated once per live row of its family, so `rows_?_qty * rows_?_price`
/// yields one product per row; anything else is a single value.
fn expand(interp: &Interpreter<'_>, arg: &ASTNode) -> Result<Vec<Cell>, EvalError> {
    let Some(family) = wildcard_family(arg) else {
        return Ok(vec![(None, interp.evaluate_ast(arg)?)]);
    };
    interp
        .rows()
        .indices_for(family)
        .into_iter()
        .map(|i| interp.at_row(i).evaluate_ast(arg).map(|v| (Some(i), v)))
        .collect()
}

pub fn reduce(interp: &Interpreter<'_>, builtin: Builtin, args: &[ASTNode]) -> Result<Value, EvalError> {
    let mut values = Vec::new();
    for arg in args {
        values.extend(expand(interp, arg)?.into_iter().map(|(_, v)| v));
    }

    if builtin == Builtin::Sum {
        return Ok(Value::Number(values.iter().map(value_to_number).sum()));
    }

    // Unfilled rows do not count towards avg/min/max/count.
    let filled: Vec<f64> = values
        .iter()
        .filter(|v| !v.is_empty())
        .map(value_to_number)
        .collect();
    let n = match builtin {
        Builtin::Count => filled.len() as f64,
        Builtin::Avg if filled.is_empty() => 0.0,
        Builtin::Avg => filled.iter().sum::<f64>() / filled.len() as f64,
        Builtin::Min => filled.iter().copied().reduce(f64::min).unwrap_or(0.0),
        Builtin::Max => filled.iter().copied().reduce(f64::max).unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(Value::Number(n))
}

/// `sumif(criteria_range, criterion[, sum_range])`.
///
/// Two wildcard ranges are paired by row index, so `rows_?_status` and
/// `rows_?_amount` line up even when a row is missing one of the fields.
pub fn sumif(interp: &Interpreter<'_>, args: &[ASTNode]) -> Result<Value, EvalError> {
    let criteria = expand(interp, &args[0])?;
    let criterion = Criterion::parse(&interp.evaluate_ast(&args[1])?);

    let sums: Vec<Value> = match args.get(2) {
        None => criteria.iter().map(|(_, v)| v.clone()).collect(),
        Some(arg) if wildcard_family(arg).is_some() => criteria
            .iter()
            .map(|(idx, _)| match idx {
                Some(i) => interp.at_row(*i).evaluate_ast(arg),
                None => Ok(Value::Empty),
            })
            .collect::<Result<_, _>>()?,
        Some(arg) => expand(interp, arg)?.into_iter().map(|(_, v)| v).collect(),
    };

    let total = criteria
        .iter()
        .zip(sums.iter())
        .filter(|((_, c), _)| criterion.matches(c))
        .map(|(_, s)| value_to_number(s))
        .sum();
    Ok(Value::Number(total))
}
