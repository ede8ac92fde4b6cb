use crate::builtins;
use crate::coercion::{compare_values, looks_numeric, truthy, value_to_number};
use crate::rows::RowIndexSet;
use crate::traits::VariableResolver;
use formcalc_common::{EvalError, Value, expand_wildcard, is_wildcard};
use formcalc_parse::{ASTNode, ASTNodeType, BinaryOp, UnaryOp};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

/// Walks a parsed expression against a fixed variable table.
///
/// Plain variables can only be read from `variables`, which the evaluator
/// fills with the expression's own free variables. Row expansion for
/// aggregates goes through `rows` and `row_resolver` and nowhere else.
///
/// While an aggregate walks its rows the interpreter is bound to one row
/// index, and every wildcard in the argument reads that row.
pub struct Interpreter<'a> {
    variables: &'a FxHashMap<String, Value>,
    row_resolver: &'a dyn VariableResolver,
    rows: &'a RowIndexSet,
    row: Option<u32>,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        variables: &'a FxHashMap<String, Value>,
        row_resolver: &'a dyn VariableResolver,
        rows: &'a RowIndexSet,
    ) -> Self {
        Self {
            variables,
            row_resolver,
            rows,
            row: None,
        }
    }

    /// The same interpreter with wildcards bound to row `index`.
    pub fn at_row(&self, index: u32) -> Interpreter<'a> {
        Interpreter {
            row: Some(index),
            ..*self
        }
    }

    pub fn rows(&self) -> &RowIndexSet {
        self.rows
    }

    /// Value of one concrete member of an indexed family.
    pub fn resolve_row(&self, name: &str) -> Value {
        self.row_resolver.resolve(name)
    }

    pub fn evaluate_ast(&self, node: &ASTNode) -> Result<Value, EvalError> {
        match &node.node_type {
            ASTNodeType::Number(n) => Ok(Value::Number(*n)),
            ASTNodeType::Text(s) => Ok(Value::Text(s.clone())),
            ASTNodeType::Boolean(b) => Ok(Value::Boolean(*b)),
            ASTNodeType::Variable(name) => Ok(self.eval_variable(name)),
            ASTNodeType::UnaryOp { op, expr } => self.eval_unary(*op, expr),
            ASTNodeType::BinaryOp { op, left, right } => self.eval_binary(*op, left, right),
            ASTNodeType::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if truthy(&self.evaluate_ast(condition)?) {
                    self.evaluate_ast(then)
                } else {
                    self.evaluate_ast(otherwise)
                }
            }
            ASTNodeType::Function { name, args } => builtins::call(self, name, args),
        }
    }

    fn eval_variable(&self, name: &str) -> Value {
        // A family pattern only means something inside an aggregate.
        if is_wildcard(name) {
            return match self.row {
                Some(i) => self.resolve_row(&expand_wildcard(name, i)),
                None => Value::Empty,
            };
        }
        self.variables.get(name).cloned().unwrap_or_default()
    }

    fn eval_unary(&self, op: UnaryOp, expr: &ASTNode) -> Result<Value, EvalError> {
        let v = self.evaluate_ast(expr)?;
        Ok(match op {
            UnaryOp::Neg => Value::Number(-value_to_number(&v)),
            UnaryOp::Plus => Value::Number(value_to_number(&v)),
            UnaryOp::Not => Value::Boolean(!truthy(&v)),
        })
    }

    fn eval_binary(&self, op: BinaryOp, left: &ASTNode, right: &ASTNode) -> Result<Value, EvalError> {
        match op {
            BinaryOp::And => {
                let l = self.evaluate_ast(left)?;
                if !truthy(&l) {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(truthy(&self.evaluate_ast(right)?)))
            }
            BinaryOp::Or => {
                let l = self.evaluate_ast(left)?;
                if truthy(&l) {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(truthy(&self.evaluate_ast(right)?)))
            }
            _ => {
                let l = self.evaluate_ast(left)?;
                let r = self.evaluate_ast(right)?;
                apply_binary(op, &l, &r)
            }
        }
    }
}

fn is_free_text(v: &Value) -> bool {
    matches!(v, Value::Text(s) if !s.trim().is_empty() && !looks_numeric(s))
}

pub(crate) fn apply_binary(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    // `+` joins text when either side is not a number.
    if op == BinaryOp::Add && (is_free_text(l) || is_free_text(r)) {
        return Ok(Value::Text(format!("{l}{r}")));
    }

    let a = value_to_number(l);
    let b = value_to_number(r);
    let result = match op {
        BinaryOp::Add => Value::Number(a + b),
        BinaryOp::Sub => Value::Number(a - b),
        BinaryOp::Mul => Value::Number(a * b),
        BinaryOp::Div | BinaryOp::Mod if b == 0.0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Div => Value::Number(a / b),
        BinaryOp::Mod => Value::Number(a % b),
        BinaryOp::Pow => Value::Number(a.powf(b)),
        BinaryOp::Eq => Value::Boolean(compare_values(l, r) == Ordering::Equal),
        BinaryOp::Ne => Value::Boolean(compare_values(l, r) != Ordering::Equal),
        BinaryOp::Lt => Value::Boolean(compare_values(l, r) == Ordering::Less),
        BinaryOp::Le => Value::Boolean(compare_values(l, r) != Ordering::Greater),
        BinaryOp::Gt => Value::Boolean(compare_values(l, r) == Ordering::Greater),
        BinaryOp::Ge => Value::Boolean(compare_values(l, r) != Ordering::Less),
        BinaryOp::And => Value::Boolean(truthy(l) && truthy(r)),
        BinaryOp::Or => Value::Boolean(truthy(l) || truthy(r)),
    };
    Ok(result)
}
