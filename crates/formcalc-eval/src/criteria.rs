//! `sumif` criteria.

use crate::coercion::{classify_input, compare_values};
use formcalc_common::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

// Longest prefixes first so `>=` is not read as `>` followed by `=5`.
const PREFIXES: &[(&str, CriterionOp)] = &[
    (">=", CriterionOp::Ge),
    ("<=", CriterionOp::Le),
    ("<>", CriterionOp::Ne),
    ("!=", CriterionOp::Ne),
    ("==", CriterionOp::Eq),
    (">", CriterionOp::Gt),
    ("<", CriterionOp::Lt),
    ("=", CriterionOp::Eq),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub op: CriterionOp,
    pub operand: Value,
}

impl Criterion {
    /// Build a criterion from an evaluated argument. Text may carry a leading
    /// comparison operator (`">100"`, `"<>paid"`); anything else is an
    /// equality test.
    pub fn parse(value: &Value) -> Self {
        let Value::Text(text) = value else {
            return Criterion {
                op: CriterionOp::Eq,
                operand: value.clone(),
            };
        };
        let trimmed = text.trim_start();
        for (prefix, op) in PREFIXES {
            if let Some(rest) = trimmed.strip_prefix(prefix) {
                return Criterion {
                    op: *op,
                    operand: classify_input(rest.trim()),
                };
            }
        }
        Criterion {
            op: CriterionOp::Eq,
            operand: value.clone(),
        }
    }

    pub fn matches(&self, candidate: &Value) -> bool {
        let ord = compare_values(candidate, &self.operand);
        match self.op {
            CriterionOp::Eq => ord == Ordering::Equal,
            CriterionOp::Ne => ord != Ordering::Equal,
            CriterionOp::Lt => ord == Ordering::Less,
            CriterionOp::Le => ord != Ordering::Greater,
            CriterionOp::Gt => ord == Ordering::Greater,
            CriterionOp::Ge => ord != Ordering::Less,
        }
    }
}
