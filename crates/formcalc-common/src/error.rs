//! Errors raised while compiling or evaluating a single expression.
//!
//! None of these are fatal to the engine: the orchestrator catches them per
//! output node, logs them and displays an empty value for that node only.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("tokenizer error at byte {position}: {message}")]
    Tokenize { message: String, position: usize },

    #[error("parse error at byte {position}: {message}")]
    Parse { message: String, position: usize },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{name} expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NonFinite,
}

impl EvalError {
    /// True for errors that come from the expression text itself rather than
    /// from the values it was evaluated against.
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            EvalError::Tokenize { .. } | EvalError::Parse { .. } | EvalError::UnknownFunction(_)
        )
    }
}
