pub mod deps;
pub mod parser;
#[cfg(test)]
mod tests;
pub mod tokenizer;

pub use deps::{collect_variables, extract_dependencies};
pub use parser::{ASTNode, ASTNodeType, BinaryOp, ParseError, Parser, UnaryOp, parse};
pub use tokenizer::{Token, TokenType, Tokenizer, TokenizerError};

// Re-export common types
pub use formcalc_common::{Builtin, EvalError, Value};
