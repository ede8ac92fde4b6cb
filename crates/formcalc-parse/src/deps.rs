//! Free-variable extraction.
//!
//! The engine needs the variable set of every output expression twice: to
//! bind values before evaluation, and to build the dependency graph. Both go
//! through [`extract_dependencies`], which works on tokens rather than a full
//! parse so that a half-typed expression (`harga * (qty`) still reports the
//! fields it mentions.

use crate::parser::{ASTNode, ASTNodeType};
use crate::tokenizer::{TokenType, Tokenizer};
use formcalc_common::is_library_function;
use std::collections::BTreeSet;

fn is_keyword(ident: &str) -> bool {
    ident.eq_ignore_ascii_case("true") || ident.eq_ignore_ascii_case("false")
}

/// Deduplicated, sorted set of variable names referenced by `expression`.
///
/// Numeric and text literals, `true`/`false`, library function names and any
/// identifier used in call position are excluded. Row-indexed names and
/// wildcard patterns are returned as written.
pub fn extract_dependencies(expression: &str) -> BTreeSet<String> {
    match Tokenizer::new(expression) {
        Ok(tokenizer) => {
            let tokens = &tokenizer.items;
            let mut out = BTreeSet::new();
            for (i, token) in tokens.iter().enumerate() {
                if token.token_type != TokenType::Identifier {
                    continue;
                }
                let is_call = tokens
                    .get(i + 1)
                    .is_some_and(|t| t.token_type == TokenType::OpenParen);
                if is_call || is_keyword(&token.value) || is_library_function(&token.value) {
                    continue;
                }
                out.insert(token.value.clone());
            }
            out
        }
        Err(_) => scan_identifiers(expression),
    }
}

/// Fallback for text the tokenizer rejects (typically an unterminated
/// string): a plain identifier scan that skips quoted regions.
fn scan_identifiers(expression: &str) -> BTreeSet<String> {
    let bytes = expression.as_bytes();
    let mut out = BTreeSet::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'"' || b == b'\'' {
            i += 1;
            while i < bytes.len() && bytes[i] != b {
                i += 1;
            }
            i += 1;
            continue;
        }
        if b.is_ascii_digit() {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.') {
                i += 1;
            }
            continue;
        }
        if b == b'_' || b == b'$' || b.is_ascii_alphabetic() {
            let start = i;
            while i < bytes.len()
                && (bytes[i] == b'_'
                    || bytes[i] == b'$'
                    || bytes[i].is_ascii_alphanumeric()
                    || (bytes[i] == b'?' && bytes[i - 1] == b'_'))
            {
                i += 1;
            }
            let ident = &expression[start..i];
            let mut j = i;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            let is_call = bytes.get(j) == Some(&b'(');
            if !is_call && !is_keyword(ident) && !is_library_function(ident) {
                out.insert(ident.to_string());
            }
            continue;
        }
        i += 1;
    }
    out
}

/// Variables referenced by an already parsed expression.
pub fn collect_variables(node: &ASTNode) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    walk(node, &mut out);
    out
}

fn walk(node: &ASTNode, out: &mut BTreeSet<String>) {
    match &node.node_type {
        ASTNodeType::Number(_) | ASTNodeType::Text(_) | ASTNodeType::Boolean(_) => {}
        ASTNodeType::Variable(name) => {
            out.insert(name.clone());
        }
        ASTNodeType::UnaryOp { expr, .. } => walk(expr, out),
        ASTNodeType::BinaryOp { left, right, .. } => {
            walk(left, out);
            walk(right, out);
        }
        ASTNodeType::Conditional {
            condition,
            then,
            otherwise,
        } => {
            walk(condition, out);
            walk(then, out);
            walk(otherwise, out);
        }
        ASTNodeType::Function { args, .. } => {
            for arg in args {
                walk(arg, out);
            }
        }
    }
}
