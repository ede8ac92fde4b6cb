//! Compiled expressions keyed by source text.

use formcalc_common::EvalError;
use formcalc_parse::{ASTNode, collect_variables, parse};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A parsed expression plus the free variables the sandbox will expose to it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    pub ast: ASTNode,
    pub variables: BTreeSet<String>,
}

impl CompiledExpression {
    pub fn compile(source: &str) -> Result<Self, EvalError> {
        let ast = parse(source)?;
        let variables = collect_variables(&ast);
        Ok(CompiledExpression { ast, variables })
    }
}

/// Bounded cache of compile results. Failures are cached as well so a broken
/// expression is not re-parsed on every keystroke elsewhere in the form.
pub struct CompileCache {
    cache: FxHashMap<String, Result<Arc<CompiledExpression>, EvalError>>,
    entries_cap: usize,
    hits: u64,
    misses: u64,
}

impl CompileCache {
    pub fn new(entries_cap: usize) -> Self {
        Self {
            cache: FxHashMap::default(),
            entries_cap: entries_cap.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get_or_compile(&mut self, source: &str) -> Result<Arc<CompiledExpression>, EvalError> {
        if let Some(entry) = self.cache.get(source) {
            self.hits += 1;
            return entry.clone();
        }
        self.misses += 1;
        let compiled = CompiledExpression::compile(source).map(Arc::new);
        // At capacity: drop an arbitrary existing entry.
        if self.cache.len() >= self.entries_cap
            && let Some(first_key) = self.cache.keys().next().cloned()
        {
            self.cache.remove(&first_key);
        }
        self.cache.insert(source.to_string(), compiled.clone());
        compiled
    }

    pub fn contains(&self, source: &str) -> bool {
        self.cache.contains_key(source)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// `(hits, misses)` since construction.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
