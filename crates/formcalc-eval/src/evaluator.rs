use crate::coercion::{round_to, sanitize_numeric};
use crate::compile_cache::{CompileCache, CompiledExpression};
use crate::interpreter::Interpreter;
use crate::rows::RowIndexSet;
use crate::traits::VariableResolver;
use formcalc_common::{EvalError, Value, is_wildcard};
use rustc_hash::FxHashMap;
use std::sync::Arc;

pub const DEFAULT_PRECISION: u32 = 5;
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Sandboxed expression evaluation with a per-instance compile cache.
///
/// Every evaluation builds a fresh variable table from the expression's own
/// free variables, so an expression can read exactly what it names and
/// nothing else.
pub struct Evaluator {
    cache: CompileCache,
    precision: u32,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new(DEFAULT_CACHE_CAPACITY, DEFAULT_PRECISION)
    }
}

impl Evaluator {
    pub fn new(cache_capacity: usize, precision: u32) -> Self {
        Evaluator {
            cache: CompileCache::new(cache_capacity),
            precision,
        }
    }

    pub fn compile(&mut self, expression: &str) -> Result<Arc<CompiledExpression>, EvalError> {
        self.cache.get_or_compile(expression)
    }

    pub fn evaluate(
        &mut self,
        expression: &str,
        resolver: &dyn VariableResolver,
        rows: &RowIndexSet,
    ) -> Result<Value, EvalError> {
        let compiled = self.compile(expression)?;
        let variables: FxHashMap<String, Value> = compiled
            .variables
            .iter()
            .filter(|name| !is_wildcard(name))
            .map(|name| (name.clone(), resolver.resolve(name)))
            .collect();
        let interp = Interpreter::new(&variables, resolver, rows);
        let raw = interp.evaluate_ast(&compiled.ast)?;
        self.finalize(raw)
    }

    fn finalize(&self, raw: Value) -> Result<Value, EvalError> {
        match raw {
            Value::Number(n) => Ok(Value::Number(round_to(sanitize_numeric(n)?, self.precision))),
            Value::Boolean(b) => Ok(Value::Number(if b { 1.0 } else { 0.0 })),
            other => Ok(other),
        }
    }

    pub fn cache(&self) -> &CompileCache {
        &self.cache
    }
}
