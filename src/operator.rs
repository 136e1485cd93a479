//! Comparison operators, looked up by symbol.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, TxtFilterError};
use crate::value::Value;

/// Binary predicate behind an operator symbol.
pub type Predicate = dyn Fn(&Value, &Value) -> bool + Send + Sync;

/// A registered operator: a predicate plus its operand order.
///
/// With `reversed == false` the predicate is called as
/// `predicate(field, value)`; with `reversed == true` as
/// `predicate(value, field)`, which is what membership needs since the
/// comparison value is the container.
#[derive(Clone)]
pub struct Operator {
    predicate: Arc<Predicate>,
    reversed: bool,
}

impl Operator {
    pub fn new<F>(predicate: F, reversed: bool) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            reversed,
        }
    }

    /// Apply the operator to a coerced field and a comparison value.
    pub fn apply(&self, field: &Value, value: &Value) -> bool {
        if self.reversed {
            (self.predicate)(value, field)
        } else {
            (self.predicate)(field, value)
        }
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("reversed", &self.reversed)
            .finish_non_exhaustive()
    }
}

/// Symbol table of operators owned by one engine.
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    operators: HashMap<String, Operator>,
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl OperatorRegistry {
    /// A registry with no operators at all.
    pub fn empty() -> Self {
        Self {
            operators: HashMap::new(),
        }
    }

    /// A registry holding `<`, `<=`, `==`, `!=`, `>=`, `>` and `in`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("<", |a, b| a < b, false);
        registry.register("<=", |a, b| a <= b, false);
        registry.register("==", |a, b| a == b, false);
        registry.register("!=", |a, b| a != b, false);
        registry.register(">=", |a, b| a >= b, false);
        registry.register(">", |a, b| a > b, false);
        registry.register("in", |container, item| container.contains(item), true);
        registry
    }

    /// Insert or overwrite the operator for `symbol`.
    pub fn register<F>(&mut self, symbol: impl Into<String>, predicate: F, reversed: bool)
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.operators
            .insert(symbol.into(), Operator::new(predicate, reversed));
    }

    pub fn get(&self, symbol: &str) -> Option<&Operator> {
        self.operators.get(symbol)
    }

    /// Like [`get`](Self::get) but an unknown symbol is an error.
    pub fn lookup(&self, symbol: &str) -> Result<&Operator> {
        self.get(symbol)
            .ok_or_else(|| TxtFilterError::UndefinedOperator(symbol.to_string()))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.operators.contains_key(symbol)
    }

    /// Registered symbols in sorted order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.operators.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_symbols() {
        let registry = OperatorRegistry::with_builtins();
        assert_eq!(
            registry.symbols(),
            vec!["!=", "<", "<=", "==", ">", ">=", "in"]
        );
    }

    #[test]
    fn test_ordering_operand_order() {
        let registry = OperatorRegistry::default();
        let lt = registry.lookup("<").unwrap();
        // field < value
        assert!(lt.apply(&Value::Integer(1), &Value::Integer(2)));
        assert!(!lt.apply(&Value::Integer(2), &Value::Integer(1)));
    }

    #[test]
    fn test_in_is_reversed() {
        let registry = OperatorRegistry::default();
        let op = registry.lookup("in").unwrap();
        assert!(op.is_reversed());
        let codes = Value::from(vec!["a", "b"]);
        assert!(op.apply(&Value::from("a"), &codes));
        assert!(!op.apply(&Value::from("c"), &codes));
    }

    #[test]
    fn test_register_overwrites() {
        let mut registry = OperatorRegistry::default();
        registry.register("==", |_, _| false, false);
        let eq = registry.lookup("==").unwrap();
        assert!(!eq.apply(&Value::from("x"), &Value::from("x")));
    }

    #[test]
    fn test_custom_not_in() {
        let mut registry = OperatorRegistry::default();
        registry.register("!in", |container, item| !container.contains(item), true);
        let op = registry.lookup("!in").unwrap();
        let codes = Value::from(vec!["a", "b"]);
        assert!(!op.apply(&Value::from("a"), &codes));
        assert!(op.apply(&Value::from("c"), &codes));
    }

    #[test]
    fn test_lookup_undefined() {
        let registry = OperatorRegistry::empty();
        let err = registry.lookup("<").unwrap_err();
        assert!(matches!(err, TxtFilterError::UndefinedOperator(ref s) if s == "<"));
    }
}
