//! Filter operators
//!
//! Built-in comparison operators, their symbolic aliases, and a registry
//! that also resolves user-registered predicates.

use crate::error::{Error, Result};
use crate::types::JsonValue;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// User-supplied predicate: `(field_value, condition_value) -> keep`
pub type Predicate = Arc<dyn Fn(&JsonValue, &JsonValue) -> bool + Send + Sync>;

/// Built-in operator names and aliases
static OPERATOR_NAMES: LazyLock<HashMap<&'static str, Operator>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    m.insert("eq", Operator::Eq);
    m.insert("==", Operator::Eq);
    m.insert("=", Operator::Eq);

    m.insert("ne", Operator::Ne);
    m.insert("!=", Operator::Ne);
    m.insert("<>", Operator::Ne);

    m.insert("gt", Operator::Gt);
    m.insert(">", Operator::Gt);
    m.insert("gte", Operator::Gte);
    m.insert(">=", Operator::Gte);
    m.insert("≥", Operator::Gte);

    m.insert("lt", Operator::Lt);
    m.insert("<", Operator::Lt);
    m.insert("lte", Operator::Lte);
    m.insert("<=", Operator::Lte);
    m.insert("≤", Operator::Lte);

    m.insert("in", Operator::In);
    m.insert("contains", Operator::Contains);

    m
});

// ============================================================================
// Operator
// ============================================================================

/// Built-in comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Field value is an element/substring/key of the condition value
    In,
    /// Condition value is an element/substring/key of the field value
    Contains,
}

impl Operator {
    /// Look up an operator by name or alias (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        OPERATOR_NAMES
            .get(name.trim().to_lowercase().as_str())
            .copied()
    }

    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::Contains => "contains",
        }
    }

    /// Evaluate `field <op> condition`.
    ///
    /// Ordering operators are false when the two values have no common
    /// ordering (e.g. a string against a number).
    pub fn apply(&self, field: &JsonValue, condition: &JsonValue) -> bool {
        match self {
            Self::Eq => values_equal(field, condition),
            Self::Ne => !values_equal(field, condition),
            Self::Gt => compare_values(field, condition) == Some(Ordering::Greater),
            Self::Gte => matches!(
                compare_values(field, condition),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::Lt => compare_values(field, condition) == Some(Ordering::Less),
            Self::Lte => matches!(
                compare_values(field, condition),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Self::In => is_member(field, condition),
            Self::Contains => is_member(condition, field),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Equality with numeric normalization (`1 == 1.0`)
pub fn values_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x == y || x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Ordering between two values of the same kind, if any
pub fn compare_values(a: &JsonValue, b: &JsonValue) -> Option<Ordering> {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (JsonValue::String(x), JsonValue::String(y)) => Some(x.cmp(y)),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn is_member(needle: &JsonValue, haystack: &JsonValue) -> bool {
    match (haystack, needle) {
        (JsonValue::Array(items), _) => items.iter().any(|item| values_equal(item, needle)),
        (JsonValue::String(text), JsonValue::String(part)) => text.contains(part.as_str()),
        (JsonValue::Object(map), JsonValue::String(key)) => map.contains_key(key),
        _ => false,
    }
}

// ============================================================================
// Registry
// ============================================================================

/// A resolved filter operation
#[derive(Clone)]
pub enum FilterOp {
    Builtin(Operator),
    Custom(Predicate),
}

impl FilterOp {
    /// Evaluate the operation
    pub fn apply(&self, field: &JsonValue, condition: &JsonValue) -> bool {
        match self {
            Self::Builtin(op) => op.apply(field, condition),
            Self::Custom(predicate) => predicate(field, condition),
        }
    }
}

impl fmt::Debug for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(op) => f.debug_tuple("Builtin").field(op).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Resolves operator names to built-in or registered predicates
#[derive(Clone, Default)]
pub struct OperatorRegistry {
    custom: HashMap<String, Predicate>,
}

impl OperatorRegistry {
    /// Registry with only the built-in operators
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named predicate; it shadows a built-in of the same name
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&JsonValue, &JsonValue) -> bool + Send + Sync + 'static,
    {
        self.custom
            .insert(name.into().trim().to_lowercase(), Arc::new(predicate));
    }

    /// Builder form of [`OperatorRegistry::register`]
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&JsonValue, &JsonValue) -> bool + Send + Sync + 'static,
    {
        self.register(name, predicate);
        self
    }

    /// Resolve a name; unknown names are an error
    pub fn resolve(&self, name: &str) -> Result<FilterOp> {
        let key = name.trim().to_lowercase();
        if let Some(predicate) = self.custom.get(&key) {
            return Ok(FilterOp::Custom(Arc::clone(predicate)));
        }
        Operator::parse(&key)
            .map(FilterOp::Builtin)
            .ok_or_else(|| Error::unknown_operator(name))
    }

    /// Whether `name` resolves
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.custom.keys().collect();
        names.sort();
        f.debug_struct("OperatorRegistry")
            .field("custom", &names)
            .finish()
    }
}
