//! Aggregate functions
//!
//! Reducers see the numeric values of a field (booleans excluded) and the
//! number of records in which the field is present.

use crate::error::{Error, Result};
use crate::types::JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// User-supplied reducer: `(numeric_values, present_count) -> result`
pub type Reducer = Arc<dyn Fn(&[f64], usize) -> JsonValue + Send + Sync>;

/// Built-in aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl Aggregate {
    /// Look up an aggregate by name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "sum" => Some(Self::Sum),
            "avg" => Some(Self::Avg),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "count" => Some(Self::Count),
            _ => None,
        }
    }

    /// Canonical name, used in default result keys
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
            Self::Count => "count",
        }
    }

    /// Reduce `values`; `present` is the number of records holding the field
    pub fn apply(&self, values: &[f64], present: usize) -> JsonValue {
        match self {
            Self::Sum => float_value(values.iter().sum()),
            Self::Avg => {
                if values.is_empty() {
                    float_value(0.0)
                } else {
                    float_value(values.iter().sum::<f64>() / values.len() as f64)
                }
            }
            Self::Min => values
                .iter()
                .copied()
                .reduce(f64::min)
                .map_or(JsonValue::Null, float_value),
            Self::Max => values
                .iter()
                .copied()
                .reduce(f64::max)
                .map_or(JsonValue::Null, float_value),
            Self::Count => JsonValue::from(present),
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn float_value(value: f64) -> JsonValue {
    serde_json::Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number)
}

/// A resolved aggregate
#[derive(Clone)]
pub enum AggregateFn {
    Builtin(Aggregate),
    Custom(Reducer),
}

impl AggregateFn {
    /// Run the reducer
    pub fn apply(&self, values: &[f64], present: usize) -> JsonValue {
        match self {
            Self::Builtin(agg) => agg.apply(values, present),
            Self::Custom(reducer) => reducer(values, present),
        }
    }
}

impl fmt::Debug for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(agg) => f.debug_tuple("Builtin").field(agg).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Resolves aggregate names to built-in or registered reducers
#[derive(Clone, Default)]
pub struct AggregateRegistry {
    custom: HashMap<String, Reducer>,
    aliases: HashMap<String, String>,
}

impl AggregateRegistry {
    /// Registry with only the built-in aggregates
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named reducer; it shadows a built-in of the same name
    pub fn register<F>(&mut self, name: impl Into<String>, reducer: F)
    where
        F: Fn(&[f64], usize) -> JsonValue + Send + Sync + 'static,
    {
        self.custom
            .insert(name.into().trim().to_lowercase(), Arc::new(reducer));
    }

    /// Builder form of [`AggregateRegistry::register`]
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, reducer: F) -> Self
    where
        F: Fn(&[f64], usize) -> JsonValue + Send + Sync + 'static,
    {
        self.register(name, reducer);
        self
    }

    /// Make `alias` resolve to whatever `target` resolves to
    pub fn alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(
            alias.into().trim().to_lowercase(),
            target.into().trim().to_lowercase(),
        );
    }

    /// Canonical name for `name` after alias expansion
    pub fn canonical(&self, name: &str) -> String {
        let key = name.trim().to_lowercase();
        self.aliases.get(&key).cloned().unwrap_or(key)
    }

    /// Resolve a name; unknown names are an error
    pub fn resolve(&self, name: &str) -> Result<AggregateFn> {
        let key = self.canonical(name);
        if let Some(reducer) = self.custom.get(&key) {
            return Ok(AggregateFn::Custom(Arc::clone(reducer)));
        }
        Aggregate::parse(&key)
            .map(AggregateFn::Builtin)
            .ok_or_else(|| Error::unknown_aggregate(name))
    }
}

impl fmt::Debug for AggregateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.custom.keys().collect();
        names.sort();
        f.debug_struct("AggregateRegistry")
            .field("custom", &names)
            .field("aliases", &self.aliases)
            .finish()
    }
}
