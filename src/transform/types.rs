//! Transform operation types
//!
//! Typed forms of the `filter`/`map`/`select`/`sort`/`aggregate` mapping.
//! Parsing is lenient: shapes that cannot be understood become specs with
//! missing parts, which the pipeline skips.

use super::aggregates::Reducer;
use super::operators::Predicate;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Operation keys in execution order
pub const STEP_ORDER: [&str; 5] = ["filter", "map", "select", "sort", "aggregate"];

// ============================================================================
// Filter
// ============================================================================

/// Operator named in config or supplied as a closure
#[derive(Clone)]
pub enum OpRef {
    Named(String),
    Custom(Predicate),
}

impl fmt::Debug for OpRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// One `{field, op, value}` condition
#[derive(Debug, Clone, Default)]
pub struct FilterCondition {
    pub field: Option<String>,
    pub op: Option<OpRef>,
    /// A JSON null counts as missing
    pub value: Option<JsonValue>,
}

impl FilterCondition {
    /// Condition using a named operator
    pub fn new(field: impl Into<String>, op: impl Into<String>, value: JsonValue) -> Self {
        Self {
            field: Some(field.into()),
            op: Some(OpRef::Named(op.into())),
            value: Some(value),
        }
    }

    /// Condition using a closure `(field_value, condition_value) -> keep`
    pub fn custom<F>(field: impl Into<String>, value: JsonValue, predicate: F) -> Self
    where
        F: Fn(&JsonValue, &JsonValue) -> bool + Send + Sync + 'static,
    {
        Self {
            field: Some(field.into()),
            op: Some(OpRef::Custom(Arc::new(predicate))),
            value: Some(value),
        }
    }

    /// Parse a config object; non-objects yield an empty condition
    pub fn from_value(value: &JsonValue) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        Self {
            field: non_empty_str(obj, "field"),
            op: non_empty_str(obj, "op").map(OpRef::Named),
            value: obj.get("value").filter(|v| !v.is_null()).cloned(),
        }
    }
}

// ============================================================================
// Map / Select / Sort
// ============================================================================

/// Ordered `old_key -> new_key` renames
pub type FieldMapping = Vec<(String, String)>;

/// Sort by one field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub field: Option<String>,
    pub reverse: bool,
}

impl SortSpec {
    /// Ascending sort on `field`
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            reverse: false,
        }
    }

    /// Descending sort on `field`
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            reverse: true,
        }
    }

    /// Parse a bare field name or `{field, reverse}`
    pub fn from_value(value: &JsonValue) -> Self {
        match value {
            JsonValue::String(field) if !field.is_empty() => Self::ascending(field.clone()),
            JsonValue::Object(obj) => Self {
                field: non_empty_str(obj, "field"),
                reverse: obj.get("reverse").is_some_and(truthy),
            },
            _ => Self::default(),
        }
    }
}

// ============================================================================
// Aggregate
// ============================================================================

/// Reducer named in config or supplied as a closure
#[derive(Clone)]
pub enum FuncRef {
    Named(String),
    Custom { label: String, reducer: Reducer },
}

impl fmt::Debug for FuncRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Custom { label, .. } => f.debug_struct("Custom").field("label", label).finish(),
        }
    }
}

/// One `{field, func, alias?}` aggregate
#[derive(Debug, Clone, Default)]
pub struct AggregateSpec {
    pub field: Option<String>,
    pub func: Option<FuncRef>,
    pub alias: Option<String>,
}

impl AggregateSpec {
    /// Aggregate using a named function
    pub fn new(field: impl Into<String>, func: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            func: Some(FuncRef::Named(func.into())),
            alias: None,
        }
    }

    /// Aggregate using a closure; `label` names it in the default result key
    pub fn custom<F>(field: impl Into<String>, label: impl Into<String>, reducer: F) -> Self
    where
        F: Fn(&[f64], usize) -> JsonValue + Send + Sync + 'static,
    {
        Self {
            field: Some(field.into()),
            func: Some(FuncRef::Custom {
                label: label.into(),
                reducer: Arc::new(reducer),
            }),
            alias: None,
        }
    }

    /// Set the result key
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Parse a config object; non-objects yield an empty spec
    pub fn from_value(value: &JsonValue) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        Self {
            field: non_empty_str(obj, "field"),
            func: non_empty_str(obj, "func").map(FuncRef::Named),
            alias: obj.get("alias").and_then(|v| match v {
                JsonValue::Null => None,
                JsonValue::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            }),
        }
    }
}

// ============================================================================
// Transform Operations
// ============================================================================

/// The full set of operations for one transform run.
///
/// Steps always run in the order filter, map, select, sort, aggregate. Each
/// step may hold several configs, applied one after another.
#[derive(Debug, Clone, Default)]
pub struct TransformOperations {
    pub filter: Vec<FilterCondition>,
    pub map: Vec<FieldMapping>,
    pub select: Vec<Vec<String>>,
    pub sort: Vec<SortSpec>,
    pub aggregate: Vec<AggregateSpec>,
}

impl TransformOperations {
    /// Create an empty operation set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the operations mapping
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::invalid_data("transform operations must be a mapping"))?;

        for key in obj.keys() {
            if !STEP_ORDER.contains(&key.as_str()) {
                debug!("Ignoring unknown transform operation '{}'", key);
            }
        }

        Ok(Self {
            filter: spec_list(obj.get("filter"))
                .iter()
                .map(FilterCondition::from_value)
                .collect(),
            map: spec_list(obj.get("map"))
                .iter()
                .filter_map(|v| v.as_object().map(parse_mapping))
                .collect(),
            select: parse_select(obj.get("select")),
            sort: spec_list(obj.get("sort"))
                .iter()
                .map(SortSpec::from_value)
                .collect(),
            aggregate: spec_list(obj.get("aggregate"))
                .iter()
                .map(AggregateSpec::from_value)
                .collect(),
        })
    }

    /// Add a filter condition
    #[must_use]
    pub fn with_filter(mut self, condition: FilterCondition) -> Self {
        self.filter.push(condition);
        self
    }

    /// Add a rename mapping
    #[must_use]
    pub fn with_map<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.map
            .push(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Add a projection
    #[must_use]
    pub fn with_select<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.select.push(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Add a sort
    #[must_use]
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort.push(sort);
        self
    }

    /// Add an aggregate
    #[must_use]
    pub fn with_aggregate(mut self, aggregate: AggregateSpec) -> Self {
        self.aggregate.push(aggregate);
        self
    }

    /// Whether no step is configured
    pub fn is_empty(&self) -> bool {
        self.filter.is_empty()
            && self.map.is_empty()
            && self.select.is_empty()
            && self.sort.is_empty()
            && self.aggregate.is_empty()
    }
}

/// One config or a list of configs; null means none
fn spec_list(value: Option<&JsonValue>) -> Vec<JsonValue> {
    match value {
        None | Some(JsonValue::Null) => Vec::new(),
        Some(JsonValue::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
    }
}

fn parse_mapping(obj: &JsonObject) -> FieldMapping {
    obj.iter()
        .filter_map(|(old, new)| match new {
            JsonValue::String(new) => Some((old.clone(), new.clone())),
            other => {
                debug!("Skipping rename of '{}' to non-string {}", old, other);
                None
            }
        })
        .collect()
}

/// `["a", "b"]`, `{fields: [...]}` or `[{fields: [...]}, ...]`
fn parse_select(value: Option<&JsonValue>) -> Vec<Vec<String>> {
    match value {
        None | Some(JsonValue::Null) => Vec::new(),
        Some(JsonValue::Array(items)) if !items.iter().any(JsonValue::is_object) => {
            vec![field_names(items)]
        }
        Some(JsonValue::Array(items)) => items.iter().filter_map(fields_config).collect(),
        Some(other) => fields_config(other).into_iter().collect(),
    }
}

fn fields_config(value: &JsonValue) -> Option<Vec<String>> {
    match value.get("fields")? {
        JsonValue::Array(items) if !items.iter().any(JsonValue::is_object) => {
            Some(field_names(items))
        }
        _ => None,
    }
}

fn field_names(items: &[JsonValue]) -> Vec<String> {
    items
        .iter()
        .map(|v| match v {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}

fn non_empty_str(obj: &JsonObject, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(a) => !a.is_empty(),
        JsonValue::Object(o) => !o.is_empty(),
        JsonValue::Null => false,
    }
}
