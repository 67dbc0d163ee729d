//! Record transform pipeline
//!
//! Applies filter, map, select, sort and aggregate steps to a record set.
//! Inputs are never mutated; every step produces new records.

use super::aggregates::{AggregateFn, AggregateRegistry};
use super::operators::{FilterOp, OperatorRegistry};
use super::types::{
    AggregateSpec, FieldMapping, FilterCondition, FuncRef, OpRef, SortSpec, TransformOperations,
};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, Record, Records};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Result of running the pipeline over a record set
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutput {
    /// The (possibly reshaped) records
    Records(Records),
    /// Merged aggregate results; produced whenever an aggregate ran
    Aggregate(JsonObject),
}

/// Runs transform operations with a given set of operator/aggregate registries
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    operators: OperatorRegistry,
    aggregates: AggregateRegistry,
}

impl Transformer {
    /// Transformer with only built-in operators and aggregates
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the operator registry
    #[must_use]
    pub fn with_operators(mut self, operators: OperatorRegistry) -> Self {
        self.operators = operators;
        self
    }

    /// Replace the aggregate registry
    #[must_use]
    pub fn with_aggregates(mut self, aggregates: AggregateRegistry) -> Self {
        self.aggregates = aggregates;
        self
    }

    /// Mutable access to the operator registry
    pub fn operators_mut(&mut self) -> &mut OperatorRegistry {
        &mut self.operators
    }

    /// Mutable access to the aggregate registry
    pub fn aggregates_mut(&mut self) -> &mut AggregateRegistry {
        &mut self.aggregates
    }

    /// Keep records that hold `field` and satisfy the predicate.
    ///
    /// A condition missing its field, operator or value leaves the records
    /// unchanged. An operator name that resolves to nothing is an error.
    pub fn apply_filter(&self, records: &[Record], condition: &FilterCondition) -> Result<Records> {
        let (Some(field), Some(op), Some(value)) =
            (&condition.field, &condition.op, &condition.value)
        else {
            warn!("Skipping filter without field, op and value");
            return Ok(records.to_vec());
        };

        let op = match op {
            OpRef::Named(name) => self.operators.resolve(name)?,
            OpRef::Custom(predicate) => FilterOp::Custom(predicate.clone()),
        };

        Ok(records
            .iter()
            .filter(|record| record.get(field).is_some_and(|v| op.apply(v, value)))
            .cloned()
            .collect())
    }

    /// Aggregate one field into a single-entry mapping.
    ///
    /// The key is `alias`, or `"{func}_{field}"`. A spec missing its field
    /// or function yields an empty mapping.
    pub fn apply_aggregate(&self, records: &[Record], spec: &AggregateSpec) -> Result<JsonObject> {
        let (Some(field), Some(func)) = (&spec.field, &spec.func) else {
            warn!("Skipping aggregate without field and func");
            return Ok(JsonObject::new());
        };

        let (label, reducer) = match func {
            FuncRef::Named(name) => (self.aggregates.canonical(name), self.aggregates.resolve(name)?),
            FuncRef::Custom { label, reducer } => {
                (label.clone(), AggregateFn::Custom(reducer.clone()))
            }
        };

        let mut values = Vec::new();
        let mut present = 0usize;
        for record in records {
            if let Some(value) = record.get(field) {
                present += 1;
                if let Some(n) = value.as_f64() {
                    values.push(n);
                }
            }
        }

        let key = spec
            .alias
            .clone()
            .unwrap_or_else(|| format!("{label}_{field}"));

        let mut result = JsonObject::new();
        result.insert(key, reducer.apply(&values, present));
        Ok(result)
    }

    /// Run every configured step in order over `records`.
    ///
    /// An aggregate step ends the run with the merged results, unless all
    /// of its specs were skipped.
    pub fn run(&self, records: Records, ops: &TransformOperations) -> Result<TransformOutput> {
        let mut records = records;

        for condition in &ops.filter {
            records = self.apply_filter(&records, condition)?;
        }
        for mapping in &ops.map {
            records = apply_map(&records, mapping);
        }
        for fields in &ops.select {
            records = apply_select(&records, fields);
        }
        for sort in &ops.sort {
            records = apply_sort(&records, sort);
        }

        if !ops.aggregate.is_empty() {
            let mut combined = JsonObject::new();
            for spec in &ops.aggregate {
                combined.extend(self.apply_aggregate(&records, spec)?);
            }
            if !combined.is_empty() {
                return Ok(TransformOutput::Aggregate(combined));
            }
        }

        debug!("Transform produced {} records", records.len());
        Ok(TransformOutput::Records(records))
    }

    /// Transform a JSON object or array of objects.
    ///
    /// A single object is processed as a one-record list and unwrapped
    /// again when exactly one record remains.
    pub fn transform(&self, data: JsonValue, ops: &TransformOperations) -> Result<JsonValue> {
        if ops.is_empty() {
            return Ok(data);
        }

        let (records, single) = match data {
            JsonValue::Object(record) => (vec![record], true),
            JsonValue::Array(items) => (records_from_items(items)?, false),
            _ => {
                return Err(Error::invalid_data(
                    "transform input must be an object or an array of objects",
                ))
            }
        };

        Ok(match self.run(records, ops)? {
            TransformOutput::Aggregate(result) => JsonValue::Object(result),
            TransformOutput::Records(mut records) if single && records.len() == 1 => {
                JsonValue::Object(records.remove(0))
            }
            TransformOutput::Records(records) => {
                JsonValue::Array(records.into_iter().map(JsonValue::Object).collect())
            }
        })
    }
}

fn records_from_items(items: Vec<JsonValue>) -> Result<Records> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            JsonValue::Object(record) => Ok(record),
            _ => Err(Error::invalid_data(format!(
                "transform input item {i} is not an object"
            ))),
        })
        .collect()
}

// ============================================================================
// Registry-free steps
// ============================================================================

/// Rename fields.
///
/// Renamed keys come first in mapping order, followed by the fields the
/// mapping does not mention. Sources missing from a record are omitted.
pub fn apply_map(records: &[Record], mapping: &FieldMapping) -> Records {
    let sources: HashSet<&str> = mapping.iter().map(|(old, _)| old.as_str()).collect();

    records
        .iter()
        .map(|record| {
            let mut renamed = Record::new();
            for (old, new) in mapping {
                if let Some(value) = record.get(old) {
                    renamed.insert(new.clone(), value.clone());
                }
            }
            for (key, value) in record {
                if !sources.contains(key.as_str()) {
                    renamed.insert(key.clone(), value.clone());
                }
            }
            renamed
        })
        .collect()
}

/// Keep exactly `fields`, in that order; missing fields become null
pub fn apply_select(records: &[Record], fields: &[String]) -> Records {
    records
        .iter()
        .map(|record| {
            fields
                .iter()
                .map(|f| (f.clone(), record.get(f).cloned().unwrap_or(JsonValue::Null)))
                .collect()
        })
        .collect()
}

/// Stable sort on one field.
///
/// Numbers order numerically and before everything else; other values
/// order by their string form. Null and missing values always sort last.
pub fn apply_sort(records: &[Record], sort: &SortSpec) -> Records {
    let mut sorted = records.to_vec();
    let Some(field) = &sort.field else {
        warn!("Skipping sort without field");
        return sorted;
    };

    sorted.sort_by(|a, b| {
        let (ka, kb) = (SortKey::of(a.get(field)), SortKey::of(b.get(field)));
        match ka.rank().cmp(&kb.rank()) {
            Ordering::Equal if sort.reverse => ka.cmp_within(&kb).reverse(),
            Ordering::Equal => ka.cmp_within(&kb),
            other => other,
        }
    });
    sorted
}

enum SortKey {
    Number(f64),
    Text(String),
    Missing,
}

impl SortKey {
    fn of(value: Option<&JsonValue>) -> Self {
        match value {
            None | Some(JsonValue::Null) => Self::Missing,
            Some(JsonValue::Number(n)) => n.as_f64().map_or(Self::Missing, Self::Number),
            Some(JsonValue::String(s)) => Self::Text(s.clone()),
            Some(other) => Self::Text(other.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Text(_) => 1,
            Self::Missing => 2,
        }
    }

    fn cmp_within(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

// ============================================================================
// Default-registry entry points
// ============================================================================

/// [`Transformer::apply_filter`] with the built-in operators
pub fn apply_filter(records: &[Record], condition: &FilterCondition) -> Result<Records> {
    Transformer::default().apply_filter(records, condition)
}

/// [`Transformer::apply_aggregate`] with the built-in aggregates
pub fn apply_aggregate(records: &[Record], spec: &AggregateSpec) -> Result<JsonObject> {
    Transformer::default().apply_aggregate(records, spec)
}

/// [`Transformer::transform`] with the built-in registries
pub fn transform(data: JsonValue, ops: &TransformOperations) -> Result<JsonValue> {
    Transformer::default().transform(data, ops)
}
