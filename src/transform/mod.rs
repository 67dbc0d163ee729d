//! Transform module
//!
//! Reshapes record sets through a fixed-order pipeline:
//! filter → map → select → sort → aggregate.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use solidafy_etl::transform::{transform, TransformOperations};
//!
//! let ops = TransformOperations::from_value(&json!({
//!     "filter": {"field": "age", "op": "gte", "value": 18},
//!     "sort": {"field": "age", "reverse": true},
//! }))
//! .unwrap();
//!
//! let data = json!([{"age": 12}, {"age": 30}, {"age": 18}]);
//! let out = transform(data, &ops).unwrap();
//! assert_eq!(out, json!([{"age": 30}, {"age": 18}]));
//! ```

mod aggregates;
mod operators;
mod pipeline;
mod types;

pub use aggregates::{Aggregate, AggregateFn, AggregateRegistry, Reducer};
pub use operators::{compare_values, values_equal, FilterOp, Operator, OperatorRegistry, Predicate};
pub use pipeline::{
    apply_aggregate, apply_filter, apply_map, apply_select, apply_sort, transform,
    TransformOutput, Transformer,
};
pub use types::{
    AggregateSpec, FieldMapping, FilterCondition, FuncRef, OpRef, SortSpec, TransformOperations,
    STEP_ORDER,
};
