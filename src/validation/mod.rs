//! Validation module
//!
//! Declarative per-field rules checked against a record or record list.

mod types;
mod validator;

pub use types::{FieldRules, FieldType, FieldValidation, Phase, RuleSet, Severity, Validation};
pub use validator::{validate, validate_field};
