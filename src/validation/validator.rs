//! Rule evaluation

use super::types::{FieldRules, FieldType, FieldValidation, RuleSet, Validation};
use crate::transform::values_equal;
use crate::types::JsonValue;
use std::collections::BTreeMap;

/// Check one value against its rules.
///
/// Null counts as missing: it fails `required` and otherwise passes
/// without further checks. Numeric bounds apply to numbers only and
/// length/pattern rules to strings only.
pub fn validate_field(value: &JsonValue, rules: &FieldRules) -> FieldValidation {
    if value.is_null() {
        return if rules.required {
            FieldValidation {
                valid: false,
                errors: vec!["Field is required".to_string()],
            }
        } else {
            FieldValidation {
                valid: true,
                errors: Vec::new(),
            }
        };
    }

    let mut errors = Vec::new();

    if let Some(expected) = rules.field_type {
        if !expected.matches(value) {
            errors.push(format!(
                "Expected type {expected}, got {}",
                FieldType::describe(value)
            ));
        }
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = rules.min.filter(|min| n < *min) {
            errors.push(format!("Value {value} is less than minimum {min:?}"));
        }
        if let Some(max) = rules.max.filter(|max| n > *max) {
            errors.push(format!("Value {value} is greater than maximum {max:?}"));
        }
    }

    if let JsonValue::String(s) = value {
        let len = s.chars().count();
        if let Some(min) = rules.min_length.filter(|min| len < *min) {
            errors.push(format!("Length {len} is less than minimum {min}"));
        }
        if let Some(max) = rules.max_length.filter(|max| len > *max) {
            errors.push(format!("Length {len} is greater than maximum {max}"));
        }
        if let Some(pattern) = rules.pattern.as_ref().filter(|p| !p.is_match(s)) {
            errors.push(format!("Value does not match pattern {}", pattern.as_str()));
        }
    }

    if let Some(allowed) = &rules.allowed {
        if !allowed.iter().any(|a| values_equal(a, value)) {
            errors.push(format!(
                "Value {} not in allowed values {}",
                display_value(value),
                JsonValue::Array(allowed.clone())
            ));
        }
    }

    FieldValidation {
        valid: errors.is_empty(),
        errors,
    }
}

/// Validate a record or a list of records.
///
/// List failures are keyed `[i].field`; list items that are not objects
/// are reported as `[i]`. Other roots are reported under `$`.
pub fn validate(data: &JsonValue, rules: &RuleSet) -> Validation {
    let mut report = Report::default();

    match data {
        _ if rules.is_empty() => {}
        JsonValue::Object(record) => {
            for (field, field_rules) in rules.iter() {
                let value = record.get(field).unwrap_or(&JsonValue::Null);
                report.add(field.to_string(), validate_field(value, field_rules));
            }
        }
        JsonValue::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let Some(record) = item.as_object() else {
                    report.push(
                        format!("[{i}]"),
                        "Item is not an object (expected dict)".to_string(),
                    );
                    continue;
                };
                for (field, field_rules) in rules.iter() {
                    let value = record.get(field).unwrap_or(&JsonValue::Null);
                    report.add(format!("[{i}].{field}"), validate_field(value, field_rules));
                }
            }
        }
        _ => report.push(
            "$".to_string(),
            "Data must be an object or an array of objects".to_string(),
        ),
    }

    Validation {
        valid: report.errors.is_empty(),
        errors: report.errors,
        field_errors: report.field_errors,
        data: data.clone(),
    }
}

#[derive(Default)]
struct Report {
    errors: Vec<String>,
    field_errors: BTreeMap<String, Vec<String>>,
}

impl Report {
    fn add(&mut self, key: String, result: FieldValidation) {
        if result.valid {
            return;
        }
        for error in result.errors {
            self.push(key.clone(), error);
        }
    }

    fn push(&mut self, key: String, message: String) {
        self.errors.push(format!("{key}: {message}"));
        self.field_errors.entry(key).or_default().push(message);
    }
}

fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
