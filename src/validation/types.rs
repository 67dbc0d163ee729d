//! Validation types
//!
//! Field rules, rule sets and the results they produce.

use crate::error::{Error, Result};
use crate::types::{try_parse_float, try_parse_int, JsonObject, JsonValue};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Field Type
// ============================================================================

/// JSON value kinds a rule can require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    /// Any number
    Number,
    /// A number without a fractional part in its JSON form
    Integer,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    /// Rule name of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Whether `value` is of this type
    pub fn matches(&self, value: &JsonValue) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }

    /// Describe the kind of `value` using rule type names
    pub fn describe(value: &JsonValue) -> &'static str {
        match value {
            JsonValue::Null => "null",
            JsonValue::Bool(_) => "boolean",
            JsonValue::Number(n) if n.is_f64() => "number",
            JsonValue::Number(_) => "integer",
            JsonValue::String(_) => "string",
            JsonValue::Array(_) => "array",
            JsonValue::Object(_) => "object",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "integer" => Ok(Self::Integer),
            "boolean" => Ok(Self::Boolean),
            "array" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            other => Err(Error::invalid_value(
                "type",
                format!("Unknown field type: {other}"),
            )),
        }
    }
}

// ============================================================================
// Field Rules
// ============================================================================

/// Constraints for one field; unset rules impose nothing
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    pub required: bool,
    pub field_type: Option<FieldType>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub allowed: Option<Vec<JsonValue>>,
}

impl FieldRules {
    /// Create rules with no constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the field as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Require a value type
    #[must_use]
    pub fn of_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    /// Numeric range (inclusive)
    #[must_use]
    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// String length range (inclusive)
    #[must_use]
    pub fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    /// Regex the string must contain a match for
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.pattern = Some(compile_pattern(pattern)?);
        Ok(self)
    }

    /// Allowed values
    #[must_use]
    pub fn one_of(mut self, values: Vec<JsonValue>) -> Self {
        self.allowed = Some(values);
        self
    }

    /// Parse a rule mapping (`required`, `type`, `min`, `max`,
    /// `minLength`, `maxLength`, `pattern`, `enum`)
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::invalid_value("rules", "Field rules must be a mapping"))?;
        Self::from_object(obj)
    }

    fn from_object(obj: &JsonObject) -> Result<Self> {
        let number = |key: &str| -> Result<Option<f64>> {
            match obj.get(key) {
                None | Some(JsonValue::Null) => Ok(None),
                Some(v) => try_parse_float(v)
                    .map(Some)
                    .ok_or_else(|| Error::invalid_value(key, format!("Rule '{key}' must be numeric"))),
            }
        };
        let length = |key: &str| -> Result<Option<usize>> {
            match obj.get(key) {
                None | Some(JsonValue::Null) => Ok(None),
                Some(v) => try_parse_int(v)
                    .and_then(|n| usize::try_from(n).ok())
                    .map(Some)
                    .ok_or_else(|| {
                        Error::invalid_value(key, format!("Rule '{key}' must be an integer"))
                    }),
            }
        };

        let field_type = match obj.get("type") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(s)) => Some(s.parse()?),
            Some(_) => return Err(Error::invalid_value("type", "Rule 'type' must be a string")),
        };

        let pattern = match obj.get("pattern") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(p)) => Some(compile_pattern(p)?),
            Some(_) => {
                return Err(Error::invalid_value(
                    "pattern",
                    "Rule 'pattern' must be a string",
                ))
            }
        };

        let allowed = match obj.get("enum") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::Array(values)) => Some(values.clone()),
            Some(_) => return Err(Error::invalid_value("enum", "Rule 'enum' must be a list")),
        };

        Ok(Self {
            required: obj
                .get("required")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
            field_type,
            min: number("min")?,
            max: number("max")?,
            min_length: length("minLength")?,
            max_length: length("maxLength")?,
            pattern,
            allowed,
        })
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        Error::invalid_value(
            "pattern",
            format!("Rule \"pattern\" is not a valid regex: {e}"),
        )
    })
}

// ============================================================================
// Rule Set
// ============================================================================

/// Field rules keyed by field name, in declaration order
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<(String, FieldRules)>,
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rules for a field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, rules: FieldRules) -> Self {
        self.fields.push((name.into(), rules));
        self
    }

    /// Parse `{field: {rules...}, ...}`
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::invalid_value("rules", "Validation rules must be a mapping"))?;

        let fields = obj
            .iter()
            .map(|(name, rules)| {
                FieldRules::from_value(rules)
                    .map(|r| (name.clone(), r))
                    .map_err(|e| Error::config(format!("Invalid rules for field '{name}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { fields })
    }

    /// Iterate `(field, rules)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldRules)> {
        self.fields.iter().map(|(name, rules)| (name.as_str(), rules))
    }

    /// Whether no field has rules
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields with rules
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of checking one value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Outcome of checking a record or record list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Validation {
    pub valid: bool,
    /// Every failure as `"{path}: {message}"`
    pub errors: Vec<String>,
    /// Failures grouped by field path (`name` or `[i].name`)
    pub field_errors: BTreeMap<String, Vec<String>>,
    /// The validated data
    pub data: JsonValue,
}

/// What a failed validation does to a job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Abort the job
    #[default]
    Error,
    /// Log the failures and continue
    Warn,
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            other => Err(Error::invalid_value(
                "severity",
                format!("Unknown severity: {other}"),
            )),
        }
    }
}

/// When validation runs relative to the transform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    BeforeTransform,
    AfterTransform,
    Both,
}

impl Phase {
    /// Runs before the transform
    pub fn before(&self) -> bool {
        matches!(self, Self::BeforeTransform | Self::Both)
    }

    /// Runs after the transform
    pub fn after(&self) -> bool {
        matches!(self, Self::AfterTransform | Self::Both)
    }
}

impl FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "before_transform" => Ok(Self::BeforeTransform),
            "after_transform" => Ok(Self::AfterTransform),
            "both" => Ok(Self::Both),
            other => Err(Error::invalid_value(
                "phase",
                format!("Unknown validation phase: {other}"),
            )),
        }
    }
}
