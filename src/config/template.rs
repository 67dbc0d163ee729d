//! Variable substitution for pipeline YAML
//!
//! Replaces `${NAME}` tokens in string values. Names come from the
//! pipeline's `vars` mapping, overridden by the process environment.
//! Tokens with no matching variable are left untouched.

use crate::types::{param_value, JsonObject, JsonValue, StringMap};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Regex for matching substitution tokens: ${NAME}
static VAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Variables available to `${NAME}` tokens
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    values: StringMap,
}

impl Variables {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables from a `vars` mapping; non-string scalars are stringified
    pub fn from_vars(vars: &JsonObject) -> Self {
        Self {
            values: vars
                .iter()
                .map(|(k, v)| (k.clone(), param_value(v)))
                .collect(),
        }
    }

    /// Overlay `env`; its entries win over existing ones
    #[must_use]
    pub fn with_env<I, K, V>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.values
            .extend(env.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Overlay the process environment
    #[must_use]
    pub fn with_process_env(self) -> Self {
        self.with_env(std::env::vars())
    }

    /// Set a single variable
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Get a variable
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Substitute the tokens in one string
    pub fn render(&self, template: &str) -> String {
        if !has_tokens(template) {
            return template.to_string();
        }
        VAR_REGEX
            .replace_all(template, |cap: &Captures<'_>| match self.get(&cap[1]) {
                Some(value) => value.to_string(),
                None => cap[0].to_string(),
            })
            .into_owned()
    }

    /// Substitute tokens in every string nested in `value`; keys are kept
    pub fn render_value(&self, value: &JsonValue) -> JsonValue {
        match value {
            JsonValue::String(s) => JsonValue::String(self.render(s)),
            JsonValue::Array(items) => {
                JsonValue::Array(items.iter().map(|v| self.render_value(v)).collect())
            }
            JsonValue::Object(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.render_value(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// Check if a string contains `${NAME}` tokens
pub fn has_tokens(s: &str) -> bool {
    VAR_REGEX.is_match(s)
}

/// Names of all tokens in a string, in order of appearance
pub fn token_names(template: &str) -> Vec<String> {
    VAR_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}
