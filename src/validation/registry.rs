//! Custom validator registry.
//!
//! # Responsibilities
//! - Hold named field validators shared by one application instance
//! - Resolve a rule name to a validator
//!
//! # Design Decisions
//! - Explicit lookup table handed to the pipeline at construction
//! - A lookup miss in the application table falls back to the built-in rules
//! - A rule known to neither is a rejection, never a pass

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use url::Url;

/// A named constraint on a single field value.
pub trait FieldValidator: Send + Sync {
    /// Return a human readable reason when `value` is not acceptable.
    fn validate(&self, field: &str, value: &Value) -> Result<(), String>;
}

impl<F> FieldValidator for F
where
    F: Fn(&str, &Value) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, field: &str, value: &Value) -> Result<(), String> {
        self(field, value)
    }
}

/// Where a rule was found.
pub enum Resolution {
    /// Registered by the application.
    Registered(Arc<dyn FieldValidator>),
    /// One of the built-in rules.
    Builtin(Arc<dyn FieldValidator>),
}

impl Resolution {
    pub fn validator(&self) -> &dyn FieldValidator {
        match self {
            Resolution::Registered(v) | Resolution::Builtin(v) => v.as_ref(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Resolution::Builtin(_))
    }
}

/// Lookup table from rule name to validator.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<&'static str, Arc<dyn FieldValidator>>,
}

impl ValidatorRegistry {
    /// A registry with no application rules; only the built-ins resolve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a named validator.
    pub fn register(mut self, name: &'static str, validator: impl FieldValidator + 'static) -> Self {
        self.validators.insert(name, Arc::new(validator));
        self
    }

    /// Resolve a rule name in the application table, then in the built-ins.
    pub fn resolve(&self, name: &str) -> Option<Resolution> {
        if let Some(validator) = self.validators.get(name) {
            return Some(Resolution::Registered(Arc::clone(validator)));
        }
        builtin(name).map(Resolution::Builtin)
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.validators.keys().collect();
        names.sort();
        f.debug_struct("ValidatorRegistry")
            .field("rules", &names)
            .finish()
    }
}

/// Built-in rules: `non_empty`, `email`, `url`, `positive`.
fn builtin(name: &str) -> Option<Arc<dyn FieldValidator>> {
    let validator: Arc<dyn FieldValidator> = match name {
        "non_empty" => Arc::new(non_empty),
        "email" => Arc::new(email),
        "url" => Arc::new(absolute_url),
        "positive" => Arc::new(positive),
        _ => return None,
    };
    Some(validator)
}

fn non_empty(field: &str, value: &Value) -> Result<(), String> {
    let empty = match value {
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        Err(format!("{field} should not be empty"))
    } else {
        Ok(())
    }
}

fn email(field: &str, value: &Value) -> Result<(), String> {
    let valid = value
        .as_str()
        .and_then(|s| s.split_once('@'))
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        });
    if valid {
        Ok(())
    } else {
        Err(format!("{field} must be an email"))
    }
}

fn absolute_url(field: &str, value: &Value) -> Result<(), String> {
    match value.as_str().map(Url::parse) {
        Some(Ok(url)) if url.has_host() => Ok(()),
        _ => Err(format!("{field} must be a URL address")),
    }
}

fn positive(field: &str, value: &Value) -> Result<(), String> {
    match value.as_f64() {
        Some(n) if n > 0.0 => Ok(()),
        _ => Err(format!("{field} must be a positive number")),
    }
}
