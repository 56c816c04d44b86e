//! Declared request shapes.
//!
//! A request type lists its fields once; the pipeline checks the raw payload
//! against that list before serde ever sees it.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// JSON type a field must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl FieldKind {
    /// Whether `value` is of this kind.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Object => value.is_object(),
            FieldKind::Array => value.is_array(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Object => "object",
            FieldKind::Array => "array",
        }
    }
}

/// One declared field of a request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Name of a custom validator in the registry.
    pub rule: Option<&'static str>,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            rule: None,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            rule: None,
        }
    }

    pub const fn with_rule(mut self, rule: &'static str) -> Self {
        self.rule = Some(rule);
        self
    }
}

/// A typed request payload with a declared field list.
pub trait RequestShape: DeserializeOwned + Send {
    /// Name used in rejection messages.
    const NAME: &'static str;

    /// Every field the payload may carry.
    const FIELDS: &'static [FieldSpec];

    fn field(name: &str) -> Option<&'static FieldSpec> {
        Self::FIELDS.iter().find(|field| field.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_kind_rejects_fractions() {
        assert!(FieldKind::Integer.matches(&json!(3)));
        assert!(!FieldKind::Integer.matches(&json!(3.5)));
        assert!(FieldKind::Number.matches(&json!(3.5)));
    }

    #[test]
    fn null_matches_no_kind() {
        for kind in [
            FieldKind::String,
            FieldKind::Integer,
            FieldKind::Number,
            FieldKind::Boolean,
            FieldKind::Object,
            FieldKind::Array,
        ] {
            assert!(!kind.matches(&Value::Null), "{}", kind.as_str());
        }
    }
}
