//! Declarative section schemas.
//!
//! Each configuration section is described by a [`SectionSchema`]: a plain
//! table of [`FieldRule`]s stating, per key, the accepted value kind and
//! whether the field is required, optional, or defaulted. [`SectionSchema::check`]
//! consults the table to reject unknown keys, enforce types and ranges, and
//! inject section-local defaults. Keeping the rules as plain data makes the
//! set of accepted sections enumerable and independently testable.

use serde_json::{Map, Value};

use crate::core::errors::SchemaError;

/// The kinds of values a field rule accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Any string.
    Str,
    /// A string drawn from a fixed enumeration.
    StrIn(&'static [&'static str]),
    /// Any integer.
    Int,
    /// An integer drawn from a fixed enumeration.
    IntIn(&'static [i64]),
    /// An odd integer within an inclusive range.
    OddInt {
        /// Lower bound, inclusive.
        min: i64,
        /// Upper bound, inclusive.
        max: i64,
    },
    /// Any number, integer or floating point.
    Float,
    /// A disparity bound: an integer or a grid path string.
    Bound,
    /// A disparity bound that may also be the explicit null marker.
    NullableBound,
    /// A string path or the explicit null marker.
    NullableStr,
}

impl FieldKind {
    /// Human-readable description of the accepted values, used in error
    /// messages.
    fn describe(&self) -> String {
        match self {
            FieldKind::Str => "a string".to_string(),
            FieldKind::StrIn(options) => format!("one of {options:?}"),
            FieldKind::Int => "an integer".to_string(),
            FieldKind::IntIn(options) => format!("one of {options:?}"),
            FieldKind::OddInt { min, max } => {
                format!("an odd integer in [{min}, {max}]")
            }
            FieldKind::Float => "a number".to_string(),
            FieldKind::Bound => "an integer or a grid path".to_string(),
            FieldKind::NullableBound => "an integer, a grid path, or null".to_string(),
            FieldKind::NullableStr => "a path or null".to_string(),
        }
    }

    /// Returns whether `value` is accepted by this kind.
    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::Str => value.is_string(),
            FieldKind::StrIn(options) => value
                .as_str()
                .is_some_and(|s| options.contains(&s)),
            FieldKind::Int => value.is_i64(),
            FieldKind::IntIn(options) => value.as_i64().is_some_and(|i| options.contains(&i)),
            FieldKind::OddInt { min, max } => value
                .as_i64()
                .is_some_and(|i| i % 2 != 0 && i >= *min && i <= *max),
            FieldKind::Float => value.is_number(),
            FieldKind::Bound => value.is_i64() || value.is_string(),
            FieldKind::NullableBound => value.is_i64() || value.is_string() || value.is_null(),
            FieldKind::NullableStr => value.is_string() || value.is_null(),
        }
    }
}

/// A default value expressible as plain data in a rule table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    /// An integer default.
    Int(i64),
    /// A floating point default.
    Float(f64),
    /// A string default.
    Str(&'static str),
    /// The explicit null marker.
    Null,
}

impl DefaultValue {
    /// Materializes the default as a JSON value.
    pub fn to_value(self) -> Value {
        match self {
            DefaultValue::Int(i) => Value::from(i),
            DefaultValue::Float(f) => Value::from(f),
            DefaultValue::Str(s) => Value::from(s),
            DefaultValue::Null => Value::Null,
        }
    }
}

/// Whether a field must be present, may be absent, or receives a default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Requirement {
    /// The field must be supplied by the user.
    Required,
    /// The field may be absent; a later cross-field rule owns its value.
    Optional,
    /// The field may be absent; the given default is injected when it is.
    Defaulted(DefaultValue),
}

/// One row of a section's rule table.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// The field's key in the section.
    pub key: &'static str,
    /// The accepted value kind.
    pub kind: FieldKind,
    /// Presence requirement and section-local default.
    pub requirement: Requirement,
}

/// A declarative schema for one configuration section.
#[derive(Debug, Clone, Copy)]
pub struct SectionSchema {
    /// Section name used in error messages.
    pub name: &'static str,
    /// The rule table.
    pub fields: &'static [FieldRule],
}

impl SectionSchema {
    /// Validates `section` against the rule table and returns the normalized
    /// section with every default materialized.
    ///
    /// User-supplied keys keep their order; injected defaults are appended,
    /// so re-checking an already-normalized section is the identity.
    pub fn check(&self, section: &Map<String, Value>) -> Result<Map<String, Value>, SchemaError> {
        for key in section.keys() {
            if !self.fields.iter().any(|rule| rule.key == key) {
                return Err(SchemaError::unknown_field(self.name, key));
            }
        }

        let mut normalized = section.clone();
        for rule in self.fields {
            match section.get(rule.key) {
                Some(value) => {
                    if !rule.kind.accepts(value) {
                        return Err(SchemaError::invalid_field(
                            self.name,
                            rule.key,
                            rule.kind.describe(),
                            value.to_string(),
                        ));
                    }
                }
                None => match rule.requirement {
                    Requirement::Required => {
                        return Err(SchemaError::missing_field(self.name, rule.key));
                    }
                    Requirement::Optional => {}
                    Requirement::Defaulted(default) => {
                        normalized.insert(rule.key.to_string(), default.to_value());
                    }
                },
            }
        }

        Ok(normalized)
    }
}

/// Extracts a named object section from the configuration root.
///
/// Returns `MissingField` when the key is absent and `InvalidSection` when
/// the value is not an object.
pub fn require_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a Map<String, Value>, SchemaError> {
    match root.get(key) {
        Some(Value::Object(section)) => Ok(section),
        Some(other) => Err(SchemaError::invalid_section(
            key,
            format!("expected an object, got {other}"),
        )),
        None => Err(SchemaError::missing_field("configuration", key)),
    }
}
