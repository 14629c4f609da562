//! Document schemas enforced by persistent stores.
//!
//! A [`RecordSchema`] lists the fields a document may carry, their types, and
//! whether they are required or unique. Conforming a payload casts values to
//! the declared types, drops unknown fields, and reports the first violation.

use serde_json::{Number, Value};
use thiserror::Error;

use stockroom_core::ResourceKind;

use crate::types::{Fields, Patch};

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A JSON string. Numbers and booleans are cast to their text form.
    String,
    /// A JSON number. Numeric strings and booleans are cast.
    Number,
}

impl FieldType {
    const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
        }
    }

    fn cast(self, value: &Value) -> Result<Value, CastFailure> {
        match (self, value) {
            (_, Value::Null) => Err(CastFailure::Empty),
            (Self::String, Value::String(s)) if s.is_empty() => Err(CastFailure::Empty),
            (Self::String, Value::String(_)) => Ok(value.clone()),
            (Self::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (Self::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),
            (Self::Number, Value::Number(_)) => Ok(value.clone()),
            (Self::Number, Value::Bool(b)) => Ok(Value::from(u8::from(*b))),
            (Self::Number, Value::String(s)) => parse_number(s.trim()),
            _ => Err(CastFailure::Invalid),
        }
    }
}

enum CastFailure {
    Empty,
    Invalid,
}

fn parse_number(text: &str) -> Result<Value, CastFailure> {
    if text.is_empty() {
        return Err(CastFailure::Empty);
    }
    if let Ok(int) = text.parse::<i64>() {
        return Ok(Value::from(int));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or(CastFailure::Invalid)
}

/// One field of a [`RecordSchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    /// Field name.
    pub name: &'static str,
    /// Declared type.
    pub ty: FieldType,
    /// Whether a new document must carry a non-empty value.
    pub required: bool,
    /// Whether no two documents may share a value.
    pub unique: bool,
}

impl FieldRule {
    /// A required field of the given type.
    #[must_use]
    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
            unique: false,
        }
    }

    /// Mark the field unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A schema violation. Reports the first offending field only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is absent, null, or empty.
    #[error("field `{field}` is required")]
    Missing {
        /// The missing field.
        field: &'static str,
    },

    /// A field value cannot be cast to its declared type.
    #[error("field `{field}` must be a {expected}")]
    InvalidType {
        /// The offending field.
        field: &'static str,
        /// The declared type name.
        expected: &'static str,
    },
}

/// The set of fields a document of some kind may hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    fields: Vec<FieldRule>,
}

impl RecordSchema {
    /// Build a schema from its field rules.
    #[must_use]
    pub const fn new(fields: Vec<FieldRule>) -> Self {
        Self { fields }
    }

    /// The schema persisted documents of `kind` follow, if any.
    #[must_use]
    pub fn for_kind(kind: ResourceKind) -> Option<Self> {
        match kind {
            ResourceKind::User => Some(Self::user()),
            ResourceKind::Product => None,
        }
    }

    /// User documents: `name`, unique `email`, numeric `age`, all required.
    #[must_use]
    pub fn user() -> Self {
        Self::new(vec![
            FieldRule::required("name", FieldType::String),
            FieldRule::required("email", FieldType::String).unique(),
            FieldRule::required("age", FieldType::Number),
        ])
    }

    /// The field rules, in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[FieldRule] {
        &self.fields
    }

    /// Fields whose values must be unique across documents.
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldRule> {
        self.fields.iter().filter(|rule| rule.unique)
    }

    /// Validate a new document and return it in canonical form.
    ///
    /// The result holds only declared fields, in declaration order, cast to
    /// their declared types.
    ///
    /// # Errors
    ///
    /// Returns the first missing required field or uncastable value.
    pub fn conform(&self, input: &Fields) -> Result<Fields, ValidationError> {
        let mut document = Fields::new();
        for rule in &self.fields {
            let Some(value) = input.get(rule.name) else {
                if rule.required {
                    return Err(ValidationError::Missing { field: rule.name });
                }
                continue;
            };
            match rule.ty.cast(value) {
                Ok(cast) => {
                    document.insert(rule.name.to_string(), cast);
                }
                Err(CastFailure::Empty) if rule.required => {
                    return Err(ValidationError::Missing { field: rule.name });
                }
                Err(CastFailure::Empty) => {}
                Err(CastFailure::Invalid) => {
                    return Err(ValidationError::InvalidType {
                        field: rule.name,
                        expected: rule.ty.name(),
                    });
                }
            }
        }
        Ok(document)
    }

    /// Cast the fields of a partial update, dropping undeclared ones.
    ///
    /// Required-ness is not checked: absent fields keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns an error if a supplied value cannot be cast.
    pub fn conform_patch(&self, patch: &Patch) -> Result<Patch, ValidationError> {
        let mut fields = Fields::new();
        for rule in &self.fields {
            let Some(value) = patch.fields().get(rule.name) else {
                continue;
            };
            match rule.ty.cast(value) {
                Ok(cast) => {
                    fields.insert(rule.name.to_string(), cast);
                }
                Err(CastFailure::Empty) => {}
                Err(CastFailure::Invalid) => {
                    return Err(ValidationError::InvalidType {
                        field: rule.name,
                        expected: rule.ty.name(),
                    });
                }
            }
        }
        Ok(Patch::from_fields(fields))
    }
}
