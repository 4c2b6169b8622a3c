//! Payload validators consulted on every cache read
//!
//! A validator claims a set of logical cache names and checks the schema and
//! semantics of payloads stored under them. The registry sniffs each payload's
//! [`SectionShape`] once and hands it to every validator that supports the key.

mod footer;
mod header;
mod shape;

pub use footer::FooterValidator;
pub use header::HeaderValidator;
pub use shape::SectionShape;

use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::cache::{CacheKey, DefectClass};

/// A single human-readable rejection tagged with its defect class
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} {}", .defect.code(), .message)]
pub struct ValidationError {
    defect: DefectClass,
    message: String,
}

impl ValidationError {
    pub fn new(defect: DefectClass, message: impl Into<String>) -> Self {
        Self {
            defect,
            message: message.into(),
        }
    }

    pub fn missing_field(message: impl Into<String>) -> Self {
        Self::new(DefectClass::MissingField, message)
    }

    pub fn semantic(message: impl Into<String>) -> Self {
        Self::new(DefectClass::SemanticViolation, message)
    }

    pub fn unrecognized(message: impl Into<String>) -> Self {
        Self::new(DefectClass::UnrecognizedShape, message)
    }

    pub fn defect(&self) -> DefectClass {
        self.defect
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Schema and semantic checks for one family of cached payloads
///
/// Implementations must not panic; returning `None` means the payload is
/// fully trusted.
pub trait PayloadValidator: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Whether this validator governs `key`
    fn supports(&self, key: &CacheKey) -> bool;

    /// Checks a payload whose shape has already been sniffed
    fn validate(&self, key: &CacheKey, shape: &SectionShape<'_>) -> Option<ValidationError>;
}

/// Ordered collection of validators
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: Vec<Box<dyn PayloadValidator>>,
}

impl ValidatorRegistry {
    /// An empty registry that trusts every payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the header and footer validators
    pub fn standard() -> Self {
        Self::new()
            .with(HeaderValidator)
            .with(FooterValidator)
    }

    /// Adds a validator after the existing ones
    pub fn with(mut self, validator: impl PayloadValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Runs every supporting validator, returning the first rejection
    pub fn check(&self, key: &CacheKey, payload: &Value) -> Option<ValidationError> {
        let mut supporting = self.validators.iter().filter(|v| v.supports(key)).peekable();
        supporting.peek()?;

        let shape = SectionShape::sniff(payload);
        supporting.find_map(|validator| validator.validate(key, &shape))
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.validators.iter().map(|v| v.name()))
            .finish()
    }
}

/// True when `item` carries a non-null `field`
pub(crate) fn has_field(item: &Value, field: &str) -> bool {
    item.get(field).is_some_and(|v| !v.is_null())
}

/// True when `field` is missing, null, or a whitespace-only string
pub(crate) fn is_blank(item: &Value, field: &str) -> bool {
    match item.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Reads a flag stored as a number, numeric string or boolean
pub(crate) fn as_flag(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map(|f| f.trunc() as i64).unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}
