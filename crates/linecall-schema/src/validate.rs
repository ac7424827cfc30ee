//! # Schema Validation
//!
//! Runtime validation of request and response documents against compiled
//! JSON Schema (Draft 7) validators.
//!
//! ## Invariant
//!
//! Validation is opt-in per route and per direction: [`validate`] with no
//! validator always succeeds. When a validator is present, every violation
//! is reported with the instance path, the schema path, and a message, so
//! callers can tell which field broke which constraint.
//!
//! A validator may carry a typed view: a [`FormatPath`] that restores
//! native scalar types. A document that passes the wire schema is then
//! coerced through the typed view and validated again, so numeric limits
//! hold for string-encoded values too.

use std::fmt;

use jsonschema::Validator;
use serde_json::Value;
use thiserror::Error;

use crate::format::FormatPath;

/// A document did not conform to its schema.
#[derive(Error, Debug, Clone)]
#[error("validation failed against schema '{schema_id}':\n{violations}")]
pub struct ValidationError {
    /// Identifier of the schema that was validated against.
    pub schema_id: String,
    /// Structured list of individual violations.
    pub violations: ValidationViolations,
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, Default)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns the violation at `instance_path`, if any.
    pub fn at(&self, instance_path: &str) -> Option<&Violation> {
        self.violations
            .iter()
            .find(|v| v.instance_path == instance_path)
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl From<Vec<Violation>> for ValidationViolations {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A compiled JSON Schema validator.
///
/// `SchemaValidator` is `Send + Sync` and is built once per route and
/// direction, then shared by every call on that route.
pub struct SchemaValidator {
    schema_id: String,
    validator: Validator,
    typed_view: Option<FormatPath>,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema_id", &self.schema_id)
            .field("typed_view", &self.typed_view.as_ref().map(ToString::to_string))
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Compile a JSON Schema document into a validator.
    ///
    /// # Errors
    ///
    /// Returns the underlying compiler message if the schema is itself invalid.
    pub fn build(schema_id: impl Into<String>, schema: &Value) -> Result<Self, String> {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft7);
        let validator = opts.build(schema).map_err(|e| e.to_string())?;
        Ok(Self {
            schema_id: schema_id.into(),
            validator,
            typed_view: None,
        })
    }

    /// Also validate documents after coercing them through `path`.
    /// An empty path clears the typed view.
    pub fn with_typed_view(mut self, path: FormatPath) -> Self {
        self.typed_view = (!path.is_empty()).then_some(path);
        self
    }

    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    /// Returns `true` if `instance` conforms to the schema.
    pub fn is_valid(&self, instance: &Value) -> bool {
        if !self.validator.is_valid(instance) {
            return false;
        }
        match &self.typed_view {
            Some(path) => path
                .apply(instance.clone())
                .is_ok_and(|typed| self.validator.is_valid(&typed)),
            None => true,
        }
    }

    /// Validate `instance`, collecting every violation.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] with one [`Violation`] per failed constraint.
    pub fn validate(&self, instance: &Value) -> Result<(), ValidationError> {
        let mut errors = self.violations(instance);
        if errors.is_empty() {
            if let Some(path) = &self.typed_view {
                match path.apply(instance.clone()) {
                    Ok(typed) => errors = self.violations(&typed),
                    Err(e) => errors.push(Violation {
                        instance_path: String::new(),
                        schema_path: String::new(),
                        message: e.to_string(),
                    }),
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                schema_id: self.schema_id.clone(),
                violations: errors.into(),
            })
        }
    }

    fn violations(&self, instance: &Value) -> Vec<Violation> {
        self.validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect()
    }
}

/// Validate `document` against an optional validator.
///
/// An absent validator means no schema was declared for this direction, so
/// validation is skipped.
pub fn validate(document: &Value, validator: Option<&SchemaValidator>) -> Result<(), ValidationError> {
    match validator {
        Some(v) => v.validate(document),
        None => Ok(()),
    }
}
