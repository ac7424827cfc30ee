//! # Format Paths
//!
//! A format path is a list of `path:kind` rules that coerce scalar fields of
//! a JSON document. Outbound documents have every scalar rendered as a
//! string for wire transport; inbound documents have typed values restored.
//!
//! ## Expression Syntax
//!
//! ```text
//! id:string,user.age:int,items[].price:number,flags[]:bool
//! ```
//!
//! Path segments are separated by `.`; a segment suffixed with `[]` names
//! an array whose elements the rest of the path applies to. The empty
//! expression is the identity conversion.
//!
//! ## Invariants
//!
//! - Fields the expression does not name pass through untouched.
//! - Named fields that are absent or `null` are left as they are.
//! - Any value that cannot be coerced is a [`FormatError`]; nothing is
//!   dropped silently.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

/// Errors from format-path parsing and conversion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// The path expression itself is malformed.
    #[error("malformed format path {expr:?}: {reason}")]
    MalformedPath {
        /// The offending expression.
        expr: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The document is not valid JSON, or not the JSON shape expected.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// A path walked into a value of the wrong shape.
    #[error("at {path}: expected {expected}, found {found}")]
    ShapeMismatch {
        /// Path of the offending value.
        path: String,
        /// Expected JSON shape.
        expected: &'static str,
        /// JSON type actually found.
        found: &'static str,
    },

    /// A scalar could not be converted to the requested kind.
    #[error("at {path}: cannot convert {value} to {kind}")]
    Coercion {
        /// Path of the offending value.
        path: String,
        /// Target kind.
        kind: ScalarKind,
        /// The value as found (compact JSON).
        value: String,
    },

    /// The request could not be serialized or the response could not be
    /// decoded into the caller's output type.
    #[error("cannot {action} {type_name}: {reason}")]
    Codec {
        /// `"serialize"` or `"decode"`.
        action: &'static str,
        /// Rust type involved.
        type_name: &'static str,
        /// Underlying serde error.
        reason: String,
    },
}

/// Scalar kinds a format rule can coerce to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Int,
    Number,
    Bool,
}

impl ScalarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Number => "number",
            Self::Bool => "bool",
        }
    }

    /// Parse a kind name; accepts the common aliases used in schemas.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => Some(Self::String),
            "int" | "integer" | "int64" | "int32" => Some(Self::Int),
            "number" | "float" | "double" | "float64" => Some(Self::Number),
            "bool" | "boolean" => Some(Self::Bool),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One segment of a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// An object field.
    Field(String),
    /// An object field holding an array; the remaining path applies to each element.
    Each(String),
}

impl Segment {
    pub fn name(&self) -> &str {
        match self {
            Self::Field(n) | Self::Each(n) => n,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(n) => f.write_str(n),
            Self::Each(n) => write!(f, "{n}[]"),
        }
    }
}

/// Parse a dotted field path (`items[].price`) into segments.
///
/// Returns a human-readable reason on failure so callers can wrap it in
/// their own error type.
pub fn parse_field_path(path: &str) -> Result<Vec<Segment>, String> {
    let path = path.trim();
    if path.is_empty() {
        return Err("empty field path".into());
    }
    path.split('.')
        .map(|raw| {
            let (name, each) = match raw.strip_suffix("[]") {
                Some(name) => (name, true),
                None => (raw, false),
            };
            if name.is_empty() {
                return Err(format!("empty segment in {path:?}"));
            }
            if name.contains(['[', ']', ':', ',', ' ']) {
                return Err(format!("invalid segment {raw:?} in {path:?}"));
            }
            Ok(if each {
                Segment::Each(name.to_string())
            } else {
                Segment::Field(name.to_string())
            })
        })
        .collect()
}

fn display_path(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// A single coercion: the field at `segments` becomes `kind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRule {
    pub segments: Vec<Segment>,
    pub kind: ScalarKind,
}

impl FormatRule {
    pub fn new(segments: Vec<Segment>, kind: ScalarKind) -> Self {
        Self { segments, kind }
    }

    /// The rule's path in expression syntax.
    pub fn path(&self) -> String {
        display_path(&self.segments)
    }
}

impl fmt::Display for FormatRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path(), self.kind)
    }
}

/// A parsed format-path expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatPath {
    rules: Vec<FormatRule>,
}

impl FormatPath {
    /// The identity conversion.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: Vec<FormatRule>) -> Self {
        Self { rules }
    }

    /// Parse an expression. The empty (or blank) expression yields the
    /// identity conversion.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::MalformedPath`] for entries without a kind,
    /// unknown kinds, or malformed field paths.
    pub fn parse(expr: &str) -> Result<Self, FormatError> {
        let malformed = |reason: String| FormatError::MalformedPath {
            expr: expr.to_string(),
            reason,
        };

        let mut rules = Vec::new();
        for entry in expr.split(',').map(str::trim) {
            if entry.is_empty() {
                if expr.trim().is_empty() {
                    continue;
                }
                return Err(malformed("empty entry".into()));
            }
            let (path, kind) = entry
                .rsplit_once(':')
                .ok_or_else(|| malformed(format!("entry {entry:?} has no ':kind'")))?;
            let kind = ScalarKind::from_name(kind)
                .ok_or_else(|| malformed(format!("unknown kind {kind:?}")))?;
            let segments = parse_field_path(path).map_err(malformed)?;
            rules.push(FormatRule::new(segments, kind));
        }
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[FormatRule] {
        &self.rules
    }

    /// Apply every rule to `document`, returning the converted document.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::ShapeMismatch`] or [`FormatError::Coercion`]
    /// naming the offending path.
    pub fn apply(&self, mut document: Value) -> Result<Value, FormatError> {
        for rule in &self.rules {
            apply_rule(&mut document, &rule.segments, 0, rule.kind)?;
        }
        Ok(document)
    }
}

impl fmt::Display for FormatPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{rule}")?;
        }
        Ok(())
    }
}

impl FromStr for FormatPath {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Convert raw document text with a path expression.
///
/// An empty expression returns the document unchanged without parsing it.
///
/// # Errors
///
/// Returns [`FormatError::MalformedPath`] for a bad expression and
/// [`FormatError::MalformedDocument`] when the text is not JSON.
pub fn convert(document: &str, expr: &str) -> Result<String, FormatError> {
    if expr.trim().is_empty() {
        return Ok(document.to_string());
    }
    let path = FormatPath::parse(expr)?;
    let value: Value = serde_json::from_str(document)
        .map_err(|e| FormatError::MalformedDocument(e.to_string()))?;
    let converted = path.apply(value)?;
    serde_json::to_string(&converted).map_err(|e| FormatError::MalformedDocument(e.to_string()))
}

fn apply_rule(
    value: &mut Value,
    segments: &[Segment],
    depth: usize,
    kind: ScalarKind,
) -> Result<(), FormatError> {
    let Some(segment) = segments.get(depth) else {
        return coerce(value, kind, || display_path(segments));
    };

    let child = match value {
        Value::Null => return Ok(()),
        Value::Object(map) => match map.get_mut(segment.name()) {
            Some(child) => child,
            None => return Ok(()),
        },
        other => {
            return Err(FormatError::ShapeMismatch {
                path: display_path(&segments[..depth]),
                expected: "object",
                found: json_type(other),
            })
        }
    };

    match segment {
        Segment::Field(_) => apply_rule(child, segments, depth + 1, kind),
        Segment::Each(_) => match child {
            Value::Null => Ok(()),
            Value::Array(items) => {
                for item in items {
                    apply_rule(item, segments, depth + 1, kind)?;
                }
                Ok(())
            }
            other => Err(FormatError::ShapeMismatch {
                path: display_path(&segments[..=depth]),
                expected: "array",
                found: json_type(other),
            }),
        },
    }
}

fn coerce(value: &mut Value, kind: ScalarKind, path: impl Fn() -> String) -> Result<(), FormatError> {
    let fail = |value: &Value| FormatError::Coercion {
        path: path(),
        kind,
        value: value.to_string(),
    };

    let converted = match (kind, &*value) {
        (_, Value::Null) => return Ok(()),
        (_, Value::Object(_) | Value::Array(_)) => {
            return Err(FormatError::ShapeMismatch {
                path: path(),
                expected: "scalar",
                found: json_type(value),
            })
        }

        (ScalarKind::String, Value::String(_)) => return Ok(()),
        (ScalarKind::String, Value::Number(n)) => Value::String(n.to_string()),
        (ScalarKind::String, Value::Bool(b)) => Value::String(b.to_string()),

        (ScalarKind::Int, Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                return Ok(());
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::from(f as i64),
                _ => return Err(fail(value)),
            }
        }
        (ScalarKind::Int, Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Value::Null
            } else if let Ok(i) = s.parse::<i64>() {
                Value::from(i)
            } else if let Ok(u) = s.parse::<u64>() {
                Value::from(u)
            } else {
                return Err(fail(value));
            }
        }

        (ScalarKind::Number, Value::Number(_)) => return Ok(()),
        (ScalarKind::Number, Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Value::Null
            } else if let Ok(i) = s.parse::<i64>() {
                Value::from(i)
            } else if let Ok(u) = s.parse::<u64>() {
                Value::from(u)
            } else {
                match s.parse::<f64>().ok().and_then(Number::from_f64) {
                    Some(n) => Value::Number(n),
                    None => return Err(fail(value)),
                }
            }
        }

        (ScalarKind::Bool, Value::Bool(_)) => return Ok(()),
        (ScalarKind::Bool, Value::String(s)) => match s.trim() {
            "" => Value::Null,
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => return Err(fail(value)),
        },
        (ScalarKind::Bool, Value::Number(n)) => match n.as_i64() {
            Some(1) => Value::Bool(true),
            Some(0) => Value::Bool(false),
            _ => return Err(fail(value)),
        },

        (ScalarKind::Int | ScalarKind::Number, Value::Bool(_)) => return Err(fail(value)),
    };

    *value = converted;
    Ok(())
}

/// JSON type name of a value, for diagnostics.
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
