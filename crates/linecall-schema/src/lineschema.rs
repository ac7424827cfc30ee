//! # Line-Schema Parser
//!
//! Parses line-oriented schema text into a [`LineSchema`]: an optional meta
//! line followed by one field declaration per line.
//!
//! ```text
//! version=http://json-schema.org/draft-07/schema#,direction=in,id=users.list
//! fullname=id,type=int,required,default=1
//! fullname=page.size,type=int,minimum=1,maximum=100
//! fullname=tags[],type=string
//! fullname=items[].price,type=string,format=number
//! ```
//!
//! Blank lines and lines starting with `#` or `//` are ignored. Attributes
//! are comma separated; `\,` escapes a literal comma inside a value. Errors
//! carry the 1-based line number.

use linecall_core::Direction;

use crate::compile::SchemaCompilationError;
use crate::format::{parse_field_path, ScalarKind, Segment};

/// Name used for a schema whose meta line declares no `id`.
pub const DEFAULT_SCHEMA_ID: &str = "schema";

/// The declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarKind),
    Object,
    Array,
}

/// Schema-level attributes from the meta line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaMeta {
    pub version: Option<String>,
    pub direction: Option<Direction>,
    pub id: Option<String>,
}

/// One `fullname=...` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// 1-based source line.
    pub line: usize,
    /// The `fullname` as written.
    pub fullname: String,
    pub path: Vec<Segment>,
    pub field_type: FieldType,
    pub required: bool,
    pub default: Option<String>,
    pub enum_values: Vec<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    /// A `format` that is not a scalar kind, kept as a JSON Schema annotation.
    pub format: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub example: Option<String>,
    pub comment: Option<String>,
}

impl FieldDecl {
    fn new(line: usize, fullname: String, path: Vec<Segment>) -> Self {
        Self {
            line,
            fullname,
            path,
            field_type: FieldType::Scalar(ScalarKind::String),
            required: false,
            default: None,
            enum_values: Vec::new(),
            minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
            pattern: None,
            format: None,
            title: None,
            description: None,
            example: None,
            comment: None,
        }
    }

    /// The scalar kind, for scalar fields.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.field_type {
            FieldType::Scalar(kind) => Some(kind),
            _ => None,
        }
    }

    /// Returns `true` if any segment of the path is an array segment.
    pub fn under_array(&self) -> bool {
        self.path.iter().any(|s| matches!(s, Segment::Each(_)))
    }
}

/// A parsed line schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineSchema {
    pub meta: SchemaMeta,
    pub fields: Vec<FieldDecl>,
}

impl LineSchema {
    /// The schema identifier used in diagnostics.
    pub fn id(&self) -> &str {
        self.meta.id.as_deref().unwrap_or(DEFAULT_SCHEMA_ID)
    }

    /// Parse line-schema text.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaCompilationError::Empty`] when the text declares
    /// nothing, and a line-numbered variant for any malformed line.
    pub fn parse(source: &str) -> Result<Self, SchemaCompilationError> {
        let mut schema = LineSchema::default();
        let mut saw_meta = false;

        for (idx, raw) in source.lines().enumerate() {
            let line = idx + 1;
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') || text.starts_with("//") {
                continue;
            }

            let attrs = split_attributes(text);
            let is_field = attrs.iter().any(|(k, _)| k == "fullname");
            if !is_field {
                if saw_meta || !schema.fields.is_empty() {
                    return Err(SchemaCompilationError::MissingFullname { line });
                }
                schema.meta = parse_meta(line, &attrs)?;
                saw_meta = true;
                continue;
            }
            schema.fields.push(parse_field(line, &attrs)?);
        }

        if schema.fields.is_empty() && !saw_meta {
            return Err(SchemaCompilationError::Empty);
        }
        Ok(schema)
    }
}

/// Split one line into `(key, value)` pairs. Bare flags get `None`.
fn split_attributes(text: &str) -> Vec<(String, Option<String>)> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&',') => {
                current.push(',');
                chars.next();
            }
            ',' => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);

    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .map(|p| match p.split_once('=') {
            Some((k, v)) => (k.trim().to_string(), Some(v.trim().to_string())),
            None => (p, None),
        })
        .collect()
}

fn require_value(
    line: usize,
    key: &str,
    value: &Option<String>,
) -> Result<String, SchemaCompilationError> {
    value.clone().ok_or_else(|| SchemaCompilationError::Parse {
        line,
        reason: format!("attribute {key:?} needs a value"),
    })
}

fn parse_meta(
    line: usize,
    attrs: &[(String, Option<String>)],
) -> Result<SchemaMeta, SchemaCompilationError> {
    let mut meta = SchemaMeta::default();
    for (key, value) in attrs {
        match key.as_str() {
            "version" => meta.version = Some(require_value(line, key, value)?),
            "id" => meta.id = Some(require_value(line, key, value)?),
            "direction" => {
                let value = require_value(line, key, value)?;
                meta.direction = Some(match value.as_str() {
                    "in" => Direction::Outbound,
                    "out" => Direction::Inbound,
                    other => {
                        return Err(SchemaCompilationError::Parse {
                            line,
                            reason: format!("direction must be \"in\" or \"out\", got {other:?}"),
                        })
                    }
                });
            }
            other => {
                return Err(SchemaCompilationError::UnknownAttribute {
                    line,
                    key: other.to_string(),
                })
            }
        }
    }
    Ok(meta)
}

fn parse_number(line: usize, key: &str, value: &str) -> Result<f64, SchemaCompilationError> {
    value.parse().map_err(|_| SchemaCompilationError::Parse {
        line,
        reason: format!("{key} must be a number, got {value:?}"),
    })
}

fn parse_length(line: usize, key: &str, value: &str) -> Result<u64, SchemaCompilationError> {
    value.parse().map_err(|_| SchemaCompilationError::Parse {
        line,
        reason: format!("{key} must be a non-negative integer, got {value:?}"),
    })
}

fn parse_field(
    line: usize,
    attrs: &[(String, Option<String>)],
) -> Result<FieldDecl, SchemaCompilationError> {
    let fullname = attrs
        .iter()
        .find(|(k, _)| k == "fullname")
        .and_then(|(_, v)| v.clone())
        .filter(|v| !v.is_empty())
        .ok_or(SchemaCompilationError::MissingFullname { line })?;
    let path = parse_field_path(&fullname)
        .map_err(|reason| SchemaCompilationError::Parse { line, reason })?;

    let mut decl = FieldDecl::new(line, fullname, path);
    let mut format_kind = None;

    for (key, value) in attrs {
        match key.as_str() {
            "fullname" => {}
            "type" => {
                let value = require_value(line, key, value)?;
                decl.field_type = match value.to_ascii_lowercase().as_str() {
                    "object" => FieldType::Object,
                    "array" => FieldType::Array,
                    other => FieldType::Scalar(ScalarKind::from_name(other).ok_or_else(|| {
                        SchemaCompilationError::UnknownType {
                            line,
                            value: value.clone(),
                        }
                    })?),
                };
            }
            "format" => {
                let value = require_value(line, key, value)?;
                match ScalarKind::from_name(&value) {
                    Some(kind) => format_kind = Some(kind),
                    None => decl.format = Some(value),
                }
            }
            "required" => {
                decl.required = match value.as_deref() {
                    None | Some("true") => true,
                    Some("false") => false,
                    Some(other) => {
                        return Err(SchemaCompilationError::Parse {
                            line,
                            reason: format!("required must be true or false, got {other:?}"),
                        })
                    }
                }
            }
            "default" => decl.default = Some(value.clone().unwrap_or_default()),
            "enum" => {
                decl.enum_values = require_value(line, key, value)?
                    .split('|')
                    .map(|v| v.trim().to_string())
                    .collect();
            }
            "minimum" => decl.minimum = Some(parse_number(line, key, &require_value(line, key, value)?)?),
            "maximum" => decl.maximum = Some(parse_number(line, key, &require_value(line, key, value)?)?),
            "minLength" => decl.min_length = Some(parse_length(line, key, &require_value(line, key, value)?)?),
            "maxLength" => decl.max_length = Some(parse_length(line, key, &require_value(line, key, value)?)?),
            "pattern" => decl.pattern = Some(require_value(line, key, value)?),
            "title" => decl.title = Some(require_value(line, key, value)?),
            "description" => decl.description = Some(require_value(line, key, value)?),
            "example" => decl.example = Some(require_value(line, key, value)?),
            "comment" => decl.comment = Some(require_value(line, key, value)?),
            other => {
                return Err(SchemaCompilationError::UnknownAttribute {
                    line,
                    key: other.to_string(),
                })
            }
        }
    }

    if let Some(kind) = format_kind {
        if !matches!(decl.field_type, FieldType::Scalar(_)) {
            return Err(SchemaCompilationError::Parse {
                line,
                reason: format!("format={kind} applies to scalar fields only"),
            });
        }
        decl.field_type = FieldType::Scalar(kind);
    }

    check_constraints(&decl)?;
    Ok(decl)
}

fn check_constraints(decl: &FieldDecl) -> Result<(), SchemaCompilationError> {
    let line = decl.line;
    let is_string = decl.field_type == FieldType::Scalar(ScalarKind::String);
    let is_numeric = matches!(
        decl.field_type,
        FieldType::Scalar(ScalarKind::Int | ScalarKind::Number)
    );
    let misplaced = |what: &str, applies: &str| SchemaCompilationError::Parse {
        line,
        reason: format!("{what} applies to {applies} fields only ({})", decl.fullname),
    };

    if !is_string && (decl.pattern.is_some() || decl.min_length.is_some() || decl.max_length.is_some()) {
        return Err(misplaced("pattern/minLength/maxLength", "string"));
    }
    if !is_numeric && (decl.minimum.is_some() || decl.maximum.is_some()) {
        return Err(misplaced("minimum/maximum", "int or number"));
    }
    if decl.scalar_kind().is_none() && (decl.default.is_some() || !decl.enum_values.is_empty()) {
        return Err(SchemaCompilationError::InvalidDefault {
            line,
            field: decl.fullname.clone(),
            reason: "default and enum apply to scalar fields only".into(),
        });
    }
    Ok(())
}
