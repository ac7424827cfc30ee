//! # Schema Compilation
//!
//! Turns schema text into the three artifacts a route needs per direction:
//! a JSON Schema validator for the wire contract, a format path, and a
//! default document.
//!
//! The [`SchemaCompiler`] trait is the seam the registry compiles through;
//! [`LineSchemaCompiler`] is the line-schema implementation.
//!
//! ## Wire Contract
//!
//! Outbound documents are stringified before validation and inbound
//! documents are validated before their types are restored, so the emitted
//! JSON Schema accepts both encodings of every typed scalar: an `int` field
//! accepts an integer or a string matching [`INT_PATTERN`]. The validator
//! also checks the document with native types restored, so `minimum` and
//! `maximum` hold for both encodings.

use std::collections::BTreeMap;

use linecall_core::Direction;
use serde_json::{json, Map, Number, Value};
use thiserror::Error;

use crate::format::{FormatPath, FormatRule, ScalarKind, Segment};
use crate::lineschema::{FieldDecl, FieldType, LineSchema};
use crate::validate::SchemaValidator;

/// Draft 7 meta-schema URI emitted as `$schema`.
pub const DRAFT7_URI: &str = "http://json-schema.org/draft-07/schema#";

/// Pattern the string encoding of an `int` must match.
pub const INT_PATTERN: &str = "^-?[0-9]+$";
/// Pattern the string encoding of a `number` must match.
pub const NUMBER_PATTERN: &str = r"^-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?$";
/// Pattern the string encoding of a `bool` must match.
pub const BOOL_PATTERN: &str = "^(true|false)$";

/// Errors from schema compilation. Never cached by the registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaCompilationError {
    #[error("schema text is empty")]
    Empty,

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("line {line}: field declaration has no fullname")]
    MissingFullname { line: usize },

    #[error("line {line}: unknown type {value:?}")]
    UnknownType { line: usize, value: String },

    #[error("line {line}: unknown attribute {key:?}")]
    UnknownAttribute { line: usize, key: String },

    /// A default or enum member does not parse as the field's kind.
    #[error("line {line}: invalid default for {field}: {reason}")]
    InvalidDefault {
        line: usize,
        field: String,
        reason: String,
    },

    /// A path segment is declared twice or used as both scalar and container.
    #[error("line {line}: conflicting declaration of {field}")]
    Conflict { line: usize, field: String },

    /// The emitted JSON Schema was rejected by the validator compiler.
    #[error("cannot build validator for schema '{schema_id}': {reason}")]
    ValidatorBuild { schema_id: String, reason: String },
}

/// The compiled artifacts of one schema.
#[derive(Debug)]
pub struct CompiledSchema {
    /// Identifier used in diagnostics.
    pub id: String,
    /// The emitted JSON Schema document.
    pub json_schema: Value,
    pub validator: SchemaValidator,
    /// Outbound: every scalar to `string`. Inbound: every scalar to its kind.
    pub format_path: FormatPath,
    /// Declared defaults, absent when the schema declares none.
    pub defaults: Option<Value>,
}

/// Compiles schema text for one direction of a route.
pub trait SchemaCompiler: Send + Sync {
    /// Compile `source`. `direction` selects the format path mapping.
    fn compile(
        &self,
        source: &str,
        direction: Direction,
    ) -> Result<CompiledSchema, SchemaCompilationError>;
}

/// [`SchemaCompiler`] for line-schema text.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineSchemaCompiler;

impl LineSchemaCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaCompiler for LineSchemaCompiler {
    fn compile(
        &self,
        source: &str,
        direction: Direction,
    ) -> Result<CompiledSchema, SchemaCompilationError> {
        if source.trim().is_empty() {
            return Err(SchemaCompilationError::Empty);
        }
        let schema = LineSchema::parse(source)?;
        if let Some(declared) = schema.meta.direction {
            if declared != direction {
                return Err(SchemaCompilationError::Parse {
                    line: 1,
                    reason: format!(
                        "schema declares direction={} but is compiled for the {direction} side",
                        declared.as_schema_str()
                    ),
                });
            }
        }

        let mut root = Node::object();
        for decl in &schema.fields {
            insert(&mut root, decl)?;
        }

        let mut json_schema = root.to_json_schema(true);
        if let Value::Object(map) = &mut json_schema {
            map.insert("$schema".into(), Value::String(DRAFT7_URI.to_string()));
            map.insert("title".into(), Value::String(schema.id().to_string()));
        }

        let validator = SchemaValidator::build(schema.id(), &json_schema)
            .map_err(|reason| SchemaCompilationError::ValidatorBuild {
                schema_id: schema.id().to_string(),
                reason,
            })?
            .with_typed_view(format_path(&schema, Direction::Inbound));

        Ok(CompiledSchema {
            id: schema.id().to_string(),
            json_schema,
            validator,
            format_path: format_path(&schema, direction),
            defaults: defaults(&schema)?,
        })
    }
}

#[derive(Debug)]
enum Node<'a> {
    Object {
        properties: BTreeMap<String, Node<'a>>,
        required: Vec<String>,
        decl: Option<&'a FieldDecl>,
    },
    Array {
        items: Option<Box<Node<'a>>>,
        decl: Option<&'a FieldDecl>,
    },
    Scalar {
        kind: ScalarKind,
        decl: &'a FieldDecl,
    },
}

impl<'a> Node<'a> {
    fn object() -> Self {
        Node::Object {
            properties: BTreeMap::new(),
            required: Vec::new(),
            decl: None,
        }
    }

    fn array() -> Self {
        Node::Array {
            items: None,
            decl: None,
        }
    }

    fn from_decl(decl: &'a FieldDecl) -> Self {
        match decl.field_type {
            FieldType::Scalar(kind) => Node::Scalar { kind, decl },
            FieldType::Object => Node::Object {
                properties: BTreeMap::new(),
                required: Vec::new(),
                decl: Some(decl),
            },
            FieldType::Array => Node::Array {
                items: None,
                decl: Some(decl),
            },
        }
    }

    fn decl(&self) -> Option<&'a FieldDecl> {
        match self {
            Node::Object { decl, .. } | Node::Array { decl, .. } => *decl,
            Node::Scalar { decl, .. } => Some(*decl),
        }
    }

    fn to_json_schema(&self, root: bool) -> Value {
        let decl = self.decl();
        let nullable = !root && !decl.is_some_and(|d| d.required);

        let mut schema = match self {
            Node::Object {
                properties,
                required,
                ..
            } => {
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(name, node)| (name.clone(), node.to_json_schema(false)))
                    .collect();
                let mut map = Map::new();
                map.insert("type".into(), types(&["object"], nullable));
                map.insert("properties".into(), Value::Object(props));
                if !required.is_empty() {
                    map.insert("required".into(), json!(required));
                }
                map
            }
            Node::Array { items, .. } => {
                let mut map = Map::new();
                map.insert("type".into(), types(&["array"], nullable));
                if let Some(items) = items {
                    map.insert("items".into(), items.to_json_schema(false));
                }
                map
            }
            Node::Scalar { kind, decl } => scalar_schema(*kind, decl, nullable),
        };

        if let Some(decl) = decl {
            annotate(&mut schema, decl);
        }
        Value::Object(schema)
    }
}

fn types(names: &[&str], nullable: bool) -> Value {
    let mut list: Vec<Value> = names.iter().map(|n| Value::String((*n).to_string())).collect();
    if nullable {
        list.push(Value::String("null".into()));
    }
    if list.len() == 1 {
        list.remove(0)
    } else {
        Value::Array(list)
    }
}

fn scalar_schema(kind: ScalarKind, decl: &FieldDecl, nullable: bool) -> Map<String, Value> {
    let mut map = Map::new();
    let (native, pattern) = match kind {
        ScalarKind::String => ("string", decl.pattern.as_deref()),
        ScalarKind::Int => ("integer", Some(INT_PATTERN)),
        ScalarKind::Number => ("number", Some(NUMBER_PATTERN)),
        ScalarKind::Bool => ("boolean", Some(BOOL_PATTERN)),
    };
    let names: &[&str] = if kind == ScalarKind::String {
        &["string"]
    } else {
        &[native, "string"]
    };
    map.insert("type".into(), types(names, nullable));
    if let Some(pattern) = pattern {
        map.insert("pattern".into(), Value::String(pattern.to_string()));
    }

    if !decl.enum_values.is_empty() {
        let mut members: Vec<Value> = Vec::new();
        for raw in &decl.enum_values {
            // Typed members also match their string encoding.
            if let Ok(typed) = typed_value(kind, raw) {
                if !typed.is_string() {
                    members.push(typed);
                }
            }
            members.push(Value::String(raw.clone()));
        }
        if nullable {
            members.push(Value::Null);
        }
        map.insert("enum".into(), Value::Array(members));
    }

    if let Some(min) = decl.minimum {
        map.insert("minimum".into(), number(min));
    }
    if let Some(max) = decl.maximum {
        map.insert("maximum".into(), number(max));
    }
    if let Some(min) = decl.min_length {
        map.insert("minLength".into(), json!(min));
    }
    if let Some(max) = decl.max_length {
        map.insert("maxLength".into(), json!(max));
    }
    if let Some(format) = &decl.format {
        map.insert("format".into(), Value::String(format.clone()));
    }
    if let Some(default) = decl.default.as_deref().and_then(|d| typed_value(kind, d).ok()) {
        map.insert("default".into(), default);
    }
    map
}

fn annotate(map: &mut Map<String, Value>, decl: &FieldDecl) {
    if let Some(title) = &decl.title {
        map.insert("title".into(), Value::String(title.clone()));
    }
    if let Some(description) = &decl.description {
        map.insert("description".into(), Value::String(description.clone()));
    }
    if let Some(example) = &decl.example {
        map.insert("examples".into(), json!([example]));
    }
    if let Some(comment) = &decl.comment {
        map.insert("$comment".into(), Value::String(comment.clone()));
    }
}

fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

/// Parse `raw` as a value of `kind`.
fn typed_value(kind: ScalarKind, raw: &str) -> Result<Value, String> {
    match kind {
        ScalarKind::String => Ok(Value::String(raw.to_string())),
        ScalarKind::Int => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("{raw:?} is not an int")),
        ScalarKind::Number => {
            if let Ok(i) = raw.parse::<i64>() {
                return Ok(Value::from(i));
            }
            if let Ok(u) = raw.parse::<u64>() {
                return Ok(Value::from(u));
            }
            raw.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("{raw:?} is not a number"))
        }
        ScalarKind::Bool => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(format!("{raw:?} is not a bool")),
        },
    }
}

/// Insert `decl` into the tree, creating implicit containers on the way.
fn insert<'a>(root: &mut Node<'a>, decl: &'a FieldDecl) -> Result<(), SchemaCompilationError> {
    let conflict = || SchemaCompilationError::Conflict {
        line: decl.line,
        field: decl.fullname.clone(),
    };

    let mut current = root;
    let last = decl.path.len().saturating_sub(1);
    for (i, segment) in decl.path.iter().enumerate() {
        let Node::Object {
            properties,
            required,
            ..
        } = current
        else {
            return Err(conflict());
        };
        let name = segment.name().to_string();

        if i == last {
            if decl.required && !required.contains(&name) {
                required.push(name.clone());
            }
            let node = match segment {
                Segment::Field(_) => Node::from_decl(decl),
                Segment::Each(_) => Node::Array {
                    items: Some(Box::new(Node::from_decl(decl))),
                    decl: Some(decl),
                },
            };
            return match properties.get_mut(&name) {
                None => {
                    properties.insert(name, node);
                    Ok(())
                }
                Some(existing) => {
                    if adopt(existing, node) {
                        Ok(())
                    } else {
                        Err(conflict())
                    }
                }
            };
        }

        let child = properties.entry(name).or_insert_with(|| match segment {
            Segment::Field(_) => Node::object(),
            Segment::Each(_) => Node::array(),
        });
        current = match segment {
            Segment::Field(_) => {
                if !matches!(child, Node::Object { .. }) {
                    return Err(conflict());
                }
                child
            }
            Segment::Each(_) => match child {
                Node::Array { items, .. } => {
                    &mut **items.get_or_insert_with(|| Box::new(Node::object()))
                }
                _ => return Err(conflict()),
            },
        };
    }
    Ok(())
}

/// Attach an explicit declaration to a container created implicitly by
/// earlier child declarations. Returns `false` on a genuine conflict.
fn adopt<'a>(existing: &mut Node<'a>, node: Node<'a>) -> bool {
    match (existing, node) {
        (Node::Object { decl: slot @ None, .. }, Node::Object { decl, properties, .. })
            if properties.is_empty() =>
        {
            *slot = decl;
            true
        }
        (Node::Array { decl: slot @ None, items }, Node::Array { decl, items: declared }) => {
            let adopted = match (items, declared) {
                (_, None) => true,
                (held @ None, Some(declared)) => {
                    *held = Some(declared);
                    true
                }
                (Some(held), Some(declared)) => adopt(held, *declared),
            };
            if adopted {
                *slot = decl;
            }
            adopted
        }
        _ => false,
    }
}

fn format_path(schema: &LineSchema, direction: Direction) -> FormatPath {
    let rules = schema
        .fields
        .iter()
        .filter_map(|decl| {
            let kind = decl.scalar_kind()?;
            let kind = match direction {
                Direction::Outbound => ScalarKind::String,
                Direction::Inbound => kind,
            };
            Some(FormatRule::new(decl.path.clone(), kind))
        })
        .collect();
    FormatPath::from_rules(rules)
}

fn defaults(schema: &LineSchema) -> Result<Option<Value>, SchemaCompilationError> {
    let mut root = Map::new();
    for decl in &schema.fields {
        let (Some(raw), Some(kind)) = (decl.default.as_deref(), decl.scalar_kind()) else {
            continue;
        };
        let invalid = |reason: String| SchemaCompilationError::InvalidDefault {
            line: decl.line,
            field: decl.fullname.clone(),
            reason,
        };
        let value = typed_value(kind, raw).map_err(invalid)?;
        if !decl.enum_values.is_empty() && !decl.enum_values.iter().any(|m| m == raw) {
            return Err(invalid(format!("{raw:?} is not one of the enum members")));
        }
        if decl.under_array() {
            continue;
        }

        let Some((leaf, parents)) = decl.path.split_last() else {
            continue;
        };
        let mut target = &mut root;
        for segment in parents {
            let entry = target
                .entry(segment.name().to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            let Value::Object(next) = entry else {
                return Err(SchemaCompilationError::Conflict {
                    line: decl.line,
                    field: decl.fullname.clone(),
                });
            };
            target = next;
        }
        target.insert(leaf.name().to_string(), value);
    }

    for decl in &schema.fields {
        if let Some(kind) = decl.scalar_kind() {
            for member in &decl.enum_values {
                typed_value(kind, member).map_err(|reason| SchemaCompilationError::InvalidDefault {
                    line: decl.line,
                    field: decl.fullname.clone(),
                    reason: format!("enum member {reason}"),
                })?;
            }
        }
    }

    Ok((!root.is_empty()).then_some(Value::Object(root)))
}
