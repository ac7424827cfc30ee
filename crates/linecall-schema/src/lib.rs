//! # linecall-schema — Schema Compilation, Validation & Format Conversion
//!
//! Everything the pipeline does to a document before and after the
//! network call, in memory and without I/O.
//!
//! ## Compilation (`compile`, `lineschema`)
//!
//! [`SchemaCompiler`] turns schema text into a [`CompiledSchema`]: a JSON
//! Schema validator for the wire contract, a [`FormatPath`], and a default
//! document. [`LineSchemaCompiler`] implements it for line-schema text.
//!
//! ## Validation (`validate`)
//!
//! [`validate`] checks a document against an optional [`SchemaValidator`];
//! an absent validator always passes.
//!
//! ## Conversion (`format`, `defaults`)
//!
//! [`FormatPath`] coerces scalar fields (stringify outbound, restore types
//! inbound). [`merge_defaults`] fills gaps in a document from declared
//! defaults without overwriting anything the caller set.
//!
//! ## Crate Policy
//!
//! - Depends only on `linecall-core` internally.
//! - Conversion never drops a field silently: every failure is a
//!   [`FormatError`] naming the offending path.

pub mod compile;
pub mod defaults;
pub mod format;
pub mod lineschema;
pub mod validate;

pub use compile::{
    CompiledSchema, LineSchemaCompiler, SchemaCompilationError, SchemaCompiler, BOOL_PATTERN,
    DRAFT7_URI, INT_PATTERN, NUMBER_PATTERN,
};
pub use defaults::merge_defaults;
pub use format::{convert, FormatError, FormatPath, FormatRule, ScalarKind, Segment};
pub use lineschema::{FieldDecl, FieldType, LineSchema, SchemaMeta};
pub use validate::{validate, SchemaValidator, ValidationError, ValidationViolations, Violation};
