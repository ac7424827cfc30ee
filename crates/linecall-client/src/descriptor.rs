//! # Client Descriptor
//!
//! The compiled, read-only artifacts of one route: validators, format paths
//! and default document for each direction. Built once by the registry and
//! shared by every call on the route.

use linecall_core::{Direction, Route, RouteKey};
use linecall_schema::{
    merge_defaults, validate, CompiledSchema, FormatError, FormatPath, SchemaCompiler,
    SchemaValidator, ValidationError,
};
use serde_json::Value;

use crate::error::CallError;
use crate::request::RouteSource;

/// Compiled artifacts for one route.
#[derive(Debug)]
pub struct ClientDescriptor {
    key: RouteKey,
    route: Route,
    name: Option<String>,
    description: Option<String>,
    input: Option<CompiledSchema>,
    output: Option<CompiledSchema>,
}

impl ClientDescriptor {
    /// Compile the schemas declared by `source`.
    ///
    /// A direction with empty schema text is left uncompiled.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::SchemaCompilation`] naming the failed direction.
    pub fn build(
        key: RouteKey,
        source: &dyn RouteSource,
        compiler: &dyn SchemaCompiler,
    ) -> Result<Self, CallError> {
        let compile = |text: &str, direction: Direction| -> Result<Option<CompiledSchema>, CallError> {
            if text.trim().is_empty() {
                return Ok(None);
            }
            compiler
                .compile(text, direction)
                .map(Some)
                .map_err(|source| CallError::SchemaCompilation {
                    route: key.clone(),
                    direction,
                    source,
                })
        };

        let input = compile(source.input_schema(), Direction::Outbound)?;
        let output = compile(source.output_schema(), Direction::Inbound)?;
        Ok(Self {
            route: source.route(),
            name: source.name().map(str::to_string),
            description: source.description().map(str::to_string),
            key,
            input,
            output,
        })
    }

    pub fn key(&self) -> &RouteKey {
        &self.key
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn input_schema(&self) -> Option<&CompiledSchema> {
        self.input.as_ref()
    }

    pub fn output_schema(&self) -> Option<&CompiledSchema> {
        self.output.as_ref()
    }

    pub fn input_validator(&self) -> Option<&SchemaValidator> {
        self.input.as_ref().map(|s| &s.validator)
    }

    pub fn output_validator(&self) -> Option<&SchemaValidator> {
        self.output.as_ref().map(|s| &s.validator)
    }

    pub fn outbound_path(&self) -> Option<&FormatPath> {
        self.input.as_ref().map(|s| &s.format_path)
    }

    pub fn inbound_path(&self) -> Option<&FormatPath> {
        self.output.as_ref().map(|s| &s.format_path)
    }

    pub fn defaults(&self) -> Option<&Value> {
        self.input.as_ref().and_then(|s| s.defaults.as_ref())
    }

    /// Fill gaps in a request document from the declared defaults.
    pub fn merge_defaults(&self, document: Value) -> Result<Value, FormatError> {
        match self.defaults() {
            Some(defaults) => merge_defaults(document, defaults),
            None => Ok(document),
        }
    }

    /// Apply the outbound coercions (stringify for the wire).
    pub fn format_as_input(&self, document: Value) -> Result<Value, FormatError> {
        match self.outbound_path() {
            Some(path) => path.apply(document),
            None => Ok(document),
        }
    }

    /// Apply the inbound coercions (restore declared types).
    pub fn format_as_output(&self, document: Value) -> Result<Value, FormatError> {
        match self.inbound_path() {
            Some(path) => path.apply(document),
            None => Ok(document),
        }
    }

    pub fn validate_input(&self, document: &Value) -> Result<(), ValidationError> {
        validate(document, self.input_validator())
    }

    pub fn validate_output(&self, document: &Value) -> Result<(), ValidationError> {
        validate(document, self.output_validator())
    }
}
