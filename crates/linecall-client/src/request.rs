//! # Request and Output Capabilities
//!
//! A client type describes one remote operation by implementing
//! [`RouteSource`] (route plus schema text) and [`ClientRequest`] (the
//! serializable request body, its output type, and its call context).
//!
//! Schemas are route-invariant: the registry compiles the schema text of the
//! first source it sees for a route and reuses that descriptor afterwards.

use linecall_core::{CallContext, Route};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::BusinessError;

/// Declares a route and the schema text used to compile its descriptor.
pub trait RouteSource {
    fn route(&self) -> Route;

    /// Line-schema text for the request document. Empty means no input
    /// validation, no outbound coercion, and no defaults.
    fn input_schema(&self) -> &str {
        ""
    }

    /// Line-schema text for the response document. Empty means no output
    /// validation and no inbound coercion.
    fn output_schema(&self) -> &str {
        ""
    }

    fn name(&self) -> Option<&str> {
        None
    }

    fn description(&self) -> Option<&str> {
        None
    }
}

/// A request instance: the serialized fields form the request document.
pub trait ClientRequest: RouteSource + Serialize + Send + Sync {
    /// The decoded response type.
    type Output: ClientOutput + DeserializeOwned + Send;

    /// Context for this call. Defaults to a fresh, uncancelled context.
    fn context(&self) -> CallContext {
        CallContext::new()
    }
}

/// The success predicate of a decoded response.
///
/// Runs only after every other stage of the call succeeded; a returned
/// error becomes the call's result.
pub trait ClientOutput {
    fn business_error(&self) -> Option<BusinessError> {
        None
    }
}

impl ClientOutput for Value {}

impl ClientOutput for () {}
