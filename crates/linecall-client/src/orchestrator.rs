//! # Request Orchestrator
//!
//! Runs one call through the fixed pipeline:
//!
//! 1. serialize the request to a JSON document
//! 2. merge the route's defaults (gaps only)
//! 3. apply the outbound format path
//! 4. validate against the input schema
//! 5. send through the transport
//! 6. validate the raw response against the output schema
//! 7. apply the inbound format path
//! 8. decode into the request's output type
//! 9. ask the output for a business error
//!
//! Every step short-circuits on failure, and each failure is reported as a
//! distinct [`CallError`] variant. Nothing is retried. Only step 5 suspends
//! or observes the call context; the orchestrator imposes no timeout of
//! its own.

use std::any::type_name;
use std::sync::Arc;

use linecall_core::{Direction, RouteKey, Transport};
use linecall_schema::{FormatError, ValidationError};
use serde_json::Value;
use tracing::Instrument;

use crate::descriptor::ClientDescriptor;
use crate::error::CallError;
use crate::metrics::CallMetrics;
use crate::registry::Registry;
use crate::request::{ClientOutput, ClientRequest};

/// A registry and a transport bound together, with call counters.
#[derive(Clone)]
pub struct Orchestrator {
    registry: Arc<Registry>,
    transport: Arc<dyn Transport>,
    metrics: CallMetrics,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("transport", &self.transport.name())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

impl Orchestrator {
    pub fn new(registry: Arc<Registry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
            metrics: CallMetrics::new(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn metrics(&self) -> &CallMetrics {
        &self.metrics
    }

    /// Execute `request` and return its decoded output.
    pub async fn execute<R: ClientRequest>(&self, request: &R) -> Result<R::Output, CallError> {
        let result = execute(&self.registry, request, self.transport.as_ref()).await;
        self.metrics.record(&result);
        result
    }
}

/// Execute `request` against `registry` over `transport`.
///
/// The descriptor for the request's route is built on first use (subject to
/// the registry's [`BuildPolicy`](crate::BuildPolicy)).
pub async fn execute<R: ClientRequest>(
    registry: &Registry,
    request: &R,
    transport: &dyn Transport,
) -> Result<R::Output, CallError> {
    let descriptor = registry.get_or_build(request).map_err(|e| {
        tracing::warn!(route = e.route(), stage = e.stage(), error = %e, "call failed");
        e
    })?;
    let key = descriptor.key().clone();
    let span = tracing::debug_span!("call", route = %key, transport = transport.name());

    let result = run(&descriptor, &key, request, transport)
        .instrument(span)
        .await;
    if let Err(e) = &result {
        log_failure(&key, e);
    }
    result
}

async fn run<R: ClientRequest>(
    descriptor: &ClientDescriptor,
    key: &RouteKey,
    request: &R,
    transport: &dyn Transport,
) -> Result<R::Output, CallError> {
    let format = |direction: Direction| {
        move |source: FormatError| CallError::Format {
            route: key.clone(),
            direction,
            source,
        }
    };
    let validation = |direction: Direction| {
        move |source: ValidationError| CallError::Validation {
            route: key.clone(),
            direction,
            source,
        }
    };

    let input = serde_json::to_value(request)
        .map_err(|e| codec_error("serialize", type_name::<R>(), &e))
        .map_err(format(Direction::Outbound))?;
    tracing::debug!(document = %input, "input");
    if let Some(defaults) = descriptor.defaults() {
        tracing::debug!(document = %defaults, "default json");
    }

    let merged = descriptor
        .merge_defaults(input)
        .map_err(format(Direction::Outbound))?;
    tracing::debug!(document = %merged, "merged input");

    let formatted = descriptor
        .format_as_input(merged)
        .map_err(format(Direction::Outbound))?;
    tracing::debug!(document = %formatted, "formatted input");

    descriptor
        .validate_input(&formatted)
        .map_err(validation(Direction::Outbound))?;

    let body = serde_json::to_vec(&formatted)
        .map_err(|e| codec_error("serialize", "request document", &e))
        .map_err(format(Direction::Outbound))?;
    let route = request.route();
    let ctx = request.context();
    let raw = transport
        .send(&ctx, route.method, &route.path, body)
        .await
        .map_err(|source| CallError::Transport {
            route: key.clone(),
            source,
        })?;

    let original = parse_response(&raw).map_err(format(Direction::Inbound))?;
    tracing::debug!(document = %original, "original output");

    descriptor
        .validate_output(&original)
        .map_err(validation(Direction::Inbound))?;

    let typed = descriptor
        .format_as_output(original)
        .map_err(format(Direction::Inbound))?;
    tracing::debug!(document = %typed, "output");

    let output: R::Output = serde_json::from_value(typed)
        .map_err(|e| codec_error("decode", type_name::<R::Output>(), &e))
        .map_err(format(Direction::Inbound))?;

    match output.business_error() {
        Some(error) => Err(CallError::Business {
            route: key.clone(),
            error,
        }),
        None => Ok(output),
    }
}

/// Response bytes to a document. An empty body is `null`.
fn parse_response(raw: &[u8]) -> Result<Value, FormatError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(raw)
        .map_err(|e| FormatError::MalformedDocument(format!("response is not JSON: {e}")))
}

fn codec_error(action: &'static str, type_name: &'static str, e: &serde_json::Error) -> FormatError {
    FormatError::Codec {
        action,
        type_name,
        reason: e.to_string(),
    }
}

fn log_failure(key: &RouteKey, e: &CallError) {
    match e {
        CallError::Business { error, .. } => {
            tracing::info!(route = %key, code = ?error.code, message = %error.message, "call reported business error");
        }
        _ => {
            tracing::warn!(route = %key, stage = e.stage(), disposition = ?e.disposition(), error = %e, "call failed");
        }
    }
}
