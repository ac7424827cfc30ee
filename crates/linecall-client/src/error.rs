//! # Call Errors
//!
//! A call returns exactly one [`CallError`], whose variant names the stage
//! that failed. [`CallError::disposition`] folds the variants into the three
//! outcomes a caller usually branches on: never sent, sent but rejected, and
//! sent and accepted but logically failed.

use linecall_core::{Direction, RouteKey, TransportError};
use linecall_schema::{FormatError, SchemaCompilationError, ValidationError};
use thiserror::Error;

/// A logical failure reported by a decoded response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BusinessError {
    /// Application-defined error code, when the response carries one.
    pub code: Option<String>,
    pub message: String,
}

impl BusinessError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// Where a failed call stopped, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Failed before the transport was invoked.
    NeverSent,
    /// Sent, but the transport failed or the response broke its contract.
    Rejected,
    /// The call completed but the response reports a business error.
    LogicallyFailed,
}

/// The single error value of one pipeline call.
#[derive(Error, Debug)]
pub enum CallError {
    /// No usable descriptor: the route is invalid or not registered.
    #[error("route {route} not found: {reason}")]
    RouteNotFound { route: String, reason: String },

    /// The route's schema text did not compile. Never cached.
    #[error("{direction} schema for {route} failed to compile: {source}")]
    SchemaCompilation {
        route: RouteKey,
        direction: Direction,
        source: SchemaCompilationError,
    },

    /// A document failed its schema.
    #[error("{direction} validation failed for {route}: {source}")]
    Validation {
        route: RouteKey,
        direction: Direction,
        source: ValidationError,
    },

    /// Serialization, default merge, format conversion or decoding failed.
    #[error("{direction} format conversion failed for {route}: {source}")]
    Format {
        route: RouteKey,
        direction: Direction,
        source: FormatError,
    },

    /// The transport failed, was cancelled, or the remote returned non-2xx.
    #[error("transport failed for {route}: {source}")]
    Transport {
        route: RouteKey,
        source: TransportError,
    },

    /// Every stage succeeded but the decoded output reports failure.
    #[error("{route} reported a business error{}: {error}", code_suffix(.error))]
    Business { route: RouteKey, error: BusinessError },
}

fn code_suffix(error: &BusinessError) -> String {
    error
        .code
        .as_deref()
        .map(|c| format!(" [{c}]"))
        .unwrap_or_default()
}

impl CallError {
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::RouteNotFound { .. } | Self::SchemaCompilation { .. } => Disposition::NeverSent,
            Self::Validation { direction, .. } | Self::Format { direction, .. } => match direction {
                Direction::Outbound => Disposition::NeverSent,
                Direction::Inbound => Disposition::Rejected,
            },
            Self::Transport { .. } => Disposition::Rejected,
            Self::Business { .. } => Disposition::LogicallyFailed,
        }
    }

    /// The route the call was made on, as text.
    pub fn route(&self) -> &str {
        match self {
            Self::RouteNotFound { route, .. } => route,
            Self::SchemaCompilation { route, .. }
            | Self::Validation { route, .. }
            | Self::Format { route, .. }
            | Self::Transport { route, .. }
            | Self::Business { route, .. } => route.as_str(),
        }
    }

    /// Returns `true` if the call was cancelled or ran out of time.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_cancellation())
    }

    /// Short stage label for log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::RouteNotFound { .. } => "route",
            Self::SchemaCompilation { .. } => "compile",
            Self::Validation { .. } => "validate",
            Self::Format { .. } => "format",
            Self::Transport { .. } => "transport",
            Self::Business { .. } => "business",
        }
    }
}
