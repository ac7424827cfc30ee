//! # linecall-client — Descriptor Registry & Request Orchestrator
//!
//! The call pipeline. A client type implements [`RouteSource`] and
//! [`ClientRequest`]; the [`Registry`] compiles its schemas into a
//! [`ClientDescriptor`] once per route; [`execute`] (or an [`Orchestrator`])
//! runs each call through validate, format, dispatch, validate, format,
//! decode, and the output's own [`ClientOutput::business_error`] predicate.
//!
//! ## Error Surface
//!
//! Every call yields at most one [`CallError`]. Its
//! [`disposition`](CallError::disposition) tells whether the request was
//! never sent, sent and rejected, or accepted but logically failed.
//!
//! ## Crate Policy
//!
//! - Depends on `linecall-core` and `linecall-schema` only; transports are
//!   injected through [`linecall_core::Transport`].
//! - No retries, no timeouts: both belong to the caller and its context.

pub mod descriptor;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod registry;
pub mod request;

pub use descriptor::ClientDescriptor;
pub use error::{BusinessError, CallError, Disposition};
pub use metrics::{CallMetrics, MetricsSnapshot};
pub use orchestrator::{execute, Orchestrator};
pub use registry::{BuildPolicy, Registry};
pub use request::{ClientOutput, ClientRequest, RouteSource};
