//! # linecall-transport
//!
//! Reference [`Transport`](linecall_core::Transport) adapters for the
//! linecall pipeline:
//!
//! - [`HttpTransport`]: a generic HTTP client rooted at a base URL. Read-style
//!   methods send the request document as query pairs.
//! - [`MeshTransport`]: a service-mesh invoker that resolves live instances
//!   of a logical service and picks one round-robin.
//!
//! Both honour the call context (cancellation and deadline) before and
//! during the request, report non-2xx answers as
//! [`TransportError::Status`](linecall_core::TransportError::Status), and
//! never retry.

mod client;
pub mod config;
pub mod form;
pub mod http;
pub mod mesh;

pub use config::{ConfigError, HttpTransportConfig, MeshTransportConfig, DEFAULT_TIMEOUT_SECS};
pub use form::query_pairs;
pub use http::HttpTransport;
pub use mesh::{InstanceResolver, MeshTransport, StaticResolver, MESH_SERVICE_HEADER, REQUEST_ID_HEADER};
