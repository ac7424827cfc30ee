//! # linecall-core — Foundational Types for the Call Pipeline
//!
//! Defines the primitives every other `linecall-*` crate builds on. It
//! depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Routes are values.** A [`Route`] is a method plus a path; its
//!    [`RouteKey`] is derived deterministically with the method lower-cased,
//!    so `GET /users` and `get /users` address the same descriptor.
//!
//! 2. **One port for the network.** The [`Transport`] trait is the only
//!    suspension point of a call. Concrete adapters live in
//!    `linecall-transport`; tests plug in closures via [`transport_fn`].
//!
//! 3. **Cancellation travels with the call.** [`CallContext`] carries the
//!    cancellation token, optional deadline, content type, and extra headers.
//!    Adapters run their network future through [`CallContext::guard`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `linecall-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod context;
pub mod direction;
pub mod route;
pub mod transport;

pub use context::{CallContext, DEFAULT_CONTENT_TYPE};
pub use direction::Direction;
pub use route::{HttpMethod, Route, RouteError, RouteKey};
pub use transport::{transport_fn, FnTransport, Transport, TransportError};
