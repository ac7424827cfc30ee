//! # Transport Port
//!
//! The [`Transport`] trait is the single network seam of the pipeline:
//! `(context, method, path, body) -> response bytes`. Everything before and
//! after it is synchronous, in-memory work.
//!
//! ## Contract for implementations
//!
//! - Honour the [`CallContext`]: an already-cancelled or expired context must
//!   not reach the network, and cancellation during the request aborts it.
//!   [`CallContext::guard`] implements both.
//! - Choose the body encoding per method (query form for read-style methods,
//!   verbatim body for write-style methods) where the wire protocol needs it.
//! - Never swallow a non-2xx response: return [`TransportError::Status`]
//!   with the status code and raw body.
//!
//! Implementations must be `Send + Sync` so they can be shared across async
//! tasks behind an `Arc`. The trait is object-safe to support runtime
//! adapter selection.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::context::CallContext;
use crate::route::HttpMethod;

/// Errors produced by a transport adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The call context was cancelled before or during the request.
    #[error("call cancelled")]
    Cancelled,

    /// The call context deadline passed before the response arrived.
    #[error("call deadline exceeded")]
    DeadlineExceeded,

    /// The remote side answered with a non-success status.
    #[error("remote returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body (lossy UTF-8).
        body: String,
    },

    /// The request could not be delivered or the response could not be read.
    #[error("connection to {endpoint} failed: {reason}")]
    Connection {
        /// Method and URL of the failed request.
        endpoint: String,
        /// Underlying client error.
        reason: String,
    },

    /// The body could not be encoded for this method.
    #[error("cannot encode request body: {0}")]
    Encoding(String),

    /// No live instance is available for the target service.
    #[error("service {service} unavailable: {reason}")]
    Unavailable {
        /// Logical service name.
        service: String,
        /// Why no instance could be selected.
        reason: String,
    },
}

impl TransportError {
    /// Returns `true` for cancellation-flavoured failures.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// HTTP status, when the remote side answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body, when the remote side answered.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Performs the network call for one pipeline invocation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `body` to `path` with `method`, returning the raw response body.
    async fn send(
        &self,
        ctx: &CallContext,
        method: HttpMethod,
        path: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError>;

    /// Short adapter name used in log fields.
    fn name(&self) -> &str {
        "transport"
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(
        &self,
        ctx: &CallContext,
        method: HttpMethod,
        path: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        (**self).send(ctx, method, path, body).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A [`Transport`] backed by an async closure.
///
/// The closure receives owned copies of the call arguments; the call is run
/// through [`CallContext::guard`], so closures get cancellation handling for
/// free.
pub struct FnTransport<F> {
    f: F,
}

impl<F> std::fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTransport").finish_non_exhaustive()
    }
}

/// Wrap an async closure as a [`Transport`].
pub fn transport_fn<F, Fut>(f: F) -> FnTransport<F>
where
    F: Fn(CallContext, HttpMethod, String, Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>, TransportError>> + Send + 'static,
{
    FnTransport { f }
}

#[async_trait]
impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(CallContext, HttpMethod, String, Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>, TransportError>> + Send + 'static,
{
    async fn send(
        &self,
        ctx: &CallContext,
        method: HttpMethod,
        path: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        ctx.guard(async { (self.f)(ctx.clone(), method, path.to_string(), body).await })
            .await
    }

    fn name(&self) -> &str {
        "fn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closure_transport_receives_arguments() {
        let transport = transport_fn(|ctx, method, path, body| async move {
            assert_eq!(ctx.content_type(), "application/json");
            assert_eq!(method, HttpMethod::Post);
            assert_eq!(path, "/orders");
            Ok(body)
        });
        let out = transport
            .send(&CallContext::new(), HttpMethod::Post, "/orders", b"{}".to_vec())
            .await
            .unwrap();
        assert_eq!(out, b"{}");
    }

    #[tokio::test]
    async fn closure_transport_honours_cancelled_context() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let invoked = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invoked);
        let transport = transport_fn(move |_, _, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(b"unreachable".to_vec()) }
        });
        let ctx = CallContext::new();
        ctx.cancel();
        let err = transport
            .send(&ctx, HttpMethod::Get, "/users", Vec::new())
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
        assert_eq!(invoked.load(Ordering::SeqCst), 0, "closure must not be called");
    }

    #[tokio::test]
    async fn arc_dyn_transport_delegates() {
        let transport: Arc<dyn Transport> =
            Arc::new(transport_fn(|_, _, _, _| async { Ok(b"ok".to_vec()) }));
        let out = transport
            .send(&CallContext::new(), HttpMethod::Get, "/", Vec::new())
            .await
            .unwrap();
        assert_eq!(out, b"ok");
        assert_eq!(transport.name(), "fn");
    }

    #[test]
    fn status_error_exposes_status_and_body() {
        let err = TransportError::Status {
            status: 500,
            body: r#"{"msg":"fail"}"#.into(),
        };
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.body(), Some(r#"{"msg":"fail"}"#));
        assert!(!err.is_cancellation());
        assert!(err.to_string().contains("500"));
    }
}
