//! # Call Context
//!
//! Per-call state that travels from the caller into the transport adapter:
//! cancellation, deadline, content type, and extra request headers.
//!
//! The orchestrator never imposes a timeout of its own. Deadlines set here
//! are enforced by [`CallContext::guard`], which every adapter wraps its
//! network future in.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::transport::TransportError;

/// Content type used when the caller does not override it.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Cancellable context for a single call.
///
/// Cloning a context shares its cancellation token: cancelling any clone
/// cancels the call.
#[derive(Debug, Clone)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    content_type: Option<String>,
    headers: BTreeMap<String, String>,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CallContext {
    /// A context with a fresh cancellation token, no deadline, and the
    /// default content type.
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
            content_type: None,
            headers: BTreeMap::new(),
        }
    }

    /// Use an externally owned token (e.g. a child of a server shutdown token).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Set an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Override the request content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add a header forwarded by transport adapters.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Content type for this call; [`DEFAULT_CONTENT_TYPE`] when unset or blank.
    pub fn content_type(&self) -> &str {
        match self.content_type.as_deref() {
            Some(ct) if !ct.trim().is_empty() => ct,
            _ => DEFAULT_CONTENT_TYPE,
        }
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel the call. In-flight transport futures observe this promptly.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns `true` if a deadline is set and has already passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Run a transport future under this context.
    ///
    /// Fails fast with [`TransportError::Cancelled`] or
    /// [`TransportError::DeadlineExceeded`] if the context is already done,
    /// and aborts the future if cancellation or the deadline fires while it
    /// is pending.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        if self.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        if self.is_expired() {
            return Err(TransportError::DeadlineExceeded);
        }

        let bounded = async {
            match self.deadline {
                Some(deadline) => {
                    tokio::time::timeout_at(tokio::time::Instant::from_std(deadline), fut)
                        .await
                        .map_err(|_| TransportError::DeadlineExceeded)?
                }
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TransportError::Cancelled),
            result = bounded => result,
        }
    }
}
