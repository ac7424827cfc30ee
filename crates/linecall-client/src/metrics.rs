//! # Call Metrics
//!
//! In-process counters, one per call outcome. Cloning shares the counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{CallError, Disposition};

/// Shared call counters.
#[derive(Debug, Clone, Default)]
pub struct CallMetrics {
    calls: Arc<AtomicU64>,
    succeeded: Arc<AtomicU64>,
    never_sent: Arc<AtomicU64>,
    rejected: Arc<AtomicU64>,
    business_failures: Arc<AtomicU64>,
}

/// Point-in-time copy of [`CallMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub calls: u64,
    pub succeeded: u64,
    pub never_sent: u64,
    pub rejected: u64,
    pub business_failures: u64,
}

impl CallMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished call.
    pub fn record<T>(&self, result: &Result<T, CallError>) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let counter = match result {
            Ok(_) => &self.succeeded,
            Err(e) => match e.disposition() {
                Disposition::NeverSent => &self.never_sent,
                Disposition::Rejected => &self.rejected,
                Disposition::LogicallyFailed => &self.business_failures,
            },
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calls: self.calls(),
            succeeded: self.succeeded(),
            never_sent: self.never_sent.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            business_failures: self.business_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BusinessError;
    use linecall_core::{Route, TransportError};

    #[test]
    fn outcomes_land_in_their_counters() {
        let metrics = CallMetrics::new();
        let shared = metrics.clone();
        let route = Route::get("/users").key().unwrap();

        metrics.record::<()>(&Ok(()));
        metrics.record::<()>(&Err(CallError::RouteNotFound {
            route: "x".into(),
            reason: "y".into(),
        }));
        metrics.record::<()>(&Err(CallError::Transport {
            route: route.clone(),
            source: TransportError::DeadlineExceeded,
        }));
        metrics.record::<()>(&Err(CallError::Business {
            route,
            error: BusinessError::new("no"),
        }));

        assert_eq!(
            shared.snapshot(),
            MetricsSnapshot {
                calls: 4,
                succeeded: 1,
                never_sent: 1,
                rejected: 1,
                business_failures: 1,
            }
        );
    }
}
