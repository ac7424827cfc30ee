//! # Descriptor Registry
//!
//! A concurrency-safe, append-only map from [`RouteKey`] to
//! [`ClientDescriptor`]. Each registry is an explicit object: hosts create
//! one at start-up, register their routes, and hand it to an orchestrator.
//! Independent registries share nothing.
//!
//! ## Invariants
//!
//! - A descriptor is compiled at most once per key. Concurrent first
//!   callers on the same key wait for a single build (single flight).
//! - The first source seen for a route wins; later sources declaring
//!   different schema text reuse the published descriptor.
//! - A failed compilation publishes nothing, so the next call retries.
//! - Published descriptors are never replaced or removed.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use linecall_core::RouteKey;
use linecall_schema::{LineSchemaCompiler, SchemaCompiler};

use crate::descriptor::ClientDescriptor;
use crate::error::CallError;
use crate::request::RouteSource;

/// How the registry treats calls on routes it has not seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildPolicy {
    /// Compile on first use.
    #[default]
    Lazy,
    /// Only routes passed to [`Registry::register`] may be called.
    RegisteredOnly,
}

/// Route key to compiled descriptor.
pub struct Registry {
    compiler: Arc<dyn SchemaCompiler>,
    policy: BuildPolicy,
    descriptors: DashMap<RouteKey, Arc<ClientDescriptor>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("policy", &self.policy)
            .field("routes", &self.descriptors.len())
            .finish_non_exhaustive()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(Arc::new(LineSchemaCompiler))
    }
}

impl Registry {
    pub fn new(compiler: Arc<dyn SchemaCompiler>) -> Self {
        Self {
            compiler,
            policy: BuildPolicy::default(),
            descriptors: DashMap::new(),
        }
    }

    pub fn with_policy(mut self, policy: BuildPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> BuildPolicy {
        self.policy
    }

    /// Compile and publish the descriptor for `source`'s route.
    ///
    /// Registering an already-known route is a no-op returning the existing
    /// descriptor.
    pub fn register(&self, source: &dyn RouteSource) -> Result<Arc<ClientDescriptor>, CallError> {
        let key = route_key(source)?;
        self.build_once(key, source)
    }

    /// Look up a published descriptor.
    pub fn get(&self, key: &RouteKey) -> Option<Arc<ClientDescriptor>> {
        self.descriptors.get(key).map(|d| Arc::clone(d.value()))
    }

    /// Return the descriptor for `source`'s route, compiling it on a miss
    /// when the policy allows.
    ///
    /// # Errors
    ///
    /// - [`CallError::RouteNotFound`] if the route is invalid, or unknown
    ///   under [`BuildPolicy::RegisteredOnly`].
    /// - [`CallError::SchemaCompilation`] if the schema text is malformed.
    pub fn get_or_build(&self, source: &dyn RouteSource) -> Result<Arc<ClientDescriptor>, CallError> {
        let key = route_key(source)?;
        if let Some(descriptor) = self.get(&key) {
            return Ok(descriptor);
        }
        if self.policy == BuildPolicy::RegisteredOnly {
            return Err(CallError::RouteNotFound {
                route: key.to_string(),
                reason: "route was not registered".into(),
            });
        }
        self.build_once(key, source)
    }

    fn build_once(
        &self,
        key: RouteKey,
        source: &dyn RouteSource,
    ) -> Result<Arc<ClientDescriptor>, CallError> {
        // The entry guard is held while compiling, so racing builders on the
        // same key block until the first one publishes or fails.
        let entry = self.descriptors.entry(key.clone()).or_try_insert_with(|| {
            let descriptor = ClientDescriptor::build(key.clone(), source, self.compiler.as_ref())
                .map_err(|e| {
                    tracing::warn!(route = %key, error = %e, "descriptor compilation failed");
                    e
                })?;
            tracing::info!(
                route = %key,
                input = descriptor.input_validator().is_some(),
                output = descriptor.output_validator().is_some(),
                "descriptor published"
            );
            Ok::<_, CallError>(Arc::new(descriptor))
        })?;
        Ok(Arc::clone(entry.value()))
    }

    /// All published descriptors, sorted by route key.
    pub fn routes(&self) -> Vec<Arc<ClientDescriptor>> {
        let mut routes: Vec<_> = self
            .descriptors
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        routes.sort_by(|a, b| a.key().cmp(b.key()));
        routes
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

fn route_key(source: &dyn RouteSource) -> Result<RouteKey, CallError> {
    let route = source.route();
    route.key().map_err(|e| CallError::RouteNotFound {
        route: route.to_string(),
        reason: e.to_string(),
    })
}
