//! # Service-Mesh Transport
//!
//! Addresses a logical service name instead of a fixed base URL. An
//! [`InstanceResolver`] returns the live instances of the service on every
//! call and the transport picks one round-robin. The request body is sent
//! verbatim for every method, and each request carries `x-mesh-service`
//! and a fresh `x-request-id`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use linecall_core::{CallContext, HttpMethod, Transport, TransportError};
use url::Url;

use crate::client::{build_client, dispatch, reqwest_method, with_context_headers};
use crate::config::{ConfigError, MeshTransportConfig};

/// Header naming the logical target service.
pub const MESH_SERVICE_HEADER: &str = "x-mesh-service";
/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Looks up the live instances of a service.
#[async_trait]
pub trait InstanceResolver: Send + Sync {
    async fn resolve(&self, service: &str) -> Result<Vec<Url>, TransportError>;
}

/// A fixed instance list, typically from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    instances: Vec<Url>,
}

impl StaticResolver {
    pub fn new(instances: Vec<Url>) -> Self {
        Self { instances }
    }
}

#[async_trait]
impl InstanceResolver for StaticResolver {
    async fn resolve(&self, _service: &str) -> Result<Vec<Url>, TransportError> {
        Ok(self.instances.clone())
    }
}

pub struct MeshTransport {
    client: reqwest::Client,
    service: String,
    resolver: Arc<dyn InstanceResolver>,
    next: AtomicUsize,
}

impl std::fmt::Debug for MeshTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshTransport")
            .field("service", &self.service)
            .field("next", &self.next.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl MeshTransport {
    /// A transport over the configured static instance list.
    pub fn new(config: &MeshTransportConfig) -> Result<Self, ConfigError> {
        let client = build_client(config.timeout_secs, config.api_token.as_ref())?;
        Ok(Self::with_resolver(
            client,
            config.service.clone(),
            Arc::new(StaticResolver::new(config.instances.clone())),
        ))
    }

    pub fn with_resolver(
        client: reqwest::Client,
        service: impl Into<String>,
        resolver: Arc<dyn InstanceResolver>,
    ) -> Self {
        Self {
            client,
            service: service.into(),
            resolver,
            next: AtomicUsize::new(0),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    async fn pick_instance(&self) -> Result<Url, TransportError> {
        let mut instances = self.resolver.resolve(&self.service).await?;
        if instances.is_empty() {
            return Err(TransportError::Unavailable {
                service: self.service.clone(),
                reason: "no live instances".into(),
            });
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % instances.len();
        Ok(instances.swap_remove(index))
    }
}

#[async_trait]
impl Transport for MeshTransport {
    async fn send(
        &self,
        ctx: &CallContext,
        method: HttpMethod,
        path: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        ctx.guard(async {
            let instance = self.pick_instance().await?;
            let url = format!("{}{}", instance.as_str().trim_end_matches('/'), path);
            let endpoint = format!("{method} {url}");
            let request_id = uuid::Uuid::new_v4().to_string();

            let request = with_context_headers(self.client.request(reqwest_method(method), &url), ctx)
                .header(MESH_SERVICE_HEADER, self.service.as_str())
                .header(REQUEST_ID_HEADER, request_id.as_str())
                .body(body);

            tracing::debug!(service = %self.service, endpoint = %endpoint, request_id = %request_id, "invoking instance");
            dispatch(request, &endpoint).await
        })
        .await
    }

    fn name(&self) -> &str {
        "mesh"
    }
}
