//! # Generic HTTP Transport
//!
//! Sends each call to `base_url + path` with `reqwest`. Read-style methods
//! (`GET`, `HEAD`, `DELETE`, `OPTIONS`) carry the request document as query
//! pairs; write-style methods send the body bytes verbatim.
//!
//! The adapter is `Send + Sync` and meant to be shared behind an `Arc`.
//! Retries are not built in.

use async_trait::async_trait;
use linecall_core::{CallContext, HttpMethod, Transport, TransportError};

use crate::client::{build_client, dispatch, reqwest_method, with_context_headers};
use crate::config::{ConfigError, HttpTransportConfig};
use crate::form::query_pairs;

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport from configuration.
    pub fn new(config: &HttpTransportConfig) -> Result<Self, ConfigError> {
        let client = build_client(config.timeout_secs, config.api_token.as_ref())?;
        Ok(Self::with_client(client, config.base_url.as_str()))
    }

    /// Wrap an existing client. `base_url` may carry a trailing slash.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        ctx: &CallContext,
        method: HttpMethod,
        path: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let endpoint = format!("{method} {url}");

        ctx.guard(async {
            let request = with_context_headers(self.client.request(reqwest_method(method), &url), ctx);
            let request = if method.is_read_style() {
                request.query(&query_pairs(&body)?)
            } else {
                request.body(body)
            };
            tracing::debug!(endpoint = %endpoint, "sending request");
            dispatch(request, &endpoint).await
        })
        .await
    }

    fn name(&self) -> &str {
        "http"
    }
}
