//! Shared `reqwest` plumbing for the HTTP-based adapters.

use std::time::Duration;

use linecall_core::{CallContext, HttpMethod, TransportError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use zeroize::Zeroizing;

use crate::config::ConfigError;

/// Build a client with the request timeout and optional bearer token.
pub(crate) fn build_client(
    timeout_secs: u64,
    api_token: Option<&Zeroizing<String>>,
) -> Result<reqwest::Client, ConfigError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = api_token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
            .map_err(|_| ConfigError::Client("invalid API token characters".into()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .default_headers(headers)
        .build()
        .map_err(|e| ConfigError::Client(e.to_string()))
}

pub(crate) fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}

/// Set the content type and forward the context's extra headers.
pub(crate) fn with_context_headers(
    mut request: reqwest::RequestBuilder,
    ctx: &CallContext,
) -> reqwest::RequestBuilder {
    request = request.header(CONTENT_TYPE, ctx.content_type());
    for (name, value) in ctx.headers() {
        request = request.header(name.as_str(), value.as_str());
    }
    request
}

/// Send `request` and read the whole response body.
///
/// Non-2xx answers become [`TransportError::Status`] carrying the raw body.
pub(crate) async fn dispatch(
    request: reqwest::RequestBuilder,
    endpoint: &str,
) -> Result<Vec<u8>, TransportError> {
    let resp = request
        .send()
        .await
        .map_err(|e| request_error(endpoint, e))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(endpoint, status = status.as_u16(), "remote returned error status");
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = resp
        .bytes()
        .await
        .map_err(|e| request_error(endpoint, e))?;
    tracing::debug!(endpoint, status = status.as_u16(), bytes = bytes.len(), "response received");
    Ok(bytes.to_vec())
}

fn request_error(endpoint: &str, e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::DeadlineExceeded
    } else if e.is_builder() {
        TransportError::Encoding(format!("{endpoint}: {e}"))
    } else {
        TransportError::Connection {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        }
    }
}
