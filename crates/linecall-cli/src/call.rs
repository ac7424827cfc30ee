//! # Call Subcommand
//!
//! `linecall call <manifest> <route-name> --body '{...}'` runs one request
//! through the full pipeline and prints the decoded response.
//!
//! The transport is a service-mesh invoker when a mesh service is named
//! (`--mesh-service` or `LINECALL_MESH_SERVICE`) and a plain HTTP client
//! otherwise. Transport settings load from the `LINECALL_*` environment
//! variables; flags override them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use linecall_client::{ClientRequest, Disposition, Orchestrator, Registry, RouteSource};
use linecall_core::{CallContext, Route, Transport};
use linecall_transport::{
    ConfigError, HttpTransport, HttpTransportConfig, MeshTransport, MeshTransportConfig,
};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::manifest::{Manifest, RouteSpec};

/// Arguments for `linecall call`.
#[derive(Args, Debug, Clone)]
pub struct CallArgs {
    /// Route manifest (YAML).
    pub manifest: PathBuf,

    /// Name of the route to call.
    pub route: String,

    /// Request document as JSON.
    #[arg(long, default_value = "{}")]
    pub body: String,

    /// Base URL for the HTTP transport [default: $LINECALL_BASE_URL].
    #[arg(long)]
    pub base_url: Option<String>,

    /// Logical service name; selects the mesh transport
    /// [default: $LINECALL_MESH_SERVICE].
    #[arg(long)]
    pub mesh_service: Option<String>,

    /// Mesh instance URL. Repeat or comma separate for several
    /// [default: $LINECALL_MESH_INSTANCES].
    #[arg(long = "instance", value_delimiter = ',')]
    pub instances: Vec<String>,

    /// Bearer token [default: $LINECALL_API_TOKEN].
    #[arg(long)]
    pub token: Option<String>,

    /// Client request timeout in seconds [default: $LINECALL_TIMEOUT_SECS or 30].
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Deadline for the whole call, in milliseconds.
    #[arg(long)]
    pub deadline_ms: Option<u64>,

    /// Content-Type sent with the request.
    #[arg(long)]
    pub content_type: Option<String>,

    /// Extra header as `name:value`. Repeatable.
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

/// A request assembled at run time from a manifest entry and a JSON body.
#[derive(Debug, Clone)]
pub struct DynamicRequest {
    spec: RouteSpec,
    body: Value,
    ctx: CallContext,
}

impl DynamicRequest {
    pub fn new(spec: RouteSpec, body: Value, ctx: CallContext) -> Self {
        Self { spec, body, ctx }
    }
}

impl Serialize for DynamicRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.body.serialize(serializer)
    }
}

impl RouteSource for DynamicRequest {
    fn route(&self) -> Route {
        self.spec.route()
    }

    fn input_schema(&self) -> &str {
        self.spec.input_schema()
    }

    fn output_schema(&self) -> &str {
        self.spec.output_schema()
    }

    fn name(&self) -> Option<&str> {
        self.spec.name()
    }

    fn description(&self) -> Option<&str> {
        self.spec.description()
    }
}

impl ClientRequest for DynamicRequest {
    type Output = Value;

    fn context(&self) -> CallContext {
        self.ctx.clone()
    }
}

/// Execute the call subcommand. Cancels the call on Ctrl-C.
pub async fn run_call(args: &CallArgs) -> Result<u8> {
    let manifest = Manifest::load(&args.manifest)?;
    let spec = manifest
        .find(&args.route)
        .cloned()
        .ok_or_else(|| anyhow!("route {:?} is not declared in {}", args.route, args.manifest.display()))?;
    let body: Value = serde_json::from_str(&args.body).context("--body is not valid JSON")?;

    let ctx = call_context(args);
    let cancel = ctx.cancellation().clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; cancelling call");
            cancel.cancel();
        }
    });

    let registry = Arc::new(Registry::default());
    let orchestrator = Orchestrator::new(registry, build_transport(args)?);
    let result = orchestrator
        .execute(&DynamicRequest::new(spec, body, ctx))
        .await;
    interrupt.abort();

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(0)
        }
        Err(e) => {
            tracing::error!(route = e.route(), stage = e.stage(), "{e}");
            eprintln!("error: {e}");
            Ok(exit_code(e.disposition()))
        }
    }
}

/// Process exit code for a failed call.
pub fn exit_code(disposition: Disposition) -> u8 {
    match disposition {
        Disposition::NeverSent => 2,
        Disposition::Rejected => 3,
        Disposition::LogicallyFailed => 4,
    }
}

fn call_context(args: &CallArgs) -> CallContext {
    let mut ctx = CallContext::new();
    if let Some(ms) = args.deadline_ms {
        ctx = ctx.with_timeout(Duration::from_millis(ms));
    }
    if let Some(content_type) = &args.content_type {
        ctx = ctx.with_content_type(content_type.clone());
    }
    for (name, value) in &args.headers {
        ctx = ctx.with_header(name.clone(), value.clone());
    }
    ctx
}

/// Pick and configure the transport: environment first, flags on top.
pub fn build_transport(args: &CallArgs) -> Result<Arc<dyn Transport>> {
    if let Some(config) = mesh_config(args)? {
        tracing::debug!(?config, "using mesh transport");
        return Ok(Arc::new(MeshTransport::new(&config)?));
    }

    let mut config = HttpTransportConfig::from_env_with(args.base_url.as_deref()).context(
        "either --base-url (LINECALL_BASE_URL) or --mesh-service (LINECALL_MESH_SERVICE) is required",
    )?;
    if let Some(secs) = args.timeout_secs {
        config = config.with_timeout_secs(secs);
    }
    if let Some(token) = &args.token {
        config = config.with_token(token.clone());
    }
    tracing::debug!(?config, "using http transport");
    Ok(Arc::new(HttpTransport::new(&config)?))
}

/// Mesh configuration, or `None` when no mesh service is named.
fn mesh_config(args: &CallArgs) -> Result<Option<MeshTransportConfig>> {
    let instances: Vec<&str> = args.instances.iter().map(String::as_str).collect();
    let mut config =
        match MeshTransportConfig::from_env_with(args.mesh_service.as_deref(), &instances) {
            Ok(config) => config,
            Err(ConfigError::Missing(_)) if args.mesh_service.is_none() => return Ok(None),
            Err(e) => return Err(e.into()),
        };
    if let Some(secs) = args.timeout_secs {
        config.timeout_secs = secs;
    }
    if let Some(token) = &args.token {
        config = config.with_token(token.clone());
    }
    Ok(Some(config))
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected name:value, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("header name is empty".into());
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use linecall_core::HttpMethod;

    fn args() -> CallArgs {
        CallArgs {
            manifest: PathBuf::from("routes.yaml"),
            route: "list-users".into(),
            body: "{}".into(),
            base_url: None,
            mesh_service: None,
            instances: Vec::new(),
            token: None,
            timeout_secs: None,
            deadline_ms: None,
            content_type: None,
            headers: Vec::new(),
        }
    }

    fn spec() -> RouteSpec {
        RouteSpec {
            name: "create-order".into(),
            method: HttpMethod::Post,
            path: "/orders".into(),
            description: None,
            input_schema: "fullname=amount,type=number".into(),
            output_schema: String::new(),
        }
    }

    #[test]
    fn headers_parse_as_name_value() {
        assert_eq!(
            parse_header("x-tenant: t-1").unwrap(),
            ("x-tenant".to_string(), "t-1".to_string())
        );
        assert!(parse_header("novalue").is_err());
        assert!(parse_header(":v").is_err());
    }

    #[test]
    fn dynamic_request_serializes_its_body_and_delegates_route() {
        let request = DynamicRequest::new(spec(), serde_json::json!({"amount": 5}), CallContext::new());
        assert_eq!(serde_json::to_value(&request).unwrap(), serde_json::json!({"amount": 5}));
        assert_eq!(request.route(), Route::post("/orders"));
        assert_eq!(request.name(), Some("create-order"));
        assert!(request.input_schema().contains("amount"));
    }

    #[test]
    fn context_carries_flags() {
        let mut a = args();
        a.content_type = Some("text/plain".into());
        a.headers = vec![("x-tenant".into(), "t-1".into())];
        a.deadline_ms = Some(1_000);
        let ctx = call_context(&a);
        assert_eq!(ctx.content_type(), "text/plain");
        assert_eq!(ctx.headers().get("x-tenant").map(String::as_str), Some("t-1"));
        assert!(ctx.deadline().is_some());
    }

    #[test]
    fn transport_selection() {
        assert!(build_transport(&args()).is_err());

        let mut http = args();
        http.base_url = Some("http://127.0.0.1:8080".into());
        assert_eq!(build_transport(&http).unwrap().name(), "http");

        let mut mesh = args();
        mesh.mesh_service = Some("orders".into());
        mesh.instances = vec!["http://10.0.0.1:80".into()];
        assert_eq!(build_transport(&mesh).unwrap().name(), "mesh");

        let mut bad = args();
        bad.base_url = Some("not a url".into());
        assert!(build_transport(&bad).is_err());
    }

    #[test]
    fn exit_codes_follow_disposition() {
        assert_eq!(exit_code(Disposition::NeverSent), 2);
        assert_eq!(exit_code(Disposition::Rejected), 3);
        assert_eq!(exit_code(Disposition::LogicallyFailed), 4);
    }
}
