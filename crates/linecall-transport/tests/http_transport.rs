//! # Integration Tests for the HTTP Transport
//!
//! Runs `HttpTransport` against wiremock servers to check request shape
//! (query form vs. verbatim body, headers), error mapping and context
//! handling, then drives one call through the full pipeline.

use std::sync::Arc;
use std::time::Duration;

use linecall_client::{CallError, ClientOutput, ClientRequest, Disposition, Orchestrator, Registry, RouteSource};
use linecall_core::{CallContext, HttpMethod, Route, Transport, TransportError};
use linecall_transport::{HttpTransport, HttpTransportConfig};
use serde::{Deserialize, Serialize};
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(server: &MockServer) -> HttpTransport {
    let config = HttpTransportConfig::local_mock(&server.uri()).expect("config");
    HttpTransport::new(&config).expect("transport build")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn get_sends_document_as_query_pairs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("id", "1"))
        .and(query_param("active", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "a"})))
        .expect(1)
        .mount(&server)
        .await;

    let out = transport(&server)
        .send(
            &CallContext::new(),
            HttpMethod::Get,
            "/users",
            br#"{"id":"1","active":true,"skip":null}"#.to_vec(),
        )
        .await
        .expect("send");
    assert_eq!(serde_json::from_slice::<serde_json::Value>(&out).unwrap(), json!({"name": "a"}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn post_sends_body_verbatim_with_context_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(header("content-type", "application/vnd.orders+json"))
        .and(header("x-tenant", "t-1"))
        .and(body_json(json!({"amount": "5", "currency": "EUR"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "7"})))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = CallContext::new()
        .with_content_type("application/vnd.orders+json")
        .with_header("x-tenant", "t-1");
    let out = transport(&server)
        .send(
            &ctx,
            HttpMethod::Post,
            "/orders",
            br#"{"amount":"5","currency":"EUR"}"#.to_vec(),
        )
        .await
        .expect("send");
    assert_eq!(out, br#"{"id":"7"}"#);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn bearer_token_is_sent_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/items/1"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_string("{}"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = HttpTransportConfig::local_mock(&format!("{}/", server.uri()))
        .expect("config")
        .with_token("test-token");
    let transport = HttpTransport::new(&config).expect("transport build");
    let out = transport
        .send(&CallContext::new(), HttpMethod::Put, "/items/1", b"{}".to_vec())
        .await
        .expect("send");
    assert!(out.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn non_success_status_keeps_the_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"msg":"fail"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let err = transport(&server)
        .send(&CallContext::new(), HttpMethod::Get, "/users", Vec::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::Status {
            status: 500,
            body: r#"{"msg":"fail"}"#.into()
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn read_style_body_must_be_an_object() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = transport(&server)
        .send(&CallContext::new(), HttpMethod::Delete, "/users", b"[1]".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Encoding(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_context_never_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = CallContext::new();
    ctx.cancel();
    let err = transport(&server)
        .send(&ctx, HttpMethod::Get, "/users", Vec::new())
        .await
        .unwrap_err();
    assert_eq!(err, TransportError::Cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancellation_aborts_an_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let ctx = CallContext::new();
    let token = ctx.cancellation().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let err = transport(&server)
        .send(&ctx, HttpMethod::Get, "/slow", Vec::new())
        .await
        .unwrap_err();
    assert_eq!(err, TransportError::Cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn deadline_bounds_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let ctx = CallContext::new().with_timeout(Duration::from_millis(100));
    let err = transport(&server)
        .send(&ctx, HttpMethod::Get, "/slow", Vec::new())
        .await
        .unwrap_err();
    assert_eq!(err, TransportError::DeadlineExceeded);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_host_is_a_connection_error() {
    let config = HttpTransportConfig::local_mock("http://127.0.0.1:1").expect("config");
    let transport = HttpTransport::new(&config).expect("transport build");
    let err = transport
        .send(&CallContext::new(), HttpMethod::Get, "/users", Vec::new())
        .await
        .unwrap_err();
    assert!(
        matches!(err, TransportError::Connection { ref endpoint, .. } if endpoint.starts_with("GET http://127.0.0.1:1/users")),
        "unexpected error: {err:?}"
    );
}

// ── Full pipeline over HTTP ────────────────────────────────────────

#[derive(Serialize, Default)]
struct ListUsers {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
}

impl RouteSource for ListUsers {
    fn route(&self) -> Route {
        Route::get("/users")
    }
    fn input_schema(&self) -> &str {
        "fullname=id,type=number,required,default=1"
    }
    fn output_schema(&self) -> &str {
        "fullname=name,required"
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    name: String,
}

impl ClientOutput for User {}

impl ClientRequest for ListUsers {
    type Output = User;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pipeline_fills_default_and_decodes_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "a"})))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(Arc::new(Registry::default()), Arc::new(transport(&server)));
    let user = orchestrator.execute(&ListUsers::default()).await.expect("call");
    assert_eq!(user, User { name: "a".into() });
    assert_eq!(orchestrator.metrics().succeeded(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pipeline_reports_remote_failure_as_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"msg":"fail"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(Arc::new(Registry::default()), Arc::new(transport(&server)));
    let err = orchestrator.execute(&ListUsers { id: Some(4) }).await.unwrap_err();
    match &err {
        CallError::Transport { source, .. } => {
            assert_eq!(source.status(), Some(500));
            assert_eq!(source.body(), Some(r#"{"msg":"fail"}"#));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
    assert_eq!(err.disposition(), Disposition::Rejected);
}
