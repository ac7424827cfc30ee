//! `linecall call` against a wiremock server.

use std::path::{Path, PathBuf};

use linecall_cli::call::{run_call, CallArgs};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MANIFEST: &str = r#"
routes:
  - name: list-users
    method: GET
    path: /users
    input_schema: "fullname=id,type=int,required,default=1"
    output_schema: "fullname=name,required"
  - name: create-order
    method: POST
    path: /orders
    input_schema: |
      fullname=amount,type=number,required
      fullname=currency,default=EUR
    output_schema: "fullname=id,type=int,required"
"#;

fn write_manifest(dir: &Path) -> PathBuf {
    let path = dir.join("routes.yaml");
    std::fs::write(&path, MANIFEST).unwrap();
    path
}

fn args(manifest: PathBuf, route: &str, body: &str, base_url: &str) -> CallArgs {
    CallArgs {
        manifest,
        route: route.into(),
        body: body.into(),
        base_url: Some(base_url.into()),
        mesh_service: None,
        instances: Vec::new(),
        token: None,
        timeout_secs: Some(5),
        deadline_ms: None,
        content_type: None,
        headers: Vec::new(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn get_call_succeeds_with_default_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "a"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let code = run_call(&args(write_manifest(dir.path()), "list-users", "{}", &server.uri()))
        .await
        .unwrap();
    assert_eq!(code, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn post_call_sends_formatted_body_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(header("x-tenant", "t-1"))
        .and(body_json(json!({"amount": "10", "currency": "EUR"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "42"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut call = args(
        write_manifest(dir.path()),
        "create-order",
        r#"{"amount":10}"#,
        &server.uri(),
    );
    call.headers = vec![("x-tenant".into(), "t-1".into())];
    assert_eq!(run_call(&call).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_input_is_never_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let code = run_call(&args(
        write_manifest(dir.path()),
        "create-order",
        r#"{"currency":"USD"}"#,
        &server.uri(),
    ))
    .await
    .unwrap();
    assert_eq!(code, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn remote_failure_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"msg":"fail"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let code = run_call(&args(write_manifest(dir.path()), "list-users", "{}", &server.uri()))
        .await
        .unwrap();
    assert_eq!(code, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_route_and_bad_body_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path());

    let err = run_call(&args(manifest.clone(), "missing", "{}", "http://127.0.0.1:1"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("missing"));

    let err = run_call(&args(manifest, "list-users", "{not json", "http://127.0.0.1:1"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("--body"));
}
