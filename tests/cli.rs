use assert_cmd::Command;
use httpmock::{Method, MockServer};
use predicates::prelude::*;
use serde_json::json;

#[test]
fn its_executable() {
    let mut cmd = Command::cargo_bin("oap-query").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn prints_services_as_json() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(Method::POST).path("/graphql");
        then.status(200).json_body(json!({
            "data": { "services": [{ "key": "c3Zj.1", "label": "provider" }] }
        }));
    });

    let mut cmd = Command::cargo_bin("oap-query").unwrap();
    cmd.env_remove("OAP_ENDPOINT")
        .args(["services", "--host", "127.0.0.1", "--port"])
        .arg(server.port().to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"label\": \"provider\""));
}

#[test]
fn exits_non_zero_on_backend_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(Method::POST).path("/graphql");
        then.status(503).body("unavailable");
    });

    let mut cmd = Command::cargo_bin("oap-query").unwrap();
    cmd.args(["endpoints", "--service-id", "svc", "--endpoint"])
        .arg(server.url("/graphql"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("503"));
}

#[test]
fn prints_its_version() {
    let mut cmd = Command::cargo_bin("oap-query").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(oap_query::PKG_VERSION));
}
