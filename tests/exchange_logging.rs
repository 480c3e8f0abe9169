//! Redacted exchange logging through a running service.

use std::collections::{BTreeMap, BTreeSet};

use correlate::config::{parse_config, ServiceConfig};
use correlate::http::exchange::Origin;
use correlate::observability::Direction;
use correlate::services::ServiceRole;
use serde_json::json;

mod common;

fn redacting_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    let obfuscate = &mut config.logbook.obfuscate;
    obfuscate.headers = BTreeSet::from(["x-api-key".to_string()]);
    obfuscate.parameters = BTreeSet::from(["pin".to_string()]);
    obfuscate.body_fields = BTreeSet::from(["password".to_string()]);
    obfuscate.body_fields_json_path = BTreeMap::from([(
        "lastName".to_string(),
        vec![r"[A-Z][a-z]+son".to_string()],
    )]);
    config
}

#[tokio::test]
async fn test_actuator_paths_never_logged() {
    let service = common::start_service(ServiceRole::User, ServiceConfig::default()).await;
    let res = common::client()
        .get(service.url("/actuator/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(service.sink.is_empty());
}

#[tokio::test]
async fn test_sensitive_values_redacted_in_records() {
    let service = common::start_service(ServiceRole::User, redacting_config()).await;
    let res = common::client()
        .post(service.url("/api/users?pin=1234&source=web"))
        .header("authorization", "Bearer secret-token")
        .header("x-api-key", "k-1")
        .header("x-datadog-trace-id", "log-1")
        .json(&json!({
            "username": "eve",
            "email": "eve@example.com",
            "lastName": "Jackson",
            "password": "hunter2"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["lastName"], "Jackson");

    let records = service.sink.records();
    assert_eq!(records.len(), 2);

    let request = &records[0];
    assert_eq!(request.direction, Direction::Request);
    assert_eq!(request.origin, Origin::Local);
    assert_eq!(request.correlation_id.as_deref(), Some("log-1"));
    assert_eq!(request.path, "/api/users?pin=XXX&source=web");
    assert_eq!(request.headers["authorization"], vec!["XXX"]);
    assert_eq!(request.headers["x-api-key"], vec!["XXX"]);
    assert_eq!(request.headers["x-datadog-trace-id"], vec!["log-1"]);
    let body = request.body.as_ref().unwrap();
    assert_eq!(body["password"], "XXX");
    assert_eq!(body["lastName"], "XXX");
    assert_eq!(body["username"], "eve");

    let response = &records[1];
    assert_eq!(response.status, Some(201));
    assert_eq!(response.body.as_ref().unwrap()["lastName"], "XXX");
    assert!(response.duration_ms.is_some());
}

#[tokio::test]
async fn test_malformed_json_logged_raw() {
    let service = common::start_service(ServiceRole::User, ServiceConfig::default()).await;
    let res = common::client()
        .post(service.url("/api/users"))
        .header("content-type", "application/json")
        .body(r#"{"username": "#)
        .send()
        .await
        .unwrap();
    assert!(res.status().is_client_error());

    let records = service.sink.records();
    assert!(records[0].body_parse_failed);
    assert_eq!(records[0].body, Some(json!(r#"{"username": "#)));
}

#[tokio::test]
async fn test_body_over_logging_limit_still_served() {
    let service = common::start_service(ServiceRole::User, ServiceConfig::default()).await;
    let long_name = "a".repeat(1_500_000);
    let res = common::client()
        .post(service.url("/api/users"))
        .json(&json!({
            "username": "gus",
            "email": "gus@example.com",
            "firstName": long_name
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["firstName"].as_str().map(str::len), Some(1_500_000));

    let records = service.sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].path, "/api/users");
    assert!(records.iter().all(|r| r.body_truncated && r.body.is_none()));
    assert_eq!(records[1].status, Some(201));
}

#[tokio::test]
async fn test_outbound_calls_logged_as_remote() {
    let config = parse_config(
        r#"
        [logbook]
        exclude = ["/api/users/count"]

        [logbook.obfuscate]
        headers = ["x-session"]
        "#,
    )
    .unwrap();
    let (user_service, _profile_service) = common::start_pair(config).await;
    let client = common::client();

    client
        .post(user_service.url("/api/users"))
        .json(&json!({"username": "fay", "email": "fay@example.com"}))
        .send()
        .await
        .unwrap();
    client
        .get(user_service.url("/api/users/count"))
        .send()
        .await
        .unwrap();
    client
        .get(user_service.url("/api/users/1/details"))
        .header("x-session", "s3cr3t")
        .send()
        .await
        .unwrap();

    let records = user_service.sink.records();
    assert!(records.iter().all(|r| r.path != "/api/users/count"));

    let remote: Vec<_> = records.iter().filter(|r| r.origin == Origin::Remote).collect();
    assert_eq!(remote.len(), 4);
    for record in remote.iter().filter(|r| r.direction == Direction::Request) {
        assert_eq!(record.headers["x-session"], vec!["XXX"]);
        assert!(record.path.ends_with("/user/1"));
    }
}
