//! Shared mock-server fixtures for the client integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use soar_client::SoarClient;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "integration-token";
pub const VERSION: &str = "6.2.1.305";

/// Mounts the version endpoint and connects with a token.
pub async fn connect(server: &MockServer) -> SoarClient {
    Mock::given(method("GET"))
        .and(path("/rest/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": VERSION })))
        .mount(server)
        .await;

    SoarClient::builder(server.uri())
        .token(TOKEN)
        .connect()
        .await
        .expect("token session should validate")
}

/// A paged list response carrying `items`.
pub fn listing(items: Value) -> ResponseTemplate {
    let count = items.as_array().map_or(0, Vec::len);
    ResponseTemplate::new(200).set_body_json(json!({
        "count": count,
        "num_pages": 1,
        "data": items,
    }))
}

/// Mounts every endpoint a container refresh reads, with `record` as the
/// container and `runs` as its playbook runs. Artifacts, pins, comments and
/// notes are empty.
pub async fn mount_refresh(server: &MockServer, record: Value, runs: Value) {
    let id = record["id"].as_u64().expect("record needs an id").to_string();

    Mock::given(method("GET"))
        .and(path("/rest/container"))
        .and(query_param("_filter_id", id.as_str()))
        .respond_with(listing(json!([record])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/artifact"))
        .and(query_param("_filter_container__exact", id.as_str()))
        .respond_with(listing(json!([])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/playbook_run"))
        .and(query_param("_filter_container__exact", id.as_str()))
        .and(query_param("include_expensive", "true"))
        .respond_with(listing(runs))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/rest/container/{id}/pins")))
        .respond_with(listing(json!([])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/rest/container/{id}/comments")))
        .respond_with(listing(json!([])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/note"))
        .and(query_param("_filter_container_id", id.as_str()))
        .respond_with(listing(json!([])))
        .mount(server)
        .await;
}
