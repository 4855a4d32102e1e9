//! Request issuing, status classification and the audit log, end to end.

mod common;

use common::{connect, listing, TOKEN};
use serde_json::json;
use soar_client::transport::REDACTED;
use soar_client::{ApiRequest, Query, Reply, ResponseShape};
use soar_model::{ErrorKind, SoarError};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn string_filters_are_quoted_and_ordering_keys_are_not() {
    let server = MockServer::start().await;
    let client = connect(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/container"))
        .and(query_param("_filter_status", "\"new\""))
        .and(query_param("sort", "create_time"))
        .and(query_param("_filter_id__in", "[1,2]"))
        .and(query_param("page_size", "5"))
        .and(query_param("pretty", "true"))
        .respond_with(listing(json!([{ "id": 1 }, { "id": 2 }])))
        .expect(1)
        .mount(&server)
        .await;

    let query = Query::new()
        .text("_filter_status", "new")
        .text("sort", "create_time")
        .text("_filter_id__in", "[1,2]")
        .int("page_size", 5)
        .flag("pretty", true);
    let containers = client.get_containers(query).await.unwrap();

    assert_eq!(containers.len(), 2);
}

#[tokio::test]
async fn list_parameters_repeat_the_key() {
    let server = MockServer::start().await;
    let client = connect(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/artifact"))
        .and(query_param("ids", "3"))
        .and(query_param("ids", "4"))
        .respond_with(listing(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client
        .get_artifacts(Query::new().list("ids", [3, 4]))
        .await
        .unwrap();
}

#[tokio::test]
async fn not_found_carries_the_server_message() {
    let server = MockServer::start().await;
    let client = connect(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/container/999"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "failed": true, "message": "Requested item not found" })),
        )
        .mount(&server)
        .await;

    let err = client
        .request(ApiRequest::get("container/999"))
        .await
        .unwrap_err();

    let SoarError::Server(server_error) = err else {
        panic!("expected a server error, got {err:?}");
    };
    assert_eq!(server_error.status, 404);
    assert_eq!(server_error.reason, "Not Found");
    assert_eq!(server_error.method, "GET");
    assert_eq!(server_error.message, "Requested item not found");
    assert!(server_error.dump.is_none());
}

#[tokio::test]
async fn bad_request_attaches_the_rendered_exchange() {
    let server = MockServer::start().await;
    let client = connect(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/container"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "message": "Invalid label 'foobar'" })),
        )
        .mount(&server)
        .await;

    let err = client
        .request(ApiRequest::post("container").json(json!({ "name": "x", "label": "foobar" })))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Server);
    let SoarError::Server(server_error) = err else {
        unreachable!();
    };
    let dump = server_error.dump.expect("400 carries a dump");
    assert!(dump.contains("POST"));
    assert!(dump.contains("\"label\":\"foobar\""));
    assert!(dump.contains("Invalid label 'foobar'"));
    assert!(!dump.contains(TOKEN), "token leaked into dump");
}

#[tokio::test]
async fn redirects_are_failures_by_default() {
    let server = MockServer::start().await;
    let client = connect(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/moved"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/elsewhere"))
        .mount(&server)
        .await;

    let err = client.request(ApiRequest::get("moved")).await.unwrap_err();

    assert!(matches!(err, SoarError::Server(ref e) if e.status == 302), "got: {err:?}");
}

#[tokio::test]
async fn data_shape_unwraps_the_data_field() {
    let server = MockServer::start().await;
    let client = connect(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/asset"))
        .respond_with(listing(json!([{ "id": 5, "name": "maxmind" }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/system_info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "base_url": "x" })))
        .mount(&server)
        .await;

    let reply = client
        .request(ApiRequest::get("asset").shape(ResponseShape::Data))
        .await
        .unwrap();
    let Reply::Json(data) = reply else {
        panic!("expected json");
    };
    assert_eq!(data, json!([{ "id": 5, "name": "maxmind" }]));

    let err = client
        .request(ApiRequest::get("system_info").shape(ResponseShape::Data))
        .await
        .unwrap_err();
    assert!(matches!(err, SoarError::InvalidResponse { .. }), "got: {err:?}");
}

#[tokio::test]
async fn methods_are_parsed_before_any_request() {
    let server = MockServer::start().await;
    let client = connect(&server).await;
    let before = client.audit_log().len();

    let err = ApiRequest::parse("TRACE", "container").unwrap_err();
    assert!(matches!(err, SoarError::UnsupportedMethod { ref method } if method == "TRACE"));

    Mock::given(method("PUT"))
        .and(path("/rest/container/3"))
        .and(body_json(json!({ "status": "closed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    client
        .request(
            ApiRequest::parse("put", "container/3")
                .unwrap()
                .json(json!({ "status": "closed" })),
        )
        .await
        .unwrap();

    assert_eq!(client.audit_log().len(), before + 1);
}

#[tokio::test]
async fn audit_log_records_every_exchange_with_secrets_redacted() {
    let server = MockServer::start().await;
    let client = connect(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&server)
        .await;
    let _ = client.request(ApiRequest::get("missing")).await;

    let records = client.audit_log().snapshot();
    assert_eq!(records.len(), 2);

    let validation = &records[0];
    assert_eq!(validation.method, "GET");
    assert!(validation.url.ends_with("/rest/version"));
    assert!(validation
        .headers
        .iter()
        .any(|(name, value)| name == "ph-auth-token" && value == REDACTED));
    assert_eq!(validation.response.as_ref().unwrap().status, 200);

    let failed = client.audit_log().last().unwrap();
    let response = failed.response.unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.body, "nope");

    let rendered = client.audit_log().render();
    assert!(rendered.contains("/rest/missing"));
    assert!(!rendered.contains(TOKEN));
}

#[tokio::test]
async fn transport_failures_are_recorded_without_a_response() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    let err = client
        .request(ApiRequest::get("http://127.0.0.1:1/rest/version"))
        .await
        .unwrap_err();

    assert!(matches!(err, SoarError::Transport { ref method, .. } if method == "GET"));
    let record = client.audit_log().last().unwrap();
    assert!(record.response.is_none());
    assert!(record.failure.is_some());
}
