//! Session establishment against a mock SOAR server.

mod common;

use serde_json::json;
use soar_client::{SoarClient, TOKEN_HEADER};
use soar_model::{ErrorKind, SoarError};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn token_session_sends_token_on_validation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/version"))
        .and(header(TOKEN_HEADER, "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "6.1.0" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SoarClient::builder(server.uri())
        .token("abc123")
        .connect()
        .await
        .unwrap();

    assert_eq!(client.version(), "6.1.0");
    assert_eq!(client.base_url(), format!("{}/", server.uri()));
}

#[tokio::test]
async fn rejected_validation_is_an_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/version"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "failed": true, "message": "bad token" })),
        )
        .mount(&server)
        .await;

    let err = SoarClient::builder(server.uri())
        .token("wrong")
        .connect()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(err.to_string().contains("bad token"), "got: {err}");
}

#[tokio::test]
async fn non_200_success_on_validation_is_an_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/version"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let err = SoarClient::builder(server.uri())
        .token("t")
        .connect()
        .await
        .unwrap_err();

    assert!(matches!(err, SoarError::Authentication { .. }), "got: {err:?}");
}

#[tokio::test]
async fn credential_login_installs_csrf_header_and_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "csrftoken=seed; Path=/")
                .set_body_string("<html>login</html>"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("username=admin"))
        .and(body_string_contains("csrfmiddlewaretoken=seed"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/home")
                .insert_header("set-cookie", "csrftoken=rotated; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/version"))
        .and(header("x-csrftoken", "rotated"))
        .and(header("authorization", "Basic YWRtaW46cHc="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "6.2.0" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SoarClient::builder(server.uri())
        .credentials("admin", "pw")
        .connect()
        .await
        .unwrap();
    assert_eq!(client.version(), "6.2.0");

    let login = client
        .audit_log()
        .snapshot()
        .into_iter()
        .find(|record| record.method == "POST")
        .unwrap();
    assert!(login.body.contains("username=admin"));
    assert!(!login.body.contains("pw"), "password leaked: {}", login.body);
}

#[tokio::test]
async fn rejected_login_form_is_an_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "csrftoken=seed; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(403).set_body_string("CSRF verification failed"))
        .mount(&server)
        .await;

    let err = SoarClient::builder(server.uri())
        .credentials("admin", "nope")
        .connect()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[tokio::test]
async fn configuration_errors_issue_no_request() {
    let server = MockServer::start().await;

    let missing = SoarClient::builder(server.uri()).connect().await.unwrap_err();
    assert!(matches!(missing, SoarError::MissingCredentials));

    let incomplete = SoarClient::builder(server.uri())
        .username("admin")
        .connect()
        .await
        .unwrap_err();
    assert!(matches!(incomplete, SoarError::IncompleteCredentials));

    let conflicting = SoarClient::builder(server.uri())
        .token("t")
        .credentials("admin", "pw")
        .connect()
        .await
        .unwrap_err();
    assert!(matches!(conflicting, SoarError::ConflictingCredentials));

    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty(), "unexpected requests: {}", received.len());
}

#[tokio::test]
async fn unreachable_server_is_a_transport_failure() {
    let err = SoarClient::builder("http://127.0.0.1:1")
        .token("t")
        .connect()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
}
