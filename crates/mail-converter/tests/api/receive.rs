use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;

const RAW_EMAIL: &[u8] =
    b"From: alice@example.com\r\nTo: ops@example.com\r\nSubject: server down\r\n\r\nhelp\r\n";

#[tokio::test]
async fn receive_without_auth_is_unauthorized() {
    let app = spawn_app().await;

    let resp = reqwest::Client::new()
        .post(app.url("/receive"))
        .header("X-Message-ID", "M1")
        .body(RAW_EMAIL)
        .send()
        .await
        .expect("execute request");

    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn receive_with_empty_body_is_bad_request() {
    let app = spawn_app().await;

    let resp = reqwest::Client::new()
        .post(app.url("/receive"))
        .bearer_auth(&app.external_api_token)
        .header("X-Message-ID", "M1")
        .body(Vec::<u8>::new())
        .send()
        .await
        .expect("execute request");

    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn receive_forwards_parsed_email_to_orchestrator() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/receive"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&app.orchestrator_server)
        .await;

    let resp = reqwest::Client::new()
        .post(app.url("/receive"))
        .bearer_auth(&app.external_api_token)
        .header("X-Message-ID", "M2")
        .body(RAW_EMAIL)
        .send()
        .await
        .expect("execute request");

    assert!(resp.status().is_success());
}

#[tokio::test]
async fn receive_generates_a_message_id_when_header_is_missing() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/receive"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&app.orchestrator_server)
        .await;

    let resp = reqwest::Client::new()
        .post(app.url("/receive"))
        .bearer_auth(&app.external_api_token)
        .body(RAW_EMAIL)
        .send()
        .await
        .expect("execute request");

    assert!(resp.status().is_success());
}

#[tokio::test]
async fn receive_reports_api_error_when_orchestrator_rejects_forward() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/receive"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.orchestrator_server)
        .await;

    let resp = reqwest::Client::new()
        .post(app.url("/receive"))
        .bearer_auth(&app.external_api_token)
        .header("X-Message-ID", "M3")
        .body(RAW_EMAIL)
        .send()
        .await
        .expect("execute request");

    assert_eq!(resp.status().as_u16(), 500);
}
