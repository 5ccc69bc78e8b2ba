use std::time::Duration;

use serde_json::json;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;

fn email_payload() -> serde_json::Value {
    json!({
        "from": "alice@example.com",
        "to": "ops@example.com",
        "cc": "",
        "subject": "server down",
        "date": "2024-03-09T00:00:00Z",
        "original_message_id": "",
        "mime_version": "",
        "content_type": "",
        "content_transfer_encoding": "",
        "body": "help",
        "file_name": null,
    })
}

fn ai_success_body() -> serde_json::Value {
    json!({
        "task_id": "T1",
        "workflow_run_id": "W1",
        "data": {
            "id": "1",
            "workflow_id": "WF",
            "status": "succeeded",
            "outputs": {"subject": "server down", "body": "help", "priority": "high"},
            "error": null,
            "elapsed_time": 1.0,
            "total_tokens": 10,
            "total_steps": 1,
            "created_at": 1_710_000_000i64,
            "finished_at": 1_710_000_001i64,
        }
    })
}

#[tokio::test]
async fn receive_without_message_id_header_is_bad_request() {
    let app = spawn_app().await;

    let resp = reqwest::Client::new()
        .post(app.url("/receive"))
        .bearer_auth(&app.service_token)
        .json(&email_payload())
        .send()
        .await
        .expect("execute request");

    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn receive_without_auth_is_unauthorized() {
    let app = spawn_app().await;

    let resp = reqwest::Client::new()
        .post(app.url("/receive"))
        .header("X-Message-ID", "M1")
        .json(&email_payload())
        .send()
        .await
        .expect("execute request");

    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn receive_accepts_and_completes_the_worker_on_ai_success() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/emails"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.persistence_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/incidents"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.persistence_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/workflow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ai_success_body()))
        .mount(&app.ai_server)
        .await;

    let resp = reqwest::Client::new()
        .post(app.url("/receive"))
        .bearer_auth(&app.service_token)
        .header("X-Message-ID", "M1")
        .json(&email_payload())
        .send()
        .await
        .expect("execute request");

    assert_eq!(resp.status().as_u16(), 202);

    // the ai call + incident persist happen in a detached worker.
    let mut completed = false;
    for _ in 0..20 {
        let status_resp = reqwest::Client::new()
            .get(app.url("/status/M1"))
            .bearer_auth(&app.service_token)
            .send()
            .await
            .expect("execute request");
        let body: serde_json::Value = status_resp.json().await.expect("decode status body");
        if body["processing"]["status"] == "COMPLETE" {
            completed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(completed, "worker did not reach COMPLETE in time");
}

#[tokio::test]
async fn receive_fails_synchronously_when_email_save_fails() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/emails"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.persistence_server)
        .await;

    let resp = reqwest::Client::new()
        .post(app.url("/receive"))
        .bearer_auth(&app.service_token)
        .header("X-Message-ID", "M2")
        .json(&email_payload())
        .send()
        .await
        .expect("execute request");

    assert_eq!(resp.status().as_u16(), 500);
}
