use serde_json::json;

use crate::helpers::spawn_app;

fn email_payload() -> serde_json::Value {
    json!({
        "from": "a@x",
        "to": "b@x",
        "cc": "",
        "subject": "S",
        "date": "2024-03-09",
        "original_message_id": "",
        "mime_version": "",
        "content_type": "",
        "content_transfer_encoding": "",
        "body": "hello",
        "file_name": null,
    })
}

#[tokio::test]
async fn save_email_requires_message_id_header() {
    let app = spawn_app().await;

    let resp = reqwest::Client::new()
        .post(app.url("/api/v1/emails"))
        .bearer_auth(&app.service_token)
        .json(&email_payload())
        .send()
        .await
        .expect("execute request");

    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn save_email_succeeds_once_and_rejects_duplicate() {
    let app = spawn_app().await;

    let resp = reqwest::Client::new()
        .post(app.url("/api/v1/emails"))
        .bearer_auth(&app.service_token)
        .header("X-Message-ID", "M1")
        .json(&email_payload())
        .send()
        .await
        .expect("execute request");
    assert!(resp.status().is_success());

    let saved = sqlx::query!("SELECT message_id FROM emails WHERE message_id = $1", "M1")
        .fetch_one(&app.pool)
        .await
        .expect("email row should exist");
    assert_eq!(saved.message_id, "M1");

    // Duplicate message_id: unique index is the synchronization mechanism
    // (concurrent inserts race the unique index).
    let dup = reqwest::Client::new()
        .post(app.url("/api/v1/emails"))
        .bearer_auth(&app.service_token)
        .header("X-Message-ID", "M1")
        .json(&email_payload())
        .send()
        .await
        .expect("execute request");
    assert_eq!(dup.status().as_u16(), 500);
}

#[tokio::test]
async fn save_email_rejects_unauthenticated_request() {
    let app = spawn_app().await;

    let resp = reqwest::Client::new()
        .post(app.url("/api/v1/emails"))
        .header("X-Message-ID", "M2")
        .json(&email_payload())
        .send()
        .await
        .expect("execute request");

    assert_eq!(resp.status().as_u16(), 401);
}
