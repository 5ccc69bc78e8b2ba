use serde_json::json;

use crate::helpers::spawn_app;

#[tokio::test]
async fn status_roundtrips_through_the_shared_state_store() {
    let app = spawn_app().await;

    sqlx::query!(
        r#"
        INSERT INTO email_processing (message_id, status, created_at, updated_at)
        VALUES ($1, 'PENDING', now(), now())
        "#,
        "M1",
    )
    .execute(&app.pool)
    .await
    .unwrap();

    let get_resp = reqwest::Client::new()
        .get(app.url("/api/v1/status/M1"))
        .bearer_auth(&app.service_token)
        .send()
        .await
        .unwrap();
    assert!(get_resp.status().is_success());
    let body: serde_json::Value = get_resp.json().await.unwrap();
    assert_eq!(body["status"], "PENDING");

    let put_resp = reqwest::Client::new()
        .put(app.url("/api/v1/status/M1"))
        .bearer_auth(&app.service_token)
        .json(&json!({"status": "RUNNING"}))
        .send()
        .await
        .unwrap();
    assert!(put_resp.status().is_success());

    let row = sqlx::query!("SELECT status FROM email_processing WHERE message_id = $1", "M1")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(row.status, "RUNNING");
}

#[tokio::test]
async fn status_for_unknown_message_is_404() {
    let app = spawn_app().await;

    let resp = reqwest::Client::new()
        .get(app.url("/api/v1/status/does-not-exist"))
        .bearer_auth(&app.service_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
