use serde_json::json;

use crate::helpers::spawn_app;

async fn seed_incident(
    app: &crate::helpers::TestApp,
    message_id: &str,
) -> i64 {
    let status_id = sqlx::query!("SELECT id FROM incident_status WHERE code = 0")
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .id;
    let now = chrono::Utc::now();
    sqlx::query!(
        r#"
        INSERT INTO incidents (message_id, datetime, status_id, assignee, vender, created_at, updated_at)
        VALUES ($1, $2, $3, '-', 0, $2, $2)
        RETURNING id
        "#,
        message_id,
        now,
        status_id,
    )
    .fetch_one(&app.pool)
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn create_response_updates_parent_incident() {
    let app = spawn_app().await;
    let incident_id = seed_incident(&app, "M1").await;

    let resp = app
        .post_json(
            "/api/v1/responses",
            &json!({
                "incident_id": incident_id,
                "status": "調査中",
                "responder": "operator-1",
                "content": "looking into it",
                "vender": 7,
            }),
        )
        .await;
    assert!(resp.status().is_success());

    let incident = sqlx::query!(
        r#"
        SELECT i.assignee, i.vender, s.code
        FROM incidents i JOIN incident_status s ON s.id = i.status_id
        WHERE i.id = $1
        "#,
        incident_id,
    )
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(incident.assignee, "operator-1");
    assert_eq!(incident.vender, 7);
    assert_eq!(incident.code, 1);
}

#[tokio::test]
async fn create_response_rejects_unknown_status_name() {
    let app = spawn_app().await;
    let incident_id = seed_incident(&app, "M2").await;

    let resp = app
        .post_json(
            "/api/v1/responses",
            &json!({
                "incident_id": incident_id,
                "status": "does-not-exist",
                "responder": "operator-1",
                "content": "x",
            }),
        )
        .await;
    assert_eq!(resp.status().as_u16(), 400);

    let incident = sqlx::query!("SELECT assignee FROM incidents WHERE id = $1", incident_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(incident.assignee, "-");
}

#[tokio::test]
async fn create_response_for_unknown_incident_is_404() {
    let app = spawn_app().await;

    let resp = app
        .post_json(
            "/api/v1/responses",
            &json!({
                "incident_id": 9_999_999,
                "status": "調査中",
                "responder": "operator-1",
                "content": "x",
            }),
        )
        .await;
    assert_eq!(resp.status().as_u16(), 404);
}
