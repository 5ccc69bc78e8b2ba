use serde_json::json;

use crate::helpers::spawn_app;

fn success_envelope(message_id: &str) -> serde_json::Value {
    json!({
        "task_id": "T1",
        "workflow_run_id": "W1",
        "message_id": message_id,
        "data": {
            "id": "1",
            "workflow_id": "WF",
            "status": "succeeded",
            "outputs": {
                "subject": "S",
                "body": "hello",
                "priority": "low",
                "incidentID": 42,
            },
            "error": null,
            "elapsed_time": 1.5,
            "total_tokens": 100,
            "total_steps": 3,
            "created_at": 1_710_000_000i64,
            "finished_at": 1_710_000_005i64,
        }
    })
}

fn error_envelope(message_id: &str) -> serde_json::Value {
    json!({
        "task_id": format!("error-{message_id}"),
        "workflow_run_id": format!("error-run-{message_id}"),
        "message_id": message_id,
        "data": {
            "id": format!("error-{message_id}"),
            "workflow_id": format!("error-workflow-{message_id}"),
            "status": "error",
            "outputs": {
                "priority": "high",
                "final": "error",
                "body": "boom",
                "workflow_logs": [{"step": "1", "action": "error", "message": "boom", "time": "2024-03-09T00:00:00Z"}],
            },
            "error": "boom",
            "created_at": 1_710_000_000i64,
            "finished_at": 1_710_000_000i64,
        }
    })
}

#[tokio::test]
async fn save_incident_persists_success_with_code_zero() {
    let app = spawn_app().await;

    let resp = app.post_json("/api/v1/incidents", &success_envelope("M1")).await;
    assert!(resp.status().is_success());

    let row = sqlx::query!(
        r#"
        SELECT i.message_id, s.code, a.task_id, a.incident_number
        FROM incidents i
        JOIN incident_status s ON s.id = i.status_id
        JOIN api_response_data a ON a.incident_id = i.id
        WHERE i.message_id = $1
        "#,
        "M1",
    )
    .fetch_one(&app.pool)
    .await
    .expect("incident row should exist");

    assert_eq!(row.code, 0);
    assert_eq!(row.task_id, "T1");
    assert_eq!(row.incident_number, Some(42));

    let error_logs = sqlx::query!("SELECT count(*) as count FROM error_logs WHERE message_id = $1", "M1")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(error_logs.count, Some(0));
}

#[tokio::test]
async fn save_incident_persists_error_with_code_ninety_nine_and_logs_it() {
    let app = spawn_app().await;

    let resp = app.post_json("/api/v1/incidents", &error_envelope("M2")).await;
    assert!(resp.status().is_success());

    let row = sqlx::query!(
        r#"
        SELECT s.code, a.task_id, a.final_status
        FROM incidents i
        JOIN incident_status s ON s.id = i.status_id
        JOIN api_response_data a ON a.incident_id = i.id
        WHERE i.message_id = $1
        "#,
        "M2",
    )
    .fetch_one(&app.pool)
    .await
    .expect("incident row should exist");

    assert_eq!(row.code, 99);
    assert_eq!(row.task_id, "error-M2");
    assert_eq!(row.final_status.as_deref(), Some("error"));

    let error_logs = sqlx::query!(
        "SELECT count(*) as count FROM error_logs WHERE message_id = $1 AND task_id = $2",
        "M2",
        "error-M2",
    )
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(error_logs.count, Some(1));
}

#[tokio::test]
async fn save_incident_rejects_malformed_body() {
    let app = spawn_app().await;

    let resp = app.post_json("/api/v1/incidents", &json!({"not": "an envelope"})).await;
    assert_eq!(resp.status().as_u16(), 400);
}
