use std::panic::AssertUnwindSafe;

use actix_web::web;
use actix_web::HttpResponse;
use futures_util::FutureExt;
use incident_aiclient::IncidentEnvelope;
use serde_json::json;
use sqlx::Executor;

use crate::domain::incident_datetime;
use crate::domain::status_code_for;
use crate::errors::PersistenceError;
use crate::startup::AppState;

/// `POST /api/v1/incidents`. Wrapped in `catch_unwind` so a panic
/// mid-transaction still rolls back and logs rather than poisoning the pool
/// connection, mirroring a `defer rollback` guard.
pub async fn save_incident(
    body: web::Bytes,
    state: web::Data<AppState>,
) -> HttpResponse {
    let envelope: IncidentEnvelope = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => return PersistenceError::BindError(e.to_string()).into_response(""),
    };
    let message_id = envelope.message_id.clone();

    let outcome = AssertUnwindSafe(process(&state, &envelope)).catch_unwind().await;

    match outcome {
        Ok(Ok(incident_id)) => {
            HttpResponse::Ok().json(json!({"status": "success", "incident_id": incident_id}))
        }
        Ok(Err(e)) => e.into_response(&message_id),
        Err(_) => {
            tracing::error!(%message_id, "panic while persisting incident; transaction rolled back");
            PersistenceError::Database("internal error persisting incident".to_string())
                .into_response(&message_id)
        }
    }
}

async fn process(
    state: &AppState,
    envelope: &IncidentEnvelope,
) -> Result<i64, PersistenceError> {
    // Step 1: re-serialize to a canonical JSON string, kept alongside the
    // row for audit/replay purposes.
    let canonical = serde_json::to_string(envelope)
        .map_err(|e| PersistenceError::BindError(e.to_string()))?;

    // Step 2: derive the status code; when not succeeded, also log the raw
    // payload as an ErrorLog row, but keep going rather than early-return.
    let code = status_code_for(&envelope.data.status);

    let mut tx = state.pool.begin().await?;

    if code != 0 {
        sqlx::query!(
            r#"
            INSERT INTO error_logs (task_id, workflow_run_id, message_id, raw_payload, created_at)
            VALUES ($1, $2, $3, $4, now())
            "#,
            envelope.task_id,
            envelope.workflow_run_id,
            envelope.message_id,
            canonical,
        )
        .execute(&mut *tx)
        .await?;
    }

    // Step 3: look up the IncidentStatus row for the derived code.
    let status_row = sqlx::query!(
        r#"SELECT id FROM incident_status WHERE code = $1"#,
        code,
    )
    .fetch_one(&mut *tx)
    .await?;

    // Step 4: insert Incident, then APIResponseData keyed off its id.
    let datetime = incident_datetime(&envelope.data);
    let now = chrono::Utc::now();
    let incident = sqlx::query!(
        r#"
        INSERT INTO incidents (message_id, datetime, status_id, assignee, vender, created_at, updated_at)
        VALUES ($1, $2, $3, '-', 0, $4, $4)
        RETURNING id
        "#,
        envelope.message_id,
        datetime,
        status_row.id,
        now,
    )
    .fetch_one(&mut *tx)
    .await?;

    let workflow_logs = serde_json::to_string(&envelope.data.outputs.workflow_logs)
        .map_err(|e| PersistenceError::BindError(e.to_string()))?;
    let incident_number = envelope.data.outputs.incident_number;

    let insert_response = sqlx::query!(
        r#"
        INSERT INTO api_response_data
            (incident_id, task_id, workflow_run_id, workflow_id, status, body, "user",
             workflow_logs, host, priority, subject, "from", place, incident_text, time,
             incident_number, judgment, sender, final_status, elapsed_time, total_tokens,
             total_steps, created_at, finished_at)
        VALUES
            ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
             $19, $20, $21, $22, $23, $24)
        "#,
        incident.id,
        envelope.task_id,
        envelope.workflow_run_id,
        envelope.data.workflow_id,
        envelope.data.status,
        envelope.data.outputs.body,
        envelope.data.outputs.user,
        workflow_logs,
        envelope.data.outputs.host,
        envelope.data.outputs.priority,
        envelope.data.outputs.subject,
        envelope.data.outputs.from,
        envelope.data.outputs.place,
        envelope.data.outputs.incident_text,
        envelope.data.outputs.time,
        incident_number,
        envelope.data.outputs.judgment,
        envelope.data.outputs.sender,
        envelope.data.outputs.r#final,
        envelope.data.elapsed_time,
        envelope.data.total_tokens,
        envelope.data.total_steps,
        envelope.data.created_at,
        envelope.data.finished_at,
    );
    tx.execute(insert_response).await?;

    // Step 5: commit.
    tx.commit().await?;
    Ok(incident.id)
}
