use actix_web::web;
use actix_web::HttpResponse;
use incident_core::Clock;
use serde::Deserialize;
use serde_json::json;

use crate::errors::PersistenceError;
use crate::startup::AppState;

/// `POST /api/v1/responses` body. `datetime` is optional: the handler
/// stamps "now in JST" when the caller omits it.
#[derive(Deserialize)]
pub struct CreateResponseRequest {
    pub incident_id: i64,
    pub status: String,
    pub responder: String,
    pub content: String,
    #[serde(default)]
    pub vender: i32,
    #[serde(default)]
    pub datetime: Option<chrono::DateTime<chrono::Utc>>,
}

/// `POST /api/v1/responses`: inserting a Response also updates the parent
/// Incident's `{assignee, status_id, vender}`, transactionally.
pub async fn create_response(
    body: web::Bytes,
    state: web::Data<AppState>,
) -> HttpResponse {
    let request: CreateResponseRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => return PersistenceError::BindError(e.to_string()).into_response(""),
    };

    match process(&state, &request).await {
        Ok(response_id) => {
            HttpResponse::Ok().json(json!({"status": "success", "response_id": response_id}))
        }
        Err(e) => e.into_response(&request.incident_id.to_string()),
    }
}

async fn process(
    state: &AppState,
    request: &CreateResponseRequest,
) -> Result<i64, PersistenceError> {
    let mut tx = state.pool.begin().await?;

    let current = sqlx::query!(
        r#"SELECT status_id FROM incidents WHERE id = $1"#,
        request.incident_id,
    )
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| PersistenceError::NotFound(format!("incident {}", request.incident_id)))?;

    // 400 if the target status name is unknown.
    let new_status = sqlx::query!(
        r#"SELECT id FROM incident_status WHERE name = $1"#,
        request.status,
    )
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| {
        PersistenceError::BindError(format!("unknown incident status {:?}", request.status))
    })?;

    let transition = sqlx::query!(
        r#"
        SELECT allowed FROM incident_status_transitions
        WHERE from_status_id = $1 AND to_status_id = $2
        "#,
        current.status_id,
        new_status.id,
    )
    .fetch_optional(&mut *tx)
    .await?;

    // Advisory only: log and still apply rather than hard-failing.
    if !matches!(transition, Some(t) if t.allowed) {
        tracing::warn!(
            incident_id = request.incident_id,
            from_status_id = current.status_id,
            to_status_id = new_status.id,
            "applying a status transition with no explicit allowed=true row",
        );
    }

    let datetime = request
        .datetime
        .unwrap_or_else(|| state.clock.now_jst().with_timezone(&chrono::Utc));

    let response = sqlx::query!(
        r#"
        INSERT INTO responses (incident_id, datetime, responder, content)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
        request.incident_id,
        datetime,
        request.responder,
        request.content,
    )
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query!(
        r#"
        UPDATE incidents SET assignee = $2, status_id = $3, vender = $4, updated_at = $5
        WHERE id = $1
        "#,
        request.incident_id,
        request.responder,
        new_status.id,
        request.vender,
        chrono::Utc::now(),
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(response.id)
}
