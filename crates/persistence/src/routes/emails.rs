use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use incident_core::EmailData;
use serde_json::json;

use crate::errors::PersistenceError;
use crate::startup::AppState;

const X_MESSAGE_ID: &str = "X-Message-ID";

/// `POST /api/v1/emails`: insert the parsed email, keyed by `message_id`
/// (unique). Concurrent inserts for the same message_id race the unique
/// index; the loser surfaces as a 500.
pub async fn save_email(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> HttpResponse {
    let message_id = match req.headers().get(X_MESSAGE_ID).and_then(|v| v.to_str().ok()) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => {
            return PersistenceError::BindError("X-Message-ID header is required".to_string())
                .into_response("")
        }
    };

    let email: EmailData = match serde_json::from_slice(&body) {
        Ok(email) => email,
        Err(e) => return PersistenceError::BindError(e.to_string()).into_response(&message_id),
    };

    match insert(&state, &message_id, &email).await {
        Ok(()) => HttpResponse::Ok().json(json!({"status": "success", "message_id": message_id})),
        Err(e) => e.into_response(&message_id),
    }
}

async fn insert(
    state: &AppState,
    message_id: &str,
    email: &EmailData,
) -> Result<(), PersistenceError> {
    let now = chrono::Utc::now();
    sqlx::query!(
        r#"
        INSERT INTO emails
            (message_id, "from", "to", cc, subject, date, original_message_id,
             mime_version, content_type, content_transfer_encoding, body, file_name,
             created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
        "#,
        message_id,
        email.from,
        email.to,
        email.cc,
        email.subject,
        email.date,
        email.original_message_id,
        email.mime_version,
        email.content_type,
        email.content_transfer_encoding,
        email.body,
        email.file_name,
        now,
    )
    .execute(&state.pool)
    .await?;
    Ok(())
}
