use actix_web::web;
use actix_web::HttpResponse;
use incident_core::ErrorEnvelope;
use incident_core::MessageId;
use incident_core::ProcessingStatus;
use serde::Deserialize;

use crate::startup::AppState;

/// `GET /api/v1/status/:messageID`: a legacy alias of the
/// `EmailProcessing` surface. Reads straight through to the shared
/// `ProcessingStateStore` rather than maintaining a second status table.
pub async fn get_status(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let message_id = MessageId::new(path.into_inner());

    match state.state_store.get_processing(&message_id).await {
        Ok(Some(processing)) => HttpResponse::Ok().json(processing),
        Ok(None) => HttpResponse::NotFound().json(ErrorEnvelope::new(
            404,
            "no such message_id",
            message_id.as_str(),
        )),
        Err(e) => HttpResponse::InternalServerError().json(ErrorEnvelope::new(
            500,
            e.to_string(),
            message_id.as_str(),
        )),
    }
}

#[derive(Deserialize)]
pub struct PutStatusRequest {
    pub status: ProcessingStatus,
}

/// `PUT /api/v1/status/:messageID`: advances `EmailProcessing.status`
/// through the same store M and O write to. Monotonicity is the caller's
/// responsibility; this compat surface does not re-validate it.
pub async fn put_status(
    path: web::Path<String>,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> HttpResponse {
    let message_id = MessageId::new(path.into_inner());

    let request: PutStatusRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return HttpResponse::BadRequest().json(ErrorEnvelope::new(
                400,
                e.to_string(),
                message_id.as_str(),
            ))
        }
    };

    match state
        .state_store
        .update_processing_status(&message_id, request.status)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(ErrorEnvelope::success(
            200,
            "status updated",
            message_id.as_str(),
        )),
        Err(e) => HttpResponse::InternalServerError().json(ErrorEnvelope::new(
            500,
            e.to_string(),
            message_id.as_str(),
        )),
    }
}
