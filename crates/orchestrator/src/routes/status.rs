use actix_web::web;
use actix_web::HttpResponse;
use incident_core::MessageId;
use incident_core::ServiceType;
use incident_statestore::StateStore;
use serde::Serialize;

use incident_core::ErrorEnvelope;

#[derive(Serialize)]
struct StatusResponse {
    processing: incident_statestore::EmailProcessing,
    service_state: incident_statestore::ServiceState,
}

/// `GET /status/:messageID`: returns both state rows for a message. 404
/// (wrapped in the shared error envelope) when the message is unknown.
pub async fn status(
    path: web::Path<String>,
    state_store: web::Data<StateStore>,
) -> HttpResponse {
    let message_id = MessageId::new(path.into_inner());

    let processing = match state_store.get_processing(&message_id).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            return HttpResponse::NotFound().json(ErrorEnvelope::new(
                404,
                "no such message_id",
                message_id.as_str(),
            ))
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(ErrorEnvelope::new(
                500,
                e.to_string(),
                message_id.as_str(),
            ))
        }
    };

    let service_state = match state_store.get_service_state(&message_id, ServiceType::AutoPilot).await {
        Ok(Some(s)) => s,
        Ok(None) => {
            return HttpResponse::NotFound().json(ErrorEnvelope::new(
                404,
                "no service state for message_id",
                message_id.as_str(),
            ))
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(ErrorEnvelope::new(
                500,
                e.to_string(),
                message_id.as_str(),
            ))
        }
    };

    HttpResponse::Ok().json(StatusResponse {
        processing,
        service_state,
    })
}
