use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use incident_aiclient::AiClient;
use incident_core::ErrorCode;
use incident_core::MessageId;
use incident_core::ServiceType;
use incident_statestore::StateStore;
use serde::Serialize;

use crate::ai_worker;
use crate::errors::IngestError;
use crate::startup::PersistenceClient;

const X_MESSAGE_ID: &str = "X-Message-ID";

#[derive(Serialize)]
struct AcceptedResponse {
    status: &'static str,
    message_id: String,
}

/// `POST /receive`. Ingest is synchronous up to and including the email
/// save; the AI call and incident persist happen in a detached worker so
/// the caller gets 202 immediately.
pub async fn receive(
    req: HttpRequest,
    body: web::Bytes,
    state_store: web::Data<StateStore>,
    ai_client: web::Data<AiClient>,
    persistence: web::Data<PersistenceClient>,
) -> HttpResponse {
    let message_id = match req.headers().get(X_MESSAGE_ID).and_then(|v| v.to_str().ok()) {
        Some(s) if !s.is_empty() => MessageId::new(s.to_string()),
        _ => return IngestError::MissingMessageId.into_response(""),
    };

    match ingest(&message_id, &body, &state_store, &persistence).await {
        Ok(email) => {
            let state_store = state_store.into_inner();
            let ai_client = ai_client.into_inner();
            let persistence = persistence.into_inner();
            let worker_message_id = message_id.clone();
            tokio::spawn(async move {
                ai_worker::run(worker_message_id, email, &state_store, &ai_client, &persistence)
                    .await;
            });

            HttpResponse::build(StatusCode::ACCEPTED).json(AcceptedResponse {
                status: "processing",
                message_id: message_id.to_string(),
            })
        }
        Err(e) => e.into_response(message_id.as_str()),
    }
}

/// Idempotent state init, bind, synchronous save. Returns the bound
/// `EmailData` so the caller can hand it straight to the worker without
/// re-parsing the body.
async fn ingest(
    message_id: &MessageId,
    body: &[u8],
    state_store: &StateStore,
    persistence: &PersistenceClient,
) -> Result<incident_core::EmailData, IngestError> {
    let existing = state_store
        .get_processing(message_id)
        .await
        .map_err(|e| IngestError::SaveError(e.to_string()))?;
    if existing.is_none() {
        state_store
            .create_processing(message_id, ServiceType::AutoPilot)
            .await
            .map_err(|e| IngestError::SaveError(e.to_string()))?;
    }

    let email: incident_core::EmailData = match serde_json::from_slice(body) {
        Ok(email) => email,
        Err(e) => {
            state_store
                .set_error(message_id, ServiceType::AutoPilot, ErrorCode::BindError, &e.to_string())
                .await
                .ok();
            return Err(IngestError::BindError(e.to_string()));
        }
    };

    if let Err(e) = persistence.post_email(message_id.as_str(), &email).await {
        state_store
            .set_error(message_id, ServiceType::AutoPilot, ErrorCode::SaveError, &e.to_string())
            .await
            .ok();
        return Err(IngestError::SaveError(e.to_string()));
    }

    Ok(email)
}
