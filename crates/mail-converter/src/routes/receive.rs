use std::panic::AssertUnwindSafe;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use futures_util::FutureExt;
use incident_core::ErrorCode;
use incident_core::ErrorEnvelope;
use incident_core::MessageId;
use incident_core::ProcessingStatus;
use incident_core::ServiceType;
use incident_statestore::StateStore;
use secrecy::ExposeSecret;

use crate::errors::ParseError;
use crate::mime_parser::parse_email;
use crate::startup::OrchestratorClient;

const X_MESSAGE_ID: &str = "X-Message-ID";

/// `POST /receive`: parse raw MIME, track sub-state, forward to
/// the orchestrator. Wrapped in `catch_unwind` so a parser panic still lands
/// as a recorded `PANIC` error rather than tearing down the worker thread's
/// in-flight request bookkeeping.
pub async fn receive(
    req: HttpRequest,
    body: web::Bytes,
    state_store: web::Data<StateStore>,
    orchestrator: web::Data<OrchestratorClient>,
) -> HttpResponse {
    let message_id = match req.headers().get(X_MESSAGE_ID) {
        Some(value) => match value.to_str() {
            Ok(s) if !s.is_empty() => MessageId::new(s.to_string()),
            _ => MessageId::generate(),
        },
        None => MessageId::generate(),
    };

    let outcome = AssertUnwindSafe(process(&message_id, &body, &state_store, &orchestrator))
        .catch_unwind()
        .await;

    match outcome {
        Ok(response) => response,
        Err(_) => {
            let _ = state_store
                .set_error(
                    &message_id,
                    ServiceType::MailConverter,
                    ErrorCode::Panic,
                    "panic while processing request",
                )
                .await;
            ParseError::Panic("panic while processing request".to_string())
                .into_response(message_id.as_str())
        }
    }
}

async fn process(
    message_id: &MessageId,
    body: &[u8],
    state_store: &StateStore,
    orchestrator: &OrchestratorClient,
) -> HttpResponse {
    if let Err(e) = state_store
        .create_processing(message_id, ServiceType::MailConverter)
        .await
    {
        tracing::error!(error = %e, %message_id, "failed to initialize processing state");
        return ParseError::ReadError(e.to_string()).into_response(message_id.as_str());
    }

    let email = match parse_email(body) {
        Ok(email) => email,
        Err(e) => {
            let _ = state_store
                .set_error(message_id, ServiceType::MailConverter, e.code(), &e.to_string())
                .await;
            return e.into_response(message_id.as_str());
        }
    };

    if let Err(e) = state_store
        .update_processing_status(message_id, ProcessingStatus::Running)
        .await
    {
        tracing::error!(error = %e, %message_id, "failed to advance processing to RUNNING");
    }
    if let Err(e) = state_store
        .update_service_state_status(message_id, ServiceType::MailConverter, ProcessingStatus::Running)
        .await
    {
        tracing::error!(error = %e, %message_id, "failed to advance service state to RUNNING");
    }

    let mut stored = email.clone();
    stored.body = email.truncated_body();
    if let Err(e) = state_store
        .embed_email_data(message_id, ServiceType::MailConverter, &stored)
        .await
    {
        tracing::error!(error = %e, %message_id, "failed to embed email data");
    }

    let forward_url = format!("{}/receive", orchestrator.base_url.trim_end_matches('/'));
    let forward_result = orchestrator
        .client
        .post(&forward_url)
        .bearer_auth(orchestrator.service_token.expose_secret())
        .header(X_MESSAGE_ID, message_id.as_str())
        .json(&email)
        .send()
        .await;

    match forward_result {
        Ok(resp) if resp.status().is_success() => {
            let _ = state_store
                .update_processing_status(message_id, ProcessingStatus::Complete)
                .await;
            let _ = state_store
                .update_service_state_status(
                    message_id,
                    ServiceType::MailConverter,
                    ProcessingStatus::Complete,
                )
                .await;
            HttpResponse::Ok().json(ErrorEnvelope::success(
                StatusCode::OK.as_u16(),
                "forwarded to orchestrator",
                message_id.as_str(),
            ))
        }
        Ok(resp) => {
            let detail = format!("orchestrator responded {}", resp.status());
            let _ = state_store
                .set_error(message_id, ServiceType::MailConverter, ErrorCode::ApiError, &detail)
                .await;
            ParseError::ApiError(detail).into_response(message_id.as_str())
        }
        Err(e) => {
            let detail = e.to_string();
            let _ = state_store
                .set_error(message_id, ServiceType::MailConverter, ErrorCode::ApiError, &detail)
                .await;
            ParseError::ApiError(detail).into_response(message_id.as_str())
        }
    }
}
