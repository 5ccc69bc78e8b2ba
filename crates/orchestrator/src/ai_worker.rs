use chrono::Utc;
use incident_aiclient::AiClient;
use incident_aiclient::AiResponse;
use incident_aiclient::IncidentEnvelope;
use incident_aiclient::RetryAttempt;
use incident_core::EmailData;
use incident_core::ErrorCode;
use incident_core::MessageId;
use incident_core::ProcessingStatus;
use incident_core::ServiceType;
use incident_statestore::StateStore;
use tokio::time::Instant;

use crate::errors::WorkerError;
use crate::startup::PersistenceClient;

/// Orchestrator's worker budget: independent of the inbound request's own
/// lifetime, hence the caller binds a fresh deadline rather than reusing
/// the request's context.
pub const WORKER_DEADLINE: std::time::Duration = std::time::Duration::from_secs(90);

/// Runs the AI call + persist steps for one message, detached from the
/// request that triggered it. Errors are absorbed here: every exit path
/// already records the outcome onto the state store, so there is nothing
/// left for a caller to do with a `Result`.
#[tracing::instrument(skip(state_store, ai_client, persistence, email), fields(%message_id))]
pub async fn run(
    message_id: MessageId,
    email: EmailData,
    state_store: &StateStore,
    ai_client: &AiClient,
    persistence: &PersistenceClient,
) {
    if let Err(e) = state_store
        .update_processing_status(&message_id, ProcessingStatus::Running)
        .await
    {
        tracing::error!(error = %e, "failed to advance processing to RUNNING");
    }
    if let Err(e) = state_store
        .update_service_state_status(&message_id, ServiceType::AutoPilot, ProcessingStatus::Running)
        .await
    {
        tracing::error!(error = %e, "failed to advance service state to RUNNING");
    }

    let deadline = Instant::now() + WORKER_DEADLINE;
    let (result, history) = ai_client.process_email(&email, deadline).await;
    if !history.is_empty() {
        tracing::info!(attempts = history.len(), "ai call required retries");
    }

    let outcome = match result {
        Ok(response) => persist_success(&message_id, response, state_store, persistence).await,
        Err(err) => {
            persist_failure(&message_id, &err.to_string(), history, state_store, persistence).await
        }
    };

    match outcome {
        Ok(()) => {
            let _ = state_store
                .update_processing_status(&message_id, ProcessingStatus::Complete)
                .await;
            let _ = state_store
                .update_service_state_status(
                    &message_id,
                    ServiceType::AutoPilot,
                    ProcessingStatus::Complete,
                )
                .await;
        }
        Err(e) => {
            tracing::error!(error = %e, "ai worker terminated with failure");
            let _ = state_store
                .set_error(&message_id, ServiceType::AutoPilot, e.code(), &e.to_string())
                .await;
        }
    }
}

/// Success path: record `task_id`, persist the real incident via P.
async fn persist_success(
    message_id: &MessageId,
    response: AiResponse,
    state_store: &StateStore,
    persistence: &PersistenceClient,
) -> Result<(), WorkerError> {
    if let Err(e) = state_store
        .set_task_id(message_id, ServiceType::AutoPilot, &response.task_id)
        .await
    {
        tracing::error!(error = %e, "failed to record ai task_id");
    }

    let envelope = IncidentEnvelope::from_response(message_id.as_str(), response);
    persistence
        .post_incident(&envelope)
        .await
        .map_err(|e| WorkerError::PersistFailed(e.to_string()))
}

/// Failure path: synthesize an `ErrorResponse` so the UI still gets a
/// visible failed ticket, and persist it via P. The worker is terminal
/// (`FAILED`/`AI_PROCESS_ERROR`) regardless of whether this best-effort
/// persist succeeds.
async fn persist_failure(
    message_id: &MessageId,
    ai_error: &str,
    retry_history: Vec<RetryAttempt>,
    state_store: &StateStore,
    persistence: &PersistenceClient,
) -> Result<(), WorkerError> {
    let _ = state_store; // state is marked FAILED by the caller in all cases.

    let synthesized =
        AiResponse::synthesize_error(message_id.as_str(), ai_error, Utc::now(), retry_history);
    let envelope = IncidentEnvelope::from_response(message_id.as_str(), synthesized);
    if let Err(e) = persistence.post_incident(&envelope).await {
        tracing::error!(error = %e, "failed to persist synthesized error incident");
    }

    Err(WorkerError::AiFailed(ai_error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_deadline_is_ninety_seconds() {
        assert_eq!(WORKER_DEADLINE, std::time::Duration::from_secs(90));
    }

    #[test]
    fn worker_error_always_codes_as_ai_process_error() {
        assert!(matches!(
            WorkerError::AiFailed("x".to_string()).code(),
            ErrorCode::AiProcessError
        ));
        assert!(matches!(
            WorkerError::PersistFailed("x".to_string()).code(),
            ErrorCode::AiProcessError
        ));
    }
}
