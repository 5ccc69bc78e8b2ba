use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use incident_core::ErrorCode;
use incident_core::ErrorEnvelope;

/// O's ingest-time error family, terminal before the async hand-off.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("X-Message-ID header is required")]
    MissingMessageId,
    #[error("failed to decode request body: {0}")]
    BindError(String),
    #[error("failed to save email via persistence service: {0}")]
    SaveError(String),
}

impl IngestError {
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            IngestError::MissingMessageId => None,
            IngestError::BindError(_) => Some(ErrorCode::BindError),
            IngestError::SaveError(_) => Some(ErrorCode::SaveError),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            IngestError::MissingMessageId | IngestError::BindError(_) => StatusCode::BAD_REQUEST,
            IngestError::SaveError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(
        &self,
        trace_id: &str,
    ) -> HttpResponse {
        let mut envelope =
            ErrorEnvelope::new(self.status_code().as_u16(), self.to_string(), trace_id);
        if let Some(code) = self.code() {
            envelope = envelope.with_detail("IngestError", code.as_str());
        }
        HttpResponse::build(self.status_code()).json(envelope)
    }
}

/// O's worker-time error family: always terminal, always `AI_PROCESS_ERROR`
/// regardless of whether the failure originated in the AI call itself or in
/// the subsequent persist of the (possibly synthesized) incident.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("ai workflow failed: {0}")]
    AiFailed(String),
    #[error("failed to persist incident: {0}")]
    PersistFailed(String),
}

impl WorkerError {
    pub fn code(&self) -> ErrorCode { ErrorCode::AiProcessError }
}
