use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use incident_core::ErrorCode;
use incident_core::ErrorEnvelope;

/// M's error family, each variant carrying the
/// `ErrorCode` recorded onto the state store before the HTTP response is
/// written.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("request body was empty")]
    EmptyBody,
    #[error("failed to read request body: {0}")]
    ReadError(String),
    #[error("parsed MIME message had no usable data")]
    EmptyData,
    #[error("failed to parse MIME message: {0}")]
    ParseMime(String),
    #[error("forwarding to orchestrator failed: {0}")]
    ApiError(String),
    #[error("internal error: {0}")]
    Panic(String),
}

impl ParseError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ParseError::EmptyBody => ErrorCode::EmptyBody,
            ParseError::ReadError(_) => ErrorCode::ReadError,
            ParseError::EmptyData => ErrorCode::EmptyData,
            ParseError::ParseMime(_) => ErrorCode::ParseError,
            ParseError::ApiError(_) => ErrorCode::ApiError,
            ParseError::Panic(_) => ErrorCode::Panic,
        }
    }
}

impl ParseError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ParseError::EmptyBody | ParseError::EmptyData | ParseError::ParseMime(_) => {
                StatusCode::BAD_REQUEST
            }
            ParseError::ReadError(_) | ParseError::ApiError(_) | ParseError::Panic(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Builds the error envelope for this failure against a known
    /// `trace_id` (the message's own id, generated or supplied before any
    /// of these errors can occur).
    pub fn into_response(
        &self,
        trace_id: &str,
    ) -> HttpResponse {
        let envelope = ErrorEnvelope::new(self.status_code().as_u16(), self.to_string(), trace_id)
            .with_detail("ParseError", self.code().as_str());
        HttpResponse::build(self.status_code()).json(envelope)
    }
}

// `ResponseError` is intentionally not implemented: every call site already
// has the message_id in scope and calls `into_response` directly so the
// envelope's `trace_id` is always accurate, rather than falling back to a
// generic conversion that doesn't know the message being processed.
