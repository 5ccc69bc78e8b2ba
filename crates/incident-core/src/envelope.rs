use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Error codes recorded onto state-store rows. Each binary only
/// ever produces the subset that belongs to it, but the type is shared so
/// `ServiceState.error_code` has one stable wire representation across all
/// three services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // M.Parse
    EmptyBody,
    ReadError,
    EmptyData,
    ParseError,
    ApiError,
    Panic,
    // O.Ingest / O.Worker
    BindError,
    SaveError,
    AiProcessError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::EmptyBody => "EMPTY_BODY",
            ErrorCode::ReadError => "READ_ERROR",
            ErrorCode::EmptyData => "EMPTY_DATA",
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::ApiError => "API_ERROR",
            ErrorCode::Panic => "PANIC",
            ErrorCode::BindError => "BIND_ERROR",
            ErrorCode::SaveError => "SAVE_ERROR",
            ErrorCode::AiProcessError => "AI_PROCESS_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The JSON body every service returns on error (and wraps a `trace_id`
/// around on success where convenient).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub status: String,
    pub code: u16,
    pub message: String,
    pub trace_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(
        code: u16,
        message: impl Into<String>,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            status: "error".to_string(),
            code,
            message: message.into(),
            trace_id: trace_id.into(),
            timestamp: Utc::now(),
            error: None,
        }
    }

    pub fn with_detail(
        mut self,
        kind: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        self.error = Some(ErrorDetail {
            kind: kind.into(),
            message: self.message.clone(),
            detail: Some(detail.into()),
        });
        self
    }

    /// Builds the `status:"success"` variant of the same envelope shape,
    /// used by M and O's `/receive` handlers to acknowledge ingest.
    pub fn success(
        code: u16,
        message: impl Into<String>,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            status: "success".to_string(),
            code,
            message: message.into(),
            trace_id: trace_id.into(),
            timestamp: Utc::now(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_serializes_status_error() {
        let env = ErrorEnvelope::new(400, "bad request", "M1");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["trace_id"], "M1");
    }
}
