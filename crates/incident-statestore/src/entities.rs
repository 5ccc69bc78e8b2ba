use chrono::DateTime;
use chrono::Utc;
use incident_core::EmailData;
use incident_core::ErrorCode;
use incident_core::MessageId;
use incident_core::ProcessingStatus;
use incident_core::ServiceType;
use serde::Deserialize;
use serde::Serialize;

use crate::StateStoreError;

/// Overall per-message state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailProcessing {
    pub message_id: MessageId,
    pub status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

/// Per-service sub-state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceState {
    pub message_id: MessageId,
    pub service_type: ServiceType,
    pub status: ProcessingStatus,
    pub task_id: Option<String>,
    pub error_code: Option<ErrorCode>,
    pub error_message: Option<String>,
    pub email_data: Option<EmailData>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

pub(crate) fn parse_status(raw: &str) -> Result<ProcessingStatus, StateStoreError> {
    match raw {
        "PENDING" => Ok(ProcessingStatus::Pending),
        "RUNNING" => Ok(ProcessingStatus::Running),
        "COMPLETE" => Ok(ProcessingStatus::Complete),
        "FAILED" => Ok(ProcessingStatus::Failed),
        other => Err(StateStoreError::CorruptRow(format!(
            "unknown status {other:?}"
        ))),
    }
}

pub(crate) fn parse_service_type(raw: &str) -> Result<ServiceType, StateStoreError> {
    match raw {
        "mail-converter" => Ok(ServiceType::MailConverter),
        "auto-pilot" => Ok(ServiceType::AutoPilot),
        "db-pilot" => Ok(ServiceType::DbPilot),
        other => Err(StateStoreError::CorruptRow(format!(
            "unknown service_type {other:?}"
        ))),
    }
}

pub(crate) fn parse_error_code(raw: &str) -> Result<ErrorCode, StateStoreError> {
    Ok(match raw {
        "EMPTY_BODY" => ErrorCode::EmptyBody,
        "READ_ERROR" => ErrorCode::ReadError,
        "EMPTY_DATA" => ErrorCode::EmptyData,
        "PARSE_ERROR" => ErrorCode::ParseError,
        "API_ERROR" => ErrorCode::ApiError,
        "PANIC" => ErrorCode::Panic,
        "BIND_ERROR" => ErrorCode::BindError,
        "SAVE_ERROR" => ErrorCode::SaveError,
        "AI_PROCESS_ERROR" => ErrorCode::AiProcessError,
        other => return Err(StateStoreError::CorruptRow(format!("unknown error_code {other:?}"))),
    })
}
