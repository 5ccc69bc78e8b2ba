use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use incident_core::ErrorEnvelope;

/// P's error family: 400 on bind errors, 404 on missing entity, 409 on
/// duplicate relation, 500 on unexpected DB failure.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to decode request body: {0}")]
    BindError(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("duplicate relation: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(String),
}

impl PersistenceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PersistenceError::BindError(_) => StatusCode::BAD_REQUEST,
            PersistenceError::NotFound(_) => StatusCode::NOT_FOUND,
            PersistenceError::Conflict(_) => StatusCode::CONFLICT,
            PersistenceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(
        &self,
        trace_id: &str,
    ) -> HttpResponse {
        let envelope = ErrorEnvelope::new(self.status_code().as_u16(), self.to_string(), trace_id);
        HttpResponse::build(self.status_code()).json(envelope)
    }
}

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            // The `emails.message_id` unique index is the only unique
            // constraint the core write paths can hit, and a losing
            // concurrent insert there is specified (S4) as a plain 500, not
            // a 409 — `Conflict` is reserved for the out-of-core
            // `/incident-relations` duplicate-relation surface, which never
            // goes through this blanket conversion.
            sqlx::Error::RowNotFound => PersistenceError::NotFound("row".to_string()),
            other => PersistenceError::Database(other.to_string()),
        }
    }
}
