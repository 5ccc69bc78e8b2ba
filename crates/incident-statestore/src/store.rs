use std::sync::Arc;

use incident_core::Clock;
use incident_core::EmailData;
use incident_core::ErrorCode;
use incident_core::MessageId;
use incident_core::ProcessingStatus;
use incident_core::ServiceType;
use incident_core::SystemClock;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::entities::parse_error_code;
use crate::entities::parse_service_type;
use crate::entities::parse_status;
use crate::EmailProcessing;
use crate::ServiceState;

#[derive(Debug, thiserror::Error)]
pub enum StateStoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("row in unexpected shape: {0}")]
    CorruptRow(String),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Postgres-backed implementation of the shared processing state store.
/// Owns its own pool; M and O each construct one pointed at the same
/// database (see DESIGN.md's resolution of `STATE_STORE_DATABASE_URL`).
pub struct StateStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl StateStore {
    pub async fn connect(database_url: &str) -> Result<Self, StateStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(
        mut self,
        clock: Arc<dyn Clock>,
    ) -> Self {
        self.clock = clock;
        self
    }

    pub fn pool(&self) -> &PgPool { &self.pool }

    pub async fn run_migrations(&self) -> Result<(), StateStoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now_jst().with_timezone(&chrono::Utc)
    }

    /// Initializes `EmailProcessing(PENDING)` and
    /// `ServiceState(service, PENDING)` for `message_id`. Per Open Question
    /// #1 (DESIGN.md), re-invoking for an already-present message_id resets
    /// both rows to PENDING rather than erroring — matches the source's
    /// unconditional-write behavior.
    #[tracing::instrument(skip(self))]
    pub async fn create_processing(
        &self,
        message_id: &MessageId,
        service: ServiceType,
    ) -> Result<(), StateStoreError> {
        let now = self.now();
        let mut tx = self.pool.begin().await?;

        sqlx::query!(
            r#"
            INSERT INTO email_processing (message_id, status, created_at, updated_at)
            VALUES ($1, 'PENDING', $2, $2)
            ON CONFLICT (message_id) DO UPDATE SET
                status = 'PENDING',
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at,
                completed_at = NULL,
                error_message = NULL
            "#,
            message_id.as_str(),
            now,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query!(
            r#"
            INSERT INTO service_state (message_id, service_type, status, created_at, updated_at)
            VALUES ($1, $2, 'PENDING', $3, $3)
            ON CONFLICT (message_id, service_type) DO UPDATE SET
                status = 'PENDING',
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at,
                completed_at = NULL,
                error_code = NULL,
                error_message = NULL
            "#,
            message_id.as_str(),
            service.as_str(),
            now,
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_processing(
        &self,
        message_id: &MessageId,
    ) -> Result<Option<EmailProcessing>, StateStoreError> {
        let row = sqlx::query!(
            r#"
            SELECT message_id, status, created_at, updated_at, completed_at, error_message
            FROM email_processing WHERE message_id = $1
            "#,
            message_id.as_str(),
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(EmailProcessing {
                message_id: MessageId::new(r.message_id),
                status: parse_status(&r.status)?,
                created_at: r.created_at,
                updated_at: r.updated_at,
                completed_at: r.completed_at,
                error_message: r.error_message,
            })
        })
        .transpose()
    }

    /// Advances `EmailProcessing.status`. Callers are expected to only call
    /// this with a forward transition (`ProcessingStatus::can_advance_to`);
    /// the store itself does not re-check monotonicity since each message_id's
    /// transitions are already linearized by its owning worker.
    #[tracing::instrument(skip(self))]
    pub async fn update_processing_status(
        &self,
        message_id: &MessageId,
        status: ProcessingStatus,
    ) -> Result<(), StateStoreError> {
        let now = self.now();
        let completed_at = status.is_terminal().then_some(now);
        sqlx::query!(
            r#"
            UPDATE email_processing
            SET status = $2, updated_at = $3, completed_at = COALESCE($4, completed_at)
            WHERE message_id = $1
            "#,
            message_id.as_str(),
            status.as_str(),
            now,
            completed_at,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_service_state(
        &self,
        message_id: &MessageId,
        service: ServiceType,
    ) -> Result<Option<ServiceState>, StateStoreError> {
        let row = sqlx::query!(
            r#"
            SELECT message_id, service_type, status, task_id, error_code, error_message,
                   email_data, created_at, updated_at, completed_at
            FROM service_state WHERE message_id = $1 AND service_type = $2
            "#,
            message_id.as_str(),
            service.as_str(),
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            let email_data = r
                .email_data
                .map(|v| serde_json::from_value::<EmailData>(v))
                .transpose()?;
            Ok(ServiceState {
                message_id: MessageId::new(r.message_id),
                service_type: parse_service_type(&r.service_type)?,
                status: parse_status(&r.status)?,
                task_id: r.task_id,
                error_code: r.error_code.as_deref().map(parse_error_code).transpose()?,
                error_message: r.error_message,
                email_data,
                created_at: r.created_at,
                updated_at: r.updated_at,
                completed_at: r.completed_at,
            })
        })
        .transpose()
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_service_state_status(
        &self,
        message_id: &MessageId,
        service: ServiceType,
        status: ProcessingStatus,
    ) -> Result<(), StateStoreError> {
        let now = self.now();
        let completed_at = status.is_terminal().then_some(now);
        sqlx::query!(
            r#"
            UPDATE service_state
            SET status = $3, updated_at = $4, completed_at = COALESCE($5, completed_at)
            WHERE message_id = $1 AND service_type = $2
            "#,
            message_id.as_str(),
            service.as_str(),
            status.as_str(),
            now,
            completed_at,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Records the AI task id. Only meaningful while the service's own
    /// status is RUNNING; the caller (the orchestrator's
    /// AI worker) enforces the ordering, this is a plain single-column write.
    #[tracing::instrument(skip(self))]
    pub async fn set_task_id(
        &self,
        message_id: &MessageId,
        service: ServiceType,
        task_id: &str,
    ) -> Result<(), StateStoreError> {
        let now = self.now();
        sqlx::query!(
            r#"
            UPDATE service_state SET task_id = $3, updated_at = $4
            WHERE message_id = $1 AND service_type = $2
            "#,
            message_id.as_str(),
            service.as_str(),
            task_id,
            now,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Embeds the parsed `EmailData` (with its body already truncated by the
    /// caller) into the `ServiceState` row.
    #[tracing::instrument(skip(self, email))]
    pub async fn embed_email_data(
        &self,
        message_id: &MessageId,
        service: ServiceType,
        email: &EmailData,
    ) -> Result<(), StateStoreError> {
        let now = self.now();
        let payload = serde_json::to_value(email)?;
        sqlx::query!(
            r#"
            UPDATE service_state SET email_data = $3, updated_at = $4
            WHERE message_id = $1 AND service_type = $2
            "#,
            message_id.as_str(),
            service.as_str(),
            payload,
            now,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Marks both `EmailProcessing` and `ServiceState` FAILED with
    /// `completed_at = now`.
    #[tracing::instrument(skip(self))]
    pub async fn set_error(
        &self,
        message_id: &MessageId,
        service: ServiceType,
        code: ErrorCode,
        message: &str,
    ) -> Result<(), StateStoreError> {
        let now = self.now();
        let mut tx = self.pool.begin().await?;

        sqlx::query!(
            r#"
            UPDATE email_processing
            SET status = 'FAILED', updated_at = $2, completed_at = $2, error_message = $3
            WHERE message_id = $1
            "#,
            message_id.as_str(),
            now,
            message,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query!(
            r#"
            UPDATE service_state
            SET status = 'FAILED', updated_at = $3, completed_at = $3,
                error_code = $4, error_message = $5
            WHERE message_id = $1 AND service_type = $2
            "#,
            message_id.as_str(),
            service.as_str(),
            now,
            code.as_str(),
            message,
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Exercised against a live Postgres instance in
    // `mail-converter`/`orchestrator`'s `tests/` integration suites
    // (`helpers::TestApp`), not here — this crate has no network-free way to
    // fake `sqlx::PgPool`.
}
