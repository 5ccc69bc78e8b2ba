use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// One logged step of the AI workflow's own internal trace, persisted
/// verbatim alongside the incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowLogEntry {
    pub step: String,
    pub action: String,
    pub message: String,
    pub time: String,
}

/// The free-form business fields the AI workflow returns. All optional
/// because the synthesized `ErrorResponse` only fills a
/// handful of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiOutputs {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub workflow_logs: Vec<WorkflowLogEntry>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub incident_text: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, rename = "incidentID")]
    pub incident_number: Option<i64>,
    #[serde(default)]
    pub judgment: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub r#final: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiData {
    pub id: String,
    #[serde(default)]
    pub workflow_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub outputs: AiOutputs,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub total_tokens: Option<i64>,
    #[serde(default)]
    pub total_steps: Option<i64>,
    pub created_at: i64,
    #[serde(default)]
    pub finished_at: Option<i64>,
}

/// Decoded AI workflow response. `retry_history` is never present on the
/// wire (the AI endpoint has no notion of our retry loop); `AiClient`
/// attaches the full accumulator to this field once an attempt finally
/// succeeds, so every attempt — including the successful one — ends up
/// recorded on the response itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiResponse {
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub workflow_run_id: String,
    pub data: AiData,
    #[serde(default, skip_deserializing)]
    pub retry_history: Vec<RetryAttempt>,
}

impl AiResponse {
    /// `task_id != ""`, `data.status != ""`,
    /// `data.error == nil`.
    pub fn validate(&self) -> Result<(), String> {
        if self.task_id.is_empty() {
            return Err("task_id is empty".to_string());
        }
        if self.data.status.is_empty() {
            return Err("data.status is empty".to_string());
        }
        if self.data.error.is_some() {
            return Err(format!(
                "data.error is set: {}",
                self.data.error.as_deref().unwrap_or_default()
            ));
        }
        Ok(())
    }

    /// Synthesizes the fallback incident body used when every retry is
    /// exhausted or the worker's deadline fires mid-retry. `retry_history`
    /// is the accumulator `AiClient::process_email` already built for this
    /// call, carried onto the synthesized response for the same reason it's
    /// carried onto a real success.
    pub fn synthesize_error(
        message_id: &str,
        err: &str,
        now: DateTime<Utc>,
        retry_history: Vec<RetryAttempt>,
    ) -> Self {
        Self {
            task_id: format!("error-{message_id}"),
            workflow_run_id: format!("error-run-{message_id}"),
            retry_history,
            data: AiData {
                id: format!("error-{message_id}"),
                workflow_id: format!("error-workflow-{message_id}"),
                status: "error".to_string(),
                outputs: AiOutputs {
                    priority: Some("high".to_string()),
                    r#final: Some("error".to_string()),
                    body: Some(err.to_string()),
                    workflow_logs: vec![WorkflowLogEntry {
                        step: "1".to_string(),
                        action: "error".to_string(),
                        message: err.to_string(),
                        time: now.to_rfc3339(),
                    }],
                    ..Default::default()
                },
                error: Some(err.to_string()),
                elapsed_time: None,
                total_tokens: None,
                total_steps: None,
                created_at: now.timestamp(),
                finished_at: Some(now.timestamp()),
            },
        }
    }
}

/// The wire envelope the orchestrator posts to persistence's `/incidents`
/// endpoint: an `AiResponse` with the owning `message_id`
/// attached, since the AI endpoint itself never learns the message id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentEnvelope {
    pub task_id: String,
    pub workflow_run_id: String,
    pub message_id: String,
    pub data: AiData,
}

impl IncidentEnvelope {
    pub fn from_response(
        message_id: &str,
        response: AiResponse,
    ) -> Self {
        Self {
            task_id: response.task_id,
            workflow_run_id: response.workflow_run_id,
            message_id: message_id.to_string(),
            data: response.data,
        }
    }
}

/// One recorded retry attempt, accumulated functionally across the retry
/// loop rather than mutated in place. Every attempt is recorded, including
/// the one that finally succeeds (`error` empty, `delay_ms` zero, since
/// nothing is waited on after success).
#[derive(Debug, Clone, Serialize)]
pub struct RetryAttempt {
    pub attempt: u32,
    pub last_attempt: DateTime<Utc>,
    pub delay_ms: u64,
    pub error: String,
}
