use std::time::Duration;

use chrono::Utc;
use incident_core::EmailData;
use rand::Rng;
use secrecy::ExposeSecret;
use serde::Serialize;
use tokio::time::Instant;

use crate::config::AiConfig;
use crate::response::AiResponse;
use crate::response::RetryAttempt;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("ai endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to decode ai response: {0}")]
    Decode(String),
    #[error("ai response failed validation: {0}")]
    Validation(String),
    #[error("retry backoff cancelled: {0}")]
    Cancelled(String),
}

#[derive(Serialize)]
struct AiInputs<'a> {
    subject: &'a str,
    from: &'a str,
    body: &'a str,
}

#[derive(Serialize)]
struct AiRequest<'a> {
    user: &'static str,
    inputs: AiInputs<'a>,
}

/// Thin wrapper over two `reqwest::Client`s (one per timeout class), held as
/// app state and shared across requests — same shape as the teacher's
/// `EmailClient`.
pub struct AiClient {
    long_client: reqwest::Client,
    #[allow(dead_code)] // reserved for future short-timeout AI calls (status polling etc.)
    short_client: reqwest::Client,
    config: AiConfig,
}

impl AiClient {
    pub fn new(config: AiConfig) -> Result<Self, reqwest::Error> {
        let long_client = reqwest::Client::builder().timeout(config.long_timeout).build()?;
        let short_client = reqwest::Client::builder().timeout(config.short_timeout).build()?;
        Ok(Self {
            long_client,
            short_client,
            config,
        })
    }

    fn jittered_delay(&self) -> Duration {
        let min = self.config.min_retry_delay;
        let max = self.config.max_retry_delay;
        let span = max.saturating_sub(min);
        if span.is_zero() {
            return min;
        }
        let extra_ms = rand::thread_rng().gen_range(0..span.as_millis() as u64);
        min + Duration::from_millis(extra_ms)
    }

    async fn try_once(
        &self,
        email: &EmailData,
    ) -> Result<AiResponse, AiError> {
        let payload = AiRequest {
            user: "system",
            inputs: AiInputs {
                subject: &email.subject,
                from: &email.from,
                body: &email.body,
            },
        };

        let resp = self
            .long_client
            .post(&self.config.endpoint)
            .bearer_auth(self.config.token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        let status = resp.status();
        let body_text = resp.text().await.map_err(|e| AiError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(AiError::Http {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let parsed: AiResponse =
            serde_json::from_str(&body_text).map_err(|e| AiError::Decode(e.to_string()))?;

        parsed.validate().map_err(AiError::Validation)?;

        Ok(parsed)
    }

    /// Calls the AI endpoint with up to `max_retries` attempts. `deadline`
    /// is the orchestrator worker's own 90s budget, independent of the
    /// inbound HTTP request's lifetime.
    ///
    /// Returns the final result alongside the full retry accumulator,
    /// rather than mutating a shared response object across attempts.
    #[tracing::instrument(skip(self, email, deadline))]
    pub async fn process_email(
        &self,
        email: &EmailData,
        deadline: Instant,
    ) -> (Result<AiResponse, AiError>, Vec<RetryAttempt>) {
        let mut history = Vec::new();

        for attempt in 1..=self.config.max_retries {
            match self.try_once(email).await {
                Ok(mut resp) => {
                    history.push(RetryAttempt {
                        attempt,
                        last_attempt: Utc::now(),
                        delay_ms: 0,
                        error: String::new(),
                    });
                    resp.retry_history = history.clone();
                    return (Ok(resp), history);
                }
                Err(err) => {
                    let delay = self.jittered_delay();
                    history.push(RetryAttempt {
                        attempt,
                        last_attempt: Utc::now(),
                        delay_ms: delay.as_millis() as u64,
                        error: err.to_string(),
                    });

                    if attempt == self.config.max_retries {
                        return (Err(err), history);
                    }

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = tokio::time::sleep_until(deadline) => {
                            let cause = format!(
                                "deadline exceeded during backoff after attempt {attempt}: {err}"
                            );
                            return (Err(AiError::Cancelled(cause)), history);
                        }
                    }
                }
            }
        }

        // Unreachable: `max_retries >= 1` is enforced by `AiConfig::new`, so
        // the loop above always returns on its last iteration.
        unreachable!("AiConfig guarantees max_retries >= 1")
    }
}
