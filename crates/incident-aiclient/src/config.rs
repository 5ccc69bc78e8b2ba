use std::time::Duration;

use secrecy::Secret;

#[derive(Debug, thiserror::Error)]
pub enum AiConfigError {
    #[error("AI_SHORT_TIMEOUT must be less than AI_LONG_TIMEOUT")]
    TimeoutOrdering,
    #[error("AI_MAX_RETRIES must be at least 1")]
    MaxRetriesZero,
    #[error("AI_MIN_RETRY_DELAY must be less than AI_MAX_RETRY_DELAY")]
    RetryDelayOrdering,
}

/// Boot-validated configuration for `AiClient`.
#[derive(Clone)]
pub struct AiConfig {
    pub endpoint: String,
    pub token: Secret<String>,
    pub short_timeout: Duration,
    pub long_timeout: Duration,
    pub max_retries: u32,
    pub min_retry_delay: Duration,
    pub max_retry_delay: Duration,
}

impl AiConfig {
    pub fn new(
        endpoint: String,
        token: Secret<String>,
        short_timeout: Duration,
        long_timeout: Duration,
        max_retries: u32,
        min_retry_delay: Duration,
        max_retry_delay: Duration,
    ) -> Result<Self, AiConfigError> {
        if short_timeout >= long_timeout {
            return Err(AiConfigError::TimeoutOrdering);
        }
        if max_retries < 1 {
            return Err(AiConfigError::MaxRetriesZero);
        }
        if min_retry_delay >= max_retry_delay {
            return Err(AiConfigError::RetryDelayOrdering);
        }
        Ok(Self {
            endpoint,
            token,
            short_timeout,
            long_timeout,
            max_retries,
            min_retry_delay,
            max_retry_delay,
        })
    }

    /// Defaults used when the corresponding env var is unset.
    pub fn defaults_with(
        endpoint: String,
        token: Secret<String>,
    ) -> Result<Self, AiConfigError> {
        Self::new(
            endpoint,
            token,
            Duration::from_secs(30),
            Duration::from_secs(90),
            3,
            Duration::from_secs(2),
            Duration::from_secs(5),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> (String, Secret<String>) { ("https://ai.example".to_string(), Secret::new("t".to_string())) }

    #[test]
    fn rejects_bad_timeout_ordering() {
        let (endpoint, token) = cfg();
        let err = AiConfig::new(
            endpoint,
            token,
            Duration::from_secs(90),
            Duration::from_secs(30),
            3,
            Duration::from_secs(2),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, AiConfigError::TimeoutOrdering));
    }

    #[test]
    fn rejects_zero_retries() {
        let (endpoint, token) = cfg();
        let err = AiConfig::new(
            endpoint,
            token,
            Duration::from_secs(30),
            Duration::from_secs(90),
            0,
            Duration::from_secs(2),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, AiConfigError::MaxRetriesZero));
    }

    #[test]
    fn defaults_are_valid() {
        let (endpoint, token) = cfg();
        assert!(AiConfig::defaults_with(endpoint, token).is_ok());
    }
}
