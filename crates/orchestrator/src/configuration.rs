use std::time::Duration;

use incident_aiclient::AiConfig;
use incident_aiclient::AiConfigError;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

/// Layered configuration, same mechanism as `mail-converter`'s `Settings`:
/// `base.yaml` + `{local,production}.yaml` + flat environment override.
/// Field names are spelled to match the literal env var names an operator
/// actually sets (`SERVICE_TOKEN`, `AI_ENDPOINT`, ...).
#[derive(Deserialize, Clone)]
pub struct Settings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub server_port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub shutdown_timeout: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub http_read_timeout: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub http_write_timeout: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub http_idle_timeout: u64,
    pub service_token: Secret<String>,
    pub persistence_base_url: String,
    pub state_store_database_url: Secret<String>,
    pub ai_endpoint: String,
    pub ai_token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub ai_short_timeout: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub ai_long_timeout: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub ai_max_retries: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub ai_min_retry_delay_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub ai_max_retry_delay_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String { "0.0.0.0".to_string() }

fn default_log_level() -> String { "info".to_string() }

impl Settings {
    pub fn shutdown_timeout(&self) -> Duration { Duration::from_secs(self.shutdown_timeout) }

    pub fn http_read_timeout(&self) -> Duration { Duration::from_secs(self.http_read_timeout) }

    pub fn http_write_timeout(&self) -> Duration { Duration::from_secs(self.http_write_timeout) }

    pub fn http_idle_timeout(&self) -> Duration { Duration::from_secs(self.http_idle_timeout) }

    /// Builds the boot-validated `AiConfig` out of the flat env fields above
    /// (ordering invariants are enforced inside `AiConfig::new`).
    pub fn ai_config(&self) -> Result<AiConfig, AiConfigError> {
        AiConfig::new(
            self.ai_endpoint.clone(),
            self.ai_token.clone(),
            Duration::from_secs(self.ai_short_timeout),
            Duration::from_secs(self.ai_long_timeout),
            self.ai_max_retries,
            Duration::from_millis(self.ai_min_retry_delay_ms),
            Duration::from_millis(self.ai_max_retry_delay_ms),
        )
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("failed to determine current directory");
    let configuration_directory = base_path.join("configuration");

    let environment: String =
        std::env::var("ENVIRONMENT").unwrap_or_else(|_| "local".to_string());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(
            config::File::from(configuration_directory.join(format!("{environment}.yaml")))
                .required(false),
        )
        .add_source(config::Environment::default().try_parsing(true))
        .build()?;

    settings.try_deserialize()
}
