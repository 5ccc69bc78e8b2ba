use std::time::Duration;

use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

/// Layered configuration: `base.yaml` +
/// `{local,production}.yaml` + flat environment override, same mechanism as
/// the teacher's `configuration.rs`. Field names are kept flat and spelled
/// to match the literal env var names an operator actually sets
/// (`SERVER_PORT`, `SERVICE_TOKEN`, ...) rather than nested under an
/// `APP__` prefix.
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
    pub external_api_token: Secret<String>,
    pub service_token: Secret<String>,
    pub orchestrator_base_url: String,
    pub state_store_database_url: Secret<String>,
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
        // Flat environment override: no separator, so `SERVICE_TOKEN` maps
        // directly onto `Settings::service_token` (config's env source
        // matches field names case-insensitively).
        .add_source(config::Environment::default().try_parsing(true))
        .build()?;

    settings.try_deserialize()
}
