use std::time::Duration;

use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

/// Database connection parameters, spelled to match the literal env var
/// names (`DB_HOST`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`, `DB_PORT`) rather
/// than a single `DATABASE_URL`.
#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub db_host: String,
    pub db_user: String,
    pub db_password: Secret<String>,
    pub db_name: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub db_port: u16,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> Secret<String> {
        Secret::new(format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user,
            self.db_password.expose_secret(),
            self.db_host,
            self.db_port,
            self.db_name,
        ))
    }

    /// Connection string for the server-level database (no `db_name`),
    /// used by tests to `CREATE DATABASE` a fresh randomized name per run.
    pub fn connection_string_without_db(&self) -> Secret<String> {
        Secret::new(format!(
            "postgres://{}:{}@{}:{}",
            self.db_user,
            self.db_password.expose_secret(),
            self.db_host,
            self.db_port,
        ))
    }
}

/// Layered configuration, same mechanism as `mail-converter`/
/// `orchestrator`'s `Settings`.
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
    #[serde(flatten)]
    pub database: DatabaseSettings,
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
        .add_source(config::Environment::default().try_parsing(true))
        .build()?;

    settings.try_deserialize()
}
