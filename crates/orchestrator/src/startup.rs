use std::net::TcpListener;
use std::time::Duration;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use actix_web_lab::middleware::from_fn;
use incident_aiclient::AiClient;
use incident_aiclient::IncidentEnvelope;
use incident_authgate::require_bearer_token;
use incident_core::EmailData;
use incident_statestore::StateStore;
use secrecy::ExposeSecret;
use secrecy::Secret;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::routes::health_check;
use crate::routes::receive;
use crate::routes::status;

const X_MESSAGE_ID: &str = "X-Message-ID";

/// Client used to call persistence's `/emails` and `/incidents` endpoints.
/// Held once and shared via `app_data`. Timeout is O's outbound client
/// budget for calls to P: 10s.
pub struct PersistenceClient {
    pub client: reqwest::Client,
    pub base_url: String,
    pub service_token: Secret<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceClientError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("persistence service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
}

impl PersistenceClient {
    pub fn new(
        base_url: String,
        service_token: Secret<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            base_url,
            service_token,
        })
    }

    fn url(
        &self,
        path: &str,
    ) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// `POST /api/v1/emails`.
    pub async fn post_email(
        &self,
        message_id: &str,
        email: &EmailData,
    ) -> Result<(), PersistenceClientError> {
        let resp = self
            .client
            .post(self.url("/api/v1/emails"))
            .bearer_auth(self.service_token.expose_secret())
            .header(X_MESSAGE_ID, message_id)
            .json(email)
            .send()
            .await
            .map_err(|e| PersistenceClientError::Transport(e.to_string()))?;
        Self::check_status(resp).await
    }

    /// `POST /api/v1/incidents`.
    pub async fn post_incident(
        &self,
        envelope: &IncidentEnvelope,
    ) -> Result<(), PersistenceClientError> {
        let resp = self
            .client
            .post(self.url("/api/v1/incidents"))
            .bearer_auth(self.service_token.expose_secret())
            .json(envelope)
            .send()
            .await
            .map_err(|e| PersistenceClientError::Transport(e.to_string()))?;
        Self::check_status(resp).await
    }

    async fn check_status(resp: reqwest::Response) -> Result<(), PersistenceClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(PersistenceClientError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.host, cfg.server_port);
        let listener = TcpListener::bind(addr)?;
        let port = listener.local_addr()?.port();

        let state_store =
            StateStore::connect(cfg.state_store_database_url.expose_secret()).await?;
        state_store.run_migrations().await?;

        let ai_client = AiClient::new(cfg.ai_config()?)?;
        let persistence_client =
            PersistenceClient::new(cfg.persistence_base_url.clone(), cfg.service_token.clone())?;

        let server = run(
            listener,
            state_store,
            ai_client,
            persistence_client,
            cfg.service_token.clone(),
        )
        .await?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 { self.port }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

async fn run(
    listener: TcpListener,
    state_store: StateStore,
    ai_client: AiClient,
    persistence_client: PersistenceClient,
    service_token: Secret<String>,
) -> Result<Server, anyhow::Error> {
    let state_store = web::Data::new(state_store);
    let ai_client = web::Data::new(ai_client);
    let persistence_client = web::Data::new(persistence_client);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("")
                    .wrap(from_fn(require_bearer_token(service_token.clone())))
                    .route("/receive", web::post().to(receive))
                    .route("/status/{message_id}", web::get().to(status)),
            )
            .app_data(state_store.clone())
            .app_data(ai_client.clone())
            .app_data(persistence_client.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
