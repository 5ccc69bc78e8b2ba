use std::net::TcpListener;
use std::time::Duration;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use actix_web_lab::middleware::from_fn;
use incident_authgate::require_bearer_token;
use incident_statestore::StateStore;
use secrecy::ExposeSecret;
use secrecy::Secret;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::routes::health_check;
use crate::routes::receive;

/// Forwarding client used to POST the parsed email to the orchestrator.
/// Held once and shared via `app_data`, same rationale as the teacher's
/// `EmailClient`: connection reuse across requests.
pub struct OrchestratorClient {
    pub client: reqwest::Client,
    pub base_url: String,
    pub service_token: Secret<String>,
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

        let orchestrator_client = OrchestratorClient {
            // Inherits the client's default timeout rather than a fixed
            // one, and does not retry on failure.
            client: reqwest::Client::new(),
            base_url: cfg.orchestrator_base_url.clone(),
            service_token: cfg.service_token.clone(),
        };

        let server = run(
            listener,
            state_store,
            orchestrator_client,
            cfg.external_api_token.clone(),
            cfg.service_token.clone(),
            cfg.http_write_timeout(),
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
    orchestrator_client: OrchestratorClient,
    external_api_token: Secret<String>,
    service_token: Secret<String>,
    _write_timeout: Duration,
) -> Result<Server, anyhow::Error> {
    let state_store = web::Data::new(state_store);
    let orchestrator_client = web::Data::new(orchestrator_client);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health", web::get().to(health_check))
            .service(
                web::resource("/receive")
                    .wrap(from_fn(require_bearer_token(external_api_token.clone())))
                    .route(web::post().to(receive)),
            )
            .app_data(state_store.clone())
            .app_data(orchestrator_client.clone())
    })
    .listen(listener)?
    .run();

    // `service_token` is not used on M's own inbound surface (only
    // `/receive`, gated above by the external token, is exposed); it is
    // carried through to `OrchestratorClient` for the outbound forward.
    let _ = &service_token;

    Ok(server)
}
