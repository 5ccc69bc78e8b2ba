use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use actix_web_lab::middleware::from_fn;
use incident_authgate::require_user_session;
use incident_core::SystemClock;
use incident_statestore::StateStore;
use secrecy::ExposeSecret;
use secrecy::Secret;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;

use crate::configuration::DatabaseSettings;
use crate::configuration::Settings;
use crate::routes::emails;
use crate::routes::health_check;
use crate::routes::incidents;
use crate::routes::responses;
use crate::routes::status;

/// Builds a pool without running migrations, for callers (tests) that need
/// their own handle to the same database `Application::build` connected to.
pub fn get_connection_pool(db_cfg: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new().connect_lazy(db_cfg.connection_string().expose_secret()).expect(
        "failed to build lazy pool",
    )
}

/// Threaded through every handler instead of a process-wide global handle:
/// one pool, one clock, one lifecycle, constructed once in
/// `Application::build` and shared via `app_data`.
pub struct AppState {
    pub pool: PgPool,
    pub state_store: StateStore,
    pub clock: SystemClock,
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

        let pool = PgPoolOptions::new()
            .max_connections(100)
            .min_connections(10)
            .max_lifetime(std::time::Duration::from_secs(3600))
            .connect(cfg.database.connection_string().expose_secret())
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        let state_store = StateStore::from_pool(pool.clone());
        state_store.run_migrations().await?;

        let state = web::Data::new(AppState {
            pool,
            state_store,
            clock: SystemClock,
        });

        let server = run(listener, state, cfg.service_token.clone()).await?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 { self.port }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

async fn run(
    listener: TcpListener,
    state: web::Data<AppState>,
    service_token: Secret<String>,
) -> Result<Server, anyhow::Error> {
    let pool_for_auth = state.pool.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/api/v1")
                    .wrap(from_fn(require_user_session(
                        pool_for_auth.clone(),
                        service_token.clone(),
                    )))
                    .route("/emails", web::post().to(emails::save_email))
                    .route("/incidents", web::post().to(incidents::save_incident))
                    .route("/responses", web::post().to(responses::create_response))
                    .route("/status/{message_id}", web::get().to(status::get_status))
                    .route("/status/{message_id}", web::put().to(status::put_status)),
            )
            .app_data(state.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
