use once_cell::sync::Lazy;
use persistence::configuration::get_configuration;
use persistence::startup::get_connection_pool;
use persistence::Application;
use secrecy::ExposeSecret;
use sqlx::Connection;
use sqlx::Executor;
use sqlx::PgConnection;
use sqlx::PgPool;
use uuid::Uuid;

static TRACING: Lazy<()> = Lazy::new(|| {
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber =
                incident_telemetry::get_subscriber("test", "debug", std::io::stdout);
            incident_telemetry::init_subscriber(subscriber);
        }
        Err(_) => {
            let subscriber = incident_telemetry::get_subscriber("test", "debug", std::io::sink);
            incident_telemetry::init_subscriber(subscriber);
        }
    }
});

pub struct TestApp {
    pub addr: String,
    pub pool: PgPool,
    pub service_token: String,
}

impl TestApp {
    pub fn url(
        &self,
        path: &str,
    ) -> String {
        format!("{}{path}", self.addr)
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> reqwest::Response {
        reqwest::Client::new()
            .post(self.url(path))
            .bearer_auth(&self.service_token)
            .json(body)
            .send()
            .await
            .expect("execute request")
    }
}

async fn configure_database(cfg: &persistence::configuration::DatabaseSettings) -> PgPool {
    let mut conn = PgConnection::connect(cfg.connection_string_without_db().expose_secret())
        .await
        .expect("postgres must be running");

    conn.execute(format!(r#"CREATE DATABASE "{}";"#, cfg.db_name).as_str())
        .await
        .expect("failed to create test database");

    let pool = PgPool::connect(cfg.connection_string().expose_secret())
        .await
        .expect("failed to connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run persistence migrations");
    sqlx::migrate!("../incident-statestore/migrations")
        .run(&pool)
        .await
        .expect("failed to run state-store migrations");
    pool
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let cfg = {
        let mut cfg = get_configuration().expect("failed to read configuration");
        cfg.database.db_name = Uuid::new_v4().to_string();
        cfg.server_port = 0;
        cfg
    };

    let _pool = configure_database(&cfg.database).await;

    let pool = get_connection_pool(&cfg.database);
    let app = Application::build(cfg.clone()).await.expect("failed to build application");
    let addr = format!("http://localhost:{}", app.port());
    tokio::spawn(app.run_until_stopped());

    TestApp {
        addr,
        pool,
        service_token: cfg.service_token.expose_secret().clone(),
    }
}
