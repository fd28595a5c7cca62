use std::net::TcpListener;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, dev::Server, web};
use anyhow::Context;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_actix_web::TracingLogger;

use crate::configuration::{DatabaseSettings, Settings};
use crate::routes::{health_check, json_error_handler, subscribe, unsubscribe};
use crate::service::SubscriptionService;
use crate::store::{PostgresSubscriberStore, SubscriberStore};

pub struct Application {
    port: u16,
    server: Server,
    store: PostgresSubscriberStore,
}

impl Application {
    /// Connects to Postgres and migrates the schema before binding, so a
    /// running server always has a usable store behind it.
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let store = PostgresSubscriberStore::initialize(get_connection_pool(
            &configuration.database,
        ))
        .await
        .context("Failed to initialize the subscriber store")?;

        let address = configuration.application.address();
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind to {address}"))?;
        let port = listener.local_addr()?.port();
        tracing::info!("Listening on {}:{}", configuration.application.host, port);

        let server = run(listener, store.clone())?;

        Ok(Self {
            port,
            server,
            store,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolves once the server has shut down, after closing the pool.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        let outcome = self.server.await;
        self.store.close().await;
        tracing::info!("Subscriber store connections closed");
        outcome
    }
}

pub fn get_connection_pool(configuration: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy_with(configuration.with_db())
}

pub fn run<S: SubscriberStore>(listener: TcpListener, store: S) -> Result<Server, std::io::Error> {
    let service = web::Data::new(SubscriptionService::new(store));
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .send_wildcard()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);
        App::new()
            .wrap(cors)
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/newsletter")
                    .route("/subscribe", web::post().to(subscribe::<S>))
                    .route("/unsubscribe", web::post().to(unsubscribe::<S>)),
            )
            .app_data(service.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}
