//! wallet_core - wallet transfer service
//!
//! Serves client, account and transfer endpoints over HTTP. Transfers are
//! committed through a unit of work on PostgreSQL; resulting events are
//! published to Kafka, or logged when no broker is configured.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wallet_core::api::{self, AppState};
use wallet_core::events::{register_publishers, EventDispatcher, LogPublisher, MessagePublisher};
use wallet_core::{db, Config, PgStore};

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wallet_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Pick the outbound publisher for dispatched events
fn build_publisher(config: &Config) -> anyhow::Result<Arc<dyn MessagePublisher>> {
    #[cfg(feature = "kafka")]
    if let Some(brokers) = &config.kafka_brokers {
        tracing::info!(brokers = %brokers, "Publishing events to Kafka");
        let publisher =
            wallet_core::events::KafkaPublisher::new(brokers, config.kafka_message_timeout)?;
        return Ok(Arc::new(publisher));
    }

    #[cfg(not(feature = "kafka"))]
    if config.kafka_brokers.is_some() {
        tracing::warn!("KAFKA_BROKERS is set but the kafka feature is disabled");
    }

    tracing::info!("Publishing events to the log");
    Ok(Arc::new(LogPublisher))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(environment = %config.environment, "Starting wallet_core server");
    tracing::info!("Connecting to database...");

    let pool = db::connect(&config).await?;
    db::verify_connection(&pool).await?;

    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Please run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }

    tracing::info!("Database connected successfully");

    let uow = Arc::new(PgStore::new(pool.clone()).unit_of_work());

    let dispatcher = Arc::new(EventDispatcher::new());
    register_publishers(&dispatcher, &config.topics, build_publisher(&config)?)?;

    let state = AppState::new(uow, dispatcher);
    let shutdown = state.shutdown.clone();
    let app = api::create_router(state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Uncommitted in-flight units of work roll back
            shutdown.cancel();
        })
        .await?;

    tracing::info!("Server shutting down...");
    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
