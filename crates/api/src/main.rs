use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cad_db::{DispatchStore, MemoryDispatchStore, PgDispatchStore, StoreError};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cad_api::config::{ServerConfig, StoreBackend};
use cad_api::realtime::EventRelay;
use cad_api::router::build_app_router;
use cad_api::state::AppState;
use cad_api::ws;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cad_api=debug,cad_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        store = %config.store,
        "Loaded server configuration"
    );

    // --- Store ---
    let store = open_store(&config).await.expect("Failed to open dispatch store");

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Event bus ---
    let event_bus = Arc::new(cad_events::EventBus::default());
    let relay_cancel = CancellationToken::new();
    let relay_handle = tokio::spawn(
        EventRelay::new(Arc::clone(&ws_manager)).run(event_bus.subscribe(), relay_cancel.clone()),
    );
    tracing::info!("Event relay started");

    // --- App state & router ---
    let state = AppState::new(
        store,
        config.clone(),
        Arc::clone(&ws_manager),
        Arc::clone(&event_bus),
    );
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    relay_cancel.cancel();
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let _ = tokio::time::timeout(shutdown_timeout, relay_handle).await;
    drop(event_bus);
    tracing::info!("Event relay stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

/// Open the configured store. Postgres is health-checked and migrated first.
async fn open_store(config: &ServerConfig) -> Result<Arc<dyn DispatchStore>, StoreError> {
    match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; nothing will be persisted");
            Ok(Arc::new(MemoryDispatchStore::new()))
        }
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| StoreError::Unavailable("DATABASE_URL must be set".into()))?;

            let pool = cad_db::create_pool(database_url).await?;
            tracing::info!("Database connection pool created");

            cad_db::health_check(&pool).await?;
            tracing::info!("Database health check passed");

            cad_db::run_migrations(&pool).await?;
            tracing::info!("Database migrations applied");

            Ok(Arc::new(PgDispatchStore::new(pool)))
        }
    }
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
