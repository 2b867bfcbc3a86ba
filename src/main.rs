use std::net::SocketAddr;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mini_notes_api::config::{self, DEV_JWT_SECRET};
use mini_notes_api::database::{seed, DatabaseManager};
use mini_notes_api::middleware::spawn_sweeper;
use mini_notes_api::{app, is_production, AppState};

const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config().clone();
    info!("Starting Mini Notes API in {:?} mode", config.environment);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }
    if !is_production!() && config.security.jwt_secret == DEV_JWT_SECRET {
        warn!("Using the built-in development JWT secret; set JWT_SECRET outside local development");
    }

    let pool = DatabaseManager::connect(&config.database).await?;
    if config.database.run_migrations {
        DatabaseManager::migrate(&pool).await?;
    }
    if config.database.seed_demo_account {
        seed::seed_demo_account(&pool, config.security.bcrypt_cost, &config.tos.current_version).await?;
    }

    let state = AppState::new(pool.clone(), config);
    let sweeper = spawn_sweeper(state.limits.clone(), RATE_LIMIT_SWEEP_INTERVAL);
    let port = state.config.server.port;
    let router = app(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    info!("Mini Notes API listening on http://{}", bind_addr);

    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    DatabaseManager::close(&pool).await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
