//! Pricelist Server - Main entry point

use anyhow::Result;
use pricelist_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tracing::info;

use pricelist_server::{api, config::Config, db};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("pricelist-server")
        .filter_directives("pricelist_server=debug,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting Pricelist Server");

    let config = Config::load()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        max_upload_bytes = config.upload.max_upload_bytes,
        "Configuration loaded"
    );

    let pool = db::connect_with_retry(&config.database).await?;
    db::run_migrations(&pool).await?;

    let app = api::create_router(pool.clone(), &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    api::serve(
        listener,
        app,
        shutdown_signal(),
        Duration::from_secs(config.server.shutdown_timeout_secs),
    )
    .await?;

    pool.close().await;
    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
