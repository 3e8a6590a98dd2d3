pub mod accounts;
pub mod api;
pub mod booking;
pub mod config;
pub mod db;
pub mod models;
pub mod notify;
pub mod prescriptions;
pub mod state;
pub mod validation;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ServerConfig};
use crate::db::DatabaseError;
use crate::notify::{LogTransport, Outbox};
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Cannot create data directory: {0}")]
    DataDir(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
}

/// Start the service and block until Ctrl-C.
pub async fn run() -> Result<(), RunError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ServerConfig::from_env()?;
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Migrations run once here; request handlers open plain connections.
    let conn = db::open_database(&config.db_path)?;
    let now = chrono::Local::now().naive_local();
    let purged = db::purge_expired_sessions(&conn, &now)?;
    drop(conn);
    tracing::info!(db = %config.db_path.display(), purged, "database ready");

    let outbox = Arc::new(Outbox::spawn(LogTransport));
    let bind = config.bind;
    let state = Arc::new(AppState::new(config, outbox.clone()));
    let server = api::start_server(state, bind).await?;
    tracing::info!(addr = %server.session.server_addr, "listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
    }
    server.stop().await;

    match Arc::try_unwrap(outbox) {
        Ok(outbox) => outbox.close().await,
        Err(_) => tracing::warn!("outbox still shared at shutdown, pending messages dropped"),
    }
    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}
