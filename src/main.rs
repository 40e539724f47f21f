//! pg-table-admin server
//!
//! Reads its settings from the environment, connects to PostgreSQL and
//! serves the admin API until Ctrl-C.

use std::process::ExitCode;
use std::sync::Arc;

use pg_table_admin::{AdminConfig, AppState, PgExecutor, TableService, create_router};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AdminConfig::from_env()?;
    info!(config = ?config, "Loaded configuration");

    let executor = PgExecutor::connect(&config).await?;
    let service = TableService::new(executor).with_max_page_size(config.max_page_size);
    let state = Arc::new(AppState::new(service, config.debug));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    info!(address = %config.bind_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
