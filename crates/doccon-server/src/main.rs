//! Doctor Connect Server: application entry point.

use anyhow::{Context, Result};
use doccon_db::DbManager;
use doccon_server::{AppConfig, AppState, app_router, seed};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("doccon=info".parse()?))
        .json()
        .init();

    tracing::info!("Starting Doctor Connect server...");

    let config = AppConfig::from_env()?;

    let db = DbManager::connect(&config.db)
        .await
        .context("failed to connect to SurrealDB")?;
    doccon_db::run_migrations(db.client())
        .await
        .context("failed to apply schema migrations")?;

    let state = AppState::new(
        db.client().clone(),
        config.auth.clone(),
        config.certificates_dir.clone(),
    );

    if let Some(path) = &config.hospital_seed_file {
        seed::seed_hospitals(&state.hospitals, path).await?;
    }
    if let Some(email) = &config.bootstrap_admin_email {
        seed::promote_admin(&state.doctors, email).await?;
    }

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "Listening");

    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Doctor Connect server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
