pub mod api;
pub mod config;
pub mod core_state;
pub mod db;
pub mod errors;
pub mod insurance;
pub mod lifecycle;
pub mod models;
pub mod notifications;
pub mod profile_completion;
pub mod realtime;
pub mod recommendations;
pub mod seed;
pub mod settings;
pub mod timeline;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] core_state::CoreError),
    #[error("Catalog seeding failed: {0}")]
    Seed(#[from] db::DatabaseError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Cannot listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Load config, open the database, seed the catalog on first run and serve
/// until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    let core = Arc::new(core_state::CoreState::open(config.database_path())?);

    if config.seed_catalog {
        let mut conn = core.open_db()?;
        let report = seed::seed_catalog(&mut conn, chrono::Utc::now())?;
        if report.is_empty() {
            tracing::debug!("Catalog already populated");
        } else {
            tracing::info!(
                hospitals = report.hospitals,
                insurance_plans = report.insurance_plans,
                test_kits = report.test_kits,
                "Catalog seeded"
            );
        }
    }

    let server = api::start_api_server(core, config.bind, config.cors_origin.as_deref()).await?;
    tracing::info!(addr = %server.session.server_addr, "Listening");

    tokio::signal::ctrl_c().await.map_err(StartupError::Signal)?;
    tracing::info!("Shutting down");
    server.stop().await;
    Ok(())
}
