//! PMMIS server
//!
//! ## Usage
//!
//! ```bash
//! # Start with the default settings file
//! pmmis
//!
//! # Start with a custom settings file and database
//! pmmis --config /etc/pmmis.yaml --database /data/pmmis.db
//!
//! # Override the listen address
//! pmmis --bind 0.0.0.0:8080
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pmmis::api::{create_router, AppState};
use pmmis::config::ConfigLoader;
use pmmis::db::{bootstrap, Database};

#[derive(Parser, Debug)]
#[command(name = "pmmis")]
#[command(about = "Project management information system API server")]
struct Args {
    /// Path to the YAML settings file
    #[arg(short, long, env = "PMMIS_CONFIG", default_value = "config/pmmis.yaml")]
    config: PathBuf,

    /// Listen address, overriding `server.bind`
    #[arg(long, env = "PMMIS_BIND")]
    bind: Option<String>,

    /// SQLite database path, overriding `database.path`
    #[arg(long, env = "PMMIS_DATABASE")]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let mut config = ConfigLoader::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.override_bind(bind)?;
    }
    if let Some(path) = args.database {
        config.override_database(path);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.config().logging.level)),
        )
        .init();

    let addr = config.bind_address()?;
    info!(
        config = %args.config.display(),
        database = config.database_path(),
        %addr,
        "Starting pmmis"
    );

    let db = Database::open(config.database_path())?;
    db.with_conn_mut(|conn| bootstrap::ensure_administrator(conn, &config.config().bootstrap))?;

    let router = create_router(AppState::new(config, db));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "Server error");
        return Err(e.into());
    }
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
