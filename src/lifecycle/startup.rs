//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Start the config watcher and admin API
//! - Bind the main listener and serve until a signal arrives
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::admin::setup_admin_router;
use crate::config::validation::validate_config;
use crate::config::watcher::ConfigWatcher;
use crate::config::{load_config, AuthConfig, ConfigError};
use crate::http::tls::load_tls_config;
use crate::http::HttpServer;
use crate::lifecycle::signals::wait_for_signal;
use crate::lifecycle::Shutdown;
use crate::observability::{logging, metrics};

/// Run the service until SIGINT/SIGTERM. `config_path` is watched for changes.
pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    // A file is validated on load; the defaults carry no usable signing key and are refused here.
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => {
            let config = AuthConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            config
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("auth-routes v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        app_url = %config.app.url,
        registration = config.registration.enabled,
        config_file = ?config_path,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config.clone())?;
    let shutdown = Shutdown::new();

    // Keep the watcher alive for the life of the server.
    let (_watcher, config_updates) = match &config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    if config.admin.enabled {
        let admin = setup_admin_router(server.state().clone());
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let mut admin_shutdown = shutdown.subscribe();
        tracing::info!(address = %config.admin.bind_address, "Admin API listening");
        tokio::spawn(async move {
            let result = axum::serve(listener, admin)
                .with_graceful_shutdown(async move {
                    let _ = admin_shutdown.recv().await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    let server_shutdown = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    match &config.listener.tls {
        Some(tls) => {
            let tls_config = load_tls_config(tls).await?;
            let addr: SocketAddr = config.listener.bind_address.parse()?;
            server.run_tls(addr, tls_config, config_updates, server_shutdown).await?;
        }
        None => {
            let listener = TcpListener::bind(&config.listener.bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, config_updates, server_shutdown).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
