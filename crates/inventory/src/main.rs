//! `inventory-svc`: binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables, including the
//!    secret key. Any failure here aborts startup.
//! 2. Initialise the telemetry pipeline (tracing + optional OTLP).
//! 3. Build the record table: DynamoDB, or in-memory for local runs.
//! 4. Assemble the [`RecordStore`] over the table and the field cipher.
//! 5. Build the Axum router and serve until Ctrl-C / SIGTERM.

mod aws;
mod config;
mod crypto;
mod key;
mod record;
mod server;
mod store;
mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use config::{Config, StorageBackend};
use crypto::FieldCipher;
use record::RecordCodec;
use server::state::AppState;
use store::{DynamoTable, ItemTable, MemoryTable, RecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        backend = ?cfg.storage_backend,
        auth_enabled = cfg.auth_token().is_some(),
        "inventory-svc starting"
    );

    // -----------------------------------------------------------------------
    // 3. Record table
    // -----------------------------------------------------------------------
    let table: Arc<dyn ItemTable> = match cfg.storage_backend {
        StorageBackend::Dynamodb => {
            let aws = aws::AwsClients::init(cfg.dynamodb_endpoint.as_deref()).await?;
            let table_name = cfg
                .table_name
                .clone()
                .context("TABLE_NAME is required for the dynamodb backend")?;
            info!(table = %table_name, "using DynamoDB table");
            Arc::new(DynamoTable::new(aws.dynamodb, table_name))
        }
        StorageBackend::Memory => {
            warn!("using in-memory table; records are lost on exit");
            Arc::new(MemoryTable::new())
        }
    };

    // -----------------------------------------------------------------------
    // 4. Record store
    // -----------------------------------------------------------------------
    let codec = RecordCodec::new(FieldCipher::new(cfg.secret_key.clone()));
    let store = RecordStore::new(table, codec);

    // -----------------------------------------------------------------------
    // 5. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(store, cfg.auth_token());
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("inventory-svc stopped");
    telemetry::shutdown_telemetry();
    Ok(())
}

/// Resolve when the process receives Ctrl-C or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
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
    info!("shutdown signal received");
}
