//! fgc_notes server
//!
//! Serves the notebook REST API over Axum, backed by Sled.
//!
//! Usage:
//!   cargo run --bin load_data    # seed a demo account
//!   cargo run --bin fgc_notes    # start server
//!   cargo run --bin fgc-cli -- login -u demo -p fightmoney

use std::sync::Arc;

use tokio::{net::TcpListener, signal};
use tracing::info;

use fgc_notes::catalog::Catalog;
use fgc_notes::config::Config;
use fgc_notes::rest::{create_router, AppState};
use fgc_notes::storage::Storage;
use fgc_notes::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let _log_guard = init_tracing(&config);
    config.log_notices();

    info!(data_dir = %config.data_dir.display(), scheme = %config.password_scheme, "Opening storage");
    let storage = Storage::open(&config.data_dir)?;

    let catalog = Arc::new(Catalog::builtin());
    let state = AppState::new(&config, storage.users(), storage.notes(), catalog);
    let app = create_router(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("Server running on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
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
}
