//! Application entry point and server initialization
//!
//! This module contains the main function that:
//! - Loads environment configuration
//! - Loads the region catalog and opens the database
//! - Starts the HTTP server with graceful shutdown support

use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use visitmap::catalog::RegionCatalog;
use visitmap::config::Config;
use visitmap::database::{init_db, AppState};
use visitmap::route::create_app;

/// Application entry point
///
/// # Environment Variables
///
/// - `PORT` - Server port number (default: 8080)
/// - `DATABASE_URL` - Path to database file (default: "data.db")
/// - `URL` - Public base URL used for photo links (default: "http://localhost")
/// - `AUTHORIZATION` - Shared API key; the API is open when unset
/// - `REGION_CATALOG` - JSON file replacing the built-in prefecture catalog
/// - `RUST_LOG` - Log filter (default: "visitmap=debug,tower_http=debug")
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("visitmap=debug,tower_http=debug")),
        )
        .init();

    let catalog = match config.catalog_path.as_deref() {
        Some(path) => RegionCatalog::load(path)?,
        None => RegionCatalog::builtin(),
    };
    let db = init_db(&config.database_url)?;

    let port = config.port;
    tracing::info!(
        database = %config.database_url,
        regions = catalog.total_regions(),
        auth = config.api_key.is_some(),
        "starting visit map server"
    );

    let state = AppState::new(db, catalog, config);
    let app = create_app(state).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("listening on http://localhost:{}", port);

    // Open transactions finish before the database handle is dropped
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
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

    tracing::info!("shutdown signal received, stopping server");
}
