use anyhow::Result;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info, trace, warn};

use crate::config::Settings;
use crate::router::{attach_metrics, create_router};
use crate::schemas::AppState;
use crate::store::Store;

pub async fn serve(settings: &Settings) -> Result<()> {
    trace!("Entering serve function");
    info!("fintrack starting up");

    let store = Store::new(settings.connect_options());
    trace!("Attempting eager database connection");
    if let Err(e) = store.conn().await {
        warn!("Database unavailable at startup, retrying on first request: {}", e);
    }

    run_server(store, settings).await
}

/// Serves the API on `settings.bind_address` until a shutdown signal arrives,
/// then closes the database connection.
pub(crate) async fn run_server(store: Store, settings: &Settings) -> Result<()> {
    let state = AppState::new(store);

    trace!("Creating application router");
    let mut app = create_router(state.clone());
    if settings.metrics {
        debug!("Prometheus metrics enabled");
        app = attach_metrics(app);
    }

    let bind_address = &settings.bind_address;
    info!("Starting server on {}", bind_address);
    let listener = match TcpListener::bind(bind_address).await {
        Ok(listener) => {
            debug!("Successfully bound to address: {}", bind_address);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", bind_address, e);
            return Err(e.into());
        }
    };

    info!("fintrack API server running on http://{}", bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    match Arc::into_inner(state.store) {
        Some(store) => {
            if let Err(e) = store.close().await {
                warn!("Failed to close database connection: {}", e);
            }
        }
        None => warn!("Database handle still shared at shutdown, not closing"),
    }

    info!("Server shutdown gracefully");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM, whichever comes first.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => debug!("Received ctrl+c signal."),
        _ = terminate => debug!("Received terminate signal."),
    }
    info!("Shutting down gracefully");
}
