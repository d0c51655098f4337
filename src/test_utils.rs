use axum::Router;
use axum_test::TestServer;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::router::create_router;
use crate::schemas::AppState;
use crate::store::Store;

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Create AppState for testing
pub async fn setup_test_app_state() -> AppState {
    AppState::new(Store::from_connection(setup_test_db().await))
}

/// Initialize tracing for tests with output to STDERR.
///
/// The log level is taken from RUST_LOG and defaults to WARN.
fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

/// Create axum app for testing
pub async fn setup_test_app() -> Router {
    let _guard = init_test_tracing();
    create_router(setup_test_app_state().await)
}

/// Create a test server over a fresh database
pub async fn setup_test_server() -> TestServer {
    TestServer::new(setup_test_app().await).expect("Failed to start test server")
}
