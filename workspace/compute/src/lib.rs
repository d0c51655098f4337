//! Reporting over the transaction and budget tables.
//!
//! Aggregation runs in Rust over rows filtered by the database, so decimal
//! amounts are summed exactly regardless of the backend.

pub mod budget;
pub mod error;
pub mod transaction;

pub use error::{ComputeError, Result};

#[cfg(test)]
pub(crate) mod testing {
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};

    pub async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");
        Migrator::up(&db, None).await.expect("Migrations failed.");
        db
    }
}
