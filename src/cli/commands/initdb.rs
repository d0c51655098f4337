use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use tracing::{debug, error, info, trace};

use crate::config::Settings;
use crate::store::Store;

/// Connects and applies all pending migrations.
pub(crate) async fn migrate(store: &Store) -> Result<&DatabaseConnection> {
    trace!("Attempting to connect to database");
    let db = match store.conn().await {
        Ok(connection) => {
            debug!("Database connection established");
            connection
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    info!("Running database migrations");
    match Migrator::up(db, None).await {
        Ok(_) => {
            info!("Database migrations completed successfully");
        }
        Err(e) => {
            error!("Failed to run database migrations: {}", e);
            return Err(e.into());
        }
    }
    Ok(db)
}

pub async fn init_database(settings: &Settings) -> Result<()> {
    info!("Initializing database");
    debug!("Database URL: {}", settings.database_url());

    let store = Store::new(settings.connect_options());
    migrate(&store).await?;
    store.close().await?;

    info!("Database initialization completed successfully!");
    Ok(())
}
