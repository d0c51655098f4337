use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument};

/// Lazily connected database handle shared by all handlers.
///
/// The first successful connection is memoized; a failed attempt is not, so
/// the next caller retries.
#[derive(Debug)]
pub struct Store {
    options: ConnectOptions,
    connection: OnceCell<DatabaseConnection>,
}

impl Store {
    pub fn new(options: ConnectOptions) -> Self {
        Self {
            options,
            connection: OnceCell::new(),
        }
    }

    /// Wraps an already established connection.
    pub fn from_connection(connection: DatabaseConnection) -> Self {
        Self {
            options: ConnectOptions::new("sqlite::memory:"),
            connection: OnceCell::new_with(Some(connection)),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    /// Returns the shared connection, connecting first if needed.
    #[instrument(skip(self))]
    pub async fn conn(&self) -> Result<&DatabaseConnection, DbErr> {
        self.connection
            .get_or_try_init(|| async {
                info!("Connecting to database");
                match Database::connect(self.options.clone()).await {
                    Ok(connection) => {
                        info!("Database connection established");
                        Ok(connection)
                    }
                    Err(e) => {
                        error!("Failed to connect to database: {}", e);
                        Err(e)
                    }
                }
            })
            .await
    }

    pub async fn ping(&self) -> Result<(), DbErr> {
        self.conn().await?.ping().await
    }

    /// Closes the connection if one was ever established.
    pub async fn close(self) -> Result<(), DbErr> {
        match self.connection.into_inner() {
            Some(connection) => {
                debug!("Closing database connection");
                connection.close().await
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_connects_lazily_and_memoizes() {
        let store = Store::new(ConnectOptions::new("sqlite::memory:"));
        assert!(!store.is_connected());

        store.ping().await.unwrap();
        assert!(store.is_connected());

        let first = store.conn().await.unwrap() as *const DatabaseConnection;
        let second = store.conn().await.unwrap() as *const DatabaseConnection;
        assert_eq!(first, second);

        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_connect_is_retried() {
        let mut options = ConnectOptions::new("sqlite:///nonexistent-dir/for/fintrack/test.db");
        options.connect_timeout(Duration::from_secs(1));
        let store = Store::new(options);

        assert!(store.conn().await.is_err());
        assert!(!store.is_connected());
        assert!(store.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_close_without_connection_is_ok() {
        let store = Store::new(ConnectOptions::new("sqlite::memory:"));
        store.close().await.unwrap();
    }
}
