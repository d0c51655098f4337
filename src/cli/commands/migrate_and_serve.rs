use anyhow::Result;
use tracing::{debug, info};

use super::initdb::migrate;
use super::serve::run_server;
use crate::config::Settings;
use crate::store::Store;

pub async fn migrate_and_serve(settings: &Settings) -> Result<()> {
    info!("Applying database migrations and starting server");
    debug!("Database URL: {}", settings.database_url());

    let store = Store::new(settings.connect_options());
    migrate(&store).await?;

    run_server(store, settings).await
}
