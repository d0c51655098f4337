use std::time::Duration;

use ::config::{Config, Environment, File};
use anyhow::Result;
use sea_orm::ConnectOptions;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://fintrack.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3001";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Runtime settings.
///
/// Layered from lowest to highest priority: built-in defaults, an optional
/// `fintrack.toml` in the working directory, `FINTRACK_*` environment
/// variables, then command line flags.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    /// Replaces the database part of `database_url` when set.
    pub database_name: Option<String>,
    pub bind_address: String,
    pub connect_timeout_secs: u64,
    /// Expose Prometheus metrics on `/metrics`.
    pub metrics: bool,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub bind_address: Option<String>,
    pub metrics: Option<bool>,
}

impl Settings {
    pub fn load(overrides: Overrides) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("connect_timeout_secs", DEFAULT_CONNECT_TIMEOUT_SECS as i64)?
            .set_default("metrics", false)?
            .add_source(File::with_name("fintrack").required(false))
            .add_source(Environment::with_prefix("FINTRACK"))
            .set_override_option("database_url", overrides.database_url)?
            .set_override_option("database_name", overrides.database_name)?
            .set_override_option("bind_address", overrides.bind_address)?
            .set_override_option("metrics", overrides.metrics)?
            .build()?
            .try_deserialize::<Settings>()?;

        debug!(?settings, "Loaded settings");
        Ok(settings)
    }

    /// The connection URL after applying `database_name`.
    pub fn database_url(&self) -> String {
        match &self.database_name {
            Some(name) if !name.is_empty() => with_database_name(&self.database_url, name),
            _ => self.database_url.clone(),
        }
    }

    pub fn connect_options(&self) -> ConnectOptions {
        let timeout = Duration::from_secs(self.connect_timeout_secs);
        let mut options = ConnectOptions::new(self.database_url());
        options
            .connect_timeout(timeout)
            .acquire_timeout(timeout)
            .sqlx_logging(false);
        options
    }
}

fn with_database_name(url: &str, name: &str) -> String {
    if url.starts_with("sqlite:") {
        return format!("sqlite://{}.db?mode=rwc", name);
    }

    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url, None),
    };
    let authority = base.find("://").map(|i| i + 3).unwrap_or(0);
    let path = base[authority..]
        .find('/')
        .map(|i| authority + i)
        .unwrap_or(base.len());

    let mut resolved = format!("{}/{}", &base[..path], name);
    if let Some(query) = query {
        resolved.push('?');
        resolved.push_str(query);
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str, name: Option<&str>) -> Settings {
        Settings {
            database_url: url.to_string(),
            database_name: name.map(str::to_string),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            metrics: false,
        }
    }

    #[test]
    fn test_database_url_without_name_is_unchanged() {
        let s = settings("postgres://u:p@localhost:5432/finance", None);
        assert_eq!(s.database_url(), "postgres://u:p@localhost:5432/finance");
    }

    #[test]
    fn test_database_name_replaces_path() {
        let s = settings("postgres://u:p@localhost:5432/old?sslmode=disable", Some("tracker"));
        assert_eq!(s.database_url(), "postgres://u:p@localhost:5432/tracker?sslmode=disable");

        let s = settings("postgres://localhost", Some("tracker"));
        assert_eq!(s.database_url(), "postgres://localhost/tracker");
    }

    #[test]
    fn test_database_name_for_sqlite_names_the_file() {
        let s = settings(DEFAULT_DATABASE_URL, Some("personal"));
        assert_eq!(s.database_url(), "sqlite://personal.db?mode=rwc");
    }

    #[test]
    fn test_empty_database_name_is_ignored() {
        let s = settings(DEFAULT_DATABASE_URL, Some(""));
        assert_eq!(s.database_url(), DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_command_line_overrides_win() {
        let s = Settings::load(Overrides {
            database_url: Some("sqlite::memory:".to_string()),
            bind_address: Some("127.0.0.1:9999".to_string()),
            metrics: Some(true),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(s.database_url, "sqlite::memory:");
        assert_eq!(s.bind_address, "127.0.0.1:9999");
        assert!(s.metrics);
    }
}
