//! A small pastebin: text pastes with random ids, secret delete keys, lazy
//! expiry and a site-wide visit counter.

use anyhow::Context;
use axum::extract::FromRef;

pub mod access_log;
pub mod admin;
pub mod commands;
pub mod config;
pub mod controllers;
pub mod db;
pub mod extract;
pub mod ids;
pub mod models;
pub mod types;

mod error;
pub use error::{ApiError, ApiResult};

use admin::AdminSessions;
use config::Config;
use db::Database;

/// Shared state handed to every request handler and command.
#[derive(Clone, FromRef)]
pub struct App {
    pub config: Config,
    pub database: Database,
    pub sessions: AdminSessions,
}

impl App {
    /// Connect to the configured database and make sure the schema exists.
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        config.validate().context("invalid config")?;

        let database = Database::connect(&config.database.url, config.database.max_connections)
            .await
            .context("failed to connect to database")?;
        database
            .migrate()
            .await
            .context("failed to set up database schema")?;

        Ok(App {
            config,
            database,
            sessions: AdminSessions::default(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use tempfile::TempDir;

    use super::*;

    pub(crate) async fn test_app() -> (App, TempDir) {
        test_app_with_pool(1).await
    }

    pub(crate) async fn test_app_with_pool(max_connections: u32) -> (App, TempDir) {
        let dir = TempDir::new().unwrap();
        let app = App::connect(test_config(&dir, max_connections))
            .await
            .unwrap();
        (app, dir)
    }

    fn test_config(dir: &TempDir, max_connections: u32) -> Config {
        let mut config = Config::default();
        config.database.url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        config.database.max_connections = max_connections;
        config
    }

    #[tokio::test]
    async fn connect_refuses_empty_ids() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir, 1);
        config.limits.id_length = 0;
        assert!(App::connect(config).await.is_err());
    }
}
