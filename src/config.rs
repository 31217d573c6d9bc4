use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use anyhow::{ensure, Context};
use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://pastes.db?mode=rwc";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 1024 * 1024;
pub const DEFAULT_ID_LENGTH: usize = 8;

/// Width of the id column in the original paste table.
pub const MAX_ID_LENGTH: usize = 12;

/// Origins that are always allowed to call the API from a browser.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:3000",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database: Database,
    pub limits: Limits,
    #[serde(default)]
    pub expiry: Expiry,
    pub cors: Cors,
    #[serde(default)]
    pub admin: Admin,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Limits {
    pub max_upload_size: usize,
    pub id_length: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Expiry {
    /// Run a background sweep this often. Disabled when unset.
    pub sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cors {
    /// Comma-separated list of extra origins.
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Admin {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Config {
    /// Load configuration from defaults, an optional TOML file and the environment.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        let config: Config = ::config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("database.url", DEFAULT_DATABASE_URL)?
            .set_default("database.max_connections", i64::from(DEFAULT_MAX_CONNECTIONS))?
            .set_default("limits.max_upload_size", DEFAULT_MAX_UPLOAD_SIZE as i64)?
            .set_default("limits.id_length", DEFAULT_ID_LENGTH as i64)?
            .set_default("cors.allowed_origins", "")?
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix("PASTY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("cors.allowed_origins", env::var("ALLOWED_ORIGINS").ok())?
            .set_override_option("admin.username", env::var("ADMIN_USERNAME").ok())?
            .set_override_option("admin.password", env::var("ADMIN_PASSWORD").ok())?
            .build()
            .context("failed to read config")?
            .try_deserialize()
            .context("failed to deserialize config")?;

        config.validate().context("invalid config")?;
        Ok(config)
    }

    /// Reject values the server can't run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let id_length = self.limits.id_length;
        ensure!(
            (1..=MAX_ID_LENGTH).contains(&id_length),
            "limits.id_length must be between 1 and {MAX_ID_LENGTH}, got {id_length}"
        );
        ensure!(
            self.database.max_connections > 0,
            "database.max_connections must be at least 1"
        );
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
            database: Database {
                url: DEFAULT_DATABASE_URL.to_owned(),
                max_connections: DEFAULT_MAX_CONNECTIONS,
            },
            limits: Limits {
                max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
                id_length: DEFAULT_ID_LENGTH,
            },
            expiry: Expiry::default(),
            cors: Cors {
                allowed_origins: String::new(),
            },
            admin: Admin::default(),
        }
    }
}

impl Cors {
    /// The default origins followed by every non-empty configured origin.
    pub fn origins(&self) -> Vec<String> {
        DEFAULT_ALLOWED_ORIGINS
            .iter()
            .map(|s| s.to_string())
            .chain(
                self.allowed_origins
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned),
            )
            .collect()
    }
}

impl Admin {
    pub fn check_credentials(&self, username: &str, password: &str) -> bool {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => u == username && p == password,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_appends_configured_list() {
        let cors = Cors {
            allowed_origins: " https://paste.example.com, ,https://other.example ".into(),
        };
        let origins = cors.origins();
        assert_eq!(origins.len(), DEFAULT_ALLOWED_ORIGINS.len() + 2);
        assert_eq!(origins[origins.len() - 2], "https://paste.example.com");
        assert_eq!(origins[origins.len() - 1], "https://other.example");
    }

    #[test]
    fn admin_without_credentials_rejects_everything() {
        let admin = Admin {
            username: None,
            password: None,
        };
        assert!(!admin.check_credentials("", ""));

        let admin = Admin {
            username: Some("root".into()),
            password: Some("hunter2".into()),
        };
        assert!(admin.check_credentials("root", "hunter2"));
        assert!(!admin.check_credentials("root", "hunter3"));
    }

    #[test]
    fn load_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pasty.toml");
        std::fs::write(
            &path,
            "port = 9123\n[limits]\nid_length = 12\n[expiry]\nsweep_interval_secs = 30\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.port, 9123);
        assert_eq!(config.limits.id_length, 12);
        assert_eq!(config.limits.max_upload_size, 1024 * 1024);
        assert_eq!(config.expiry.sweep_interval_secs, Some(30));
    }

    #[test]
    fn load_rejects_unusable_id_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pasty.toml");

        for id_length in [0, MAX_ID_LENGTH + 1] {
            std::fs::write(&path, format!("[limits]\nid_length = {id_length}\n")).unwrap();
            let err = Config::load(&path).unwrap_err();
            assert!(
                format!("{err:#}").contains("limits.id_length"),
                "{err:#}"
            );
        }
    }

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }
}
