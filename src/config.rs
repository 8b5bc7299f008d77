use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub export_dir: PathBuf,
    pub seed_demo_data: bool,
    pub seed_password: String,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://taxi_orders.db?mode=rwc".to_string()),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            connect_timeout_secs: parse_var("DATABASE_CONNECT_TIMEOUT_SECS", 8)?,
            export_dir: env::var("EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("out")),
            seed_demo_data: parse_var("SEED_DEMO_DATA", true)?,
            seed_password: env::var("SEED_PASSWORD").unwrap_or_else(|_| "changeme".to_string()),
        })
    }

    /// Isolated in-memory database. Every pooled SQLite connection would get its own
    /// `:memory:` database, so the pool is pinned to a single connection.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connect_timeout_secs: 8,
            export_dir: PathBuf::from("out"),
            seed_demo_data: false,
            seed_password: "changeme".to_string(),
        }
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}
