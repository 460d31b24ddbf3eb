use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::db::MAX_TRANSACTION_TIMEOUT;
use crate::services::propagation::DEFAULT_CHANNEL_CAPACITY;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    /// Bound on how long a write waits for the database lock.
    pub transaction_timeout: Duration,
    pub catalog_path: PathBuf,
    pub identity_path: PathBuf,
    pub event_channel_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: "slotbook.db".to_string(),
            transaction_timeout: MAX_TRANSACTION_TIMEOUT,
            catalog_path: PathBuf::from("catalog.json"),
            identity_path: PathBuf::from("principals.json"),
            event_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            transaction_timeout: env::var("TRANSACTION_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .map(|d| d.min(MAX_TRANSACTION_TIMEOUT))
                .unwrap_or(defaults.transaction_timeout),
            catalog_path: env::var("CATALOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.catalog_path),
            identity_path: env::var("IDENTITY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.identity_path),
            event_channel_capacity: env::var("EVENT_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.event_channel_capacity),
        }
    }
}
