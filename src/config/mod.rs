//! Configuration module for the ReelGuide backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Default number of validator tasks allowed to run at the same time.
pub const DEFAULT_TRIGGER_MAX_INSTANCES: usize = 10;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key identifying admin requests. Without it nobody is admin.
    pub admin_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to the persisted preferences file
    pub preferences_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Upper bound on concurrently running video validators
    pub trigger_max_instances: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let admin_psk = env::var("REELGUIDE_ADMIN_PSK")
            .ok()
            .filter(|psk| !psk.trim().is_empty());

        let db_path = env::var("REELGUIDE_DB_PATH")
            .unwrap_or_else(|_| "./data/reelguide.sqlite".to_string())
            .into();

        let preferences_path = env::var("REELGUIDE_PREFERENCES_PATH")
            .unwrap_or_else(|_| "./data/preferences.json".to_string())
            .into();

        let bind_addr = env::var("REELGUIDE_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid REELGUIDE_BIND_ADDR: {}", e)))?;

        let log_level = env::var("REELGUIDE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let trigger_max_instances = match env::var("REELGUIDE_TRIGGER_MAX_INSTANCES") {
            Ok(raw) => parse_max_instances(&raw)?,
            Err(_) => DEFAULT_TRIGGER_MAX_INSTANCES,
        };

        Ok(Self {
            admin_psk,
            db_path,
            preferences_path,
            bind_addr,
            log_level,
            trigger_max_instances,
        })
    }
}

fn parse_max_instances(raw: &str) -> Result<usize, AppError> {
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(AppError::Internal(format!(
            "Invalid REELGUIDE_TRIGGER_MAX_INSTANCES: {:?} (expected a positive integer)",
            raw
        ))),
        Ok(n) => Ok(n),
    }
}
