//! Configuration management for the ARGO dashboard.
//!
//! This module provides a centralized configuration struct that loads settings
//! from environment variables. All configuration is loaded once at startup
//! and can be displayed for logging purposes.

use crate::plan::{Tables, DEFAULT_MEASUREMENTS_TABLE, DEFAULT_PROFILES_TABLE};
use crate::ArgoError;
use std::fmt;

const DEFAULT_DB_PATH: &str = "argo.sqlite3";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 40080;

/// Warehouse configuration settings.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Path to the SQLite warehouse file.
    /// Environment variable: `ARGO_DASHBOARD_DB_PATH`
    pub db_path: String,

    /// Name of the profiles table.
    /// Environment variable: `ARGO_DASHBOARD_PROFILES_TABLE`
    pub profiles_table: String,

    /// Name of the measurements table.
    /// Environment variable: `ARGO_DASHBOARD_MEASUREMENTS_TABLE`
    pub measurements_table: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            profiles_table: DEFAULT_PROFILES_TABLE.to_string(),
            measurements_table: DEFAULT_MEASUREMENTS_TABLE.to_string(),
        }
    }
}

impl WarehouseConfig {
    /// Load warehouse configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            db_path: std::env::var("ARGO_DASHBOARD_DB_PATH")
                .unwrap_or_else(|_| DEFAULT_DB_PATH.to_string()),
            profiles_table: std::env::var("ARGO_DASHBOARD_PROFILES_TABLE")
                .unwrap_or_else(|_| DEFAULT_PROFILES_TABLE.to_string()),
            measurements_table: std::env::var("ARGO_DASHBOARD_MEASUREMENTS_TABLE")
                .unwrap_or_else(|_| DEFAULT_MEASUREMENTS_TABLE.to_string()),
        }
    }

    /// Validated table names.
    pub fn tables(&self) -> Result<Tables, ArgoError> {
        Tables::new(&self.profiles_table, &self.measurements_table)
    }
}

impl fmt::Display for WarehouseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "db_path={}, profiles_table={}, measurements_table={}",
            self.db_path, self.profiles_table, self.measurements_table
        )
    }
}

/// HTTP API configuration settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Environment variable: `ARGO_DASHBOARD_HOST`
    pub host: String,

    /// Environment variable: `ARGO_DASHBOARD_PORT`
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ApiConfig {
    /// Load API configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("ARGO_DASHBOARD_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: std::env::var("ARGO_DASHBOARD_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }
}

/// Complete ARGO dashboard configuration.
#[derive(Debug, Clone, Default)]
pub struct ArgoConfig {
    /// Warehouse settings
    pub warehouse: WarehouseConfig,

    /// HTTP API settings
    pub api: ApiConfig,
}

impl ArgoConfig {
    /// Create a new ArgoConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load all configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            warehouse: WarehouseConfig::from_env(),
            api: ApiConfig::from_env(),
        }
    }

    /// Display configuration summary for logging.
    ///
    /// Returns a vector of log lines suitable for info-level logging.
    pub fn display_summary(&self) -> Vec<String> {
        let mut lines = Vec::new();

        lines.push("=== ARGO Dashboard Configuration ===".to_string());
        lines.push(format!("Warehouse: {}", self.warehouse));
        if self.warehouse.tables().is_err() {
            lines.push("Warehouse: WARNING invalid table name".to_string());
        }
        lines.push(format!(
            "API service: ENABLED ({}:{})",
            self.api.host, self.api.port
        ));
        lines.push("====================================".to_string());

        lines
    }
}
