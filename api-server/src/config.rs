//! Configuration module

use std::env;

use instacheck_core::logic::account::AccountApiConfig;
use instacheck_core::logic::model::DeploymentConfig;

/// Default upload limit for batch tables (10 MB)
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Largest accepted request body, batch uploads included
    pub max_upload_bytes: usize,

    /// Which artifacts to load at startup
    pub deployment: DeploymentConfig,

    /// Account-info API settings
    pub account_api: AccountApiConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),

            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|b| b.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),

            deployment: DeploymentConfig::from_env(),

            account_api: AccountApiConfig::default(),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
