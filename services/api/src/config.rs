//! Service configuration
//!
//! Everything is read from the environment once at startup (a `.env` file is
//! honoured for local development) and handed to each component explicitly.

use anyhow::Result;
use auth::{JwtConfig, MailConfig};
use common::{database::DatabaseConfig, storage::StorageConfig};
use std::net::{Ipv4Addr, SocketAddr};

/// Holds all configuration loaded at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listening port
    pub port: u16,
    /// Login link included in the registration email
    pub login_url: String,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    /// - `PORT`: Listening port (default: 3000)
    /// - `LOGIN_URL`: Login link for emails (default: "http://localhost:5173/login")
    /// - plus those read by [`DatabaseConfig`], [`StorageConfig`], [`JwtConfig`]
    ///   and [`MailConfig`]
    pub fn from_env() -> Result<Self> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let port = match std::env::var("PORT") {
            Ok(value) => value
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid PORT value: {}", value))?,
            Err(_) => 3000,
        };

        let login_url = std::env::var("LOGIN_URL")
            .unwrap_or_else(|_| "http://localhost:5173/login".to_string());

        Ok(AppConfig {
            port,
            login_url,
            database: DatabaseConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            mail: MailConfig::from_env(),
        })
    }

    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}
