use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;
use std::time::Duration;

use crate::constants::{DEFAULT_DB_ACQUIRE_TIMEOUT_SECS, DEFAULT_DB_MAX_CONNECTIONS};
use crate::utils::config::env_or;

/// Pool settings for the PostgreSQL-backed stores.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env_or("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS).max(1),
            acquire_timeout: Duration::from_secs(env_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_DB_ACQUIRE_TIMEOUT_SECS,
            )),
        })
    }

    /// The connection URL with its password masked, safe for logs.
    pub fn redacted_url(&self) -> String {
        let url = &self.database_url;
        let Some(authority) = url.find("://").map(|i| i + 3) else {
            return url.clone();
        };
        let rest = &url[authority..];
        let Some(at) = rest.rfind('@') else {
            return url.clone();
        };

        match rest[..at].find(':') {
            Some(colon) => format!("{}{}:***{}", &url[..authority], &rest[..colon], &rest[at..]),
            None => url.clone(),
        }
    }
}

pub async fn get_db_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("connecting to {}", config.redacted_url()))?;

    tracing::info!(
        url = %config.redacted_url(),
        max_connections = config.max_connections,
        "Connected to PostgreSQL"
    );
    Ok(pool)
}
