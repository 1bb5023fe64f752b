//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::events::TopicRoutes;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Kafka bootstrap servers; events are only logged when unset
    pub kafka_brokers: Option<String>,

    pub kafka_message_timeout: Duration,

    /// Topic per event name
    pub topics: TopicRoutes,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = var_or("DATABASE_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = var_or("HOST", "127.0.0.1");

        let port = var_or("PORT", "8080")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = var_or("ENVIRONMENT", "development");

        let kafka_brokers = lookup("KAFKA_BROKERS").filter(|brokers| !brokers.trim().is_empty());

        let kafka_message_timeout = var_or("KAFKA_MESSAGE_TIMEOUT_MS", "5000")
            .parse()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidValue("KAFKA_MESSAGE_TIMEOUT_MS"))?;

        let topics = TopicRoutes {
            transaction_created: var_or("TOPIC_TRANSACTION_CREATED", "transactions"),
            balance_updated: var_or("TOPIC_BALANCE_UPDATED", "balances"),
        };

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            kafka_brokers,
            kafka_message_timeout,
            topics,
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
