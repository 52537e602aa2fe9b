//! Application Configuration
//!
//! Loads configuration from files and environment variables.

use std::fmt;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::application::use_cases::CommitRetryPolicy;
use crate::domain::models::cidr::CidrBlock;
use crate::domain::models::pool::AddressPool;
use crate::shared::errors::DomainError;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// CORS origins; empty means any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// JWT configuration
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct JwtConfig {
    pub secret: String,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_second: u64,
    pub burst_size: u32,
}

/// Which allocation store backs the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    /// Process-local; for local runs and tests only
    Memory,
}

/// Store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

/// Address pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    pub ranges: Vec<String>,
    pub min_prefix_len: u8,
    pub max_prefix_len: u8,
}

impl PoolConfig {
    /// Parse and validate the configured ranges into an address pool
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCidr` for a range that is not a canonical
    /// IPv4 CIDR and `DomainError::InvalidPool` for bad bounds or overlapping ranges.
    pub fn to_address_pool(&self) -> Result<AddressPool, DomainError> {
        let ranges = self
            .ranges
            .iter()
            .map(|range| range.trim().parse::<CidrBlock>())
            .collect::<Result<Vec<_>, _>>()?;

        AddressPool::new(ranges, self.min_prefix_len, self.max_prefix_len)
    }
}

/// Commit retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub max_commit_attempts: u32,
    pub retry_backoff_ms: u64,
    /// Random spread applied to each backoff, 0.0 to 1.0
    #[serde(default = "default_retry_jitter")]
    pub retry_jitter: f64,
}

fn default_retry_jitter() -> f64 {
    0.5
}

impl RegistryConfig {
    #[must_use]
    pub fn to_retry_policy(&self) -> CommitRetryPolicy {
        CommitRetryPolicy::new(self.max_commit_attempts, Duration::from_millis(self.retry_backoff_ms))
            .with_jitter(self.retry_jitter)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub store: StoreConfig,
    pub pool: PoolConfig,
    pub registry: RegistryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "default".into());

        Config::builder()
            .add_source(File::with_name("config/default").required(true))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // e.g. APP__SERVER__PORT=9090 or APP__POOL__RANGES=10.0.0.0/8,172.16.0.0/12
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("pool.ranges")
                    .with_list_parse_key("server.allowed_origins")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_config(ranges: &[&str]) -> PoolConfig {
        PoolConfig {
            ranges: ranges.iter().map(|r| (*r).to_string()).collect(),
            min_prefix_len: 16,
            max_prefix_len: 28,
        }
    }

    #[test]
    fn should_build_pool_from_ranges() {
        let pool = pool_config(&["172.16.0.0/12", "10.0.0.0/8"]).to_address_pool().unwrap();

        assert_eq!(pool.ranges().len(), 2);
        assert_eq!(pool.ranges()[0].to_string(), "10.0.0.0/8");
    }

    #[test]
    fn should_reject_non_canonical_range() {
        let result = pool_config(&["10.0.0.1/8"]).to_address_pool();

        assert!(matches!(result, Err(DomainError::InvalidCidr(_))));
    }

    #[test]
    fn should_reject_overlapping_ranges() {
        let result = pool_config(&["10.0.0.0/8", "10.1.0.0/16"]).to_address_pool();

        assert!(matches!(result, Err(DomainError::InvalidPool(_))));
    }

    #[test]
    fn jwt_secret_is_redacted_in_debug_output() {
        let jwt = JwtConfig {
            secret: "super-secret-value".to_string(),
        };

        assert!(!format!("{jwt:?}").contains("super-secret-value"));
    }

    #[test]
    fn retry_policy_follows_registry_config() {
        let policy = RegistryConfig {
            max_commit_attempts: 3,
            retry_backoff_ms: 10,
            retry_jitter: 0.0,
        }
        .to_retry_policy();

        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.backoff(2), Duration::from_millis(20));
    }

    #[test]
    fn retry_jitter_defaults_when_omitted() {
        let registry: RegistryConfig = Config::builder()
            .add_source(File::from_str(
                "max_commit_attempts = 5\nretry_backoff_ms = 20",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let policy = registry.to_retry_policy();
        assert!((policy.jitter() - 0.5).abs() < f64::EPSILON);
        let delay = policy.backoff(1);
        assert!(delay >= Duration::from_millis(10) && delay < Duration::from_millis(30));
    }
}
