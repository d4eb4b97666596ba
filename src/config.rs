//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Seconds before a query's cached value counts as stale
    pub query_stale_time: u64,
    /// Hard TTL in seconds for values written through queries
    pub query_ttl: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `QUERY_STALE_TIME` - Query freshness window in seconds (default: 30)
    /// - `QUERY_TTL` - Query hard expiry in seconds (default: 300)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            query_stale_time: env_or("QUERY_STALE_TIME", defaults.query_stale_time),
            query_ttl: env_or("QUERY_TTL", defaults.query_ttl),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: 1,
            query_stale_time: 30,
            query_ttl: 300,
        }
    }
}

/// Parses `name` from the environment, falling back on absence or bad input.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 1);
        assert_eq!(config.query_stale_time, 30);
        assert_eq!(config.query_ttl, 300);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SERVER_PORT");
        env::remove_var("CLEANUP_INTERVAL");
        env::remove_var("QUERY_STALE_TIME");
        env::remove_var("QUERY_TTL");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 1);
        assert_eq!(config.query_stale_time, 30);
        assert_eq!(config.query_ttl, 300);
    }

    #[test]
    fn test_env_or_ignores_unparseable_values() {
        env::set_var("POS_CACHE_TEST_BAD_NUMBER", "not-a-number");
        assert_eq!(env_or("POS_CACHE_TEST_BAD_NUMBER", 7u64), 7);
        env::remove_var("POS_CACHE_TEST_BAD_NUMBER");
    }
}
