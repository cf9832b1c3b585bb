//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::SocketAddr;
use std::time::Duration;

use quip_core::{EngineConfig, HashType, DEFAULT_LIKELY_THRESHOLD, DEFAULT_TOP_K};

/// Upper bound for `k` accepted from clients.
pub const MAX_TOP_K: usize = 100;

/// Default exact-match cache capacity.
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 500;

/// Default exact-match cache TTL (7 days).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 5050)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 25)
    pub body_limit_mb: usize,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// Similarity engine settings
    pub engine: EngineConfig,
    /// Exact-match cache capacity (default: 500)
    pub cache_max_entries: usize,
    /// Exact-match cache TTL in seconds (default: 7 days)
    pub cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5050,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 25,
            timeout_secs: 30,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            engine: EngineConfig::default(),
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = env_parse("PORT").unwrap_or(5050);

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or([127, 0, 0, 1]);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let body_limit_mb = env_parse("BODY_LIMIT_MB").unwrap_or(25);
        let timeout_secs = env_parse("REQUEST_TIMEOUT_SECS").unwrap_or(30);
        let rate_limit_per_sec = env_parse("RATE_LIMIT_PER_SEC").unwrap_or(10);
        let rate_limit_burst = env_parse("RATE_LIMIT_BURST").unwrap_or(20);

        // Rate limiting enabled by default in production, can be disabled with RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let hash_types = std::env::var("QUIP_HASH_TYPES")
            .ok()
            .and_then(|v| parse_hash_types(&v))
            .unwrap_or_else(|| HashType::ALL.to_vec());

        let engine = EngineConfig {
            hash_types,
            top_k: env_parse("QUIP_TOP_K").unwrap_or(DEFAULT_TOP_K),
            likely_threshold: env_parse("QUIP_LIKELY_THRESHOLD")
                .unwrap_or(DEFAULT_LIKELY_THRESHOLD),
        };

        let cache_max_entries = env_parse("CACHE_MAX_ENTRIES").unwrap_or(DEFAULT_CACHE_MAX_ENTRIES);
        let cache_ttl_secs = env_parse("CACHE_TTL_SECS").unwrap_or(DEFAULT_CACHE_TTL_SECS);

        Self {
            port,
            host,
            allowed_origins,
            body_limit_mb,
            timeout_secs,
            rate_limit_enabled,
            rate_limit_per_sec,
            rate_limit_burst,
            engine,
            cache_max_entries,
            cache_ttl_secs,
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Exact-match cache TTL as a `Duration`
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Parse a comma-separated list of hash type names.
///
/// Returns `None` when any name is unknown or the list is empty, so a typo
/// falls back to the default set instead of silently dropping a type.
fn parse_hash_types(value: &str) -> Option<Vec<HashType>> {
    let parsed: Result<Vec<HashType>, _> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect();

    match parsed {
        Ok(types) if !types.is_empty() => Some(types),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring invalid QUIP_HASH_TYPES");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 5050);
        assert_eq!(config.host, [127, 0, 0, 1]);
        assert!(config.allowed_origins.is_none());
        assert!(!config.rate_limit_enabled);
        assert_eq!(config.cache_max_entries, 500);
        assert_eq!(config.cache_ttl(), Duration::from_secs(604_800));
        assert_eq!(config.engine.hash_types.len(), 5);
    }

    #[test]
    fn test_socket_addr() {
        let config = Config {
            port: 8080,
            host: [0, 0, 0, 0],
            ..Default::default()
        };
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_parse_hash_types() {
        assert_eq!(
            parse_hash_types("mean, dct"),
            Some(vec![HashType::Mean, HashType::Dct])
        );
        assert_eq!(parse_hash_types(" , "), None);
        assert_eq!(parse_hash_types("mean,wavelet"), None);
    }
}
