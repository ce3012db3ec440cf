//! Configuration management
//!
//! All configurable parameters in one place with environment variable
//! overrides. Sensible defaults, configurable in production.

use std::env;
use std::path::PathBuf;
use tracing::info;

use crate::constants::{
    DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_STORAGE_PATH,
};
use crate::errors::Result;
use crate::memory::ContextConfig;

/// Server configuration loaded from environment with defaults
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: 127.0.0.1)
    pub host: String,

    /// Server port (default: 7070)
    pub port: u16,

    /// Directory holding durable session records
    pub storage_path: PathBuf,

    /// Reject requests that omit a session id instead of falling back to
    /// the default session
    pub strict_sessions: bool,

    /// Tier capacities and extraction settings
    pub context: ContextConfig,

    /// Maximum concurrent in-flight requests
    pub max_concurrent_requests: usize,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            strict_sessions: false,
            context: ContextConfig::default(),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("STRATA_HOST") {
            config.host = val;
        }

        if let Ok(val) = env::var("STRATA_PORT") {
            if let Ok(port) = val.parse() {
                config.port = port;
            }
        }

        if let Ok(val) = env::var("STRATA_STORAGE_PATH") {
            config.storage_path = PathBuf::from(val);
        }

        if let Ok(val) = env::var("STRATA_STRICT_SESSIONS") {
            config.strict_sessions = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = env::var("STRATA_MAX_CORE_CONTEXTS") {
            if let Ok(n) = val.parse() {
                config.context.max_core_contexts = n;
            }
        }

        if let Ok(val) = env::var("STRATA_MAX_EVOLVING_ITEMS") {
            if let Ok(n) = val.parse() {
                config.context.max_evolving_items = n;
            }
        }

        if let Ok(val) = env::var("STRATA_TURN_HISTORY_LIMIT") {
            if let Ok(n) = val.parse() {
                config.context.turn_history_limit = n;
            }
        }

        if let Ok(val) = env::var("STRATA_KEYWORD_TOP_K") {
            if let Ok(n) = val.parse() {
                config.context.keyword_top_k = n;
            }
        }

        if let Ok(val) = env::var("STRATA_MAX_CONCURRENT") {
            if let Ok(n) = val.parse() {
                config.max_concurrent_requests = n;
            }
        }

        if let Ok(val) = env::var("STRATA_REQUEST_TIMEOUT") {
            if let Ok(n) = val.parse() {
                config.request_timeout_secs = n;
            }
        }

        config
    }

    /// Reject out-of-range limits at startup
    pub fn validate(&self) -> Result<()> {
        self.context.validate()
    }

    /// Log the current configuration
    pub fn log(&self) {
        info!("📋 Configuration:");
        info!("   Bind: {}:{}", self.host, self.port);
        info!("   Storage: {:?}", self.storage_path);
        info!(
            "   Sessions: {}",
            if self.strict_sessions {
                "strict (explicit session_id required)"
            } else {
                "default fallback enabled"
            }
        );
        info!(
            "   Tiers: core={} evolving={} turn={}",
            self.context.max_core_contexts,
            self.context.max_evolving_items,
            self.context.turn_history_limit
        );
        info!("   Keywords per entry: {}", self.context.keyword_top_k);
        info!("   Max concurrent: {}", self.max_concurrent_requests);
        info!("   Request timeout: {}s", self.request_timeout_secs);
    }
}

/// Environment variable documentation
#[allow(unused)] // Public API - available for CLI help output
pub fn print_env_help() {
    println!("Strata-Memory Configuration Environment Variables:");
    println!();
    println!("  STRATA_HOST               - Bind address (default: 127.0.0.1)");
    println!("  STRATA_PORT               - Server port (default: 7070)");
    println!("  STRATA_STORAGE_PATH       - Durable record directory (default: ./strata_data)");
    println!("  STRATA_STRICT_SESSIONS    - Require explicit session ids true/false (default: false)");
    println!("  STRATA_MAX_CORE_CONTEXTS  - Core tier capacity (default: 3)");
    println!("  STRATA_MAX_EVOLVING_ITEMS - Evolving tier capacity (default: 10)");
    println!("  STRATA_TURN_HISTORY_LIMIT - Turn tier capacity (default: 6)");
    println!("  STRATA_KEYWORD_TOP_K      - Keywords cached per entry (default: 5)");
    println!("  STRATA_MAX_CONCURRENT     - Max concurrent requests (default: 200)");
    println!("  STRATA_REQUEST_TIMEOUT    - Request timeout in seconds (default: 30)");
    println!();
    println!("  RUST_LOG                  - Log level (e.g., info, debug, trace)");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(!config.strict_sessions);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_override() {
        env::set_var("STRATA_PORT", "9090");
        env::set_var("STRATA_TURN_HISTORY_LIMIT", "12");

        let config = ServerConfig::from_env();
        assert_eq!(config.port, 9090);
        assert_eq!(config.context.turn_history_limit, 12);

        env::remove_var("STRATA_PORT");
        env::remove_var("STRATA_TURN_HISTORY_LIMIT");
    }

    #[test]
    fn test_out_of_range_limit_rejected() {
        let mut config = ServerConfig::default();
        config.context.max_evolving_items = 0;
        assert!(config.validate().is_err());
    }
}
