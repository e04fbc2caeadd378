//! Runtime configuration

use crate::types::{FetchConfig, ScanConfig};
use std::env;

/// Everything the service needs at startup. Nothing is read from globals
/// afterwards; components receive the parts they need.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite connection URL
    pub database_url: String,

    pub host: String,
    pub port: u16,

    pub fetch: FetchConfig,
    pub scan: ScanConfig,

    /// Upper bound on records returned by the dashboard endpoint
    pub recent_limit: usize,

    /// Fixed seed for the classifier's base score; random when unset
    pub classifier_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://threatlens.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5001,
            fetch: FetchConfig::default(),
            scan: ScanConfig::default(),
            recent_limit: 50,
            classifier_seed: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut fetch = defaults.fetch;
        if let Some(timeout) = parsed_var("FETCH_TIMEOUT_SECS") {
            fetch.timeout_seconds = timeout;
        }
        if let Ok(user_agent) = env::var("USER_AGENT") {
            fetch.user_agent = user_agent;
        }

        let mut scan = defaults.scan;
        if let Some(max_entries) = parsed_var("MAX_ENTRIES_PER_FEED") {
            scan.max_entries_per_feed = max_entries;
        }

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parsed_var("PORT").unwrap_or(defaults.port),
            fetch,
            scan,
            recent_limit: parsed_var("RECENT_LIMIT").unwrap_or(defaults.recent_limit),
            classifier_seed: parsed_var("CLASSIFIER_SEED"),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
