//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::credentials::DEFAULT_IDENTITY_URL;
use crate::remote::DEFAULT_API_URL;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Number of awaiting items that triggers an immediate dispatch
    pub count_trigger: usize,
    /// Quiet period in milliseconds after which awaiting items are dispatched anyway
    pub idle_trigger_ms: u64,
    /// Records requested per page
    pub record_limit: u32,
    /// Highest page offset that will be requested
    pub record_start_max: u32,
    /// Remote call timeout in milliseconds
    pub http_timeout_ms: u64,
    /// Wait adapter poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Wait adapter iteration cap
    pub max_poll_iterations: u32,
    /// GraphQL endpoint
    pub api_url: String,
    /// OAuth token endpoint
    pub identity_url: String,
    /// Pre-issued bearer token, if any
    pub token: Option<String>,
}

/// Settings the batch dispatcher needs.
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    pub count_trigger: usize,
    pub idle_interval: Duration,
    pub record_limit: u32,
    pub record_start_max: u32,
    pub http_timeout: Duration,
}

/// Settings the wait adapter needs.
#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    pub poll_interval: Duration,
    pub max_iterations: u32,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `QUERY_COUNT_TRIGGER` - Awaiting count that forces a dispatch (default: 10)
    /// - `QUERY_IDLE_MS` - Idle trigger in milliseconds (default: 200)
    /// - `RECORD_LIMIT` - Records per page (default: 1)
    /// - `RECORD_START_MAX` - Highest page offset (default: 80)
    /// - `HTTP_TIMEOUT_MS` - Remote call timeout (default: 5000)
    /// - `POLL_INTERVAL_MS` - Wait adapter poll interval (default: 10)
    /// - `MAX_POLL_ITERATIONS` - Wait adapter iteration cap (default: 1000)
    /// - `SUPPLY_API_URL` - GraphQL endpoint
    /// - `SUPPLY_IDENTITY_URL` - OAuth token endpoint
    /// - `SUPPLY_TOKEN` - Pre-issued bearer token (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            count_trigger: parse_var("QUERY_COUNT_TRIGGER").unwrap_or(defaults.count_trigger),
            idle_trigger_ms: parse_var("QUERY_IDLE_MS").unwrap_or(defaults.idle_trigger_ms),
            record_limit: parse_var("RECORD_LIMIT").unwrap_or(defaults.record_limit),
            record_start_max: parse_var("RECORD_START_MAX").unwrap_or(defaults.record_start_max),
            http_timeout_ms: parse_var("HTTP_TIMEOUT_MS").unwrap_or(defaults.http_timeout_ms),
            poll_interval_ms: parse_var("POLL_INTERVAL_MS").unwrap_or(defaults.poll_interval_ms),
            max_poll_iterations: parse_var("MAX_POLL_ITERATIONS")
                .unwrap_or(defaults.max_poll_iterations),
            api_url: env::var("SUPPLY_API_URL").unwrap_or(defaults.api_url),
            identity_url: env::var("SUPPLY_IDENTITY_URL").unwrap_or(defaults.identity_url),
            token: env::var("SUPPLY_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }

    /// Checks values that would make the dispatcher misbehave.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.record_limit == 0 {
            return Some("RECORD_LIMIT must be at least 1".to_string());
        }
        if self.count_trigger == 0 {
            return Some("QUERY_COUNT_TRIGGER must be at least 1".to_string());
        }
        if self.max_poll_iterations == 0 {
            return Some("MAX_POLL_ITERATIONS must be at least 1".to_string());
        }
        None
    }

    pub fn dispatch(&self) -> DispatchConfig {
        DispatchConfig {
            count_trigger: self.count_trigger,
            idle_interval: Duration::from_millis(self.idle_trigger_ms),
            record_limit: self.record_limit,
            record_start_max: self.record_start_max,
            http_timeout: Duration::from_millis(self.http_timeout_ms),
        }
    }

    pub fn wait(&self) -> WaitConfig {
        WaitConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_iterations: self.max_poll_iterations,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            count_trigger: 10,
            idle_trigger_ms: 200,
            record_limit: 1,
            record_start_max: 80,
            http_timeout_ms: 5000,
            poll_interval_ms: 10,
            max_poll_iterations: 1000,
            api_url: DEFAULT_API_URL.to_string(),
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            token: None,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Config::default().dispatch()
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Config::default().wait()
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
