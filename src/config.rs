//! Configuration management for Argus
//!
//! Loads configuration from YAML files and environment variables.
//! Environment variables override YAML values.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// RPC endpoint configuration
    pub rpc: RpcConfig,
    /// Account watching configuration
    #[serde(default)]
    pub watch: WatchSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

/// RPC endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    /// HTTP RPC endpoint URL
    #[serde(default = "default_http_url")]
    pub http_url: String,
    /// Websocket RPC endpoint URL (account-change subscriptions)
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_ms: u64,
}

fn default_http_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

fn default_ws_url() -> String {
    "wss://api.mainnet-beta.solana.com".to_string()
}

fn default_rpc_timeout() -> u64 {
    30000
}

/// Account watching configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSettings {
    /// Delay between holder registrations (ms)
    #[serde(default = "default_registration_delay")]
    pub registration_delay_ms: u64,
    /// Capacity of the swap event broadcast channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Per-account capacity of the already-classified signature cache
    #[serde(default = "default_seen_signature_capacity")]
    pub seen_signature_capacity: usize,
}

fn default_registration_delay() -> u64 {
    1000
}

fn default_event_capacity() -> usize {
    256
}

fn default_seen_signature_capacity() -> usize {
    1024
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            registration_delay_ms: default_registration_delay(),
            event_capacity: default_event_capacity(),
            seen_signature_capacity: default_seen_signature_capacity(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (ARGUS_*)
    /// 2. config/config.yaml (if exists)
    /// 3. config.yaml (if exists)
    /// 4. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("rpc.http_url", "https://api.mainnet-beta.solana.com")?
            .set_default("rpc.ws_url", "wss://api.mainnet-beta.solana.com")?
            .set_default("rpc.timeout_ms", 30000)?
            .set_default("watch.registration_delay_ms", 1000)?
            .set_default("watch.event_capacity", 256)?
            .set_default("watch.seen_signature_capacity", 1024)?
            // Load from config files (lower priority)
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("config/config").required(false))
            // Override with environment variables (highest priority - loaded last)
            // ARGUS_SERVER__PORT=5001 -> server.port = 5001
            .add_source(
                Environment::with_prefix("ARGUS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc.http_url.is_empty() {
            return Err(ConfigError::Message(
                "RPC HTTP URL must be set".to_string(),
            ));
        }

        if self.rpc.ws_url.is_empty() {
            return Err(ConfigError::Message(
                "RPC websocket URL must be set".to_string(),
            ));
        }

        if self.watch.event_capacity == 0 {
            return Err(ConfigError::Message(
                "Watch event capacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
