//! Application configuration.
//!
//! Layered: optional `orders.{yaml,toml,json}` in the working directory, then
//! environment variables prefixed with `ORDERS` using `__` as the section
//! separator (`ORDERS__EMAIL__MODE=http`, `ORDERS__DATABASE__URL=...`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::order::OrderEventTag;

/// Base name of the optional configuration file.
pub const CONFIG_FILE: &str = "orders";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "ORDERS";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub email: EmailConfig,
    pub messaging: MessagingConfig,
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub redis: RedisConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::layered(environment())
    }

    /// Environment values are not type-guessed: strings reach their fields verbatim.
    fn layered(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(CONFIG_ENV_PREFIX).separator("__")
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Email strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailMode {
    /// Probe the SMTP relay and fall back to the HTTP API when it is unhealthy
    #[default]
    Auto,
    /// Always use the HTTP API
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub mode: EmailMode,
    pub from: String,
    /// Seconds a relay probe outcome is reused. Zero probes before every send.
    #[serde(default)]
    pub probe_cache_ttl_secs: u64,
    pub smtp: Option<SmtpConfig>,
    pub http_api: HttpApiConfig,
}

impl EmailConfig {
    pub fn probe_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.probe_cache_ttl_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    /// Implicit TLS (port 465)
    #[default]
    Wrapper,
    /// STARTTLS upgrade (port 587)
    Starttls,
    None,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub tls: SmtpTls,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_greeting_timeout")]
    pub greeting_timeout_secs: u64,
    #[serde(default = "default_socket_idle_timeout")]
    pub socket_idle_timeout_secs: u64,
    #[serde(default = "default_dns_timeout")]
    pub dns_timeout_secs: u64,
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpApiConfig {
    pub endpoint: String,
    pub api_key: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagingConfig {
    #[serde(default = "default_messaging_base_url")]
    pub base_url: String,
    pub account_sid: String,
    pub auth_token: String,
    /// Fixed sender identity, E.164
    pub sender: String,
    /// Channel prefix prepended to both addresses, e.g. `whatsapp:`
    #[serde(default)]
    pub address_prefix: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    /// Event tag → provider template id
    #[serde(default)]
    pub templates: HashMap<OrderEventTag, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    pub recipient: String,
    #[serde(default = "default_low_stock_window")]
    pub low_stock_window_secs: u64,
}

impl AlertsConfig {
    pub fn low_stock_window(&self) -> Duration {
        Duration::from_secs(self.low_stock_window_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Hand events to the notification actor and return immediately
    #[default]
    Queued,
    /// Dispatch within the request that triggered the event
    Inline,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    #[serde(default)]
    pub mode: DispatchMode,
    #[serde(default = "default_dedupe_window")]
    pub dedupe_window_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::default(),
            dedupe_window_secs: default_dedupe_window(),
        }
    }
}

impl DispatchConfig {
    pub fn dedupe_window(&self) -> Duration {
        Duration::from_secs(self.dedupe_window_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedisConfig {
    /// When set, cooldowns are shared through Redis instead of process memory
    pub url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_max_connections() -> u32 {
    10
}
fn default_smtp_port() -> u16 {
    465
}
fn default_connect_timeout() -> u64 {
    25
}
fn default_greeting_timeout() -> u64 {
    12
}
fn default_socket_idle_timeout() -> u64 {
    25
}
fn default_dns_timeout() -> u64 {
    8
}
fn default_pool_max_size() -> u32 {
    5
}
fn default_http_timeout() -> u64 {
    15
}
fn default_messaging_base_url() -> String {
    "https://api.twilio.com/2010-04-01".to_string()
}
fn default_low_stock_window() -> u64 {
    6 * 60 * 60
}
fn default_dedupe_window() -> u64 {
    600
}
