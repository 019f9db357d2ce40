use std::{env, str::FromStr, time::Duration};

use gateway_tools::GatewayConfig;
use log::*;
use market_payment_engine::{db_types::SessionMode, DEFAULT_LOCK_TIMEOUT};

const DEFAULT_MPG_HOST: &str = "127.0.0.1";
const DEFAULT_MPG_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/marketplace.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// How long a request waits for a database write lock before giving up with a retryable error.
    pub lock_timeout: Duration,
    /// Capacity of each event hook channel. Events that do not fit are dropped.
    pub event_buffer_size: usize,
    /// Payment gateway credentials and behaviour. A missing or placeholder server key puts the server in mock mode.
    pub gateway: GatewayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MPG_HOST.to_string(),
            port: DEFAULT_MPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            gateway: GatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MPG_HOST").ok().unwrap_or_else(|| DEFAULT_MPG_HOST.into());
        let port = parse_env("MPG_PORT", DEFAULT_MPG_PORT);
        let database_url = env::var("MPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ MPG_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = parse_env("MPG_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let lock_timeout =
            Duration::from_millis(parse_env("MPG_LOCK_TIMEOUT_MS", DEFAULT_LOCK_TIMEOUT.as_millis() as u64));
        let event_buffer_size = parse_env("MPG_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let gateway = GatewayConfig::new_from_env_or_default();
        Self { host, port, database_url, max_connections, lock_timeout, event_buffer_size, gateway }
    }

    /// Live sessions are only possible once a real gateway server key has been configured.
    pub fn session_mode(&self) -> SessionMode {
        if self.gateway.is_configured() {
            SessionMode::Live
        } else {
            SessionMode::Mock
        }
    }
}

/// Reads and parses an environment variable. Missing values quietly fall back to the default, while values that do
/// not parse are logged before falling back.
fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}
