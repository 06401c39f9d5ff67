//! Relay configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::str::FromStr;

/// Main relay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub hub: HubSettings,
    pub transport: TransportSettings,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            _ => Err(()),
        }
    }
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path of the upgrade endpoint
    #[serde(default = "default_path")]
    pub path: String,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Broadcast hub settings
#[derive(Debug, Clone, Deserialize)]
pub struct HubSettings {
    /// Capacity of each client's outbound queue
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,
    /// Capacity of the hub's inbound command channel
    #[serde(default = "default_inbound_capacity")]
    pub inbound_capacity: usize,
    /// Maximum number of concurrently registered clients
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Whether a sender receives its own broadcast
    #[serde(default = "default_echo_to_sender")]
    pub echo_to_sender: bool,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            outbound_capacity: default_outbound_capacity(),
            inbound_capacity: default_inbound_capacity(),
            max_connections: default_max_connections(),
            echo_to_sender: default_echo_to_sender(),
        }
    }
}

/// WebSocket transport settings
#[derive(Debug, Clone, Deserialize)]
pub struct TransportSettings {
    #[serde(default = "default_buffer_size")]
    pub read_buffer_size: usize,
    #[serde(default = "default_buffer_size")]
    pub write_buffer_size: usize,
    /// Maximum inbound message size; `None` keeps the library default
    #[serde(default)]
    pub max_message_size: Option<usize>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            read_buffer_size: default_buffer_size(),
            write_buffer_size: default_buffer_size(),
            max_message_size: None,
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "fanout-relay".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_path() -> String {
    "/ws".to_string()
}

fn default_outbound_capacity() -> usize {
    256
}

fn default_inbound_capacity() -> usize {
    1024
}

fn default_max_connections() -> usize {
    10_000
}

fn default_echo_to_sender() -> bool {
    true
}

fn default_buffer_size() -> usize {
    1024
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: Environment::default(),
            },
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                path: default_path(),
            },
            hub: HubSettings::default(),
            transport: TransportSettings::default(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is present but cannot be parsed, or if a
    /// value is out of range
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let config = Self {
            app: AppSettings {
                name: vars.string("APP_NAME").unwrap_or_else(default_app_name),
                env: vars.parse("APP_ENV")?.unwrap_or_default(),
            },
            server: ServerConfig {
                host: vars.string("RELAY_HOST").unwrap_or_else(default_host),
                port: vars.parse("RELAY_PORT")?.unwrap_or_else(default_port),
                path: vars.string("RELAY_PATH").unwrap_or_else(default_path),
            },
            hub: HubSettings {
                outbound_capacity: vars
                    .parse("RELAY_OUTBOUND_CAPACITY")?
                    .unwrap_or_else(default_outbound_capacity),
                inbound_capacity: vars
                    .parse("RELAY_INBOUND_CAPACITY")?
                    .unwrap_or_else(default_inbound_capacity),
                max_connections: vars
                    .parse("RELAY_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_max_connections),
                echo_to_sender: vars
                    .parse("RELAY_ECHO_TO_SENDER")?
                    .unwrap_or_else(default_echo_to_sender),
            },
            transport: TransportSettings {
                read_buffer_size: vars
                    .parse("RELAY_READ_BUFFER_SIZE")?
                    .unwrap_or_else(default_buffer_size),
                write_buffer_size: vars
                    .parse("RELAY_WRITE_BUFFER_SIZE")?
                    .unwrap_or_else(default_buffer_size),
                max_message_size: vars.parse("RELAY_MAX_MESSAGE_SIZE")?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that the types alone cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.server.path.starts_with('/') {
            return Err(ConfigError::InvalidValue(
                "RELAY_PATH",
                format!("{:?} must start with '/'", self.server.path),
            ));
        }

        let positive = [
            ("RELAY_OUTBOUND_CAPACITY", self.hub.outbound_capacity),
            ("RELAY_INBOUND_CAPACITY", self.hub.inbound_capacity),
            ("RELAY_MAX_CONNECTIONS", self.hub.max_connections),
            ("RELAY_READ_BUFFER_SIZE", self.transport.read_buffer_size),
            ("RELAY_WRITE_BUFFER_SIZE", self.transport.write_buffer_size),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue(name, "must be greater than zero".to_string()));
            }
        }

        if self.transport.max_message_size == Some(0) {
            return Err(ConfigError::InvalidValue(
                "RELAY_MAX_MESSAGE_SIZE",
                "must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Variable lookup with typed parsing
struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    }

    fn parse<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        match self.string(key) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue(key, raw)),
            None => Ok(None),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
