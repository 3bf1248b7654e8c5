//! Connection configuration using Figment.
//!
//! A configuration names the transport to open and the command table to bind.
//! It is loaded from:
//! 1. a TOML file (base configuration)
//! 2. environment variables prefixed with `LASER_` (nested keys joined by `__`)
//!
//! ```toml
//! model = "rfl-c3000s"          # built-in table, or:
//! # table = "tables/custom.toml"
//!
//! [connection]
//! transport = "tcp"             # serial | tcp | udp
//! address = "192.168.0.10"
//! port = 10001
//! baud_rate = 9600
//! timeout = 1.0                 # seconds
//! ```
//!
//! ```text
//! LASER_CONNECTION__ADDRESS=10.0.0.5
//! LASER_MODEL=ylr
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::{DeviceTable, Model};
use crate::error::LaserError;

/// Default network port of the laser's Ethernet interface.
pub const DEFAULT_PORT: u16 = 10001;
/// Default RS-232 speed.
pub const DEFAULT_BAUD_RATE: u32 = 9600;
/// Default response timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 1.0;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file or environment could not be read or deserialized.
    #[error("Configuration load error: {0}")]
    LoadError(#[from] Box<figment::Error>),
    /// Values parsed but are unusable.
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for LaserError {
    fn from(err: ConfigError) -> Self {
        LaserError::Config(err.to_string())
    }
}

/// Physical medium used to reach the laser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// RS-232 serial line.
    Serial,
    /// TCP stream.
    Tcp,
    /// UDP datagrams.
    Udp,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Serial => f.write_str("serial"),
            TransportKind::Tcp => f.write_str("tcp"),
            TransportKind::Udp => f.write_str("udp"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serial" => Ok(TransportKind::Serial),
            "tcp" => Ok(TransportKind::Tcp),
            "udp" => Ok(TransportKind::Udp),
            other => Err(ConfigError::ValidationError(format!(
                "Invalid transport '{other}'. Must be one of: serial, tcp, udp"
            ))),
        }
    }
}

/// Everything needed to open a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Medium to use
    pub transport: TransportKind,
    /// Serial port name, or network host (optionally `host:port`)
    pub address: String,
    /// Network port, used when `address` has none
    #[serde(default = "default_port")]
    pub port: u16,
    /// Serial line speed
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Response timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: f64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_timeout() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

impl ConnectionSettings {
    /// Settings for `kind` at `address` with default port, baud rate and timeout.
    pub fn new(transport: TransportKind, address: impl Into<String>) -> Self {
        Self {
            transport,
            address: address.into(),
            port: DEFAULT_PORT,
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Serial line on `port_name`.
    pub fn serial(port_name: impl Into<String>) -> Self {
        Self::new(TransportKind::Serial, port_name)
    }

    /// TCP connection to `address`.
    pub fn tcp(address: impl Into<String>) -> Self {
        Self::new(TransportKind::Tcp, address)
    }

    /// UDP exchange with `address`.
    pub fn udp(address: impl Into<String>) -> Self {
        Self::new(TransportKind::Udp, address)
    }

    /// Override the network port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Override the serial speed.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Override the timeout, in seconds.
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Timeout as a `Duration`, validated.
    pub fn timeout_duration(&self) -> Result<Duration, ConfigError> {
        if !self.timeout.is_finite() || self.timeout <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "Invalid timeout {}. Must be a positive number of seconds",
                self.timeout
            )));
        }
        Duration::try_from_secs_f64(self.timeout)
            .map_err(|e| ConfigError::ValidationError(format!("Invalid timeout: {e}")))
    }

    /// Check the settings before opening a transport.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} transport: 'address' cannot be empty",
                self.transport
            )));
        }
        if self.transport == TransportKind::Serial && self.baud_rate == 0 {
            return Err(ConfigError::ValidationError(
                "Serial transport: 'baud_rate' must be non-zero".to_string(),
            ));
        }
        if self.transport != TransportKind::Serial && self.port == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{} transport: 'port' must be non-zero",
                self.transport
            )));
        }
        self.timeout_duration().map(|_| ())
    }
}

/// Top-level configuration: one connection and one command table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserConfig {
    /// Transport settings
    pub connection: ConnectionSettings,
    /// Built-in model id (e.g. "rfl-c3000s")
    #[serde(default)]
    pub model: Option<String>,
    /// Path to a TOML command table; relative paths resolve against the config file
    #[serde(default)]
    pub table: Option<PathBuf>,
}

impl LaserConfig {
    /// Load configuration from a TOML file and `LASER_` environment variables.
    ///
    /// Environment variables take precedence over the file. After loading,
    /// the configuration is validated and a relative `table` path is made
    /// relative to the file's directory.
    ///
    /// # Errors
    ///
    /// Returns a ConfigError if the file cannot be loaded or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("LASER_").split("__"));

        let mut config = Self::from_figment(figment)?;
        if let (Some(table), Some(dir)) = (config.table.as_mut(), path.parent()) {
            if table.is_relative() {
                *table = dir.join(&*table);
            }
        }
        Ok(config)
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    ///
    /// Checks:
    /// - Connection settings are usable
    /// - Exactly one of `model` and `table` is given
    /// - `model` names a built-in table
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.connection.validate()?;

        match (&self.model, &self.table) {
            (Some(_), Some(_)) => Err(ConfigError::ValidationError(
                "Specify either 'model' or 'table', not both".to_string(),
            )),
            (None, None) => Err(ConfigError::ValidationError(
                "Missing command table: set 'model' or 'table'".to_string(),
            )),
            (Some(model), None) => model
                .parse::<Model>()
                .map(|_| ())
                .map_err(|e| ConfigError::ValidationError(e.to_string())),
            (None, Some(_)) => Ok(()),
        }
    }

    /// Build the configured command table.
    pub fn device_table(&self) -> Result<DeviceTable, LaserError> {
        match (&self.model, &self.table) {
            (Some(model), _) => Ok(model.parse::<Model>()?.table()),
            (None, Some(path)) => DeviceTable::from_toml_file(path),
            (None, None) => Err(LaserError::Config(
                "Missing command table: set 'model' or 'table'".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_defaults() {
        let settings = ConnectionSettings::tcp("192.168.0.10");
        assert_eq!(settings.port, 10001);
        assert_eq!(settings.baud_rate, 9600);
        assert_eq!(settings.timeout_duration().unwrap(), Duration::from_secs(1));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_timeout() {
        for timeout in [0.0, -1.0, f64::NAN] {
            let settings = ConnectionSettings::udp("127.0.0.1").with_timeout(timeout);
            assert!(settings.validate().is_err(), "timeout {timeout} accepted");
        }
    }

    #[test]
    fn test_empty_address_rejected() {
        assert!(ConnectionSettings::serial("  ").validate().is_err());
    }

    #[test]
    fn test_transport_kind_from_str() {
        assert_eq!("TCP".parse::<TransportKind>().unwrap(), TransportKind::Tcp);
        assert_eq!("serial".parse::<TransportKind>().unwrap(), TransportKind::Serial);
        assert!("can".parse::<TransportKind>().is_err());
    }

    #[test]
    fn test_extract_with_defaults() {
        let figment = Figment::new().merge(Toml::string(
            r#"
            model = "ylr"
            [connection]
            transport = "udp"
            address = "10.0.0.2"
            "#,
        ));
        let config = LaserConfig::from_figment(figment).unwrap();

        assert_eq!(config.connection.transport, TransportKind::Udp);
        assert_eq!(config.connection.port, DEFAULT_PORT);
        assert_eq!(config.connection.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.device_table().unwrap().name(), "IPG YLR series");
    }

    #[test]
    fn test_model_and_table_are_exclusive() {
        let mut config = LaserConfig {
            connection: ConnectionSettings::tcp("10.0.0.2"),
            model: Some("ylr".into()),
            table: Some(PathBuf::from("custom.toml")),
        };
        assert!(config.validate().is_err());

        config.table = None;
        config.model = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_model_rejected() {
        let config = LaserConfig {
            connection: ConnectionSettings::tcp("10.0.0.2"),
            model: Some("rfl-9000".into()),
            table: None,
        };
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }
}
