//! Error definitions for the device client

use thiserror::Error;

/// Errors raised while preparing or running the simulated device
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Missing or invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading or writing the configuration file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A payload or configuration template could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// The MQTT client rejected a request
    #[error("Client error: {0}")]
    Client(#[from] rumqttc::ClientError),
}

impl From<serde_json::Error> for DeviceError {
    fn from(e: serde_json::Error) -> Self {
        DeviceError::Serialize(e.to_string())
    }
}

impl From<toml::ser::Error> for DeviceError {
    fn from(e: toml::ser::Error) -> Self {
        DeviceError::Serialize(e.to_string())
    }
}
