//! # Device Configuration
//!
//! Loads the device identity triple and connection settings from a TOML file.
//! Everything downstream (credential signing, topic names, the MQTT session)
//! receives an immutable [`Config`] built here; nothing reads global state.
//!
//! The file lives at `$IOT_DEVICE_CONFIG` when set, otherwise under the
//! platform config directory (`~/.config/iot-device/device.toml` on Linux).
//! A missing file is replaced with a template and loading stops so the user
//! can fill in the identity issued by the console.

use crate::error::DeviceError;
use rumqttc::QoS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const CONFIG_ENV: &str = "IOT_DEVICE_CONFIG";
const CONFIG_DIR: &str = "iot-device";
const CONFIG_FILE: &str = "device.toml";

/// Value written into the template for fields the user has to replace
pub const PLACEHOLDER: &str = "replace-me";

/// Identity triple issued for one device, plus the region it is registered in.
#[derive(Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub product_key: String,
    pub device_name: String,
    pub device_secret: String,
    pub region_id: String,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            product_key: PLACEHOLDER.to_string(),
            device_name: PLACEHOLDER.to_string(),
            device_secret: PLACEHOLDER.to_string(),
            region_id: "cn-shanghai".to_string(),
        }
    }
}

// The secret never ends up in logs.
impl fmt::Debug for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceIdentity")
            .field("product_key", &self.product_key)
            .field("device_name", &self.device_name)
            .field("device_secret", &"***")
            .field("region_id", &self.region_id)
            .finish()
    }
}

impl DeviceIdentity {
    /// Broker host name for this product in its region
    pub fn broker_host(&self) -> String {
        format!(
            "{}.iot-as-mqtt.{}.aliyuncs.com",
            self.product_key, self.region_id
        )
    }
}

/// CONNECT and publishing parameters
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct MqttSettings {
    pub port: u16,
    pub keep_alive_secs: u64,
    pub clean_session: bool,
    pub publish_interval_secs: u64,
    /// QoS used for telemetry and the control subscription (0, 1 or 2)
    pub qos: u8,
    /// Capacity of the request channel between client and event loop
    pub channel_capacity: usize,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            port: 1883,
            keep_alive_secs: 60,
            clean_session: false,
            publish_interval_secs: 5,
            qos: 0,
            channel_capacity: 10,
        }
    }
}

impl MqttSettings {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_secs(self.publish_interval_secs)
    }

    pub fn qos(&self) -> Result<QoS, DeviceError> {
        match self.qos {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            other => Err(DeviceError::Config(format!(
                "qos must be 0, 1 or 2, got {}",
                other
            ))),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Fixed seed for client id and sensor values; random when absent
    pub seed: Option<u64>,
}

/// Complete, validated configuration of the simulated device
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub device: DeviceIdentity,
    #[serde(default)]
    pub mqtt: MqttSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Config {
    /// Resolves the configuration file location
    pub fn default_path() -> Result<PathBuf, DeviceError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            debug!("Using config path from {}: {}", CONFIG_ENV, path);
            return Ok(PathBuf::from(path));
        }

        let mut path = dirs::config_dir().ok_or_else(|| {
            DeviceError::Config(format!(
                "no config directory available, set {}",
                CONFIG_ENV
            ))
        })?;
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    /// Parses and validates configuration text
    pub fn from_toml_str(content: &str) -> Result<Self, DeviceError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self, DeviceError> {
        debug!("Reading config file {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::from_toml_str(&content)?;
        info!(
            "Loaded configuration for device {} ({})",
            config.device.device_name, config.device.product_key
        );
        Ok(config)
    }

    /// Loads the file at `path`, writing a template first if it does not exist.
    ///
    /// A freshly written template still holds placeholders, so this returns
    /// a [`DeviceError::Config`] pointing at the file instead of a config.
    pub async fn load_or_init(path: &Path) -> Result<Self, DeviceError> {
        if !tokio::fs::try_exists(path).await? {
            Self::write_template(path).await?;
            return Err(DeviceError::Config(format!(
                "wrote a template to {}, fill in the device identity and restart",
                path.display()
            )));
        }
        Self::load(path).await
    }

    async fn write_template(path: &Path) -> Result<(), DeviceError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string_pretty(&Config::default())?;
        tokio::fs::write(path, content).await?;
        warn!("No configuration found, template written to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DeviceError> {
        let fields = [
            ("device.product_key", &self.device.product_key),
            ("device.device_name", &self.device.device_name),
            ("device.device_secret", &self.device.device_secret),
            ("device.region_id", &self.device.region_id),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() || value == PLACEHOLDER {
                return Err(DeviceError::Config(format!("{} is not set", name)));
            }
        }

        if self.mqtt.publish_interval_secs == 0 {
            return Err(DeviceError::Config(
                "mqtt.publish_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.mqtt.channel_capacity == 0 {
            return Err(DeviceError::Config(
                "mqtt.channel_capacity must be greater than zero".to_string(),
            ));
        }
        self.mqtt.qos()?;
        Ok(())
    }
}
