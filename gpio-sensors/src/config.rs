//! Defines the bridge configuration, loaded from a JSON file.
//!
//! ```json
//! {
//!   "accessory": { "name": "GPIO Sensors", "manufacturer": "gpio-sensors" },
//!   "gpio": { "chip": "/dev/gpiochip0", "detection": "edge", "poll_interval": 100 },
//!   "sensors": [
//!     { "name": "Front door", "pin": 17, "type": "contact" },
//!     { "name": "Hallway", "pin": "GPIO27", "type": "motion" }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ConfigError::InvalidFile;
use crate::errors::Error;
use crate::io::{Detection, PinIdOrName};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub accessory: AccessoryConfig,
    pub gpio: GpioConfig,
    pub sensors: SensorEntries,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessoryConfig {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
}

impl Default for AccessoryConfig {
    fn default() -> Self {
        Self {
            name: String::from("GPIO Sensors"),
            manufacturer: String::from("gpio-sensors"),
            model: String::from("0.1"),
            serial_number: String::from("0001"),
        }
    }
}

/// The change detection strategy, as written in the configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    #[default]
    Edge,
    Poll,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    /// The GPIO character device.
    pub chip: String,
    pub detection: DetectionMode,
    /// Polling interval (in ms), used with the `poll` detection only.
    pub poll_interval: u64,
    /// The pull-up resistors are provided by the board configuration or the wiring. The
    /// character device cannot set a bias: pull-up inputs are refused unless this is set.
    pub external_bias: bool,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            chip: String::from("/dev/gpiochip0"),
            detection: DetectionMode::Edge,
            poll_interval: 100,
            external_bias: false,
        }
    }
}

impl GpioConfig {
    pub fn detection(&self) -> Detection {
        match self.detection {
            DetectionMode::Edge => Detection::Edge,
            DetectionMode::Poll => Detection::Poll(Duration::from_millis(self.poll_interval.max(1))),
        }
    }
}

/// One configured sensor. Every field is kept as raw JSON here: an incomplete or malformed entry
/// is reported and skipped when the sensors are built, without rejecting the whole file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorEntry {
    pub name: Option<Value>,
    /// A pin id (`17`) or name (`"GPIO17"`).
    pub pin: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<Value>,
}

impl SensorEntry {
    pub fn new<T: Into<PinIdOrName>>(name: &str, pin: T, kind: &str) -> Self {
        Self {
            name: Some(Value::from(name)),
            pin: Some(Value::from(pin.into())),
            kind: Some(Value::from(kind)),
        }
    }
}

/// The configured sensors: either a list or a map keyed by any label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorEntries {
    List(Vec<SensorEntry>),
    Named(BTreeMap<String, SensorEntry>),
}

impl Default for SensorEntries {
    fn default() -> Self {
        SensorEntries::List(vec![])
    }
}

impl SensorEntries {
    /// Lists the entries in configuration order, each with a label for logging (its list index or
    /// its map key).
    pub fn iter(&self) -> Vec<(String, &SensorEntry)> {
        match self {
            SensorEntries::List(entries) => entries
                .iter()
                .enumerate()
                .map(|(index, entry)| (index.to_string(), entry))
                .collect(),
            SensorEntries::Named(entries) => entries
                .iter()
                .map(|(label, entry)| (label.clone(), entry))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SensorEntries::List(entries) => entries.len(),
            SensorEntries::Named(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<SensorEntry>> for SensorEntries {
    fn from(entries: Vec<SensorEntry>) -> Self {
        SensorEntries::List(entries)
    }
}

impl Config {
    /// Loads the configuration file, then applies the environment overrides.
    ///
    /// # Errors
    /// * `InvalidFile`: the file cannot be read or is not a valid configuration.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| InvalidFile {
            info: format!("{}: {}", path.display(), err),
        })?;
        let config = Self::from_json(&content)?;
        debug!(
            "Configuration loaded from {}: {} sensor(s)",
            path.display(),
            config.sensors.len()
        );
        Ok(config.with_env_overrides())
    }

    /// Parses a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Overrides the GPIO settings with the `GPIO_CHIP`, `GPIO_DETECTION`, `GPIO_POLL_INTERVAL`
    /// and `GPIO_EXTERNAL_BIAS` environment variables, when set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F: Fn(&str) -> Option<String>>(mut self, lookup: F) -> Self {
        if let Some(chip) = lookup("GPIO_CHIP") {
            self.gpio.chip = chip;
        }
        if let Some(detection) = lookup("GPIO_DETECTION") {
            match detection.trim().to_lowercase().as_str() {
                "edge" => self.gpio.detection = DetectionMode::Edge,
                "poll" => self.gpio.detection = DetectionMode::Poll,
                _ => warn!("Ignoring GPIO_DETECTION={}: expected edge or poll", detection),
            }
        }
        if let Some(interval) = lookup("GPIO_POLL_INTERVAL") {
            match interval.trim().parse() {
                Ok(interval) => self.gpio.poll_interval = interval,
                Err(_) => warn!("Ignoring GPIO_POLL_INTERVAL={}: not a number", interval),
            }
        }
        if let Some(bias) = lookup("GPIO_EXTERNAL_BIAS") {
            match bias.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => self.gpio.external_bias = true,
                "0" | "false" | "no" => self.gpio.external_bias = false,
                _ => warn!("Ignoring GPIO_EXTERNAL_BIAS={}: expected true or false", bias),
            }
        }
        self
    }
}
