use log::error;
use snafu::Snafu;

pub use crate::errors::Error::*;
use crate::errors::HardwareError::IoException;
use crate::io::PinMode;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Runtime error: Are you sure your code runs inside #[gpio_sensors::runtime]?
    RuntimeError,
    /// Configuration error: {source}.
    ConfigError { source: ConfigError },
    /// Hardware error: {source}.
    HardwareError { source: HardwareError },
    /// Transient read error on pin {pin}: {info}.
    TransientReadError { pin: u16, info: String },
    /// Unknown error: {info}.
    Unknown { info: String },
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        error!("std::io error {:?}", error);
        let info = match error.kind() {
            std::io::ErrorKind::NotFound => String::from("GPIO device not found"),
            std::io::ErrorKind::PermissionDenied => String::from("GPIO device access denied"),
            _ => error.to_string(),
        };
        Self::HardwareError {
            source: IoException { info },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::ConfigError {
            source: ConfigError::InvalidFile {
                info: error.to_string(),
            },
        }
    }
}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        Self::ConfigError { source: value }
    }
}

impl From<HardwareError> for Error {
    fn from(value: HardwareError) -> Self {
        Self::HardwareError { source: value }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Sensor name is missing or empty
    MissingName,
    /// Sensor "{name}" has no pin
    MissingPin { name: String },
    /// Sensor "{name}" has no type
    MissingType { name: String },
    /// Sensor "{name}" has an invalid pin ({pin})
    InvalidPin { name: String, pin: String },
    /// Sensor "{name}" has an unknown type "{kind}"
    UnknownType { name: String, kind: String },
    /// Pin {pin} is already used by sensor "{owner}"
    DuplicatePin { pin: String, owner: String },
    /// Invalid configuration file - {info}
    InvalidFile { info: String },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum HardwareError {
    /// Pin ({pin}) not compatible with mode ({mode}) - {context}
    IncompatibleMode {
        pin: u16,
        mode: PinMode,
        context: &'static str,
    },
    /// Unknown pin {pin}
    UnknownPin { pin: String },
    /// Pin {pin} is already in use
    PinInUse { pin: u16 },
    /// Pin {pin} is not configured
    NotConfigured { pin: u16 },
    /// {info}
    IoException { info: String },
}

#[cfg(test)]
mod tests {
    use std::io;

    use crate::errors::HardwareError::{IncompatibleMode, PinInUse, UnknownPin};

    use super::*;

    #[test]
    fn test_error_display() {
        let runtime_error = RuntimeError;
        assert_eq!(
            format!("{}", runtime_error),
            "Runtime error: Are you sure your code runs inside #[gpio_sensors::runtime]?"
        );

        let config_error = Error::from(ConfigError::UnknownType {
            name: "Cellar".to_string(),
            kind: "BAROMETER".to_string(),
        });
        assert_eq!(
            format!("{}", config_error),
            "Configuration error: Sensor \"Cellar\" has an unknown type \"BAROMETER\"."
        );

        let hardware_error = Error::from(IncompatibleMode {
            pin: 1,
            mode: PinMode::PullUp,
            context: "test context",
        });
        assert_eq!(
            format!("{}", hardware_error),
            "Hardware error: Pin (1) not compatible with mode (PULLUP) - test context."
        );

        let read_error = TransientReadError {
            pin: 4,
            info: "device busy".to_string(),
        };
        assert_eq!(
            format!("{}", read_error),
            "Transient read error on pin 4: device busy."
        );

        let unknown_error = Unknown {
            info: "Some unknown error".to_string(),
        };
        assert_eq!(
            format!("{}", unknown_error),
            "Unknown error: Some unknown error."
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: Error = io_error.into();
        assert_eq!(
            format!("{}", error),
            "Hardware error: GPIO device not found."
        );
    }

    #[test]
    fn test_from_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(format!("{}", error).starts_with("Configuration error: Invalid configuration file - "));
    }

    #[test]
    fn test_from_hardware_error() {
        let error: Error = UnknownPin {
            pin: "\"GPIO99\"".to_string(),
        }
        .into();
        assert_eq!(format!("{}", error), "Hardware error: Unknown pin \"GPIO99\".");

        let error: Error = PinInUse { pin: 17 }.into();
        assert_eq!(format!("{}", error), "Hardware error: Pin 17 is already in use.");
    }
}
