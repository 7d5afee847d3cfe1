//! Defines the accessory exposed to the home-automation side: its information and one service
//! per configured sensor.

mod service;

pub use service::{Service, ServiceEvent};

use std::fmt::{Display, Formatter};

use log::{info, log, warn, Level};

use crate::config::{AccessoryConfig, Config};
use crate::errors::Error;
use crate::io::SignalSource;
use crate::sensors::{Sensor, SensorRegistry};

/// The accessory information service.
#[derive(Clone, Debug, PartialEq)]
pub struct AccessoryInformation {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
}

impl From<&AccessoryConfig> for AccessoryInformation {
    fn from(config: &AccessoryConfig) -> Self {
        Self {
            name: config.name.clone(),
            manufacturer: config.manufacturer.clone(),
            model: config.model.clone(),
            serial_number: config.serial_number.clone(),
        }
    }
}

/// The bridge accessory: every configured sensor wired to its [`Service`].
#[derive(Clone, Debug)]
pub struct GpioSensors {
    information: AccessoryInformation,
    services: Vec<Service>,
    sensors: Vec<Sensor>,
}

impl GpioSensors {
    /// Creates the sensors declared in the configuration, in configuration order.
    ///
    /// An invalid entry or a sensor that cannot be set up is logged and skipped: the others are
    /// still created.
    pub fn new(config: &Config, source: &(dyn SignalSource + 'static)) -> Self {
        let mut registry = SensorRegistry::new();
        let mut services = Vec::new();
        let mut sensors = Vec::new();

        for (label, entry) in config.sensors.iter() {
            let mut service = None;
            let result = registry.register(source, entry, |name, kind| {
                let created = Service::new(name, kind);
                let forward = created.forwarder();
                service = Some(created);
                forward
            });
            match result {
                Ok(sensor) => {
                    sensors.push(sensor);
                    services.extend(service);
                }
                Err(err) => log!(skip_level(&err), "Sensor {} skipped: {}", label, err),
            }
        }
        info!(
            "{} sensor(s) set up out of {} configured",
            sensors.len(),
            config.sensors.len()
        );

        Self {
            information: AccessoryInformation::from(&config.accessory),
            services,
            sensors,
        }
    }

    // ########################################
    // Getters and Setters

    pub fn get_information(&self) -> &AccessoryInformation {
        &self.information
    }

    /// Returns the sensor services, in configuration order.
    pub fn get_services(&self) -> &[Service] {
        &self.services
    }

    pub fn get_sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    /// Makes every service show its sensor current state.
    ///
    /// # Return
    /// Returns how many states have been emitted (a sensor emits its initial state once only).
    pub fn emit_initial_states(&self) -> usize {
        self.sensors
            .iter()
            .filter(|sensor| sensor.emit_initial_state())
            .count()
    }

    /// Stops monitoring every sensor and releases their pins.
    pub fn detach(&self) {
        for sensor in &self.sensors {
            if let Err(err) = sensor.detach() {
                warn!("{} could not be detached: {}", sensor, err);
            }
        }
    }
}

/// Configuration problems are warnings, anything else (hardware, read) is an error.
fn skip_level(err: &Error) -> Level {
    match err {
        Error::ConfigError { .. } => Level::Warn,
        _ => Level::Error,
    }
}

impl Display for GpioSensors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GpioSensors \"{}\" [sensors={}]",
            self.information.name,
            self.sensors.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{SensorEntries, SensorEntry};
    use crate::errors::{ConfigError, HardwareError};
    use crate::mocks::MockSource;
    use crate::sensors::{DomainValue, SensorKind};

    fn config(entries: Vec<SensorEntry>) -> Config {
        Config {
            sensors: SensorEntries::from(entries),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_accessory() {
        let source = MockSource::default();
        source.set_value(17, true).unwrap();
        let config = config(vec![
            SensorEntry::new("Front door", 17, "contact"),
            SensorEntry::new("Hallway", "GPIO27", "motion"),
        ]);

        let accessory = GpioSensors::new(&config, &source);
        assert_eq!(accessory.get_information().model, "0.1");
        assert_eq!(accessory.get_information().name, "GPIO Sensors");
        assert_eq!(accessory.get_sensors().len(), 2);

        let services = accessory.get_services();
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].get_name(), "Front door");
        assert_eq!(services[0].get_service_type(), "ContactSensor");
        assert_eq!(services[1].get_name(), "Hallway");
        assert_eq!(services[1].get_kind(), SensorKind::Motion);
        assert_eq!(
            format!("{}", accessory),
            "GpioSensors \"GPIO Sensors\" [sensors=2]"
        );
    }

    #[test]
    fn test_initial_states() {
        let source = MockSource::default();
        source.set_value(17, true).unwrap();
        let config = config(vec![
            SensorEntry::new("Front door", 17, "contact"),
            SensorEntry::new("Hallway", 27, "motion"),
        ]);
        let accessory = GpioSensors::new(&config, &source);
        let services = accessory.get_services();
        assert_eq!(services[0].get_value(), None);

        assert_eq!(accessory.emit_initial_states(), 2);
        assert_eq!(
            services[0].get_value(),
            Some(DomainValue::ContactNotDetected)
        );
        assert_eq!(
            services[1].get_value(),
            Some(DomainValue::MotionNotDetected)
        );
        assert_eq!(accessory.emit_initial_states(), 0, "Emitted once only");

        source.set_value(27, true).unwrap();
        assert_eq!(services[1].get_value(), Some(DomainValue::MotionDetected));
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let source = MockSource::default();
        let config = config(vec![
            SensorEntry::new("Front door", 17, "contact"),
            SensorEntry::new("Barometer", 18, "BAROMETER"),
            SensorEntry {
                pin: None,
                ..SensorEntry::new("Attic", 19, "smoke")
            },
            SensorEntry::new("Back door", 1, "contact"),
            SensorEntry::new("Porch", 17, "motion"),
            SensorEntry::new("Cellar", 22, "leak"),
        ]);

        let accessory = GpioSensors::new(&config, &source);
        let names: Vec<&str> = accessory
            .get_services()
            .iter()
            .map(|service| service.get_name())
            .collect();
        assert_eq!(names, vec!["Front door", "Cellar"]);
        assert!(!source.is_claimed(18));
        assert!(!source.is_claimed(1));
    }

    #[test]
    fn test_only_unknown_type() {
        let source = MockSource::default();
        let entry = SensorEntry::new("Barometer", 18, "BAROMETER");
        let config = config(vec![entry.clone()]);
        let accessory = GpioSensors::new(&config, &source);
        assert!(accessory.get_sensors().is_empty());
        assert!(accessory.get_services().is_empty());

        // The entry is reported as a configuration problem, at warning level.
        let err = SensorRegistry::new()
            .register(&source, &entry, |_, _| Arc::new(|_: DomainValue| {}))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ConfigError {
                source: ConfigError::UnknownType { .. }
            }
        ));
        assert_eq!(skip_level(&err), Level::Warn);
        assert!(!source.is_claimed(18));
    }

    #[test]
    fn test_skip_level() {
        let err = Error::from(ConfigError::MissingName);
        assert_eq!(skip_level(&err), Level::Warn);
        let err = Error::from(HardwareError::PinInUse { pin: 17 });
        assert_eq!(skip_level(&err), Level::Error);
        let err = Error::TransientReadError {
            pin: 17,
            info: String::from("busy"),
        };
        assert_eq!(skip_level(&err), Level::Error);
    }

    #[test]
    fn test_malformed_entry_is_skipped() {
        let source = MockSource::default();
        let config = Config::from_json(
            r#"{
                "sensors": [
                    { "name": "Front door", "pin": 17, "type": "contact" },
                    { "name": "Hallway", "pin": -1, "type": "motion" },
                    { "name": "Attic", "pin": 5, "type": 3 },
                    { "name": "Porch", "pin": "", "type": "motion" },
                    { "name": "Cellar", "pin": 22, "type": "leak" }
                ]
            }"#,
        )
        .unwrap();

        let accessory = GpioSensors::new(&config, &source);
        let names: Vec<&str> = accessory
            .get_services()
            .iter()
            .map(|service| service.get_name())
            .collect();
        assert_eq!(names, vec!["Front door", "Cellar"]);
        assert!(!source.is_claimed(5));
    }

    #[test]
    fn test_detach() {
        let source = MockSource::default();
        let config = config(vec![
            SensorEntry::new("Front door", 17, "contact"),
            SensorEntry::new("Cellar", 22, "leak"),
        ]);
        let accessory = GpioSensors::new(&config, &source);
        assert!(source.is_claimed(17));

        accessory.detach();
        assert!(!source.is_claimed(17));
        assert!(!source.is_claimed(22));
    }
}
