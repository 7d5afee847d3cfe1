use std::collections::HashMap;

use log::debug;
use serde_json::Value;

use crate::config::SensorEntry;
use crate::errors::ConfigError::{
    DuplicatePin, InvalidPin, MissingName, MissingPin, MissingType, UnknownType,
};
use crate::errors::Error;
use crate::io::{PinIdOrName, SignalSource};
use crate::sensors::{Forward, Sensor, SensorKind};

/// Builds sensors from configuration entries, keeping track of the pins already used.
#[derive(Clone, Debug, Default)]
pub struct SensorRegistry {
    /// Used pin => owning sensor name.
    pins: HashMap<u16, String>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration entry and creates its sensor.
    ///
    /// # Parameters
    /// * `source`: the [`SignalSource`] the pins belong to
    /// * `entry`: the configuration entry
    /// * `forward`: builds the forwarding callback once the entry name and kind are known
    ///
    /// # Errors
    /// * `MissingName`, `MissingPin`, `MissingType`: the entry is incomplete.
    /// * `InvalidPin`: the pin is neither an id (0 to 65535) nor a name.
    /// * `UnknownType`: the type matches no [`SensorKind`].
    /// * `DuplicatePin`: another sensor already uses the pin.
    /// * any [`Sensor::new()`] error.
    pub fn register<F>(
        &mut self,
        source: &(dyn SignalSource + 'static),
        entry: &SensorEntry,
        forward: F,
    ) -> Result<Sensor, Error>
    where
        F: FnOnce(&str, SensorKind) -> Forward,
    {
        let name = match entry.name.as_ref().and_then(Value::as_str).map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => return Err(MissingName.into()),
        };
        let pin = match &entry.pin {
            Some(pin) => pin_of(name, pin)?,
            None => return Err(missing_pin(name)),
        };
        let kind = match &entry.kind {
            Some(Value::String(type_name)) => {
                SensorKind::from_type_name(type_name).ok_or_else(|| UnknownType {
                    name: name.to_string(),
                    kind: type_name.to_string(),
                })?
            }
            Some(other) => {
                return Err(UnknownType {
                    name: name.to_string(),
                    kind: other.to_string(),
                }
                .into())
            }
            None => {
                return Err(MissingType {
                    name: name.to_string(),
                }
                .into())
            }
        };

        let pin = source.resolve_pin(&pin)?;
        if let Some(owner) = self.pins.get(&pin) {
            return Err(DuplicatePin {
                pin: pin.to_string(),
                owner: owner.clone(),
            }
            .into());
        }

        let sensor = Sensor::new(source, name, pin, kind, forward(name, kind))?;
        self.pins.insert(pin, name.to_string());
        debug!("Sensor registered: {}", sensor);
        Ok(sensor)
    }

    /// Returns the name of the sensor using the pin, if any.
    pub fn get_owner(&self, pin: u16) -> Option<&str> {
        self.pins.get(&pin).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

/// Reads a configured pin: a JSON number fitting a pin id, or a non-blank pin name.
fn pin_of(name: &str, pin: &Value) -> Result<PinIdOrName, Error> {
    match pin {
        Value::Number(number) => number
            .as_u64()
            .and_then(|id| u16::try_from(id).ok())
            .map(PinIdOrName::Id)
            .ok_or_else(|| invalid_pin(name, pin)),
        Value::String(pin_name) if pin_name.trim().is_empty() => Err(missing_pin(name)),
        Value::String(pin_name) => Ok(PinIdOrName::from(pin_name.trim())),
        Value::Null => Err(missing_pin(name)),
        _ => Err(invalid_pin(name, pin)),
    }
}

fn missing_pin(name: &str) -> Error {
    MissingPin {
        name: name.to_string(),
    }
    .into()
}

fn invalid_pin(name: &str, pin: &Value) -> Error {
    InvalidPin {
        name: name.to_string(),
        pin: pin.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::RwLock;
    use serde_json::json;

    use super::*;
    use crate::errors::ConfigError;
    use crate::errors::HardwareError::IncompatibleMode;
    use crate::mocks::MockSource;
    use crate::sensors::DomainValue;

    fn no_forward(_: &str, _: SensorKind) -> Forward {
        Arc::new(|_: DomainValue| {})
    }

    fn config_error(result: Result<Sensor, Error>) -> ConfigError {
        match result {
            Err(Error::ConfigError { source }) => source,
            other => panic!("Expected a configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_register() {
        let source = MockSource::default();
        let mut registry = SensorRegistry::new();
        let forwarded = Arc::new(RwLock::new(Vec::new()));

        let forwarded_clone = forwarded.clone();
        let sensor = registry
            .register(
                &source,
                &SensorEntry::new("Front door", 17, "Contact"),
                |name, kind| {
                    assert_eq!(name, "Front door");
                    assert_eq!(kind, SensorKind::Contact);
                    Arc::new(move |value: DomainValue| forwarded_clone.write().push(value))
                },
            )
            .unwrap();
        assert_eq!(sensor.get_kind(), SensorKind::Contact);
        assert_eq!(registry.get_owner(17), Some("Front door"));
        assert_eq!(registry.len(), 1);

        source.set_value(17, true).unwrap();
        assert_eq!(*forwarded.read(), vec![DomainValue::ContactNotDetected]);

        let sensor = registry
            .register(&source, &SensorEntry::new("CO", "GPIO4", "c0"), no_forward)
            .unwrap();
        assert_eq!(sensor.get_kind(), SensorKind::CarbonMonoxide);
        assert_eq!(registry.get_owner(4), Some("CO"));
    }

    #[test]
    fn test_register_invalid_entries() {
        let source = MockSource::default();
        let mut registry = SensorRegistry::new();

        let entry = SensorEntry::new("Barometer", 5, "BAROMETER");
        assert!(matches!(
            config_error(registry.register(&source, &entry, no_forward)),
            ConfigError::UnknownType { .. }
        ));

        let entry = SensorEntry {
            pin: None,
            ..SensorEntry::new("Attic", 5, "smoke")
        };
        assert!(matches!(
            config_error(registry.register(&source, &entry, no_forward)),
            ConfigError::MissingPin { .. }
        ));

        let entry = SensorEntry::new("", 5, "smoke");
        assert!(matches!(
            config_error(registry.register(&source, &entry, no_forward)),
            ConfigError::MissingName
        ));

        let entry = SensorEntry {
            kind: None,
            ..SensorEntry::new("Attic", 5, "smoke")
        };
        assert!(matches!(
            config_error(registry.register(&source, &entry, no_forward)),
            ConfigError::MissingType { .. }
        ));

        let entry = SensorEntry {
            kind: Some(json!(3)),
            ..SensorEntry::new("Attic", 5, "smoke")
        };
        assert!(matches!(
            config_error(registry.register(&source, &entry, no_forward)),
            ConfigError::UnknownType { .. }
        ));

        let entry = SensorEntry {
            name: Some(json!(4)),
            ..SensorEntry::new("Attic", 5, "smoke")
        };
        assert!(matches!(
            config_error(registry.register(&source, &entry, no_forward)),
            ConfigError::MissingName
        ));

        assert!(registry.is_empty());
        assert!(!source.is_claimed(5), "Invalid entries claim no pin");
    }

    #[test]
    fn test_register_invalid_pins() {
        let source = MockSource::default();
        let mut registry = SensorRegistry::new();

        for pin in [json!(""), json!("  "), json!(null)] {
            let entry = SensorEntry {
                pin: Some(pin),
                ..SensorEntry::new("Empty", 5, "motion")
            };
            assert!(matches!(
                config_error(registry.register(&source, &entry, no_forward)),
                ConfigError::MissingPin { .. }
            ));
        }

        for pin in [json!(-1), json!(70000), json!(4.5), json!(true), json!([6])] {
            let entry = SensorEntry {
                pin: Some(pin),
                ..SensorEntry::new("Porch", 5, "motion")
            };
            assert!(matches!(
                config_error(registry.register(&source, &entry, no_forward)),
                ConfigError::InvalidPin { .. }
            ));
        }

        let entry = SensorEntry {
            pin: Some(json!(-1)),
            ..SensorEntry::new("Porch", 5, "motion")
        };
        assert_eq!(
            registry
                .register(&source, &entry, no_forward)
                .unwrap_err()
                .to_string(),
            "Configuration error: Sensor \"Porch\" has an invalid pin (-1)."
        );

        // Pin names are trimmed.
        let entry = SensorEntry::new("Hallway", " GPIO5 ", "motion");
        let sensor = registry.register(&source, &entry, no_forward).unwrap();
        assert_eq!(sensor.get_pin(), 5);
        assert!(registry.get_owner(5).is_some());
    }

    #[test]
    fn test_duplicate_pin() {
        let source = MockSource::default();
        let mut registry = SensorRegistry::new();

        registry
            .register(&source, &SensorEntry::new("Cellar", 22, "leak"), no_forward)
            .unwrap();
        let entry = SensorEntry::new("Basement", "GPIO22", "leak");
        let result = registry.register(&source, &entry, no_forward);
        let error = config_error(result);
        assert!(matches!(error, ConfigError::DuplicatePin { .. }));
        assert_eq!(
            error.to_string(),
            "Pin 22 is already used by sensor \"Cellar\""
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_independent_failures() {
        let source = MockSource::default();
        let mut registry = SensorRegistry::new();
        let entries = [
            SensorEntry::new("Front door", 17, "contact"),
            // Pin 1 supports no pull-up.
            SensorEntry::new("Back door", 1, "contact"),
            SensorEntry::new("Hallway", 27, "motion"),
        ];

        let results: Vec<Result<Sensor, Error>> = entries
            .iter()
            .map(|entry| registry.register(&source, entry, no_forward))
            .collect();

        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(Error::HardwareError {
                source: IncompatibleMode { pin: 1, .. }
            })
        ));
        assert!(results[2].is_ok());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get_owner(1), None);

        // Both remaining sensors are monitored.
        source.set_value(17, true).unwrap();
        source.set_value(27, true).unwrap();
        assert!(results[0].as_ref().unwrap().get_state());
        assert!(results[2].as_ref().unwrap().get_state());
    }
}
