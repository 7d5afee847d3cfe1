use std::fmt::{Display, Formatter};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::errors::Error;
use crate::sensors::{Characteristic, DomainValue, Forward, SensorKind};
use crate::utils::{EventHandler, EventManager};

/// Lists all events a [`Service`] can emit/listen.
pub enum ServiceEvent {
    /// Triggered when the characteristic value is set.
    OnChange,
}

/// Convert events to string to facilitate usage with [`EventManager`].
impl From<ServiceEvent> for String {
    fn from(value: ServiceEvent) -> Self {
        let event = match value {
            ServiceEvent::OnChange => "change",
        };
        event.into()
    }
}

/// Represents the accessory service of one sensor (`ContactSensor`, `MotionSensor`, ...) and its
/// single characteristic.
#[derive(Clone, Debug)]
pub struct Service {
    name: String,
    kind: SensorKind,
    /// The characteristic value: unset until the sensor forwards its first value.
    value: Arc<RwLock<Option<DomainValue>>>,
    events: EventManager,
}

impl Service {
    pub fn new<S: Into<String>>(name: S, kind: SensorKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: Arc::new(RwLock::new(None)),
            events: Default::default(),
        }
    }

    // ########################################
    // Getters and Setters

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_kind(&self) -> SensorKind {
        self.kind
    }

    pub fn get_service_type(&self) -> &'static str {
        self.kind.service_type()
    }

    pub fn get_characteristic(&self) -> Characteristic {
        self.kind.characteristic()
    }

    pub fn get_value(&self) -> Option<DomainValue> {
        *self.value.read()
    }

    /// Sets the characteristic value and emits [`ServiceEvent::OnChange`].
    pub fn set_characteristic(&self, value: DomainValue) {
        *self.value.write() = Some(value);
        self.events.emit(ServiceEvent::OnChange, value);
    }

    /// Returns the callback a [`crate::sensors::Sensor`] forwards its values to.
    pub fn forwarder(&self) -> Forward {
        let service = self.clone();
        Arc::new(move |value: DomainValue| service.set_characteristic(value))
    }

    // ########################################
    // Event related functions

    /// Registers a callback to be executed on a given event on the Service.
    ///
    /// Available events for a Service are:
    /// * `change`: Triggered when the characteristic is set. To use it, register through the
    ///   [`Self::on()`] method with [`ServiceEvent::OnChange`]: the callback receives the
    ///   [`DomainValue`].
    pub fn on<S, F, T, Fut>(&self, event: S, callback: F) -> EventHandler
    where
        S: Into<String>,
        T: 'static + Send + Sync + Clone,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<(), Error>> + Send + 'static,
    {
        self.events.on(event, callback)
    }
}

impl Display for Service {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let value = match self.get_value() {
            Some(value) => value.to_string(),
            None => String::from("unset"),
        };
        write!(
            f,
            "{} \"{}\" [{}={}]",
            self.get_service_type(),
            self.name,
            self.get_characteristic(),
            value
        )
    }
}
