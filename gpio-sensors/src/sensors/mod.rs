//! Defines the binary sensors: one state engine shared by every [`SensorKind`].

mod kind;
mod registry;
mod sensor;

pub use kind::{Characteristic, DomainValue, SensorKind};
pub use registry::SensorRegistry;
pub use sensor::{Forward, Sensor};
