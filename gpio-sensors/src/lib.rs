//! <h1 align="center">GPIO-SENSORS - Binary GPIO sensors for home automation</h1>
//!
//! # Features
//!
//! **GPIO-Sensors** turns discrete GPIO input signals (door contacts, PIR motion detectors, leak
//! probes, smoke or gas alarms with a dry contact output, etc.) into detected / not-detected
//! accessory states.
//!
//! - Read pins through a [`SignalSource`](io::SignalSource): the Linux GPIO character device
//!   ([`CdevSource`](io::CdevSource)), by edge events or by polling
//! - Seven [`SensorKind`](sensors::SensorKind)s sharing one [`Sensor`](sensors::Sensor) state
//!   engine: a value is forwarded only when the pin level actually changes
//! - Expose each sensor as an accessory [`Service`](accessory::Service) and listen to its changes
//!
//! # Getting Started
//!
//! Declare the sensors in a `config.json` file:
//! ```json
//! {
//!   "gpio": { "chip": "/dev/gpiochip0", "detection": "edge", "external_bias": true },
//!   "sensors": [
//!     { "name": "Front door", "pin": 17, "type": "contact" },
//!     { "name": "Hallway", "pin": 27, "type": "motion" }
//!   ]
//! }
//! ```
//!
//! Then run the `gpio-sensors-bridge` binary, or build the accessory yourself:
//! ```ignore
//! use gpio_sensors::accessory::{GpioSensors, ServiceEvent};
//! use gpio_sensors::config::Config;
//! use gpio_sensors::io::CdevSource;
//! use gpio_sensors::sensors::DomainValue;
//!
//! #[gpio_sensors::runtime]
//! async fn main() {
//!     let config = Config::from_file("config.json").unwrap();
//!     let source = CdevSource::new("/dev/gpiochip0", "my-app", config.gpio.detection())
//!         .unwrap()
//!         .with_external_bias(config.gpio.external_bias);
//!     let accessory = GpioSensors::new(&config, &source);
//!
//!     for service in accessory.get_services() {
//!         service.on(ServiceEvent::OnChange, |value: DomainValue| async move {
//!             println!("Sensor value: {}", value);
//!             Ok(())
//!         });
//!     }
//!     accessory.emit_initial_states();
//! }
//! ```
//!
//! # Feature flags
//!
//! - **mocks** -- Provides a mocked [`SignalSource`](io::SignalSource) (useful for tests mostly).

#[cfg(test)]
extern crate self as gpio_sensors;

pub mod accessory;
pub mod config;
pub mod errors;
pub mod io;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod sensors;
pub mod utils;

pub use gpio_sensors_macros::runtime;
