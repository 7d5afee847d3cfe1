//! Demonstrates a door contact (reed switch) wired between GPIO17 and ground, watched through
//! kernel edge events. The pull-up must be enabled on the board (`gpio=17=ip,pu`).

use std::sync::Arc;

use gpio_sensors::io::{CdevSource, Detection};
use gpio_sensors::sensors::{DomainValue, Sensor, SensorKind};

#[gpio_sensors::runtime]
async fn main() {
    let source = CdevSource::new("/dev/gpiochip0", "contact-example", Detection::Edge)
        .unwrap()
        .with_external_bias(true);

    // Register a contact sensor on pin 17.
    let sensor = Sensor::new(
        &source,
        "Front door",
        17,
        SensorKind::Contact,
        Arc::new(|value: DomainValue| println!("Front door: {}", value)),
    )
    .unwrap();

    // Show the state read at startup.
    sensor.emit_initial_state();
}
