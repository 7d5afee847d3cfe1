//! Demonstrates several sensors built from a configuration, polled every 50ms, with their
//! accessory services logged on change. Stops on Ctrl-C.

use gpio_sensors::accessory::{GpioSensors, ServiceEvent};
use gpio_sensors::config::Config;
use gpio_sensors::io::CdevSource;
use gpio_sensors::sensors::DomainValue;
use gpio_sensors::utils::task;

#[gpio_sensors::runtime]
async fn main() {
    let config = Config::from_json(
        r#"{
            "gpio": { "detection": "poll", "poll_interval": 50, "external_bias": true },
            "sensors": {
                "door": { "name": "Front door", "pin": 17, "type": "contact" },
                "pir": { "name": "Hallway", "pin": 27, "type": "motion" },
                "water": { "name": "Cellar", "pin": 22, "type": "leak" }
            }
        }"#,
    )
    .unwrap();

    let source = CdevSource::new(
        config.gpio.chip.as_str(),
        "polling-example",
        config.gpio.detection(),
    )
    .unwrap()
    .with_external_bias(config.gpio.external_bias);
    let accessory = GpioSensors::new(&config, &source);

    for service in accessory.get_services() {
        let name = service.get_name().to_string();
        service.on(ServiceEvent::OnChange, move |value: DomainValue| {
            let name = name.clone();
            async move {
                println!("{}: {}", name, value);
                Ok(())
            }
        });
    }
    accessory.emit_initial_states();

    task::run(async move {
        let _ = tokio::signal::ctrl_c().await;
        accessory.detach();
    })
    .unwrap();
}
