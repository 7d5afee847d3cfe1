use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use log::info;

use gpio_sensors::accessory::{GpioSensors, ServiceEvent};
use gpio_sensors::config::Config;
use gpio_sensors::errors::Error;
use gpio_sensors::io::SignalSource;
use gpio_sensors::sensors::DomainValue;
use gpio_sensors::utils::task;

/// Bridges GPIO input pins to home-automation sensor states.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(short, long, env = "GPIO_SENSORS_CONFIG", default_value = "config.json")]
    config: PathBuf,
}

#[gpio_sensors::runtime]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let config = Config::from_file(&args.config)?;
    let source = open_source(&config)?;
    info!("Signal source: {}", source);

    let accessory = GpioSensors::new(&config, source.as_ref());
    info!("{}", accessory);

    for service in accessory.get_services() {
        let label = format!("{} \"{}\"", service.get_service_type(), service.get_name());
        let characteristic = service.get_characteristic();
        service.on(ServiceEvent::OnChange, move |value: DomainValue| {
            let label = label.clone();
            async move {
                info!(
                    "{}: {} = {} ({})",
                    label,
                    characteristic,
                    value.hap_value(),
                    value
                );
                Ok(())
            }
        });
    }
    accessory.emit_initial_states();

    task::run(async move {
        tokio::signal::ctrl_c().await?;
        info!("Shutting down");
        accessory.detach();
        Ok::<(), Error>(())
    })?;

    Ok(())
}

#[cfg(target_os = "linux")]
fn open_source(config: &Config) -> Result<Box<dyn SignalSource>, Error> {
    let source = gpio_sensors::io::CdevSource::new(
        config.gpio.chip.as_str(),
        "gpio-sensors",
        config.gpio.detection(),
    )?
    .with_external_bias(config.gpio.external_bias);
    Ok(Box::new(source))
}

#[cfg(not(target_os = "linux"))]
fn open_source(_: &Config) -> Result<Box<dyn SignalSource>, Error> {
    Err(gpio_sensors::errors::HardwareError::IoException {
        info: String::from("GPIO character devices are only available on Linux"),
    }
    .into())
}
