use std::time::Duration;

use log::debug;
use tokio::time::MissedTickBehavior;

use crate::errors::Error;
use crate::errors::HardwareError::NotConfigured;
use crate::io::{ChangeHandler, SignalSource, Subscription};
use crate::utils::task;

/// Watches a pin by polling: the pin is re-read every `interval` and `handler` is called only
/// when the level differs from the last forwarded one.
///
/// The first successful read is always forwarded: it reconciles any transition that happened
/// between the caller's own initial read and the start of the watch.
///
/// Any [`SignalSource`] can be watched this way. Polling stops once the pin is released.
///
/// # Errors
/// * `RuntimeError`: the polling task cannot be started outside the runtime.
pub fn watch(
    mut source: Box<dyn SignalSource>,
    pin: u16,
    interval: Duration,
    handler: ChangeHandler,
) -> Result<Subscription, Error> {
    let task = task::run(async move {
        let mut ticker = tokio::time::interval(interval);
        // A slow read must not cause a burst of reads afterward.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last: Option<bool> = None;
        loop {
            ticker.tick().await;
            match source.read(pin) {
                Ok(value) if last != Some(value) => {
                    last = Some(value);
                    handler(value);
                }
                Ok(_) => {}
                // The pin has been released: nothing left to watch.
                Err(Error::HardwareError {
                    source: NotConfigured { .. },
                }) => break,
                Err(err) => debug!("Pin {}: poll tick dropped - {}", pin, err),
            }
        }
        debug!("Pin {}: polling stopped", pin);
    })?;

    Ok(Subscription::new(pin, Some(task)))
}
