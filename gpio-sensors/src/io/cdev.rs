//! Linux GPIO character device driver (`/dev/gpiochipN`).

use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use gpio_cdev::{AsyncLineEventHandle, Chip, EventRequestFlags, LineHandle, LineRequestFlags};
use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::errors::HardwareError::{
    IncompatibleMode, IoException, NotConfigured, PinInUse, UnknownPin,
};
use crate::errors::{Error, TransientReadError};
use crate::io::{poll, ChangeHandler, Detection, PinIdOrName, PinMode, SignalSource, Subscription};
use crate::utils::task;

/// A claimed line.
enum Claim {
    /// Configured input line, read on demand.
    Input(LineHandle),
    /// Line handed over to an edge watch: holds the last level the watch has read.
    Watched(Arc<AtomicBool>),
}

/// [`SignalSource`] backed by the Linux GPIO character device, through `gpio-cdev`.
///
/// Pins are line offsets of the chip (or line names such as "GPIO17" when the device tree
/// names them).
///
/// The v1 character device interface has no bias request: [`PinMode::PullUp`] and
/// [`PinMode::PullDown`] are refused, unless the source is told the bias is provided by the
/// board configuration (`gpio=17=ip,pu` on a Raspberry Pi) or an external resistor with
/// [`CdevSource::with_external_bias()`].
#[derive(Clone)]
pub struct CdevSource {
    path: String,
    consumer: String,
    detection: Detection,
    external_bias: bool,
    chip: Arc<Mutex<Chip>>,
    lines: Arc<Mutex<HashMap<u16, Claim>>>,
}

impl CdevSource {
    /// Opens the GPIO chip at `path` (`/dev/gpiochip0` for instance).
    ///
    /// # Parameters
    /// * `path`: the chip device path
    /// * `consumer`: the label shown by the kernel for the claimed lines
    /// * `detection`: the change detection strategy
    ///
    /// # Errors
    /// * `IoException`: the chip cannot be opened.
    pub fn new<S: Into<String>>(path: S, consumer: S, detection: Detection) -> Result<Self, Error> {
        let path = path.into();
        let chip = Chip::new(&path).map_err(driver_error)?;
        debug!(
            "GPIO chip {} opened: {} ({} lines)",
            path,
            chip.label(),
            chip.num_lines()
        );
        Ok(Self {
            path,
            consumer: consumer.into(),
            detection,
            external_bias: false,
            chip: Arc::new(Mutex::new(chip)),
            lines: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Declares that the pull-up / pull-down resistors are provided outside the driver, so that
    /// biased input modes can be claimed as plain inputs.
    pub fn with_external_bias(mut self, external_bias: bool) -> Self {
        self.external_bias = external_bias;
        self
    }

    /// Watches a line through kernel edge events: the line is re-read after every event and
    /// the level is forwarded unconditionally.
    fn watch_edges(&mut self, pin: u16, handler: ChangeHandler) -> Result<Subscription, Error> {
        // The input request has to be given back before requesting events on the same line.
        let claim = self.lines.lock().remove(&pin);
        match claim {
            Some(Claim::Input(handle)) => drop(handle),
            Some(claim @ Claim::Watched(_)) => {
                self.lines.lock().insert(pin, claim);
                return Err(PinInUse { pin }.into());
            }
            None => return Err(NotConfigured { pin }.into()),
        }

        let events = self
            .chip
            .lock()
            .get_line(u32::from(pin))
            .and_then(|line| {
                line.events(
                    LineRequestFlags::INPUT,
                    EventRequestFlags::BOTH_EDGES,
                    &self.consumer,
                )
            })
            .map_err(driver_error)?;
        let level = Arc::new(AtomicBool::new(
            events.get_value().map_err(driver_error)? != 0,
        ));
        self.lines.lock().insert(pin, Claim::Watched(level.clone()));

        let task = task::run(async move {
            let mut events = AsyncLineEventHandle::new(events).map_err(driver_error)?;

            // Reconciles a transition that happened before the events were requested.
            handler(level.load(Ordering::SeqCst));

            while let Some(event) = events.next().await {
                if let Err(err) = event {
                    debug!("Pin {}: edge event dropped - {}", pin, err);
                    continue;
                }
                match events.as_ref().get_value() {
                    Ok(value) => {
                        trace!("Pin {}: edge, level {}", pin, value);
                        level.store(value != 0, Ordering::SeqCst);
                        handler(value != 0);
                    }
                    Err(err) => debug!("Pin {}: edge read dropped - {}", pin, err),
                }
            }
            warn!("Pin {}: edge event stream closed", pin);
            Ok(())
        })?;

        Ok(Subscription::new(pin, Some(task)))
    }
}

impl Debug for CdevSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut claimed: Vec<u16> = self.lines.lock().keys().copied().collect();
        claimed.sort_unstable();
        f.debug_struct("CdevSource")
            .field("path", &self.path)
            .field("consumer", &self.consumer)
            .field("detection", &self.detection)
            .field("external_bias", &self.external_bias)
            .field("claimed", &claimed)
            .finish()
    }
}

impl Display for CdevSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [chip={}, detection={}]",
            self.get_source_name(),
            self.path,
            self.detection
        )
    }
}

impl SignalSource for CdevSource {
    fn get_detection(&self) -> Detection {
        self.detection
    }

    fn resolve_pin(&self, pin: &PinIdOrName) -> Result<u16, Error> {
        let chip = self.chip.lock();
        let unknown = || Error::from(UnknownPin { pin: pin.to_string() });
        match pin {
            PinIdOrName::Id(id) => match u32::from(*id) < chip.num_lines() {
                true => Ok(*id),
                false => Err(unknown()),
            },
            PinIdOrName::Name(name) => chip
                .lines()
                .find(|line| {
                    line.info()
                        .map(|info| info.name() == Some(name.as_str()))
                        .unwrap_or(false)
                })
                .and_then(|line| u16::try_from(line.offset()).ok())
                .ok_or_else(unknown),
        }
    }

    fn configure(&mut self, pin: u16, mode: PinMode) -> Result<(), Error> {
        let mut lines = self.lines.lock();
        if lines.contains_key(&pin) {
            return Err(PinInUse { pin }.into());
        }
        check_bias(pin, mode, self.external_bias)?;

        let handle = self
            .chip
            .lock()
            .get_line(u32::from(pin))
            .and_then(|line| line.request(LineRequestFlags::INPUT, 0, &self.consumer))
            .map_err(driver_error)?;
        lines.insert(pin, Claim::Input(handle));
        Ok(())
    }

    fn read(&mut self, pin: u16) -> Result<bool, Error> {
        match self.lines.lock().get(&pin) {
            Some(Claim::Input(handle)) => handle
                .get_value()
                .map(|value| value != 0)
                .map_err(|err| TransientReadError {
                    pin,
                    info: err.to_string(),
                }),
            Some(Claim::Watched(level)) => Ok(level.load(Ordering::SeqCst)),
            None => Err(NotConfigured { pin }.into()),
        }
    }

    fn subscribe(&mut self, pin: u16, handler: ChangeHandler) -> Result<Subscription, Error> {
        match self.detection {
            Detection::Edge => self.watch_edges(pin, handler),
            Detection::Poll(interval) => poll::watch(Box::new(self.clone()), pin, interval, handler),
        }
    }

    fn release(&mut self, pin: u16) -> Result<(), Error> {
        // Dropping the handle gives the line back to the kernel.
        self.lines.lock().remove(&pin);
        Ok(())
    }
}

/// Biased modes cannot be requested from the driver: they are accepted only when provided
/// externally.
fn check_bias(pin: u16, mode: PinMode, external_bias: bool) -> Result<(), Error> {
    match mode {
        PinMode::Input => Ok(()),
        _ if external_bias => {
            debug!("Pin {}: {} bias provided externally", pin, mode);
            Ok(())
        }
        _ => Err(IncompatibleMode {
            pin,
            mode,
            context: "bias not supported by the character device",
        }
        .into()),
    }
}

fn driver_error(error: gpio_cdev::Error) -> Error {
    IoException {
        info: error.to_string(),
    }
    .into()
}
