use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::errors::HardwareError::{
    IncompatibleMode, IoException, NotConfigured, PinInUse, UnknownPin,
};
use crate::errors::{Error, TransientReadError};
use crate::io::{watch, ChangeHandler, Detection, PinIdOrName, PinMode, SignalSource, Subscription};

/// An in-memory GPIO pin.
#[derive(Clone, Debug)]
pub struct MockPin {
    pub id: u16,
    pub name: String,
    /// The level the next read returns.
    pub value: bool,
    pub mode: Option<PinMode>,
    pub supported_modes: Vec<PinMode>,
    pub claimed: bool,
    /// Number of upcoming reads that fail with a `TransientReadError`.
    pub failing_reads: usize,
    /// Number of reads done so far (failing ones included).
    pub reads: usize,
    /// The next release fails with an `IoException`.
    pub failing_release: bool,
}

/// Creates the pins GPIO0 to GPIO27, all LOW.
/// GPIO0 and GPIO1 (ID EEPROM pins) support floating input only.
pub fn create_test_pins() -> HashMap<u16, MockPin> {
    (0..28)
        .map(|id| {
            let supported_modes = match id {
                0 | 1 => vec![PinMode::Input],
                _ => vec![PinMode::Input, PinMode::PullUp, PinMode::PullDown],
            };
            let pin = MockPin {
                id,
                name: format!("GPIO{}", id),
                value: false,
                mode: None,
                supported_modes,
                claimed: false,
                failing_reads: 0,
                reads: 0,
                failing_release: false,
            };
            (id, pin)
        })
        .collect()
}

/// Mock implement for [`SignalSource`].
/// Uses [`create_test_pins`] for the hardware.
///
/// With [`Detection::Edge`], every [`MockSource::set_value()`] call is notified as an edge to the
/// subscribed handler (even when the level did not change, like a bouncing contact would).
/// With [`Detection::Poll`], pins are watched by the generic polling loop.
#[derive(Clone)]
pub struct MockSource {
    detection: Detection,
    pins: Arc<RwLock<HashMap<u16, MockPin>>>,
    /// Edge dispatch table: one handler per watched pin.
    handlers: Arc<RwLock<HashMap<u16, ChangeHandler>>>,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new(Detection::Edge)
    }
}

impl MockSource {
    pub fn new(detection: Detection) -> Self {
        Self {
            detection,
            pins: Arc::new(RwLock::new(create_test_pins())),
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Sets the pin level, then notifies the edge handler (if any) with a fresh read.
    pub fn set_value(&self, pin: u16, value: bool) -> Result<(), Error> {
        self.pins
            .write()
            .get_mut(&pin)
            .ok_or(UnknownPin {
                pin: pin.to_string(),
            })?
            .value = value;

        if self.detection != Detection::Edge {
            return Ok(());
        }
        // The handler runs outside any lock: it may read the source again.
        let handler = self.handlers.read().get(&pin).cloned();
        if let Some(handler) = handler {
            if let Ok(level) = self.clone().read(pin) {
                handler(level);
            }
        }
        Ok(())
    }

    /// Makes the `count` next reads of the pin fail.
    pub fn fail_next_reads(&self, pin: u16, count: usize) {
        if let Some(pin) = self.pins.write().get_mut(&pin) {
            pin.failing_reads = count;
        }
    }

    /// Makes the next release of the pin fail (the pin stays claimed).
    pub fn fail_next_release(&self, pin: u16) {
        if let Some(pin) = self.pins.write().get_mut(&pin) {
            pin.failing_release = true;
        }
    }

    pub fn get_pin(&self, pin: u16) -> Option<MockPin> {
        self.pins.read().get(&pin).cloned()
    }

    pub fn is_claimed(&self, pin: u16) -> bool {
        self.pins.read().get(&pin).is_some_and(|pin| pin.claimed)
    }

    /// Checks if an edge handler is registered for the pin.
    pub fn is_watched(&self, pin: u16) -> bool {
        self.handlers.read().contains_key(&pin)
    }
}

impl Debug for MockSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut watched: Vec<u16> = self.handlers.read().keys().copied().collect();
        watched.sort_unstable();
        f.debug_struct("MockSource")
            .field("detection", &self.detection)
            .field("pins", &self.pins.read().len())
            .field("watched", &watched)
            .finish()
    }
}

impl Display for MockSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [pins={}, detection={}]",
            self.get_source_name(),
            self.pins.read().len(),
            self.detection
        )
    }
}

impl SignalSource for MockSource {
    fn get_detection(&self) -> Detection {
        self.detection
    }

    fn resolve_pin(&self, pin: &PinIdOrName) -> Result<u16, Error> {
        let pins = self.pins.read();
        let found = match pin {
            PinIdOrName::Id(id) => pins.get(id),
            PinIdOrName::Name(name) => pins.values().find(|candidate| &candidate.name == name),
        };
        match found {
            Some(found) => Ok(found.id),
            None => Err(UnknownPin {
                pin: pin.to_string(),
            }
            .into()),
        }
    }

    fn configure(&mut self, pin: u16, mode: PinMode) -> Result<(), Error> {
        let mut lock = self.pins.write();
        let pin_instance = lock.get_mut(&pin).ok_or(UnknownPin {
            pin: pin.to_string(),
        })?;
        if pin_instance.claimed {
            return Err(PinInUse { pin }.into());
        }
        if !pin_instance.supported_modes.contains(&mode) {
            return Err(IncompatibleMode {
                pin,
                mode,
                context: "try to configure input pin",
            }
            .into());
        }
        pin_instance.mode = Some(mode);
        pin_instance.claimed = true;
        Ok(())
    }

    fn read(&mut self, pin: u16) -> Result<bool, Error> {
        let mut lock = self.pins.write();
        let pin_instance = lock.get_mut(&pin).ok_or(UnknownPin {
            pin: pin.to_string(),
        })?;
        if !pin_instance.claimed {
            return Err(NotConfigured { pin }.into());
        }
        pin_instance.reads += 1;
        if pin_instance.failing_reads > 0 {
            pin_instance.failing_reads -= 1;
            return Err(TransientReadError {
                pin,
                info: String::from("simulated read failure"),
            });
        }
        Ok(pin_instance.value)
    }

    fn subscribe(&mut self, pin: u16, handler: ChangeHandler) -> Result<Subscription, Error> {
        if !self.is_claimed(pin) {
            return Err(NotConfigured { pin }.into());
        }
        match self.detection {
            Detection::Edge => {
                let mut handlers = self.handlers.write();
                if handlers.contains_key(&pin) {
                    return Err(PinInUse { pin }.into());
                }
                handlers.insert(pin, handler);
                Ok(Subscription::new(pin, None))
            }
            Detection::Poll(interval) => watch(Box::new(self.clone()), pin, interval, handler),
        }
    }

    fn release(&mut self, pin: u16) -> Result<(), Error> {
        self.handlers.write().remove(&pin);
        if let Some(pin_instance) = self.pins.write().get_mut(&pin) {
            if pin_instance.failing_release {
                pin_instance.failing_release = false;
                return Err(IoException {
                    info: String::from("simulated release failure"),
                }
                .into());
            }
            pin_instance.claimed = false;
            pin_instance.mode = None;
        }
        Ok(())
    }
}
