use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use log::{debug, info, trace, warn};
use parking_lot::{Mutex, RwLock};

use crate::errors::ConfigError::{MissingName, MissingPin};
use crate::errors::Error;
use crate::io::{ChangeHandler, PinIdOrName, PinMode, SignalSource, Subscription};
use crate::sensors::{DomainValue, SensorKind};

/// Callback receiving the domain values of a sensor (the accessory side of a [`Sensor`]).
pub type Forward = Arc<dyn Fn(DomainValue) + Send + Sync>;

/// Represents one binary sensor wired to a GPIO input pin.
///
/// The sensor caches the last known pin level and forwards the kind-mapped [`DomainValue`]
/// each time that level actually changes. Clones share the same state and watch.
#[derive(Clone)]
pub struct Sensor {
    // ########################################
    // # Basics
    name: String,
    /// The resolved pin (id) of the [`SignalSource`].
    pin: u16,
    kind: SensorKind,
    /// The last known raw level.
    state: Arc<RwLock<bool>>,

    // ########################################
    // # Volatile utility data.
    /// Held across compare-update-forward: forwarded values keep the order of the changes.
    /// Flags whether the initial state has been emitted.
    notifying: Arc<Mutex<bool>>,
    source: Box<dyn SignalSource>,
    forward: Forward,
    subscription: Arc<Mutex<Option<Subscription>>>,
}

impl Sensor {
    /// Creates a sensor on the given pin: the pin is configured as a pull-up input, read once to
    /// establish the initial state, then watched for changes.
    ///
    /// # Parameters
    /// * `source`: the [`SignalSource`] the pin belongs to
    /// * `name`: the sensor name (non-empty)
    /// * `pin`: the input pin id or name
    /// * `kind`: the [`SensorKind`] defining how the raw level is mapped
    /// * `forward`: the callback receiving the mapped values
    ///
    /// # Errors
    /// * `MissingName` / `MissingPin`: the name or the pin name is empty.
    /// * `UnknownPin`: the pin does not exist on the source.
    /// * `IncompatibleMode`: the pin does not support pull-up input.
    /// * `PinInUse`: the pin is already claimed.
    /// * `TransientReadError`: the initial read failed.
    ///
    /// On error, the pin is left unclaimed.
    pub fn new<T: Into<PinIdOrName>>(
        source: &(dyn SignalSource + 'static),
        name: &str,
        pin: T,
        kind: SensorKind,
        forward: Forward,
    ) -> Result<Self, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MissingName.into());
        }
        let pin = pin.into();
        if matches!(&pin, PinIdOrName::Name(pin_name) if pin_name.trim().is_empty()) {
            return Err(MissingPin {
                name: name.to_string(),
            }
            .into());
        }

        let mut source = dyn_clone::clone_box(source);
        let pin = source.resolve_pin(&pin)?;
        source.configure(pin, PinMode::PullUp)?;

        let sensor = Self {
            name: name.to_string(),
            pin,
            kind,
            state: Arc::new(RwLock::new(false)),
            notifying: Arc::new(Mutex::new(false)),
            source,
            forward,
            subscription: Arc::new(Mutex::new(None)),
        };

        if let Err(err) = sensor.start() {
            if let Err(release_err) = sensor.source.clone().release(pin) {
                warn!("{}: Pin {} not released - {}", sensor.tag(), pin, release_err);
            }
            return Err(err);
        }
        Ok(sensor)
    }

    /// Reads the initial state, then watches the pin.
    fn start(&self) -> Result<(), Error> {
        *self.state.write() = self.source.clone().read(self.pin)?;
        info!("{}: Pin {}", self.tag(), self.pin);
        self.attach()
    }

    // ########################################
    // Getters and Setters

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_pin(&self) -> u16 {
        self.pin
    }

    pub fn get_kind(&self) -> SensorKind {
        self.kind
    }

    /// Returns the cached raw level (the hardware is not read).
    pub fn get_state(&self) -> bool {
        *self.state.read()
    }

    // ########################################
    // Event related functions

    /// Handles a raw level notified by the source: the state is updated and the mapped value is
    /// forwarded only if the level differs from the current state.
    pub fn on_raw_change(&self, value: bool) {
        let _lock = self.notifying.lock();
        let old = *self.state.read();
        if old == value {
            trace!("{}: State unchanged ({})", self.tag(), value);
            return;
        }
        *self.state.write() = value;
        info!("{}: State changed from {} to {}", self.tag(), old, value);
        (self.forward)(self.kind.map(value));
    }

    /// Forwards the mapped current state without any hardware change, so that a freshly
    /// registered consumer sees the right value. Only the first call forwards.
    ///
    /// # Return
    /// Returns `true` if the state has been forwarded.
    pub fn emit_initial_state(&self) -> bool {
        let mut emitted = self.notifying.lock();
        if *emitted {
            debug!("{}: Initial state already emitted", self.tag());
            return false;
        }
        *emitted = true;
        (self.forward)(self.kind.map(*self.state.read()));
        true
    }

    /// Manually attaches the sensor to the pin changes.
    /// This should never be needed unless you manually `detach()` the sensor first.
    ///
    /// # Errors
    /// * `NotConfigured`: the pin has been released.
    pub fn attach(&self) -> Result<(), Error> {
        let mut subscription = self.subscription.lock();
        if subscription.is_none() {
            let sensor = self.clone();
            let handler: ChangeHandler = Arc::new(move |value: bool| sensor.on_raw_change(value));
            *subscription = Some(self.source.clone().subscribe(self.pin, handler)?);
        }
        Ok(())
    }

    /// Stops watching the pin and releases it.
    pub fn detach(&self) -> Result<(), Error> {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.cancel();
        }
        debug!("{}: Detached", self.tag());
        self.source.clone().release(self.pin)
    }

    /// Log prefix: `ContactSensor "Front door"`.
    fn tag(&self) -> String {
        format!("{} \"{}\"", self.kind, self.name)
    }
}

impl Display for Sensor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (pin={}) [state={}]",
            self.tag(),
            self.pin,
            self.state.read(),
        )
    }
}

impl Debug for Sensor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sensor")
            .field("name", &self.name)
            .field("pin", &self.pin)
            .field("kind", &self.kind)
            .field("state", &*self.state.read())
            .field("source", &self.source)
            .finish()
    }
}
