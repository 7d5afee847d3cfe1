use std::any::type_name;
use std::fmt::{Debug, Display};
use std::sync::Arc;

use dyn_clone::DynClone;

use crate::errors::Error;
use crate::io::{Detection, PinIdOrName, PinMode};
use crate::utils::task::TaskHandler;

// Makes a Box<dyn SignalSource> clone (each sensor keeps its own handle to the source).
dyn_clone::clone_trait_object!(SignalSource);

/// Callback invoked by a [`SignalSource`] with the freshly read level of a watched pin.
pub type ChangeHandler = Arc<dyn Fn(bool) + Send + Sync>;

/// Defines the trait all GPIO drivers must implement.
///
/// Clones of a source share the same underlying driver: a pin claimed through one clone is
/// claimed for all of them.
pub trait SignalSource: DynClone + Send + Sync + Debug + Display {
    /// Returns the source name (used for Display only)
    fn get_source_name(&self) -> &'static str {
        type_name::<Self>().split("::").last().unwrap_or("SignalSource")
    }

    /// Returns the change detection strategy used by [`Self::subscribe()`].
    fn get_detection(&self) -> Detection;

    /// Resolves a pin id or name to the pin id used by all other methods.
    ///
    /// # Errors
    /// * `UnknownPin`: the pin does not exist on this hardware.
    fn resolve_pin(&self, pin: &PinIdOrName) -> Result<u16, Error>;

    /// Claims the `pin` and configures it as an input in the given `mode`.
    ///
    /// # Errors
    /// * `PinInUse`: the pin is already claimed.
    /// * `IncompatibleMode`: the pin does not support the mode.
    fn configure(&mut self, pin: u16, mode: PinMode) -> Result<(), Error>;

    /// Reads the current logical level of a configured `pin`.
    ///
    /// # Errors
    /// * `TransientReadError`: the read failed but may succeed later.
    /// * `NotConfigured`: the pin has not been claimed through [`Self::configure()`].
    fn read(&mut self, pin: u16) -> Result<bool, Error>;

    /// Starts watching a configured `pin`: `handler` is called with the pin level following the
    /// source [`Detection`] strategy, in the order transitions happen.
    ///
    /// Failing reads while watching are dropped: the handler is not called for them.
    fn subscribe(&mut self, pin: u16, handler: ChangeHandler) -> Result<Subscription, Error>;

    /// Releases a pin claimed by [`Self::configure()`] (no-op if the pin is not claimed).
    fn release(&mut self, pin: u16) -> Result<(), Error>;
}

/// Represents the watch of a pin started by [`SignalSource::subscribe()`].
#[derive(Debug)]
pub struct Subscription {
    pin: u16,
    /// The monitoring task, if the source needs one.
    task: Option<TaskHandler>,
}

impl Subscription {
    pub fn new(pin: u16, task: Option<TaskHandler>) -> Self {
        Self { pin, task }
    }

    pub fn get_pin(&self) -> u16 {
        self.pin
    }

    /// Checks if the monitoring task (if any) is still running.
    pub fn is_active(&self) -> bool {
        match &self.task {
            Some(task) => !task.is_finished(),
            None => true,
        }
    }

    /// Stops watching the pin.
    pub fn cancel(self) {
        if let Some(task) = self.task {
            task.abort();
        }
    }
}
