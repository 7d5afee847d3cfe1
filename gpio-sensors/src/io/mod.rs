//! Defines the signal sources: the GPIO drivers sensors read their raw level from.

#[cfg(target_os = "linux")]
mod cdev;
mod poll;
mod source;

#[cfg(target_os = "linux")]
pub use cdev::CdevSource;
pub use poll::watch;
pub use source::*;

use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Lists the modes an input pin can be configured with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PinMode {
    /// Floating input.
    Input,
    /// Input biased to HIGH when not driven.
    PullUp,
    /// Input biased to LOW when not driven.
    PullDown,
}

impl Display for PinMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mode = match self {
            PinMode::Input => "INPUT",
            PinMode::PullUp => "PULLUP",
            PinMode::PullDown => "PULLDOWN",
        };
        write!(f, "{}", mode)
    }
}

/// Defines the strategy a [`SignalSource`] uses to detect pin changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Detection {
    /// Hardware edge notification: the pin is re-read on every edge and the value is always
    /// forwarded.
    Edge,
    /// Periodic re-read: the value is forwarded only when it differs from the last forwarded one.
    Poll(Duration),
}

impl Display for Detection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Detection::Edge => write!(f, "edge"),
            Detection::Poll(interval) => write!(f, "poll ({}ms)", interval.as_millis()),
        }
    }
}

// ########################################

/// Defines a structure to receive either an id or a name for a pin: 17 or "GPIO17" for instance.
#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PinIdOrName {
    Id(u16),
    Name(String),
}

impl From<u16> for PinIdOrName {
    fn from(n: u16) -> Self {
        PinIdOrName::Id(n)
    }
}

impl From<&str> for PinIdOrName {
    fn from(s: &str) -> Self {
        PinIdOrName::Name(s.to_string())
    }
}

impl From<String> for PinIdOrName {
    fn from(s: String) -> Self {
        PinIdOrName::Name(s)
    }
}

impl From<PinIdOrName> for serde_json::Value {
    fn from(pin: PinIdOrName) -> Self {
        match pin {
            PinIdOrName::Id(n) => serde_json::Value::from(n),
            PinIdOrName::Name(s) => serde_json::Value::from(s),
        }
    }
}

impl Display for PinIdOrName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PinIdOrName::Id(n) => write!(f, "{}", n),
            PinIdOrName::Name(s) => write!(f, "{:?}", s),
        }
    }
}
