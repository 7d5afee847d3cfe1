//! Mocked entities for tests (enabled by the `mocks` feature).

mod signal_source;

pub use signal_source::*;
