//! Defines the GPIO-Sensors runtime macros.

#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

extern crate proc_macro;

use proc_macro::TokenStream;

mod helpers;
mod runtime_macro;

/// Macro definition for the GPIO-Sensors runtime.
///
/// This macro should be used once only in a project.
/// This macro requires `tokio` as a dependency.
///
/// _Runs the function inside a tokio runtime and waits for every task spawned through
/// `gpio_sensors::utils::task::run` (sensor monitoring loops, event callbacks) to be done
/// before returning._
///
/// # Example
/// ```ignore
/// #[gpio_sensors_macros::runtime]
/// async fn main() {
///     // whatever
/// }
/// ```
#[proc_macro_attribute]
pub fn runtime(_: TokenStream, item: TokenStream) -> TokenStream {
    runtime_macro::runtime_macro(item, false)
}

/// Same as `#[gpio_sensors_macros::runtime]` but for tests.
///
/// Tests are serialized since they all share the global task channel.
#[proc_macro_attribute]
pub fn test(_: TokenStream, item: TokenStream) -> TokenStream {
    runtime_macro::runtime_macro(item, true)
}
