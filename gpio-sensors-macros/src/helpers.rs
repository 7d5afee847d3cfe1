extern crate proc_macro;

use proc_macro2::TokenStream;
use quote::quote;

/// Determines what crate name should be used to refer to `gpio_sensors`.
/// crate::... or gpio_sensors::... depending.
pub fn gpio_sensors_crate_path() -> TokenStream {
    let is_internal = std::env::var("CARGO_CRATE_NAME")
        .map(|pkg_name| pkg_name == "gpio_sensors")
        .unwrap_or_default();

    #[cfg(doctest)]
    let is_internal = false;

    match is_internal {
        true => quote!(crate),
        false => quote!(gpio_sensors),
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    // All three cases live in one test: they mutate the same process-wide variable.
    #[test]
    fn test_gpio_sensors_crate_path() {
        env::set_var("CARGO_CRATE_NAME", "gpio_sensors");
        assert_eq!(gpio_sensors_crate_path().to_string(), "crate");

        env::set_var("CARGO_CRATE_NAME", "gpio_sensors_bridge");
        assert_eq!(gpio_sensors_crate_path().to_string(), "gpio_sensors");

        env::remove_var("CARGO_CRATE_NAME");
        assert_eq!(gpio_sensors_crate_path().to_string(), "gpio_sensors");
    }
}
