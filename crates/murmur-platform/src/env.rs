//! Environment variable lookup.
//!
//! Only config discovery reads the environment (`MURMUR_CONFIG`). Going
//! through [`Environment`] lets its tests supply variables from a map.

pub trait Environment: Send + Sync {
    /// Value of `name`, or `None` when unset or not valid unicode.
    fn get_var(&self, name: &str) -> Option<String>;
}

/// [`Environment`] backed by the process environment.
pub struct NativeEnvironment;

impl Environment for NativeEnvironment {
    fn get_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}
