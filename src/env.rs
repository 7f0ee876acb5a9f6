//! Environment variable access.
//!
//! The resolver never calls `std::env` directly. It goes through [`GetEnv`], so
//! tests and embedders can hand it a plain map instead of the process
//! environment.

use std::collections::HashMap;
use std::hash::BuildHasher;

/// Read-only access to a set of environment variables.
pub trait GetEnv {
    /// Get a variable, or `None` if it is not set.
    fn get(&self, key: &str) -> Option<String>;

    /// Get a variable, returning an empty string when it is not set.
    fn read(&self, key: &str) -> String {
        self.get(key).unwrap_or_default()
    }
}

/// The environment of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    pub fn new() -> Self {
        Self
    }
}

impl GetEnv for SystemEnv {
    /// Non-UTF-8 values are converted lossily.
    fn get(&self, key: &str) -> Option<String> {
        std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
    }
}

impl<S: BuildHasher> GetEnv for HashMap<String, String, S> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl<T: GetEnv + ?Sized> GetEnv for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}
