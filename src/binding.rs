//! Flag to environment variable bindings.

use crate::env::GetEnv;
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// One flag that may be overridden by an environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    flag_name: String,
    /// Full variable name, already in the case it is looked up with.
    env_name: String,
}

impl Binding {
    pub fn new(flag_name: impl Into<String>, env_name: impl Into<String>) -> Self {
        Self {
            flag_name: flag_name.into(),
            env_name: env_name.into(),
        }
    }

    pub fn flag_name(&self) -> &str {
        &self.flag_name
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    /// Read the bound variable, empty if it is not set.
    pub fn read(&self, env: &impl GetEnv) -> String {
        env.read(&self.env_name)
    }
}

/// Bindings keyed by flag name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    bindings: HashMap<String, Binding>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `flag_name` to `env_name`, replacing and returning any earlier binding.
    pub fn register(
        &mut self,
        flag_name: impl Into<String>,
        env_name: impl Into<String>,
    ) -> Option<Binding> {
        let binding = Binding::new(flag_name, env_name);
        let previous = self.bindings.insert(binding.flag_name.clone(), binding);
        if let Some(ref previous) = previous {
            warn!(
                flag = %previous.flag_name,
                replaced = %previous.env_name,
                "Environment binding replaced"
            );
        }
        previous
    }

    pub fn binding(&self, flag_name: &str) -> Option<&Binding> {
        self.bindings.get(flag_name)
    }

    pub fn contains(&self, flag_name: &str) -> bool {
        self.bindings.contains_key(flag_name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterate bindings in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }
}
