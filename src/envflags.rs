//! Environment overrides layered on a [`FlagSet`].
//!
//! Flags declared through [`EnvFlags`] are bound to an environment variable.
//! After the command line is parsed, [`EnvFlags::resolve`] visits every flag;
//! a bound variable that is set and non-empty replaces whatever the command
//! line or the default produced. Empty and unset variables are ignored.
//!
//! ```no_run
//! use envflag::{EnvFlags, FlagSet, Var};
//!
//! let url = Var::default();
//! let mut flags = EnvFlags::new(FlagSet::new("fetch"));
//! flags.string_var(&url, "url", "API_URL", "http://api.com", "API URL to GET")?;
//! flags.parse(std::env::args_os().skip(1))?;
//! println!("{}", url.get());
//! # Ok::<(), envflag::Error>(())
//! ```

use crate::binding::{Binding, Registry};
use crate::env::{GetEnv, SystemEnv};
use crate::error::Result;
use crate::flagset::{Flag, FlagSet, Source};
use crate::value::{FlagValue, Var};
use serde::Serialize;
use std::ffi::OsString;
use std::time::Duration;
use tracing::{debug, trace};

/// A flag set whose flags may be overridden from the environment.
#[derive(Debug)]
pub struct EnvFlags<E = SystemEnv> {
    flag_set: FlagSet,
    registry: Registry,
    env: E,
}

impl EnvFlags<SystemEnv> {
    /// Overrides read from the process environment.
    pub fn new(flag_set: FlagSet) -> Self {
        Self::with_env(flag_set, SystemEnv)
    }
}

impl<E: GetEnv> EnvFlags<E> {
    pub fn with_env(flag_set: FlagSet, env: E) -> Self {
        Self {
            flag_set,
            registry: Registry::new(),
            env,
        }
    }

    /// Bind an already declared flag to an environment variable.
    pub fn register(
        &mut self,
        flag_name: impl Into<String>,
        env_name: impl Into<String>,
    ) -> Option<Binding> {
        self.registry.register(flag_name, env_name)
    }

    /// Declare a flag on the underlying flag set and bind it to `env_name`.
    ///
    /// The help text gets a note naming the variable.
    pub fn var<T: FlagValue>(
        &mut self,
        target: &Var<T>,
        flag_name: &str,
        env_name: &str,
        default: T,
        help: &str,
    ) -> Result<()> {
        self.flag_set
            .var(target, flag_name, default, override_usage(help, env_name))?;
        self.registry.register(flag_name, env_name);
        Ok(())
    }

    pub fn string_var(
        &mut self,
        target: &Var<String>,
        flag_name: &str,
        env_name: &str,
        default: impl Into<String>,
        help: &str,
    ) -> Result<()> {
        self.var(target, flag_name, env_name, default.into(), help)
    }

    pub fn bool_var(
        &mut self,
        target: &Var<bool>,
        flag_name: &str,
        env_name: &str,
        default: bool,
        help: &str,
    ) -> Result<()> {
        self.var(target, flag_name, env_name, default, help)
    }

    pub fn int_var(
        &mut self,
        target: &Var<i64>,
        flag_name: &str,
        env_name: &str,
        default: i64,
        help: &str,
    ) -> Result<()> {
        self.var(target, flag_name, env_name, default, help)
    }

    pub fn uint_var(
        &mut self,
        target: &Var<u64>,
        flag_name: &str,
        env_name: &str,
        default: u64,
        help: &str,
    ) -> Result<()> {
        self.var(target, flag_name, env_name, default, help)
    }

    pub fn float_var(
        &mut self,
        target: &Var<f64>,
        flag_name: &str,
        env_name: &str,
        default: f64,
        help: &str,
    ) -> Result<()> {
        self.var(target, flag_name, env_name, default, help)
    }

    pub fn duration_var(
        &mut self,
        target: &Var<Duration>,
        flag_name: &str,
        env_name: &str,
        default: Duration,
        help: &str,
    ) -> Result<()> {
        self.var(target, flag_name, env_name, default, help)
    }

    /// Apply the environment override for one flag, if it has a binding.
    ///
    /// Meant to run after the command line has been parsed. A value that
    /// does not parse fails the same way a bad command-line value does.
    pub fn visit(&self, flag: &mut Flag) -> Result<()> {
        apply_override(&self.registry, &self.env, flag)
    }

    /// Visit every declared flag, stopping at the first bad value.
    pub fn resolve(&mut self) -> Result<()> {
        let Self {
            flag_set,
            registry,
            env,
        } = self;
        flag_set.try_visit_all_mut(|flag| apply_override(registry, env, flag))
    }

    /// Parse `args` (without the program name), then resolve.
    pub fn parse<I, T>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        self.flag_set.parse(args)?;
        self.resolve()
    }

    pub fn flag_set(&self) -> &FlagSet {
        &self.flag_set
    }

    pub fn flag_set_mut(&mut self) -> &mut FlagSet {
        &mut self.flag_set
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn into_flag_set(self) -> FlagSet {
        self.flag_set
    }

    /// Snapshot of every flag's effective value and where it came from.
    pub fn report(&self) -> Vec<FlagReport> {
        self.flag_set
            .iter()
            .map(|flag| FlagReport {
                name: flag.name().to_string(),
                value: flag.value(),
                default_value: flag.default_value().to_string(),
                source: flag.source().clone(),
                env: self
                    .registry
                    .binding(flag.name())
                    .map(|binding| binding.env_name().to_string()),
                usage: flag.usage().to_string(),
            })
            .collect()
    }
}

/// One row of [`EnvFlags::report`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagReport {
    pub name: String,
    pub value: String,
    pub default_value: String,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
    pub usage: String,
}

fn override_usage(help: &str, env_name: &str) -> String {
    format!("{}. Override with env var {}", help, env_name)
}

fn apply_override<E: GetEnv>(registry: &Registry, env: &E, flag: &mut Flag) -> Result<()> {
    let Some(binding) = registry.binding(flag.name()) else {
        return Ok(());
    };

    let value = binding.read(env);
    if value.is_empty() {
        trace!(flag = %flag.name(), var = %binding.env_name(), "Override variable unset or empty");
        return Ok(());
    }

    flag.set(
        &value,
        Source::Environment {
            var: binding.env_name().to_string(),
        },
    )?;
    debug!(flag = %flag.name(), var = %binding.env_name(), "Flag overridden from environment");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ValueError};
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_declare_augments_help_and_registers() {
        let mut flags = EnvFlags::with_env(FlagSet::new("test"), env(&[]));
        let url = Var::default();
        flags
            .string_var(&url, "url", "URL", "http://example.com", "site url")
            .unwrap();

        let flag = flags.flag_set().lookup("url").unwrap();
        assert_eq!(flag.usage(), "site url. Override with env var URL");
        assert_eq!(flags.registry().binding("url").unwrap().env_name(), "URL");
        assert_eq!(url.get(), "http://example.com");
    }

    #[test]
    fn test_visit_single_flag() {
        let mut flags = EnvFlags::with_env(FlagSet::new("test"), env(&[("URL", "http://env.com")]));
        let url = Var::default();
        flags
            .string_var(&url, "url", "URL", "http://example.com", "site url")
            .unwrap();

        let mut fs = FlagSet::new("other");
        let other = Var::default();
        fs.var(&other, "url", String::from("unchanged"), "").unwrap();
        flags.visit(fs.lookup_mut("url").unwrap()).unwrap();
        assert_eq!(other.get(), "http://env.com");
        assert_eq!(url.get(), "http://example.com");
    }

    #[test]
    fn test_empty_variable_ignored() {
        let mut flags = EnvFlags::with_env(FlagSet::new("test"), env(&[("URL", "")]));
        let url = Var::default();
        flags
            .string_var(&url, "url", "URL", "http://example.com", "site url")
            .unwrap();
        flags.parse(["--url=http://cmd.com"]).unwrap();
        assert_eq!(url.get(), "http://cmd.com");
        assert_eq!(
            flags.flag_set().lookup("url").unwrap().source(),
            &Source::CommandLine
        );
    }

    #[test]
    fn test_register_after_plain_declaration() {
        let mut flags = EnvFlags::with_env(FlagSet::new("test"), env(&[("WORKERS", "8")]));
        let workers = Var::default();
        flags
            .flag_set_mut()
            .var(&workers, "workers", 2u32, "worker count")
            .unwrap();
        flags.parse(Vec::<String>::new()).unwrap();
        assert_eq!(workers.get(), 2);

        flags.register("workers", "WORKERS");
        flags.resolve().unwrap();
        assert_eq!(workers.get(), 8);
    }

    #[test]
    fn test_bad_environment_value_propagates() {
        let mut flags = EnvFlags::with_env(FlagSet::new("test"), env(&[("PORT", "eighty")]));
        let port = Var::default();
        flags
            .uint_var(&port, "port", "PORT", 8080, "listen port")
            .unwrap();
        let err = flags.parse(["--port=9090"]).unwrap_err();
        match err {
            Error::InvalidValue { origin, reason, .. } => {
                assert_eq!(
                    origin,
                    Source::Environment {
                        var: "PORT".to_string()
                    }
                );
                assert_eq!(reason, ValueError::Syntax);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(port.get(), 9090);
    }

    #[test]
    fn test_resolve_stops_at_first_bad_value() {
        let mut flags = EnvFlags::with_env(
            FlagSet::new("test"),
            env(&[("ALPHA", "env-a"), ("BETA", "not-a-number"), ("GAMMA", "env-c")]),
        );
        let alpha = Var::default();
        let beta = Var::default();
        let gamma = Var::default();
        flags
            .string_var(&alpha, "alpha", "ALPHA", "a", "first")
            .unwrap();
        flags.int_var(&beta, "beta", "BETA", 2, "second").unwrap();
        flags
            .string_var(&gamma, "gamma", "GAMMA", "c", "third")
            .unwrap();
        flags.flag_set_mut().parse(Vec::<String>::new()).unwrap();

        let err = flags.resolve().unwrap_err();

        assert!(matches!(err, Error::InvalidValue { ref flag, .. } if flag == "beta"));
        assert_eq!(alpha.get(), "env-a");
        assert_eq!(beta.get(), 2);
        assert_eq!(gamma.get(), "c");
        assert_eq!(
            flags.flag_set().lookup("gamma").unwrap().source(),
            &Source::Default
        );
    }

    #[test]
    fn test_report() {
        let mut flags = EnvFlags::with_env(FlagSet::new("test"), env(&[("TIMEOUT", "1m")]));
        let timeout = Var::default();
        let name = Var::default();
        flags
            .duration_var(&timeout, "timeout", "TIMEOUT", Duration::from_secs(5), "request timeout")
            .unwrap();
        flags
            .flag_set_mut()
            .var(&name, "name", String::from("demo"), "process name")
            .unwrap();
        flags.parse(Vec::<String>::new()).unwrap();

        let report = flags.report();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].name, "name");
        assert_eq!(report[0].source, Source::Default);
        assert_eq!(report[0].env, None);
        assert_eq!(report[1].name, "timeout");
        assert_eq!(report[1].value, "1m0s");
        assert_eq!(report[1].default_value, "5s");
        assert_eq!(report[1].env.as_deref(), Some("TIMEOUT"));
    }
}
