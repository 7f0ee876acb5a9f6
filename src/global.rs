//! The process-wide default registry.
//!
//! Most programs should own an [`EnvFlags`] and pass it around. For small
//! tools this module offers one shared instance bound to a flag set named
//! after the running program. It is constructed exactly once: either
//! explicitly with [`init`] at start-up, or lazily by the first call that
//! needs it. After that, [`init`] fails.
//!
//! ```no_run
//! use envflag::{Var, global};
//!
//! let url = Var::default();
//! global::string_var(&url, "url", "API_URL", "http://api.com", "API URL to GET")?;
//! global::parse();
//! # Ok::<(), envflag::Error>(())
//! ```

use crate::env::SystemEnv;
use crate::envflags::EnvFlags;
use crate::error::{Error, Result};
use crate::flagset::FlagSet;
use crate::value::{FlagValue, Var};
use std::ffi::OsString;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

static COMMAND_LINE: OnceLock<Mutex<EnvFlags<SystemEnv>>> = OnceLock::new();

/// Install `flag_set` as the default flag set.
pub fn init(flag_set: FlagSet) -> Result<()> {
    COMMAND_LINE
        .set(Mutex::new(EnvFlags::new(flag_set)))
        .map_err(|_| Error::AlreadyInitialized)
}

/// Lock the default registry, constructing it if needed.
///
/// Do not hold the guard across calls to the other functions in this module.
pub fn command_line() -> MutexGuard<'static, EnvFlags<SystemEnv>> {
    COMMAND_LINE
        .get_or_init(|| Mutex::new(EnvFlags::new(FlagSet::new(program_name()))))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

pub fn var<T: FlagValue>(
    target: &Var<T>,
    flag_name: &str,
    env_name: &str,
    default: T,
    help: &str,
) -> Result<()> {
    command_line().var(target, flag_name, env_name, default, help)
}

pub fn string_var(
    target: &Var<String>,
    flag_name: &str,
    env_name: &str,
    default: impl Into<String>,
    help: &str,
) -> Result<()> {
    command_line().string_var(target, flag_name, env_name, default, help)
}

pub fn bool_var(
    target: &Var<bool>,
    flag_name: &str,
    env_name: &str,
    default: bool,
    help: &str,
) -> Result<()> {
    var(target, flag_name, env_name, default, help)
}

pub fn int_var(
    target: &Var<i64>,
    flag_name: &str,
    env_name: &str,
    default: i64,
    help: &str,
) -> Result<()> {
    var(target, flag_name, env_name, default, help)
}

pub fn uint_var(
    target: &Var<u64>,
    flag_name: &str,
    env_name: &str,
    default: u64,
    help: &str,
) -> Result<()> {
    var(target, flag_name, env_name, default, help)
}

pub fn float_var(
    target: &Var<f64>,
    flag_name: &str,
    env_name: &str,
    default: f64,
    help: &str,
) -> Result<()> {
    var(target, flag_name, env_name, default, help)
}

pub fn duration_var(
    target: &Var<Duration>,
    flag_name: &str,
    env_name: &str,
    default: Duration,
    help: &str,
) -> Result<()> {
    var(target, flag_name, env_name, default, help)
}

/// Apply environment overrides to every flag of the default flag set.
pub fn resolve() -> Result<()> {
    command_line().resolve()
}

/// Parse `args` (without the program name) into the default flag set and resolve.
pub fn parse_from<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    command_line().parse(args)
}

/// Parse the process arguments and resolve, exiting on failure.
///
/// Help requests and command-line errors exit the way clap does; a bad
/// environment value is reported on stderr with exit status 2.
pub fn parse() {
    match parse_from(std::env::args_os().skip(1)) {
        Ok(()) => {}
        Err(Error::Cli(err)) => err.exit(),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    }
}
