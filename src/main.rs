//! envflag demo
//!
//! Declares a few flags that can be overridden from the environment, resolves
//! them, and prints the effective configuration.

use anyhow::Result;
use envflag::format::{OutputFormat, format_report};
use envflag::logging::{self, LogTarget};
use envflag::{EnvFlags, Error, FlagSet, Var};
use std::time::Duration;
use tracing::{debug, info};

fn main() -> Result<()> {
    let url = Var::default();
    let name = Var::default();
    let port = Var::<u16>::default();
    let timeout = Var::default();
    let verbose = Var::default();
    let log = Var::<LogTarget>::default();
    let format = Var::<OutputFormat>::default();

    let mut flags = EnvFlags::new(
        FlagSet::new("envflag")
            .with_about("Resolve flags from the command line and the environment"),
    );
    flags.string_var(&url, "url", "API_URL", "http://api.com", "API URL to GET")?;
    flags.string_var(&name, "name", "APP_NAME", "envflag", "Process name")?;
    flags.var(&port, "port", "PORT", 8080, "Port to listen on")?;
    flags.duration_var(
        &timeout,
        "timeout",
        "TIMEOUT",
        Duration::from_secs(30),
        "Request timeout",
    )?;
    flags.bool_var(&verbose, "verbose", "VERBOSE", false, "Enable verbose logging")?;
    flags.var(
        &log,
        "log",
        "LOG",
        LogTarget::Stderr,
        "Logging output: 0/off, 1/stdout, 2/stderr, or filename",
    )?;
    flags.var(
        &format,
        "format",
        "FORMAT",
        OutputFormat::Markdown,
        "Output format: markdown or json",
    )?;

    match flags.parse(std::env::args_os().skip(1)) {
        Ok(()) => {}
        Err(Error::Cli(err)) => err.exit(),
        Err(err) => return Err(err.into()),
    }

    logging::init(&log.get(), verbose.get())?;
    info!(
        name = %name.get(),
        url = %url.get(),
        port = port.get(),
        timeout = ?timeout.get(),
        "Configuration resolved"
    );
    for arg in flags.flag_set().args() {
        debug!(arg = %arg, "Positional argument");
    }

    println!("{}", format_report(&flags.report(), format.get())?);
    Ok(())
}
