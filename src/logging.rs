//! Logging setup for binaries built on envflag.
//!
//! The library itself only emits `tracing` events. Binaries pick a target
//! with a flag (which can in turn be overridden from the environment) and
//! install a subscriber once the flags are resolved.

use crate::error::ValueError;
use crate::value::FlagValue;
use anyhow::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogTarget {
    Off,
    Stdout,
    #[default]
    Stderr,
    /// Append to a file.
    File(PathBuf),
}

impl FlagValue for LogTarget {
    /// `0`/`off`, `1`/`stdout`, `2`/`stderr`, anything else is a file name.
    fn parse_flag(raw: &str) -> std::result::Result<Self, ValueError> {
        match raw {
            "" => Err(ValueError::Syntax),
            "0" | "off" => Ok(LogTarget::Off),
            "1" | "stdout" => Ok(LogTarget::Stdout),
            "2" | "stderr" => Ok(LogTarget::Stderr),
            path => Ok(LogTarget::File(PathBuf::from(path))),
        }
    }

    fn format_flag(&self) -> String {
        match self {
            LogTarget::Off => "off".to_string(),
            LogTarget::Stdout => "stdout".to_string(),
            LogTarget::Stderr => "stderr".to_string(),
            LogTarget::File(path) => path.to_string_lossy().into_owned(),
        }
    }
}

/// Install the global subscriber for `target`.
pub fn init(target: &LogTarget, verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    match target {
        LogTarget::Off => {}
        LogTarget::Stdout => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}
