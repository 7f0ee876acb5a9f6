//! Error types for flag declaration, parsing and resolution.

use crate::flagset::Source;
use thiserror::Error;

/// Why a raw string could not be converted into a flag's value type.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueError {
    #[error("invalid syntax")]
    Syntax,

    #[error("value out of range")]
    Range,
}

/// Errors raised by [`FlagSet`](crate::FlagSet) and [`EnvFlags`](crate::EnvFlags).
#[derive(Error, Debug)]
pub enum Error {
    /// The flag name cannot be used as a `--long` option.
    #[error("invalid flag name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// A flag with this name was already declared on the flag set.
    #[error("flag redefined: {0}")]
    Redefined(String),

    #[error("no such flag --{0}")]
    NoSuchFlag(String),

    /// A raw value, from the command line or the environment, did not parse.
    #[error("invalid value {value:?} for flag --{flag} from {origin}: {reason}")]
    InvalidValue {
        flag: String,
        value: String,
        origin: Source,
        #[source]
        reason: ValueError,
    },

    /// The process-wide registry was constructed before `init` was called.
    #[error("default flag registry already initialized")]
    AlreadyInitialized,

    /// Tokenizing failed, or help was requested.
    #[error(transparent)]
    Cli(#[from] clap::Error),
}

/// Result type for flag operations.
pub type Result<T> = std::result::Result<T, Error>;
