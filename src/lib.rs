//! Command-line flags that can be overridden by environment variables.
//!
//! Flags are declared on an [`EnvFlags`] together with the name of an
//! environment variable. After the command line is parsed, a bound variable
//! that is set to a non-empty value always wins over the command-line value
//! and the default. An empty or unset variable leaves the flag alone.

pub mod binding;
pub mod env;
pub mod envflags;
pub mod error;
pub mod flagset;
pub mod format;
pub mod global;
pub mod logging;
pub mod value;

pub use binding::{Binding, Registry};
pub use env::{GetEnv, SystemEnv};
pub use envflags::{EnvFlags, FlagReport};
pub use error::{Error, Result, ValueError};
pub use flagset::{Flag, FlagSet, Source};
pub use value::{FlagValue, Value, Var};
