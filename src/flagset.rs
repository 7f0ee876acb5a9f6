//! Typed command-line flags parsed with clap.
//!
//! A [`FlagSet`] owns the declared flags. Each flag writes into a caller-held
//! [`Var`], remembers its default, and records which layer produced its
//! current value. Parsing goes through clap's builder API, so usage text and
//! tokenizing follow clap conventions; `-name` is accepted as well as
//! `--name`.

use crate::error::{Error, Result};
use crate::value::{FlagValue, Value, Var};
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, Command};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use tracing::debug;

/// Id of the positional argument collecting everything after the flags.
const POSITIONAL_ID: &str = "ARGS";

/// Which layer produced a flag's current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    Default,
    CommandLine,
    Environment { var: String },
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Default => write!(f, "default"),
            Source::CommandLine => write!(f, "command line"),
            Source::Environment { var } => write!(f, "environment variable {}", var),
        }
    }
}

/// A declared flag.
pub struct Flag {
    name: String,
    usage: String,
    default_value: String,
    value: Box<dyn Value>,
    source: Source,
}

impl Flag {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// The default, formatted as it would be given on the command line.
    pub fn default_value(&self) -> &str {
        &self.default_value
    }

    /// The current value, formatted.
    pub fn value(&self) -> String {
        self.value.render()
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn is_bool_flag(&self) -> bool {
        self.value.is_bool_flag()
    }

    /// Parse `raw` into the flag's value and record where it came from.
    ///
    /// On error the value and source are left untouched.
    pub fn set(&mut self, raw: &str, origin: Source) -> Result<()> {
        if let Err(reason) = self.value.set(raw) {
            return Err(Error::InvalidValue {
                flag: self.name.clone(),
                value: raw.to_string(),
                origin,
                reason,
            });
        }
        self.source = origin;
        Ok(())
    }

    fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .help(self.usage.clone())
            .action(ArgAction::Set)
            .value_parser(clap::value_parser!(String));
        if !self.default_value.is_empty() {
            arg = arg.default_value(self.default_value.clone());
        }
        if self.is_bool_flag() {
            arg.num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_name("BOOL")
        } else {
            arg.allow_hyphen_values(true).value_name("VALUE")
        }
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("default_value", &self.default_value)
            .field("value", &self.value())
            .field("source", &self.source)
            .finish()
    }
}

/// A named set of flags.
#[derive(Debug)]
pub struct FlagSet {
    name: String,
    about: Option<String>,
    flags: BTreeMap<String, Flag>,
    args: Vec<String>,
    parsed: bool,
}

impl FlagSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: None,
            flags: BTreeMap::new(),
            args: Vec::new(),
            parsed: false,
        }
    }

    /// Set the description shown at the top of the help text.
    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a flag writing into `target`, which immediately takes `default`.
    pub fn var<T: FlagValue>(
        &mut self,
        target: &Var<T>,
        name: &str,
        default: T,
        usage: impl Into<String>,
    ) -> Result<()> {
        validate_name(name)?;
        if self.flags.contains_key(name) {
            return Err(Error::Redefined(name.to_string()));
        }

        let default_value = default.format_flag();
        target.set(default);
        self.flags.insert(
            name.to_string(),
            Flag {
                name: name.to_string(),
                usage: usage.into(),
                default_value,
                value: Box::new(target.clone()),
                source: Source::Default,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.flags.get(name)
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Flag> {
        self.flags.get_mut(name)
    }

    /// Set a flag as if it had been given on the command line.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<()> {
        self.flags
            .get_mut(name)
            .ok_or_else(|| Error::NoSuchFlag(name.to_string()))?
            .set(raw, Source::CommandLine)
    }

    /// Parse arguments, not including the program name.
    ///
    /// Only flags actually present in `args` are touched. Everything from the
    /// first positional argument on is kept in [`args`](Self::args).
    ///
    /// Values are applied in lexicographic flag order. If one fails to parse,
    /// the flags before it keep their new values, the rest are untouched, and
    /// [`parsed`](Self::parsed) stays false.
    pub fn parse<I, T>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args = self.normalize_args(args);
        let matches = self.command().try_get_matches_from(args)?;

        let mut set = 0usize;
        for flag in self.flags.values_mut() {
            if matches.value_source(&flag.name) != Some(ValueSource::CommandLine) {
                continue;
            }
            if let Some(raw) = matches.get_one::<String>(&flag.name) {
                flag.set(raw, Source::CommandLine)?;
                set += 1;
            }
        }

        self.args = matches
            .get_many::<String>(POSITIONAL_ID)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        self.parsed = true;
        debug!(flag_set = %self.name, set, positional = self.args.len(), "Parsed command line");
        Ok(())
    }

    pub fn parsed(&self) -> bool {
        self.parsed
    }

    /// Positional arguments left after parsing.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Visit every declared flag in lexicographic order.
    pub fn visit_all(&self, mut f: impl FnMut(&Flag)) {
        for flag in self.flags.values() {
            f(flag);
        }
    }

    /// Visit only the flags whose value did not come from the default.
    pub fn visit(&self, mut f: impl FnMut(&Flag)) {
        for flag in self.flags.values() {
            if flag.source != Source::Default {
                f(flag);
            }
        }
    }

    /// Visit every flag mutably in lexicographic order, stopping at the first error.
    pub fn try_visit_all_mut(&mut self, mut f: impl FnMut(&mut Flag) -> Result<()>) -> Result<()> {
        for flag in self.flags.values_mut() {
            f(flag)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Build the clap command describing this flag set.
    pub fn command(&self) -> Command {
        let mut command = Command::new(self.name.clone())
            .no_binary_name(true)
            .disable_version_flag(true)
            .args_override_self(true);
        if let Some(about) = &self.about {
            command = command.about(about.clone());
        }
        for flag in self.flags.values() {
            command = command.arg(flag.to_arg());
        }
        command.arg(
            Arg::new(POSITIONAL_ID)
                .value_name("ARGS")
                .num_args(0..)
                .trailing_var_arg(true)
                .value_parser(clap::value_parser!(String)),
        )
    }

    pub fn render_help(&self) -> String {
        self.command().render_help().to_string()
    }

    /// Rewrite `-name` to `--name` for declared flags, up to the first
    /// positional argument or `--`.
    fn normalize_args<I, T>(&self, args: I) -> Vec<OsString>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut iter = args.into_iter().map(Into::into);
        let mut out = Vec::new();
        let mut expect_value = false;

        for arg in iter.by_ref() {
            if expect_value {
                expect_value = false;
                out.push(arg);
                continue;
            }
            let Some(text) = arg.to_str() else {
                out.push(arg);
                break;
            };
            if text == "--" || text == "-" || !text.starts_with('-') {
                out.push(arg);
                break;
            }

            let body = text
                .strip_prefix("--")
                .or_else(|| text.strip_prefix('-'))
                .unwrap_or(text);
            let (name, inline_value) = match body.split_once('=') {
                Some((name, _)) => (name, true),
                None => (body, false),
            };
            match self.flags.get(name) {
                Some(flag) => {
                    expect_value = !inline_value && !flag.is_bool_flag();
                    out.push(OsString::from(format!("--{body}")));
                }
                None => out.push(arg),
            }
        }

        out.extend(iter);
        out
    }
}

fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.starts_with('-') {
        "must not start with '-'"
    } else if name.contains('=') {
        "must not contain '='"
    } else if name.chars().any(char::is_whitespace) {
        "must not contain whitespace"
    } else if name == "help" || name == POSITIONAL_ID {
        "name is reserved"
    } else {
        return Ok(());
    };
    Err(Error::InvalidName {
        name: name.to_string(),
        reason,
    })
}
