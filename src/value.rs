//! Typed flag values.
//!
//! A [`Var<T>`] is the cell a declared flag writes into. The caller keeps one
//! handle and reads the effective value after resolution; the flag set keeps
//! another, boxed as a [`Value`], and only ever changes it through
//! [`Value::set`].

use crate::error::ValueError;
use std::fmt::Write;
use std::num::{IntErrorKind, ParseIntError};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// A settable flag value, driven by raw strings.
pub trait Value: Send + Sync {
    /// Parse `raw` and store it.
    fn set(&mut self, raw: &str) -> Result<(), ValueError>;

    /// The current value, formatted so that `set` would accept it.
    fn render(&self) -> String;

    /// Bool flags may appear on the command line without a value.
    fn is_bool_flag(&self) -> bool {
        false
    }
}

/// A type that can back a flag.
pub trait FlagValue: Clone + Send + Sync + 'static {
    fn parse_flag(raw: &str) -> Result<Self, ValueError>;

    fn format_flag(&self) -> String;

    fn is_bool() -> bool {
        false
    }
}

/// Shared handle to a typed flag value.
#[derive(Debug, Default)]
pub struct Var<T>(Arc<RwLock<T>>);

impl<T> Clone for Var<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Var<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    pub fn set(&self, value: T) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = value;
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl<T: Clone> Var<T> {
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}

impl<T: FlagValue> Value for Var<T> {
    fn set(&mut self, raw: &str) -> Result<(), ValueError> {
        let parsed = T::parse_flag(raw)?;
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = parsed;
        Ok(())
    }

    fn render(&self) -> String {
        self.with(T::format_flag)
    }

    fn is_bool_flag(&self) -> bool {
        T::is_bool()
    }
}

impl FlagValue for String {
    fn parse_flag(raw: &str) -> Result<Self, ValueError> {
        Ok(raw.to_string())
    }

    fn format_flag(&self) -> String {
        self.clone()
    }
}

impl FlagValue for PathBuf {
    fn parse_flag(raw: &str) -> Result<Self, ValueError> {
        Ok(PathBuf::from(raw))
    }

    fn format_flag(&self) -> String {
        self.to_string_lossy().into_owned()
    }
}

impl FlagValue for bool {
    fn parse_flag(raw: &str) -> Result<Self, ValueError> {
        parse_bool(raw)
    }

    fn format_flag(&self) -> String {
        self.to_string()
    }

    fn is_bool() -> bool {
        true
    }
}

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(raw: &str) -> Result<bool, ValueError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ValueError::Syntax),
    }
}

/// Split an integer literal into sign, digits and radix.
fn split_int(raw: &str) -> Result<(bool, String, u32), ValueError> {
    let (negative, rest) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let (digits, radix) = match rest.get(..2) {
        Some("0x" | "0X") => (&rest[2..], 16),
        Some("0o" | "0O") => (&rest[2..], 8),
        Some("0b" | "0B") => (&rest[2..], 2),
        _ => (rest, 10),
    };
    if digits.is_empty()
        || digits.starts_with(['_', '+', '-'])
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return Err(ValueError::Syntax);
    }
    Ok((negative, digits.replace('_', ""), radix))
}

fn int_error(err: ParseIntError) -> ValueError {
    match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ValueError::Range,
        _ => ValueError::Syntax,
    }
}

macro_rules! int_flag_value {
    ($($ty:ty),* $(,)?) => {$(
        impl FlagValue for $ty {
            fn parse_flag(raw: &str) -> Result<Self, ValueError> {
                let (negative, digits, radix) = split_int(raw)?;
                let literal = if negative { format!("-{digits}") } else { digits };
                <$ty>::from_str_radix(&literal, radix).map_err(int_error)
            }

            fn format_flag(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

int_flag_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! float_flag_value {
    ($($ty:ty),* $(,)?) => {$(
        impl FlagValue for $ty {
            fn parse_flag(raw: &str) -> Result<Self, ValueError> {
                raw.parse().map_err(|_| ValueError::Syntax)
            }

            fn format_flag(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

float_flag_value!(f32, f64);

impl FlagValue for Duration {
    fn parse_flag(raw: &str) -> Result<Self, ValueError> {
        parse_duration(raw)
    }

    fn format_flag(&self) -> String {
        format_duration(self)
    }
}

/// Parse a duration such as `300ms`, `1.5h` or `2h45m`.
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare `0` is
/// accepted; negative durations are out of range.
pub fn parse_duration(raw: &str) -> Result<Duration, ValueError> {
    let (negative, mut rest) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(ValueError::Syntax);
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3_600 * NANOS_PER_SEC,
            _ => return Err(ValueError::Syntax),
        };

        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        if (whole.is_empty() && frac.is_empty()) || frac.contains('.') {
            return Err(ValueError::Syntax);
        }
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| ValueError::Range)?
        };
        let mut nanos = whole.checked_mul(scale).ok_or(ValueError::Range)?;
        if !frac.is_empty() {
            // digits past 10^-18 cannot contribute a nanosecond
            let digits = &frac[..frac.len().min(18)];
            let numerator: u128 = digits.parse().map_err(|_| ValueError::Syntax)?;
            let denominator = 10u128.pow(digits.len() as u32);
            nanos = nanos
                .checked_add(numerator * scale / denominator)
                .ok_or(ValueError::Range)?;
        }
        total = total.checked_add(nanos).ok_or(ValueError::Range)?;
        rest = tail;
    }

    if negative && total != 0 {
        return Err(ValueError::Range);
    }
    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| ValueError::Range)?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

/// Format a duration the way [`parse_duration`] reads it back, e.g. `1h30m0s`.
pub fn format_duration(duration: &Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_SEC {
        return if nanos % 1_000_000 == 0 {
            format!("{}ms", nanos / 1_000_000)
        } else if nanos % 1_000 == 0 {
            format!("{}us", nanos / 1_000)
        } else {
            format!("{nanos}ns")
        };
    }

    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3_600, secs % 3_600 / 60, secs % 60);
    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let subsec = duration.subsec_nanos();
    if subsec == 0 {
        let _ = write!(out, "{seconds}s");
    } else {
        let frac = format!("{subsec:09}");
        let _ = write!(out, "{seconds}.{}s", frac.trim_end_matches('0'));
    }
    out
}
