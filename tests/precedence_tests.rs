//! Tests for override precedence: environment over command line over default.

use envflag::{EnvFlags, Error, FlagSet, Source, ValueError, Var};
use std::collections::HashMap;
use std::time::Duration;

/// Helper to build an environment from literal pairs.
fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Declare `url` bound to `URL` with the usual default.
fn url_flags(env: HashMap<String, String>) -> (EnvFlags<HashMap<String, String>>, Var<String>) {
    let mut flags = EnvFlags::with_env(FlagSet::new("test"), env);
    let url = Var::default();
    flags
        .string_var(&url, "url", "URL", "http://example.com", "site url")
        .expect("Failed to declare url");
    (flags, url)
}

#[test]
fn environment_has_precedence_over_command_line() {
    let (mut flags, url) = url_flags(env(&[("URL", "http://env.site.com")]));

    flags.parse(["-url=http://cmd.site.com"]).unwrap();

    assert_eq!(url.get(), "http://env.site.com");
    assert_eq!(
        flags.flag_set().lookup("url").unwrap().source(),
        &Source::Environment {
            var: "URL".to_string()
        }
    );
}

#[test]
fn command_line_used_when_environment_unset() {
    let (mut flags, url) = url_flags(env(&[]));

    flags.parse(["-url=http://cmd.site.com"]).unwrap();

    assert_eq!(url.get(), "http://cmd.site.com");
}

#[test]
fn default_used_when_nothing_given() {
    let (mut flags, url) = url_flags(env(&[]));

    flags.parse(Vec::<String>::new()).unwrap();

    assert_eq!(url.get(), "http://example.com");
    assert_eq!(
        flags.flag_set().lookup("url").unwrap().source(),
        &Source::Default
    );
}

#[test]
fn empty_environment_value_treated_as_unset() {
    let (mut flags, url) = url_flags(env(&[("URL", "")]));
    flags.parse(["--url=http://cmd.site.com"]).unwrap();
    assert_eq!(url.get(), "http://cmd.site.com");

    let (mut flags, url) = url_flags(env(&[("URL", "")]));
    flags.parse(Vec::<String>::new()).unwrap();
    assert_eq!(url.get(), "http://example.com");
}

#[test]
fn environment_overrides_default_without_command_line() {
    let (mut flags, url) = url_flags(env(&[("URL", "http://env.site.com")]));

    flags.parse(Vec::<String>::new()).unwrap();

    assert_eq!(url.get(), "http://env.site.com");
}

#[test]
fn flags_without_binding_are_never_touched() {
    let mut flags = EnvFlags::with_env(
        FlagSet::new("test"),
        env(&[("NAME", "from-env"), ("name", "from-env")]),
    );
    let name = Var::default();
    flags
        .flag_set_mut()
        .var(&name, "name", String::from("default"), "process name")
        .unwrap();

    flags.parse(["--name=cmd"]).unwrap();
    assert_eq!(name.get(), "cmd");

    flags.resolve().unwrap();
    assert_eq!(name.get(), "cmd");
    assert_eq!(
        flags.flag_set().lookup("name").unwrap().source(),
        &Source::CommandLine
    );
}

#[test]
fn resolve_is_idempotent() {
    let (mut flags, url) = url_flags(env(&[("URL", "http://env.site.com")]));
    flags.parse(["--url=http://cmd.site.com"]).unwrap();
    let once = url.get();

    flags.resolve().unwrap();
    flags.resolve().unwrap();

    assert_eq!(url.get(), once);
}

#[test]
fn typed_flags_are_coerced_from_environment() {
    let mut flags = EnvFlags::with_env(
        FlagSet::new("test"),
        env(&[
            ("VERBOSE", "true"),
            ("WORKERS", "-3"),
            ("LIMIT", "0x100"),
            ("RATIO", "0.25"),
            ("TIMEOUT", "1m30s"),
        ]),
    );
    let verbose = Var::default();
    let workers = Var::default();
    let limit = Var::default();
    let ratio = Var::default();
    let timeout = Var::default();
    flags
        .bool_var(&verbose, "verbose", "VERBOSE", false, "verbose output")
        .unwrap();
    flags
        .int_var(&workers, "workers", "WORKERS", 4, "worker count")
        .unwrap();
    flags
        .uint_var(&limit, "limit", "LIMIT", 10, "request limit")
        .unwrap();
    flags
        .float_var(&ratio, "ratio", "RATIO", 1.0, "sample ratio")
        .unwrap();
    flags
        .duration_var(
            &timeout,
            "timeout",
            "TIMEOUT",
            Duration::from_secs(5),
            "request timeout",
        )
        .unwrap();

    flags
        .parse(["--verbose=false", "--workers=8", "--timeout=10s"])
        .unwrap();

    assert!(verbose.get());
    assert_eq!(workers.get(), -3);
    assert_eq!(limit.get(), 256);
    assert_eq!(ratio.get(), 0.25);
    assert_eq!(timeout.get(), Duration::from_secs(90));
}

#[test]
fn bad_environment_value_fails_like_bad_command_line_value() {
    let mut flags = EnvFlags::with_env(FlagSet::new("test"), env(&[("WORKERS", "many")]));
    let workers = Var::default();
    flags
        .int_var(&workers, "workers", "WORKERS", 4, "worker count")
        .unwrap();

    let err = flags.parse(Vec::<String>::new()).unwrap_err();

    assert!(matches!(
        err,
        Error::InvalidValue {
            ref flag,
            reason: ValueError::Syntax,
            ..
        } if flag == "workers"
    ));
    assert_eq!(workers.get(), 4);
}

#[test]
fn one_environment_variable_may_feed_several_flags() {
    let mut flags = EnvFlags::with_env(FlagSet::new("test"), env(&[("HOST", "db.internal")]));
    let primary = Var::default();
    let replica = Var::default();
    flags
        .string_var(&primary, "primary", "HOST", "localhost", "primary host")
        .unwrap();
    flags
        .string_var(&replica, "replica", "HOST", "localhost", "replica host")
        .unwrap();

    flags.parse(Vec::<String>::new()).unwrap();

    assert_eq!(primary.get(), "db.internal");
    assert_eq!(replica.get(), "db.internal");
}

#[test]
fn redeclaring_a_flag_is_rejected_and_keeps_binding() {
    let (mut flags, url) = url_flags(env(&[]));

    let err = flags
        .string_var(&url, "url", "OTHER_URL", "", "again")
        .unwrap_err();

    assert!(matches!(err, Error::Redefined(_)));
    assert_eq!(flags.registry().binding("url").unwrap().env_name(), "URL");
}

#[test]
fn help_mentions_override_variable() {
    let (flags, _url) = url_flags(env(&[]));

    let help = flags.flag_set().render_help();

    assert!(help.contains("site url. Override with env var URL"));
}

#[test]
fn system_environment_overrides_command_line() {
    // SAFETY: the variable name is unique to this test.
    unsafe {
        std::env::set_var("ENVFLAG_PRECEDENCE_TEST_URL", "http://env.site.com");
    }

    let mut flags = EnvFlags::new(FlagSet::new("test"));
    let url = Var::default();
    flags
        .string_var(
            &url,
            "url",
            "ENVFLAG_PRECEDENCE_TEST_URL",
            "http://example.com",
            "site url",
        )
        .unwrap();
    flags.parse(["-url=http://cmd.site.com"]).unwrap();

    unsafe {
        std::env::remove_var("ENVFLAG_PRECEDENCE_TEST_URL");
    }

    assert_eq!(url.get(), "http://env.site.com");
}
