//! Tracing subscriber setup for binaries and tests.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a global subscriber writing to stderr.
///
/// `RUST_LOG` wins when set. Otherwise `PTSL_LOG` (`debug`, `info`, `warn`,
/// `error`) picks the level for this crate. `LOG_FORMAT=json` switches to
/// JSON lines. Does nothing if a subscriber is already installed.
pub fn init_tracing() {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(filter_directives(std::env::var("PTSL_LOG").ok().as_deref()))
    };

    let use_json = std::env::var("LOG_FORMAT").as_deref() == Ok("json");

    if use_json {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    }
}

fn filter_directives(level: Option<&str>) -> String {
    let level = match level {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("warn") | Some("warning") => "warn",
        Some("error") => "error",
        _ => "info",
    };
    if level == "trace" {
        return "ptsl=trace".to_string();
    }
    format!("ptsl={level},ptsl::bridge::codec=warn")
}
