//! Logging initialization.
//!
//! Logs go to stderr so stdout stays clean for event output.
//! `BREATHWELL_LOG` takes precedence over `-v`.

use tracing_subscriber::EnvFilter;

/// Maps a verbosity level to a tracing directive string.
pub fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initializes the global tracing subscriber. Safe to call more than once.
pub fn init_logging(verbosity: u8, json: bool) {
    let filter = EnvFilter::try_from_env("BREATHWELL_LOG")
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));
    let show_target = verbosity >= 2;

    if json {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(show_target)
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(show_target)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
