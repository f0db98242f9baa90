//! Tracing setup.

use tracing_subscriber::EnvFilter;

/// Default level for a `-v` count: none is `warn`, one is `info`, more is `debug`.
pub fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the verbosity level.
///
/// Logs go to stderr so `--output json` keeps stdout machine-readable.
pub fn init(verbosity: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().with_current_span(true).init();
    } else {
        builder.init();
    }
}
