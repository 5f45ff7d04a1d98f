//! Tracing setup for the library crates' `debug!`/`trace!` events.

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// Overrides the filter derived from `-v`. `RUST_LOG` is honored after it.
const LOG_ENV: &str = "REQCHECK_LOG";

/// The default filter directive for a `-v` count.
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "reqcheck=warn",
        1 => "reqcheck=debug",
        _ => "trace",
    }
}

/// Install a stderr subscriber. Fails only when one is already installed.
pub fn setup_logging(verbosity: u8) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity >= 2)
                .without_time()
                .compact(),
        )
        .try_init()
}
