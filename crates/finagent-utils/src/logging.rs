//! Logging and tracing setup

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable overriding the log filter, checked before `RUST_LOG`
pub const LOG_ENV: &str = "FINAGENT_LOG";

/// Initialize the global tracing subscriber with an `info` default
pub fn init_tracing() {
    init_tracing_with("info");
}

/// Initialize the global tracing subscriber with an explicit default directive
///
/// Filter resolution order: `FINAGENT_LOG`, then `RUST_LOG`, then the given
/// default. Safe to call more than once; later calls keep the first
/// subscriber.
pub fn init_tracing_with(default_directive: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
