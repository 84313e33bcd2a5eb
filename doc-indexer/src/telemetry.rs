//! Tracing initialization.

use std::env;

/// Initialize the global tracing subscriber.
///
/// Log level comes from `RUST_LOG`, defaulting to `info`. Set
/// `LOG_FORMAT=json` for structured output in deployed environments.
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
