//! Global `tracing` subscriber setup.
//!
//! The log level is configurable via the `RUST_LOG` environment variable,
//! e.g. `RUST_LOG=debug,router_core::gossip=trace`. Defaults to `INFO` if
//! unset or unparseable.

use std::io;
use std::str::FromStr;

use tracing_core::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Initialize the global `tracing` subscriber. Panics if one is already set.
pub fn init(rust_log: Option<&str>) {
    try_init(rust_log).expect("failed to set up logger");
}

/// Initialize the global logger for tests. Swallows the "already
/// initialized" error, since multiple test threads race to set it.
#[cfg(any(test, feature = "test-utils"))]
pub fn init_for_testing() {
    let rust_log = std::env::var("RUST_LOG").ok();
    let _ = try_init(rust_log.as_deref());
}

/// Try to initialize a global logger, returning `Err` if one is already set.
pub fn try_init(rust_log: Option<&str>) -> Result<(), tracing_subscriber::util::TryInitError> {
    let rust_log = rust_log.unwrap_or("info");
    let targets = Targets::from_str(rust_log)
        .inspect_err(|e| eprintln!("invalid RUST_LOG ({e}); defaulting to INFO"))
        .unwrap_or_else(|_| Targets::new().with_default(Level::INFO));

    let stderr_log = tracing_subscriber::fmt::Layer::default()
        .compact()
        .with_level(true)
        .with_target(true)
        .with_writer(io::stderr as fn() -> io::Stderr)
        .with_filter(targets);

    tracing_subscriber::registry().with(stderr_log).try_init()
}
