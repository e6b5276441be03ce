//! Small utilities and extensions built on top of Tokio, used by the
//! routing core's single-consumer event loop.

/// A broadcast bus for fanning out router events (`ChannelLost`,
/// `NodeDiscovered`, etc) to any number of subscribers.
pub mod events_bus;
/// A channel for sending deduplicated notifications with no data attached.
pub mod notify;
/// A multi-producer, multi-consumer shutdown signal.
pub mod shutdown;
/// `Task`, a thin `must_use` wrapper around `tokio::task::JoinHandle`.
pub mod task;

/// Default bound for bookkeeping channels: this crate's own internal ones,
/// and the router's command queue in `router_core::actor`.
pub const DEFAULT_CHANNEL_SIZE: usize = 256;

// Re-exported so downstream crates don't need a separate `tokio` dependency
// declaration just to name e.g. `tokio::time::Duration`.
pub use tokio;
