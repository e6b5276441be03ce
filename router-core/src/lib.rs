//! Gossip ingestion, graph maintenance, path finding, synchronization, and
//! pruning for a Lightning-Network routing core. See [`Router`] for the
//! single entry point, and [`actor`] for a runnable event loop built on it.

/// The default `tokio`-based event loop: the thin harness that turns
/// [`Router`] into a running service.
pub mod actor;
/// The directed weighted multigraph over node public keys.
pub mod graph;
/// Gossip ingestion & validation.
pub mod gossip;
/// Local channel lifecycle and on-chain funding-spend events.
pub mod local;
/// `tracing-subscriber` setup.
pub mod logging;
/// Opaque gossip-peer references.
pub mod peer;
/// The `ChannelPersister` trait and an in-memory reference implementation.
pub mod persistence;
/// Staleness pruning.
pub mod pruning;
/// Observable effects of state transitions.
pub mod events;
/// Path finding & query service.
pub mod routing;
/// The single mutable state record owned by the router.
pub mod state;
/// The channel-range sync handshake.
pub mod sync;
/// Signature verification collaborator.
pub mod verifier;

mod router;

pub use router::{Router, RoutingStateSnapshot};

/// Deterministic test fixtures (pubkeys, etc). Always available to this
/// crate's own tests; exposed to downstream crates behind the `test-utils`
/// feature so integration tests can reuse them without pulling in their own
/// secp256k1 scaffolding.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
#[cfg(not(any(test, feature = "test-utils")))]
mod test_support;
