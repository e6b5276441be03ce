//! Shared data types for the Lightning routing core: the wire-level gossip
//! records, the derived graph edge key, routing hints, configuration, and
//! the typed errors the router can return. Kept free of any event-loop or
//! graph-algorithm logic so it can be depended on by both `router-core` and
//! an embedding node's other components without pulling in `tokio` or
//! `petgraph`.

/// Directed edge key over the routing graph, and the `Hop` type returned by
/// a successful route query.
pub mod channel_desc;
/// The chain this router serves.
pub mod chain_hash;
/// Hard-coded thresholds and the path-finding reference amount.
pub mod constants;
/// Embedder-supplied configuration.
pub mod config;
/// Typed error surface.
pub mod error;
/// Caller-supplied routing hints ("assisted routes").
pub mod hint;
/// Gossip message types: `ChannelAnnouncement`, `ChannelUpdate`,
/// `NodeAnnouncement`.
pub mod messages;
/// The packed 64-bit outpoint identifier.
pub mod short_channel_id;

pub use channel_desc::{ChannelDesc, Hop};
pub use chain_hash::ChainHash;
pub use config::RouterConfig;
pub use error::{PersistError, RouterError};
pub use hint::{RouteHint, RouteHintHop};
pub use messages::{ChannelAnnouncement, ChannelFlags, ChannelUpdate, NodeAnnouncement, Signature};
pub use short_channel_id::ShortChannelId;
