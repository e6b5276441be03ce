use std::time::Duration;

use bitcoin::secp256k1::PublicKey;
use serde::{Deserialize, Serialize};

use crate::chain_hash::ChainHash;

/// Configuration the embedder hands to the router at construction time. This
/// crate does not parse a config file itself (that's the embedding node's
/// job); it just carries the already-resolved values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Period of the (no-op) `TickBroadcast` tick.
    pub broadcast_interval: Duration,
    /// How long a directional `ExcludeChannel` ban lasts before the router
    /// automatically lifts it.
    pub channel_exclude_duration: Duration,
    /// The chain this router serves. Gossip for a different chain is
    /// rejected as a protocol violation.
    pub chain_hash: ChainHash,
    /// This node's own identity, used to orient private channel updates
    /// (which side of `ChannelDesc` is `a` vs. `b`).
    pub node_id: PublicKey,
}
