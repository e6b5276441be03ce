//! Observable effects of router state transitions, fanned out on
//! [`router_tokio::events_bus::EventsBus`] the same way `lexe-ln` publishes
//! payment and channel lifecycle events to its subscribers.

use bitcoin::secp256k1::PublicKey;
use router_types::{ChannelDesc, NodeAnnouncement, ShortChannelId};

/// Something callers/subscribers may care about that happened as a side
/// effect of processing gossip, a sync reply, a tick, or a local event.
#[derive(Clone, Debug, PartialEq)]
pub enum RouterEvent {
    /// A directional channel policy was accepted and is now (or still)
    /// reflected in the graph.
    ChannelUpdateReceived(ChannelDesc),
    /// A channel (both directions) was removed, whether by staleness
    /// pruning or by `ExternalFundingSpent`.
    ChannelLost(ShortChannelId),
    /// A node was seen for the first time.
    NodeDiscovered(NodeAnnouncement),
    /// A newer announcement superseded a previously known one for the same
    /// node id.
    NodeUpdated(NodeAnnouncement),
    /// A node was dropped because it had no remaining incident channels.
    NodeLost(PublicKey),
}
