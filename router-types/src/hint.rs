use bitcoin::secp256k1::PublicKey;
use serde::{Deserialize, Serialize};

use crate::short_channel_id::ShortChannelId;

/// One hop of a caller-supplied routing hint ("assisted route"). A sequence
/// of these, terminated implicitly by the query's `target`, is converted
/// into synthetic, always-enabled `ChannelDesc -> ChannelUpdate` overlay
/// entries for the duration of a single route query. See §4.3.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteHintHop {
    pub node_id: PublicKey,
    pub short_channel_id: ShortChannelId,
    pub fee_base_msat: u32,
    pub fee_proportional_millionths: u32,
    pub cltv_expiry_delta: u16,
}

/// An ordered sequence of [`RouteHintHop`]s describing a private path from
/// some node toward the query's `target`.
pub type RouteHint = Vec<RouteHintHop>;
