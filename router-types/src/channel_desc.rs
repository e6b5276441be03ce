use bitcoin::secp256k1::PublicKey;
use serde::{Deserialize, Serialize};

use crate::messages::ChannelUpdate;
use crate::short_channel_id::ShortChannelId;

/// A directed edge key: the channel it belongs to, the node the update
/// originates from (`a`), and its counterpart (`b`). A channel has exactly
/// two `ChannelDesc`s, one per direction.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ChannelDesc {
    pub short_channel_id: ShortChannelId,
    pub a: PublicKey,
    pub b: PublicKey,
}

impl ChannelDesc {
    pub fn new(short_channel_id: ShortChannelId, a: PublicKey, b: PublicKey) -> Self {
        Self {
            short_channel_id,
            a,
            b,
        }
    }

    /// The `ChannelDesc` for the opposite direction of the same channel.
    pub fn reversed(&self) -> Self {
        Self {
            short_channel_id: self.short_channel_id,
            a: self.b,
            b: self.a,
        }
    }
}

/// One directed edge traversed by a payment: the two endpoints and the
/// policy that was used to price the hop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hop {
    pub a: PublicKey,
    pub b: PublicKey,
    pub update: ChannelUpdate,
}
