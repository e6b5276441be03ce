use bitcoin::secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

use crate::chain_hash::ChainHash;
use crate::short_channel_id::ShortChannelId;

/// A raw ECDSA signature. Verification is an external collaborator's
/// responsibility (see the `SignatureVerifier` trait in `router-core`); this
/// crate only carries the bytes around.
pub type Signature = [u8; 64];

/// The authenticated public declaration of a channel. Immutable once
/// accepted into `RouterState::channels`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelAnnouncement {
    pub short_channel_id: ShortChannelId,
    pub chain_hash: ChainHash,
    /// The lexicographically smaller of the two node public keys.
    pub node_id_1: PublicKey,
    /// The lexicographically larger of the two node public keys.
    pub node_id_2: PublicKey,
    pub bitcoin_key_1: PublicKey,
    pub bitcoin_key_2: PublicKey,
    #[serde(with = "BigArray")]
    pub node_signature_1: Signature,
    #[serde(with = "BigArray")]
    pub node_signature_2: Signature,
    #[serde(with = "BigArray")]
    pub bitcoin_signature_1: Signature,
    #[serde(with = "BigArray")]
    pub bitcoin_signature_2: Signature,
}

impl ChannelAnnouncement {
    /// The two endpoints in `(node_id_1, node_id_2)` order.
    pub fn node_ids(&self) -> (PublicKey, PublicKey) {
        (self.node_id_1, self.node_id_2)
    }

    pub fn involves(&self, node_id: &PublicKey) -> bool {
        &self.node_id_1 == node_id || &self.node_id_2 == node_id
    }
}

/// Per-BOLT7 `channel_flags`: bit 0 selects the direction (0 = node_id_1 is
/// the update's origin, 1 = node_id_2 is), bit 1 is the `disable` bit.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChannelFlags(pub u8);

impl ChannelFlags {
    pub const fn new(direction_is_node_2: bool, disabled: bool) -> Self {
        let mut flags = 0u8;
        if direction_is_node_2 {
            flags |= 0b01;
        }
        if disabled {
            flags |= 0b10;
        }
        Self(flags)
    }

    /// `false` means node_id_1 is the origin of this update; `true` means
    /// node_id_2 is.
    pub const fn direction_is_node_2(&self) -> bool {
        self.0 & 0b01 != 0
    }

    pub const fn enabled(&self) -> bool {
        self.0 & 0b10 == 0
    }
}

/// A directional, timestamped forwarding policy for one side of a channel.
/// At most one is retained per `(channel, direction)`: the one with the
/// highest `timestamp`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelUpdate {
    pub short_channel_id: ShortChannelId,
    pub chain_hash: ChainHash,
    #[serde(with = "BigArray")]
    pub signature: Signature,
    pub timestamp: u32,
    pub message_flags: u8,
    pub channel_flags: ChannelFlags,
    pub cltv_expiry_delta: u16,
    pub htlc_minimum_msat: u64,
    pub fee_base_msat: u32,
    pub fee_proportional_millionths: u32,
    pub htlc_maximum_msat: Option<u64>,
}

impl ChannelUpdate {
    pub fn is_enabled(&self) -> bool {
        self.channel_flags.enabled()
    }

    /// Fee to forward `amount_msat` under this policy.
    pub fn fee_msat(&self, amount_msat: u64) -> u64 {
        u64::from(self.fee_base_msat)
            + (amount_msat * u64::from(self.fee_proportional_millionths)) / 1_000_000
    }
}

/// Timestamped, signed self-description of a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeAnnouncement {
    pub node_id: PublicKey,
    #[serde(with = "BigArray")]
    pub signature: Signature,
    pub timestamp: u32,
    pub features: Vec<u8>,
    pub rgb_color: [u8; 3],
    pub alias: String,
    pub addresses: Vec<String>,
}
