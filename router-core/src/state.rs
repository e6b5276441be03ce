//! The single mutable state record owned by the router (§3). Everything in
//! here is plain data plus small invariant-preserving helpers; the async
//! orchestration that drives persistence and signature verification around
//! these helpers lives in [`crate::gossip`], [`crate::routing`],
//! [`crate::sync`], [`crate::pruning`], and [`crate::local`].

use std::collections::{BTreeMap, HashMap, HashSet};

use bitcoin::secp256k1::PublicKey;
use router_types::{ChannelAnnouncement, ChannelDesc, ChannelUpdate, NodeAnnouncement, ShortChannelId};

use crate::graph::RoutingGraph;
use crate::peer::PeerId;

/// A channel announcement currently under signature validation, plus every
/// peer that independently delivered it. `origins[0]` is the one to
/// acknowledge first.
#[derive(Clone, Debug)]
pub struct AwaitingEntry {
    pub announcement: ChannelAnnouncement,
    pub origins: Vec<PeerId>,
}

/// A gossip item held back because its parent channel is still `awaiting`.
/// Kept as a flat, insertion-ordered `Vec` rather than a map: the spec notes
/// stashing exists only for out-of-order arrival and will rarely hold more
/// than a handful of entries at once, so a linear scan to find-or-insert is
/// the simplest correct thing.
#[derive(Clone, Debug)]
pub struct Stashed<K, V> {
    pub key: K,
    pub message: V,
    pub origins: Vec<PeerId>,
}

/// The full mutable state of the routing core (§3).
#[derive(Clone, Debug, Default)]
pub struct RouterState {
    pub nodes: HashMap<PublicKey, NodeAnnouncement>,
    /// Ordered by ascending unsigned short-channel-id; load-bearing for
    /// §4.4's sync handshake.
    pub channels: BTreeMap<ShortChannelId, ChannelAnnouncement>,
    pub updates: HashMap<ChannelDesc, ChannelUpdate>,
    pub awaiting: HashMap<ShortChannelId, AwaitingEntry>,
    pub stash_updates: Vec<Stashed<ChannelDesc, ChannelUpdate>>,
    pub stash_nodes: Vec<Stashed<PublicKey, NodeAnnouncement>>,
    pub private_channels: HashMap<ShortChannelId, PublicKey>,
    pub private_updates: HashMap<ChannelDesc, ChannelUpdate>,
    pub excluded_channels: HashSet<ChannelDesc>,
    pub graph: RoutingGraph,
}

impl RouterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild state (and the graph) from a persisted snapshot, as done once
    /// at startup. Node announcements are intentionally not part of the
    /// snapshot (see the Open Questions recorded in `DESIGN.md`).
    pub fn from_snapshot(
        channels: BTreeMap<ShortChannelId, ChannelAnnouncement>,
        updates: Vec<ChannelUpdate>,
    ) -> Self {
        let mut state = Self {
            channels,
            ..Self::default()
        };
        for update in updates {
            let Some(desc) = state.public_desc_for(&update) else {
                continue;
            };
            state.updates.insert(desc, update.clone());
            state.graph.add_edge(desc, update);
        }
        state
    }

    /// `desc = (shortId, a, b)` for a public update, where `a` is node1 iff
    /// the direction bit is 0. `None` if the update's channel is unknown.
    pub fn public_desc_for(&self, update: &ChannelUpdate) -> Option<ChannelDesc> {
        let announcement = self.channels.get(&update.short_channel_id)?;
        Some(self.desc_from_announcement(announcement, update.channel_flags.direction_is_node_2()))
    }

    pub fn desc_from_announcement(&self, announcement: &ChannelAnnouncement, direction_is_node_2: bool) -> ChannelDesc {
        let (node_1, node_2) = announcement.node_ids();
        if direction_is_node_2 {
            ChannelDesc::new(announcement.short_channel_id, node_2, node_1)
        } else {
            ChannelDesc::new(announcement.short_channel_id, node_1, node_2)
        }
    }

    /// `desc` for a private update: the direction bit chooses which of
    /// `{local_node_id, remote_node_id}` is `a`.
    pub fn private_desc_for(&self, short_channel_id: ShortChannelId, local_node_id: PublicKey, update: &ChannelUpdate) -> Option<ChannelDesc> {
        let remote_node_id = *self.private_channels.get(&short_channel_id)?;
        Some(if update.channel_flags.direction_is_node_2() {
            ChannelDesc::new(short_channel_id, remote_node_id, local_node_id)
        } else {
            ChannelDesc::new(short_channel_id, local_node_id, remote_node_id)
        })
    }

    pub fn is_known_channel(&self, short_channel_id: ShortChannelId) -> bool {
        self.channels.contains_key(&short_channel_id) || self.private_channels.contains_key(&short_channel_id)
    }

    /// Find (and remove) the stashed update matching `desc`, if any.
    pub fn take_stashed_update(&mut self, desc: &ChannelDesc) -> Option<Stashed<ChannelDesc, ChannelUpdate>> {
        let index = self.stash_updates.iter().position(|s| &s.key == desc)?;
        Some(self.stash_updates.remove(index))
    }

    /// Drain every update stashed under the channel `short_channel_id`
    /// (either direction), in the order they were received.
    pub fn drain_stashed_updates_for(&mut self, short_channel_id: ShortChannelId) -> Vec<Stashed<ChannelDesc, ChannelUpdate>> {
        let (matching, rest): (Vec<_>, Vec<_>) = self
            .stash_updates
            .drain(..)
            .partition(|s| s.key.short_channel_id == short_channel_id);
        self.stash_updates = rest;
        matching
    }

    pub fn find_stashed_node(&mut self, node_id: &PublicKey) -> Option<&mut Stashed<PublicKey, NodeAnnouncement>> {
        self.stash_nodes.iter_mut().find(|s| &s.key == node_id)
    }

    /// Drain every node announcement stashed for any node referenced by
    /// `short_channel_id`'s channel.
    pub fn drain_stashed_nodes_for(&mut self, node_ids: &[PublicKey]) -> Vec<Stashed<PublicKey, NodeAnnouncement>> {
        let (matching, rest): (Vec<_>, Vec<_>) = self
            .stash_nodes
            .drain(..)
            .partition(|s| node_ids.contains(&s.key));
        self.stash_nodes = rest;
        matching
    }

    /// `true` if some accepted channel references `node_id`.
    pub fn node_is_in_accepted_channel(&self, node_id: &PublicKey) -> bool {
        self.channels.values().any(|c| c.involves(node_id))
    }

    /// `true` if some channel still under validation references `node_id`.
    pub fn node_is_in_awaiting_channel(&self, node_id: &PublicKey) -> bool {
        self.awaiting.values().any(|a| a.announcement.involves(node_id))
    }

    /// Replace (or insert) `updates[desc]` and rebuild its graph edge.
    pub fn apply_public_update(&mut self, desc: ChannelDesc, update: ChannelUpdate) {
        self.updates.insert(desc, update.clone());
        self.graph.apply_update(desc, update);
    }

    pub fn apply_private_update(&mut self, desc: ChannelDesc, update: ChannelUpdate) {
        self.private_updates.insert(desc, update.clone());
        self.graph.apply_update(desc, update);
    }

    /// Remove both directional entries for a channel from `updates` and the
    /// graph. Used by pruning and `ExternalFundingSpent`.
    pub fn remove_channel_edges(&mut self, announcement: &ChannelAnnouncement) {
        let (node_1, node_2) = announcement.node_ids();
        let forward = ChannelDesc::new(announcement.short_channel_id, node_1, node_2);
        let backward = forward.reversed();
        self.updates.remove(&forward);
        self.updates.remove(&backward);
        self.graph.remove_edge(&forward);
        self.graph.remove_edge(&backward);
    }
}

#[cfg(test)]
mod test {
    use router_types::{ChainHash, ChannelFlags};

    use super::*;
    use crate::test_support::test_pubkey;

    fn announcement(scid: ShortChannelId, node_1: PublicKey, node_2: PublicKey) -> ChannelAnnouncement {
        ChannelAnnouncement {
            short_channel_id: scid,
            chain_hash: ChainHash([0u8; 32]),
            node_id_1: node_1,
            node_id_2: node_2,
            bitcoin_key_1: node_1,
            bitcoin_key_2: node_2,
            node_signature_1: [0u8; 64],
            node_signature_2: [0u8; 64],
            bitcoin_signature_1: [0u8; 64],
            bitcoin_signature_2: [0u8; 64],
        }
    }

    #[test]
    fn desc_from_announcement_honors_direction_bit() {
        let state = RouterState::new();
        let a = test_pubkey(1);
        let b = test_pubkey(2);
        let scid = ShortChannelId::new(1, 0, 0);
        let announcement = announcement(scid, a, b);

        let forward = state.desc_from_announcement(&announcement, false);
        assert_eq!((forward.a, forward.b), (a, b));

        let backward = state.desc_from_announcement(&announcement, true);
        assert_eq!((backward.a, backward.b), (b, a));
    }

    #[test]
    fn stash_drains_in_insertion_order() {
        let mut state = RouterState::new();
        let a = test_pubkey(1);
        let b = test_pubkey(2);
        let scid = ShortChannelId::new(1, 0, 0);
        let desc = ChannelDesc::new(scid, a, b);
        let update = ChannelUpdate {
            short_channel_id: scid,
            chain_hash: ChainHash([0u8; 32]),
            signature: [0u8; 64],
            timestamp: 1,
            message_flags: 0,
            channel_flags: ChannelFlags::new(false, false),
            cltv_expiry_delta: 1,
            htlc_minimum_msat: 1,
            fee_base_msat: 1,
            fee_proportional_millionths: 1,
            htlc_maximum_msat: None,
        };
        state.stash_updates.push(Stashed {
            key: desc,
            message: update,
            origins: vec![PeerId(1)],
        });

        let drained = state.drain_stashed_updates_for(scid);
        assert_eq!(drained.len(), 1);
        assert!(state.stash_updates.is_empty());
    }
}
