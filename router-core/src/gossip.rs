//! Gossip ingestion & validation (§4.1): classifies each incoming channel
//! announcement, channel update, and node announcement against current
//! state; accepts, updates, stashes, or rejects it.

use bitcoin::secp256k1::PublicKey;
use router_types::{ChannelAnnouncement, ChannelUpdate, NodeAnnouncement, RouterError};
use tracing::debug;

use crate::events::RouterEvent;
use crate::peer::PeerId;
use crate::persistence::ChannelPersister;
use crate::state::{RouterState, Stashed};
use crate::verifier::SignatureVerifier;

/// The result of ingesting one gossip message: zero or more events to
/// publish, and an optional protocol error to send back to `origin`. The
/// caller always sends a bare acknowledgement regardless of either field
/// (§4.1: "all rejections still send a protocol acknowledgement").
#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub events: Vec<RouterEvent>,
    pub error: Option<RouterError>,
}

impl IngestOutcome {
    fn empty() -> Self {
        Self::default()
    }

    fn events(events: Vec<RouterEvent>) -> Self {
        Self { events, error: None }
    }

    fn protocol_violation(message: impl Into<String>) -> Self {
        Self {
            events: Vec::new(),
            error: Some(RouterError::ProtocolViolation(message.into())),
        }
    }
}

/// Process an inbound [`ChannelAnnouncement`]. Persistence failures are
/// fatal to the event loop (§7) and propagate as `Err`; everything else is
/// folded into the returned [`IngestOutcome`].
pub async fn ingest_channel_announcement<P: ChannelPersister, V: SignatureVerifier>(
    state: &mut RouterState,
    persister: &P,
    verifier: &V,
    announcement: ChannelAnnouncement,
    origin: PeerId,
) -> Result<IngestOutcome, RouterError> {
    let short_channel_id = announcement.short_channel_id;

    if state.channels.contains_key(&short_channel_id) {
        debug!(%short_channel_id, "duplicate channel announcement");
        return Ok(IngestOutcome::empty());
    }

    if let Some(awaiting) = state.awaiting.get_mut(&short_channel_id) {
        awaiting.origins.push(origin);
        return Ok(IngestOutcome::empty());
    }

    if !verifier.verify_channel_announcement(&announcement) {
        return Ok(IngestOutcome::protocol_violation(format!(
            "bad signature(s) on channel announcement {short_channel_id}"
        )));
    }

    persister.add_channel(&announcement).await?;
    state.private_channels.remove(&short_channel_id);
    let (node_1, node_2) = announcement.node_ids();
    state.channels.insert(short_channel_id, announcement);

    let mut events = Vec::new();
    for stashed in state.drain_stashed_updates_for(short_channel_id) {
        events.extend(apply_accepted_update(state, persister, stashed).await?);
    }
    for stashed in state.drain_stashed_nodes_for(&[node_1, node_2]) {
        events.extend(apply_accepted_node(state, persister, stashed).await?);
    }

    Ok(IngestOutcome::events(events))
}

/// Re-run the "channel is accepted" branch of update ingestion for a
/// previously stashed update, now that its channel has graduated out of
/// `awaiting`.
async fn apply_accepted_update<P: ChannelPersister>(
    state: &mut RouterState,
    persister: &P,
    stashed: Stashed<router_types::ChannelDesc, ChannelUpdate>,
) -> Result<Vec<RouterEvent>, RouterError> {
    let desc = stashed.key;
    let update = stashed.message;
    if let Some(existing) = state.updates.get(&desc) {
        if existing.timestamp >= update.timestamp {
            return Ok(Vec::new());
        }
    }
    persister.update_channel_update(&update).await?;
    state.apply_public_update(desc, update);
    Ok(vec![RouterEvent::ChannelUpdateReceived(desc)])
}

async fn apply_accepted_node<P: ChannelPersister>(
    state: &mut RouterState,
    persister: &P,
    stashed: Stashed<PublicKey, NodeAnnouncement>,
) -> Result<Vec<RouterEvent>, RouterError> {
    let node = stashed.message;
    if let Some(existing) = state.nodes.get(&node.node_id) {
        if existing.timestamp >= node.timestamp {
            return Ok(Vec::new());
        }
    }
    if state.nodes.contains_key(&node.node_id) {
        persister.update_node(&node).await?;
        state.nodes.insert(node.node_id, node.clone());
        Ok(vec![RouterEvent::NodeUpdated(node)])
    } else {
        persister.add_node(&node).await?;
        state.nodes.insert(node.node_id, node.clone());
        Ok(vec![RouterEvent::NodeDiscovered(node)])
    }
}

/// Process an inbound [`ChannelUpdate`]. `local_node_id` is only consulted
/// for the private-channel branch.
pub async fn ingest_channel_update<P: ChannelPersister, V: SignatureVerifier>(
    state: &mut RouterState,
    persister: &P,
    verifier: &V,
    local_node_id: PublicKey,
    update: ChannelUpdate,
    origin: PeerId,
) -> Result<IngestOutcome, RouterError> {
    let short_channel_id = update.short_channel_id;

    if state.channels.contains_key(&short_channel_id) {
        let desc = state
            .public_desc_for(&update)
            .expect("just checked channels contains short_channel_id");

        if let Some(existing) = state.updates.get(&desc) {
            if existing.timestamp >= update.timestamp {
                return Ok(IngestOutcome::empty());
            }
        }
        if !verifier.verify_channel_update(&desc.a, &update) {
            return Ok(IngestOutcome::protocol_violation(format!(
                "bad signature on channel update {short_channel_id}"
            )));
        }
        persister.update_channel_update(&update).await?;
        state.apply_public_update(desc, update);
        return Ok(IngestOutcome::events(vec![RouterEvent::ChannelUpdateReceived(desc)]));
    }

    if let Some(awaiting) = state.awaiting.get(&short_channel_id) {
        let desc = state.desc_from_announcement(&awaiting.announcement, update.channel_flags.direction_is_node_2());
        match state.take_stashed_update(&desc) {
            Some(mut stashed) => {
                stashed.origins.push(origin);
                stashed.message = update;
                state.stash_updates.push(stashed);
            }
            None => state.stash_updates.push(Stashed {
                key: desc,
                message: update,
                origins: vec![origin],
            }),
        }
        return Ok(IngestOutcome::empty());
    }

    if state.private_channels.contains_key(&short_channel_id) {
        let desc = state
            .private_desc_for(short_channel_id, local_node_id, &update)
            .expect("just checked private_channels contains short_channel_id");

        if let Some(existing) = state.private_updates.get(&desc) {
            if existing.timestamp >= update.timestamp {
                return Ok(IngestOutcome::empty());
            }
        }
        if !verifier.verify_channel_update(&desc.a, &update) {
            return Ok(IngestOutcome::protocol_violation(format!(
                "bad signature on private channel update {short_channel_id}"
            )));
        }
        state.apply_private_update(desc, update);
        return Ok(IngestOutcome::events(vec![RouterEvent::ChannelUpdateReceived(desc)]));
    }

    debug!(%short_channel_id, "update for unknown channel, dropping");
    Ok(IngestOutcome::empty())
}

/// Process an inbound [`NodeAnnouncement`].
pub async fn ingest_node_announcement<P: ChannelPersister, V: SignatureVerifier>(
    state: &mut RouterState,
    persister: &P,
    verifier: &V,
    node: NodeAnnouncement,
    origin: PeerId,
) -> Result<IngestOutcome, RouterError> {
    if let Some(stashed) = state.find_stashed_node(&node.node_id) {
        stashed.origins.push(origin);
        return Ok(IngestOutcome::empty());
    }

    if let Some(existing) = state.nodes.get(&node.node_id) {
        if existing.timestamp >= node.timestamp {
            return Ok(IngestOutcome::empty());
        }
    }

    if !verifier.verify_node_announcement(&node) {
        return Ok(IngestOutcome::protocol_violation(format!(
            "bad signature on node announcement {}",
            node.node_id
        )));
    }

    if state.nodes.contains_key(&node.node_id) {
        persister.update_node(&node).await?;
        state.nodes.insert(node.node_id, node.clone());
        return Ok(IngestOutcome::events(vec![RouterEvent::NodeUpdated(node)]));
    }

    if state.node_is_in_accepted_channel(&node.node_id) {
        persister.add_node(&node).await?;
        state.nodes.insert(node.node_id, node.clone());
        return Ok(IngestOutcome::events(vec![RouterEvent::NodeDiscovered(node)]));
    }

    if state.node_is_in_awaiting_channel(&node.node_id) {
        state.stash_nodes.push(Stashed {
            key: node.node_id,
            message: node,
            origins: vec![origin],
        });
        return Ok(IngestOutcome::empty());
    }

    debug!(node_id = %node.node_id, "node announcement references no known channel, discarding");
    persister.remove_node(node.node_id).await?;
    Ok(IngestOutcome::empty())
}

#[cfg(test)]
mod test {
    use router_types::{ChainHash, ChannelFlags, ShortChannelId};

    use super::*;
    use crate::persistence::InMemoryStore;
    use crate::test_support::test_pubkey;
    use crate::verifier::AcceptAllVerifier;

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

    fn update(scid: ShortChannelId, timestamp: u32, fee_base_msat: u32, fee_proportional_millionths: u32) -> ChannelUpdate {
        ChannelUpdate {
            short_channel_id: scid,
            chain_hash: ChainHash([0u8; 32]),
            signature: [0u8; 64],
            timestamp,
            message_flags: 0,
            channel_flags: ChannelFlags::new(false, false),
            cltv_expiry_delta: 40,
            htlc_minimum_msat: 1,
            fee_base_msat,
            fee_proportional_millionths,
            htlc_maximum_msat: None,
        }
    }

    // S1 from the scenario table: channel then update.
    #[tokio::test]
    async fn channel_then_update_populates_state_and_graph() {
        let mut state = RouterState::new();
        let persister = InMemoryStore::new();
        let verifier = AcceptAllVerifier;
        let a = test_pubkey(1);
        let b = test_pubkey(2);
        let scid = ShortChannelId::new(1, 2, 3);

        ingest_channel_announcement(&mut state, &persister, &verifier, announcement(scid, a, b), PeerId(1))
            .await
            .unwrap();
        assert_eq!(state.channels.len(), 1);

        let outcome = ingest_channel_update(&mut state, &persister, &verifier, a, update(scid, 1000, 1000, 100), PeerId(1))
            .await
            .unwrap();
        assert!(outcome.error.is_none());
        assert_eq!(outcome.events.len(), 1);

        let desc = router_types::ChannelDesc::new(scid, a, b);
        assert_eq!(state.updates.len(), 1);
        assert!(state.updates.contains_key(&desc));

        let path = state.graph.shortest_path(a, b).expect("edge should exist");
        assert_eq!(path[0].update.fee_msat(10_000_000), 2000);
    }

    // S2 from the scenario table: a strictly older update is a no-op.
    #[tokio::test]
    async fn stale_update_is_rejected() {
        let mut state = RouterState::new();
        let persister = InMemoryStore::new();
        let verifier = AcceptAllVerifier;
        let a = test_pubkey(1);
        let b = test_pubkey(2);
        let scid = ShortChannelId::new(1, 2, 3);

        ingest_channel_announcement(&mut state, &persister, &verifier, announcement(scid, a, b), PeerId(1))
            .await
            .unwrap();
        ingest_channel_update(&mut state, &persister, &verifier, a, update(scid, 1000, 1000, 100), PeerId(1))
            .await
            .unwrap();

        let outcome = ingest_channel_update(&mut state, &persister, &verifier, a, update(scid, 999, 1, 1), PeerId(1))
            .await
            .unwrap();
        assert!(outcome.events.is_empty());
        assert!(outcome.error.is_none());

        let desc = router_types::ChannelDesc::new(scid, a, b);
        assert_eq!(state.updates.get(&desc).unwrap().timestamp, 1000);
    }

    #[tokio::test]
    async fn update_for_unknown_channel_is_silently_dropped() {
        let mut state = RouterState::new();
        let persister = InMemoryStore::new();
        let verifier = AcceptAllVerifier;
        let a = test_pubkey(1);
        let scid = ShortChannelId::new(9, 0, 0);

        let outcome = ingest_channel_update(&mut state, &persister, &verifier, a, update(scid, 1, 1, 1), PeerId(1))
            .await
            .unwrap();
        assert!(outcome.events.is_empty());
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn duplicate_channel_announcement_is_a_no_op() {
        let mut state = RouterState::new();
        let persister = InMemoryStore::new();
        let verifier = AcceptAllVerifier;
        let a = test_pubkey(1);
        let b = test_pubkey(2);
        let scid = ShortChannelId::new(1, 2, 3);

        ingest_channel_announcement(&mut state, &persister, &verifier, announcement(scid, a, b), PeerId(1))
            .await
            .unwrap();
        let outcome = ingest_channel_announcement(&mut state, &persister, &verifier, announcement(scid, a, b), PeerId(2))
            .await
            .unwrap();
        assert!(outcome.events.is_empty());
        assert_eq!(state.channels.len(), 1);
    }
}
