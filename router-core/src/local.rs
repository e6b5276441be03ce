//! Local & chain events (§4.6): lifecycle notifications about our own
//! channels, and on-chain funding spends, as opposed to gossip received
//! from peers.

use bitcoin::secp256k1::PublicKey;
use router_types::{ChannelAnnouncement, ChannelUpdate, RouterError, ShortChannelId};

use crate::events::RouterEvent;
use crate::gossip::{self, IngestOutcome};
use crate::peer::PeerId;
use crate::persistence::ChannelPersister;
use crate::state::RouterState;
use crate::verifier::SignatureVerifier;

/// A reserved origin used when a local event is routed through the same
/// ingestion paths as real gossip. Never visible to a real peer.
const LOCAL_ORIGIN: PeerId = PeerId(0);

/// A locally-sourced channel policy (our own channel-state machine telling
/// us its current forwarding policy), with an optional announcement for
/// channels that are only now being made public.
#[derive(Clone, Debug)]
pub struct LocalChannelUpdate {
    pub short_channel_id: ShortChannelId,
    pub remote_node_id: PublicKey,
    pub announcement: Option<ChannelAnnouncement>,
    pub update: ChannelUpdate,
}

/// A local channel has closed or otherwise stopped forwarding.
#[derive(Clone, Copy, Debug)]
pub struct LocalChannelDown {
    pub short_channel_id: ShortChannelId,
}

/// The chain watcher reports that `short_channel_id`'s funding output was
/// spent.
#[derive(Clone, Copy, Debug)]
pub struct ExternalFundingSpent {
    pub short_channel_id: ShortChannelId,
}

pub async fn on_local_channel_update<P: ChannelPersister, V: SignatureVerifier>(
    state: &mut RouterState,
    persister: &P,
    verifier: &V,
    local_node_id: PublicKey,
    event: LocalChannelUpdate,
) -> Result<IngestOutcome, RouterError> {
    if state.channels.contains_key(&event.short_channel_id) {
        return gossip::ingest_channel_update(state, persister, verifier, local_node_id, event.update, LOCAL_ORIGIN).await;
    }

    if let Some(announcement) = event.announcement {
        if state.channels.contains_key(&announcement.short_channel_id) || state.awaiting.contains_key(&announcement.short_channel_id) {
            let outcome = gossip::ingest_channel_announcement(state, persister, verifier, announcement, LOCAL_ORIGIN).await?;
            let update_outcome =
                gossip::ingest_channel_update(state, persister, verifier, local_node_id, event.update, LOCAL_ORIGIN).await?;
            return Ok(merge(outcome, update_outcome));
        }
    }

    if !state.private_channels.contains_key(&event.short_channel_id) {
        state.private_channels.insert(event.short_channel_id, event.remote_node_id);
    }
    gossip::ingest_channel_update(state, persister, verifier, local_node_id, event.update, LOCAL_ORIGIN).await
}

fn merge(mut first: IngestOutcome, second: IngestOutcome) -> IngestOutcome {
    first.events.extend(second.events);
    first.error = first.error.or(second.error);
    first
}

/// Remove `short_channel_id` from `private_channels` and drop every
/// `private_updates` entry for it.
pub fn on_local_channel_down(state: &mut RouterState, event: LocalChannelDown) {
    state.private_channels.remove(&event.short_channel_id);
    state.private_updates.retain(|desc, _| desc.short_channel_id != event.short_channel_id);
}

/// Treat a spent funding output as channel loss: remove the channel, both
/// graph edges, both update rows, delete from persistence, and clean up any
/// endpoint left orphaned.
pub async fn on_external_funding_spent<P: ChannelPersister>(
    state: &mut RouterState,
    persister: &P,
    event: ExternalFundingSpent,
) -> Result<Vec<RouterEvent>, RouterError> {
    let Some(announcement) = state.channels.remove(&event.short_channel_id) else {
        return Ok(Vec::new());
    };

    let (node_1, node_2) = announcement.node_ids();
    state.remove_channel_edges(&announcement);
    persister.remove_channel(event.short_channel_id).await?;

    let mut events = vec![RouterEvent::ChannelLost(event.short_channel_id)];
    for node_id in [node_1, node_2] {
        if !state.node_is_in_accepted_channel(&node_id) {
            state.nodes.remove(&node_id);
            state.graph.forget_orphan_node(&node_id);
            persister.remove_node(node_id).await?;
            events.push(RouterEvent::NodeLost(node_id));
        }
    }
    Ok(events)
}

#[cfg(test)]
mod test {
    use router_types::{ChainHash, ChannelFlags};

    use super::*;
    use crate::persistence::InMemoryStore;
    use crate::test_support::test_pubkey;
    use crate::verifier::AcceptAllVerifier;

    fn update(scid: ShortChannelId, timestamp: u32) -> ChannelUpdate {
        ChannelUpdate {
            short_channel_id: scid,
            chain_hash: ChainHash([0u8; 32]),
            signature: [0u8; 64],
            timestamp,
            message_flags: 0,
            channel_flags: ChannelFlags::new(false, false),
            cltv_expiry_delta: 40,
            htlc_minimum_msat: 1,
            fee_base_msat: 1,
            fee_proportional_millionths: 0,
            htlc_maximum_msat: None,
        }
    }

    #[tokio::test]
    async fn first_local_update_creates_a_private_channel_and_edge() {
        let mut state = RouterState::new();
        let persister = InMemoryStore::new();
        let verifier = AcceptAllVerifier;
        let local = test_pubkey(1);
        let remote = test_pubkey(2);
        let scid = ShortChannelId::new(1, 0, 0);

        on_local_channel_update(
            &mut state,
            &persister,
            &verifier,
            local,
            LocalChannelUpdate {
                short_channel_id: scid,
                remote_node_id: remote,
                announcement: None,
                update: update(scid, 1),
            },
        )
        .await
        .unwrap();

        assert_eq!(state.private_channels.get(&scid), Some(&remote));
        assert!(state.graph.contains_edge(&router_types::ChannelDesc::new(scid, local, remote)));
    }

    #[tokio::test]
    async fn channel_down_clears_private_state() {
        let mut state = RouterState::new();
        let remote = test_pubkey(2);
        let scid = ShortChannelId::new(1, 0, 0);
        state.private_channels.insert(scid, remote);
        state
            .private_updates
            .insert(router_types::ChannelDesc::new(scid, test_pubkey(1), remote), update(scid, 1));

        on_local_channel_down(&mut state, LocalChannelDown { short_channel_id: scid });

        assert!(!state.private_channels.contains_key(&scid));
        assert!(state.private_updates.is_empty());
    }

    #[tokio::test]
    async fn funding_spent_removes_channel_and_orphaned_endpoints() {
        let mut state = RouterState::new();
        let persister = InMemoryStore::new();
        let a = test_pubkey(1);
        let b = test_pubkey(2);
        let scid = ShortChannelId::new(1, 0, 0);
        state.channels.insert(
            scid,
            ChannelAnnouncement {
                short_channel_id: scid,
                chain_hash: ChainHash([0u8; 32]),
                node_id_1: a,
                node_id_2: b,
                bitcoin_key_1: a,
                bitcoin_key_2: b,
                node_signature_1: [0u8; 64],
                node_signature_2: [0u8; 64],
                bitcoin_signature_1: [0u8; 64],
                bitcoin_signature_2: [0u8; 64],
            },
        );

        let events = on_external_funding_spent(&mut state, &persister, ExternalFundingSpent { short_channel_id: scid })
            .await
            .unwrap();

        assert!(state.channels.is_empty());
        assert!(events.contains(&RouterEvent::ChannelLost(scid)));
        assert_eq!(events.iter().filter(|e| matches!(e, RouterEvent::NodeLost(_))).count(), 2);
    }
}
