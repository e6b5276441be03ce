//! Staleness pruning (§4.5): periodically drops channels whose funding is
//! old and whose policies haven't been refreshed in a long time, then drops
//! any node left with no remaining channel.

use router_types::constants::{STALE_CHANNEL_BLOCKS, STALE_CHANNEL_SECONDS};
use router_types::ShortChannelId;

use crate::events::RouterEvent;
use crate::persistence::ChannelPersister;
use crate::state::RouterState;

/// `true` if `short_channel_id`'s funding height is more than
/// [`STALE_CHANNEL_BLOCKS`] behind `current_block`, AND every known
/// directional update for it (if any) is older than `now - 1_209_600s`, OR
/// no update is known at all. A channel with no updates yet stays valid
/// until both clocks expire, per §4.5.
pub fn is_stale(state: &RouterState, current_block: u32, short_channel_id: ShortChannelId) -> bool {
    is_stale_at(state, current_block, now_unix_seconds(), short_channel_id)
}

fn is_stale_at(state: &RouterState, current_block: u32, now: u64, short_channel_id: ShortChannelId) -> bool {
    let height_is_old = u64::from(short_channel_id.block_height()) + u64::from(STALE_CHANNEL_BLOCKS) < u64::from(current_block);
    if !height_is_old {
        return false;
    }

    let Some(announcement) = state.channels.get(&short_channel_id) else {
        return false;
    };
    let (node_1, node_2) = announcement.node_ids();
    let forward = router_types::ChannelDesc::new(short_channel_id, node_1, node_2);
    let backward = forward.reversed();

    let newest_update_timestamp = [state.updates.get(&forward), state.updates.get(&backward)]
        .into_iter()
        .flatten()
        .map(|update| u64::from(update.timestamp))
        .max();

    match newest_update_timestamp {
        None => true,
        Some(timestamp) => timestamp + STALE_CHANNEL_SECONDS < now,
    }
}

fn now_unix_seconds() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_secs()
}

/// Run one `TickPruneStaleChannels` pass. Returns the events to publish.
/// Persistence failures are fatal and propagate as `Err`, matching the rest
/// of the gossip-ingestion surface.
pub async fn prune_stale_channels<P: ChannelPersister>(
    state: &mut RouterState,
    persister: &P,
    current_block: u32,
) -> Result<Vec<RouterEvent>, router_types::RouterError> {
    let now = now_unix_seconds();
    let stale_ids: Vec<ShortChannelId> = state
        .channels
        .keys()
        .copied()
        .filter(|&id| is_stale_at(state, current_block, now, id))
        .collect();

    let mut events = Vec::new();
    let mut touched_nodes = std::collections::HashSet::new();

    for short_channel_id in stale_ids {
        let Some(announcement) = state.channels.remove(&short_channel_id) else {
            continue;
        };
        let (node_1, node_2) = announcement.node_ids();
        touched_nodes.insert(node_1);
        touched_nodes.insert(node_2);
        state.remove_channel_edges(&announcement);
        persister.remove_channel(short_channel_id).await?;
        events.push(RouterEvent::ChannelLost(short_channel_id));
    }

    for node_id in touched_nodes {
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
    use bitcoin::secp256k1::PublicKey;
    use router_types::{ChainHash, ChannelAnnouncement};

    use super::*;
    use crate::persistence::InMemoryStore;
    use crate::test_support::test_pubkey;

    fn announcement(scid: ShortChannelId, a: PublicKey, b: PublicKey) -> ChannelAnnouncement {
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
        }
    }

    // S5 from the scenario table.
    #[tokio::test]
    async fn prunes_old_channel_with_no_updates_and_orphaned_endpoints() {
        let mut state = RouterState::new();
        let persister = InMemoryStore::new();
        let a = test_pubkey(1);
        let b = test_pubkey(2);
        let current_block = 10_000;
        let funding_height = current_block - 3000;
        let scid = ShortChannelId::new(funding_height, 0, 0);
        state.channels.insert(scid, announcement(scid, a, b));

        let events = prune_stale_channels(&mut state, &persister, current_block).await.unwrap();

        assert!(state.channels.is_empty());
        assert!(events.contains(&RouterEvent::ChannelLost(scid)));
        assert!(events.iter().any(|e| matches!(e, RouterEvent::NodeLost(_))));
        assert!(persister.list_channels().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recent_channel_with_no_updates_survives() {
        let mut state = RouterState::new();
        let persister = InMemoryStore::new();
        let a = test_pubkey(1);
        let b = test_pubkey(2);
        let current_block = 10_000;
        let scid = ShortChannelId::new(current_block - 10, 0, 0);
        state.channels.insert(scid, announcement(scid, a, b));

        let events = prune_stale_channels(&mut state, &persister, current_block).await.unwrap();

        assert!(events.is_empty());
        assert_eq!(state.channels.len(), 1);
    }
}
