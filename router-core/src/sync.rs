//! Synchronization handshake (§4.4): querying a peer for channel ids we
//! might be missing, and computing the diff from its reply.

use router_types::{ChainHash, ShortChannelId};
use tracing::warn;

use crate::state::RouterState;

/// Outbound query issued when told to sync with a peer: "send me everything
/// you have in this block range". `number_of_blocks = u32::MAX` covers the
/// whole chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryChannelRange {
    pub chain_hash: ChainHash,
    pub first_block_num: u32,
    pub number_of_blocks: u32,
}

impl QueryChannelRange {
    pub fn whole_chain(chain_hash: ChainHash) -> Self {
        Self {
            chain_hash,
            first_block_num: 0,
            number_of_blocks: u32::MAX,
        }
    }
}

/// A peer's reply to [`QueryChannelRange`]: the short-channel-ids it knows
/// of within the requested window, in whatever order the peer sent them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyChannelRange {
    pub chain_hash: ChainHash,
    pub first_block_num: u32,
    pub number_of_blocks: u32,
    pub short_channel_ids: Vec<ShortChannelId>,
}

/// `true` if `id`'s block height falls in `[first_block_num,
/// first_block_num + number_of_blocks]` and the channel (if known locally)
/// is not stale. Ids we don't know about locally are assumed admissible:
/// the filter's purpose is to bound the *our-side* comparison set, not to
/// validate the peer's claims.
fn keep(state: &RouterState, first_block_num: u32, number_of_blocks: u32, current_block: u32, id: ShortChannelId) -> bool {
    let last_block_num = first_block_num.saturating_add(number_of_blocks);
    let height = id.block_height();
    if height < first_block_num || height > last_block_num {
        return false;
    }
    match state.channels.get(&id) {
        Some(_) => !crate::pruning::is_stale(state, current_block, id),
        None => true,
    }
}

/// Process a [`ReplyChannelRange`]: compute `theirs - ours` over our ids in
/// the same block window that pass [`keep`], to be re-requested via a
/// `QueryShortChannelId`.
///
/// Returns `None` if `reply.chain_hash` doesn't match `our_chain_hash`
/// (logged and ignored per §4.4).
pub fn diff_channel_range(
    state: &RouterState,
    our_chain_hash: ChainHash,
    current_block: u32,
    reply: &ReplyChannelRange,
) -> Option<Vec<ShortChannelId>> {
    if reply.chain_hash != our_chain_hash {
        warn!(?reply.chain_hash, ?our_chain_hash, "ReplyChannelRange for a different chain, ignoring");
        return None;
    }

    let ours: Vec<ShortChannelId> = state
        .channels
        .keys()
        .copied()
        .filter(|&id| keep(state, reply.first_block_num, reply.number_of_blocks, current_block, id))
        .collect();
    let ours_set: std::collections::HashSet<ShortChannelId> = ours.into_iter().collect();

    let theirs: Vec<ShortChannelId> = reply
        .short_channel_ids
        .iter()
        .copied()
        .filter(|&id| keep(state, reply.first_block_num, reply.number_of_blocks, current_block, id))
        .collect();

    Some(theirs.into_iter().filter(|id| !ours_set.contains(id)).collect())
}
