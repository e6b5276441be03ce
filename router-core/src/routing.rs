//! Path finding & query service (§4.3): answers shortest-path requests
//! against a transient view of the graph that overlays request-specific
//! hints and excludes request-specific blacklists plus the time-expiring
//! exclusion set.

use std::collections::HashSet;

use bitcoin::secp256k1::PublicKey;
use router_types::{ChannelDesc, ChannelUpdate, Hop, RouteHint, RouterError, ShortChannelId};

use crate::state::RouterState;

/// A path-finding request (§6).
#[derive(Clone, Debug)]
pub struct RouteRequest {
    pub source: PublicKey,
    pub target: PublicKey,
    pub assisted_routes: Vec<RouteHint>,
    pub ignore_nodes: HashSet<PublicKey>,
    pub ignore_channels: HashSet<ShortChannelId>,
}

/// A successful path-finding result. Echoes the caller's blacklist inputs so
/// a retry with a widened blacklist doesn't need to reconstruct them.
#[derive(Clone, Debug)]
pub struct RouteResponse {
    pub hops: Vec<Hop>,
    pub ignore_nodes: HashSet<PublicKey>,
    pub ignore_channels: HashSet<ShortChannelId>,
}

/// Turn one assisted route (a routing hint) into synthetic `(desc, update)`
/// overlay entries: each hop's `node_id` is paired with the next hop's
/// `node_id`, the last hop pairs with `target`. Synthetic updates are
/// unsigned and always enabled.
fn hint_to_overlay(hint: &RouteHint, target: PublicKey) -> Vec<(ChannelDesc, ChannelUpdate)> {
    let mut overlay = Vec::with_capacity(hint.len());
    for (index, hop) in hint.iter().enumerate() {
        let next_node_id = hint.get(index + 1).map(|h| h.node_id).unwrap_or(target);
        let desc = ChannelDesc::new(hop.short_channel_id, hop.node_id, next_node_id);
        let update = ChannelUpdate {
            short_channel_id: hop.short_channel_id,
            chain_hash: router_types::ChainHash([0u8; 32]),
            signature: [0u8; 64],
            timestamp: 0,
            message_flags: 0,
            channel_flags: router_types::ChannelFlags::new(false, false),
            cltv_expiry_delta: hop.cltv_expiry_delta,
            htlc_minimum_msat: 0,
            fee_base_msat: hop.fee_base_msat,
            fee_proportional_millionths: hop.fee_proportional_millionths,
            htlc_maximum_msat: None,
        };
        overlay.push((desc, update));
    }
    overlay
}

/// Union of `excluded_channels`, every `ChannelDesc` touching an
/// `ignore_nodes` member, and both directions of every `ignore_channels`
/// short-channel-id.
fn assemble_blacklist(state: &RouterState, request: &RouteRequest) -> HashSet<ChannelDesc> {
    let mut blacklist: HashSet<ChannelDesc> = state.excluded_channels.clone();

    if !request.ignore_nodes.is_empty() {
        let all_descs = state.updates.keys().chain(state.private_updates.keys());
        for desc in all_descs {
            if request.ignore_nodes.contains(&desc.a) || request.ignore_nodes.contains(&desc.b) {
                blacklist.insert(*desc);
            }
        }
    }

    for short_channel_id in &request.ignore_channels {
        if let Some(announcement) = state.channels.get(short_channel_id) {
            let (node_1, node_2) = announcement.node_ids();
            blacklist.insert(ChannelDesc::new(*short_channel_id, node_1, node_2));
            blacklist.insert(ChannelDesc::new(*short_channel_id, node_2, node_1));
        }
    }

    blacklist
}

/// Execute a route request (§4.3). Never mutates `state`: when an overlay or
/// blacklist applies, path finding runs against a clone of the graph.
pub fn find_route(state: &RouterState, request: &RouteRequest) -> Result<RouteResponse, RouterError> {
    if request.source == request.target {
        return Err(RouterError::CannotRouteToSelf);
    }

    let overlay: Vec<(ChannelDesc, ChannelUpdate)> = request
        .assisted_routes
        .iter()
        .flat_map(|hint| hint_to_overlay(hint, request.target))
        .collect();
    let blacklist = assemble_blacklist(state, request);

    let hops = if overlay.is_empty() && blacklist.is_empty() {
        state.graph.shortest_path(request.source, request.target)
    } else {
        let mut working = state.graph.clone();
        for (desc, update) in overlay {
            working.apply_update(desc, update);
        }
        for desc in &blacklist {
            working.remove_edge(desc);
        }
        if !working.contains_node(&request.source) || !working.contains_node(&request.target) {
            return Err(RouterError::RouteNotFound);
        }
        working.shortest_path(request.source, request.target)
    };

    hops.map(|hops| RouteResponse {
        hops,
        ignore_nodes: request.ignore_nodes.clone(),
        ignore_channels: request.ignore_channels.clone(),
    })
    .ok_or(RouterError::RouteNotFound)
}

#[cfg(test)]
mod test {
    use router_types::{ChainHash, ChannelFlags, RouteHintHop};

    use super::*;
    use crate::test_support::test_pubkey;

    fn enabled_update(scid: ShortChannelId, fee_base_msat: u32) -> ChannelUpdate {
        ChannelUpdate {
            short_channel_id: scid,
            chain_hash: ChainHash([0u8; 32]),
            signature: [0u8; 64],
            timestamp: 1,
            message_flags: 0,
            channel_flags: ChannelFlags::new(false, false),
            cltv_expiry_delta: 40,
            htlc_minimum_msat: 1,
            fee_base_msat,
            fee_proportional_millionths: 0,
            htlc_maximum_msat: None,
        }
    }

    // S3 from the scenario table: route with a hint overlay.
    #[test]
    fn hint_overlay_extends_the_path_without_mutating_the_base_graph() {
        let mut state = RouterState::new();
        let a = test_pubkey(1);
        let b = test_pubkey(2);
        let c = test_pubkey(3);
        let d = test_pubkey(4);
        state
            .graph
            .add_edge(ChannelDesc::new(ShortChannelId::new(1, 0, 0), a, b), enabled_update(ShortChannelId::new(1, 0, 0), 5000));
        state
            .graph
            .add_edge(ChannelDesc::new(ShortChannelId::new(2, 0, 0), b, c), enabled_update(ShortChannelId::new(2, 0, 0), 3000));

        let hint = vec![RouteHintHop {
            node_id: c,
            short_channel_id: ShortChannelId::new(3, 0, 0),
            fee_base_msat: 2,
            fee_proportional_millionths: 0,
            cltv_expiry_delta: 9,
        }];
        let request = RouteRequest {
            source: a,
            target: d,
            assisted_routes: vec![hint],
            ignore_nodes: HashSet::new(),
            ignore_channels: HashSet::new(),
        };

        let response = find_route(&state, &request).expect("path should exist via hint");
        let hops: Vec<_> = response.hops.iter().map(|h| (h.a, h.b)).collect();
        assert_eq!(hops, vec![(a, b), (b, c), (c, d)]);
        assert!(!state.graph.contains_edge(&ChannelDesc::new(ShortChannelId::new(3, 0, 0), c, d)));
    }

    // S4 from the scenario table: an ignored node makes the route unreachable.
    #[test]
    fn ignore_nodes_blacklists_touching_channels() {
        let mut state = RouterState::new();
        let a = test_pubkey(1);
        let b = test_pubkey(2);
        let c = test_pubkey(3);
        state.apply_public_update(ChannelDesc::new(ShortChannelId::new(1, 0, 0), a, b), enabled_update(ShortChannelId::new(1, 0, 0), 5000));
        state.apply_public_update(ChannelDesc::new(ShortChannelId::new(2, 0, 0), b, c), enabled_update(ShortChannelId::new(2, 0, 0), 3000));

        let request = RouteRequest {
            source: a,
            target: c,
            assisted_routes: vec![],
            ignore_nodes: [b].into_iter().collect(),
            ignore_channels: HashSet::new(),
        };

        let err = find_route(&state, &request).unwrap_err();
        assert_eq!(err, RouterError::RouteNotFound);
    }

    #[test]
    fn source_equals_target_is_rejected_before_touching_the_graph() {
        let state = RouterState::new();
        let a = test_pubkey(1);
        let request = RouteRequest {
            source: a,
            target: a,
            assisted_routes: vec![],
            ignore_nodes: HashSet::new(),
            ignore_channels: HashSet::new(),
        };
        assert_eq!(find_route(&state, &request).unwrap_err(), RouterError::CannotRouteToSelf);
    }
}
