use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use bitcoin::secp256k1::PublicKey;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use router_types::constants::REFERENCE_AMOUNT_MSAT;
use router_types::{ChannelDesc, ChannelUpdate, Hop};

#[derive(Clone, Debug)]
struct Edge {
    desc: ChannelDesc,
    update: ChannelUpdate,
    weight_msat: u64,
}

/// The directed weighted multigraph described in §4.2: one edge per
/// currently-known *enabled* directional update, public or private. Vertices
/// are node public keys; edge weight is the fee to forward
/// [`REFERENCE_AMOUNT_MSAT`] under that edge's policy.
///
/// Uses a [`StableDiGraph`] (rather than the plain `Graph`) specifically
/// because its node/edge indices stay valid across removals, which lets us
/// keep `ChannelDesc -> EdgeIndex` and `PublicKey -> NodeIndex` side tables
/// instead of re-deriving indices after every edit.
#[derive(Clone, Debug, Default)]
pub struct RoutingGraph {
    inner: StableDiGraph<PublicKey, Edge>,
    nodes: HashMap<PublicKey, NodeIndex>,
    edges: HashMap<ChannelDesc, EdgeIndex>,
}

impl RoutingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_node(&self, node_id: &PublicKey) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn contains_edge(&self, desc: &ChannelDesc) -> bool {
        self.edges.contains_key(desc)
    }

    fn node_index(&mut self, node_id: PublicKey) -> NodeIndex {
        *self
            .nodes
            .entry(node_id)
            .or_insert_with(|| self.inner.add_node(node_id))
    }

    /// Add an edge for `desc` carrying `update`. A no-op if `update` is
    /// disabled. Does not check for a pre-existing edge for `desc`; callers
    /// that are replacing a policy must [`remove_edge`](Self::remove_edge)
    /// first.
    pub fn add_edge(&mut self, desc: ChannelDesc, update: ChannelUpdate) {
        if !update.is_enabled() {
            return;
        }
        let weight_msat = update.fee_msat(REFERENCE_AMOUNT_MSAT);
        let a = self.node_index(desc.a);
        let b = self.node_index(desc.b);
        let edge_index = self.inner.add_edge(
            a,
            b,
            Edge {
                desc,
                update,
                weight_msat,
            },
        );
        self.edges.insert(desc, edge_index);
    }

    /// Remove the edge for `desc`, if any. Vertices are not reclaimed (best
    /// effort cleanup only, per §3's invariants).
    pub fn remove_edge(&mut self, desc: &ChannelDesc) -> Option<ChannelUpdate> {
        let edge_index = self.edges.remove(desc)?;
        self.inner.remove_edge(edge_index).map(|edge| edge.update)
    }

    /// Replace whatever edge (if any) exists for `desc` with `update`:
    /// removes the old edge, then re-adds it only if `update` is enabled.
    /// This is the "rebuild the graph edge" step referenced throughout §4.1.
    pub fn apply_update(&mut self, desc: ChannelDesc, update: ChannelUpdate) {
        self.remove_edge(&desc);
        self.add_edge(desc, update);
    }

    /// Drop a node from the side table if it has no incident edges left.
    /// Best-effort: does not touch `petgraph`'s own node storage, since
    /// `StableDiGraph::remove_node` would be `O(E)` and vertex cleanup is
    /// explicitly best-effort per the spec.
    pub fn forget_orphan_node(&mut self, node_id: &PublicKey) {
        let Some(&index) = self.nodes.get(node_id) else {
            return;
        };
        let has_edges = self
            .inner
            .edges_directed(index, Direction::Outgoing)
            .next()
            .is_some()
            || self
                .inner
                .edges_directed(index, Direction::Incoming)
                .next()
                .is_some();
        if !has_edges {
            self.inner.remove_node(index);
            self.nodes.remove(node_id);
        }
    }

    /// Single-source shortest path via Dijkstra (non-negative weights by
    /// construction: fees are never negative). Returns the ordered edges
    /// traversed from `source` to `target`.
    pub fn shortest_path(&self, source: PublicKey, target: PublicKey) -> Option<Vec<Hop>> {
        let source_index = *self.nodes.get(&source)?;
        let target_index = *self.nodes.get(&target)?;

        let mut dist: HashMap<NodeIndex, u64> = HashMap::new();
        let mut prev_edge: HashMap<NodeIndex, EdgeIndex> = HashMap::new();
        let mut heap: BinaryHeap<Reverse<(u64, NodeIndex)>> = BinaryHeap::new();

        dist.insert(source_index, 0);
        heap.push(Reverse((0, source_index)));

        while let Some(Reverse((cost, node))) = heap.pop() {
            if node == target_index {
                break;
            }
            if cost > *dist.get(&node).unwrap_or(&u64::MAX) {
                continue;
            }
            for edge_ref in self.inner.edges_directed(node, Direction::Outgoing) {
                let next = edge_ref.target();
                let next_cost = cost + edge_ref.weight().weight_msat;
                if next_cost < *dist.get(&next).unwrap_or(&u64::MAX) {
                    dist.insert(next, next_cost);
                    prev_edge.insert(next, edge_ref.id());
                    heap.push(Reverse((next_cost, next)));
                }
            }
        }

        if !dist.contains_key(&target_index) {
            return None;
        }

        let mut path_edges = Vec::new();
        let mut current = target_index;
        while current != source_index {
            let edge_index = *prev_edge.get(&current)?;
            let edge = self.inner.edge_weight(edge_index)?;
            path_edges.push(Hop {
                a: edge.desc.a,
                b: edge.desc.b,
                update: edge.update.clone(),
            });
            current = self.inner.edge_endpoints(edge_index)?.0;
        }
        path_edges.reverse();
        Some(path_edges)
    }
}
