//! Ties gossip ingestion, graph maintenance, path finding, sync, and
//! pruning together behind one state record and a persistence/verifier
//! pair, and fans out resulting [`RouterEvent`]s.

use std::collections::HashMap;

use bitcoin::secp256k1::PublicKey;
use router_tokio::events_bus::{EventsBus, EventsRx};
use router_types::{ChannelAnnouncement, ChannelDesc, ChannelUpdate, NodeAnnouncement, RouterConfig, RouterError, ShortChannelId};

use crate::gossip::{self, IngestOutcome};
use crate::local::{self, ExternalFundingSpent, LocalChannelDown, LocalChannelUpdate};
use crate::peer::PeerId;
use crate::persistence::ChannelPersister;
use crate::pruning;
use crate::routing::{self, RouteRequest, RouteResponse};
use crate::state::RouterState;
use crate::sync::{self, QueryChannelRange, ReplyChannelRange};
use crate::verifier::SignatureVerifier;
use crate::events::RouterEvent;

/// A read-only snapshot of the router's state, returned by
/// [`Router::routing_state`] for the `GetRoutingState`/introspection queries
/// named in §6.
#[derive(Clone, Debug)]
pub struct RoutingStateSnapshot {
    pub nodes: HashMap<PublicKey, NodeAnnouncement>,
    pub channels: std::collections::BTreeMap<ShortChannelId, ChannelAnnouncement>,
    pub updates: HashMap<ChannelDesc, ChannelUpdate>,
}

/// The routing core, generic over its persistence backend and signature
/// verifier so tests can swap in [`crate::persistence::InMemoryStore`] and
/// [`crate::verifier::AcceptAllVerifier`].
pub struct Router<P: ChannelPersister, V: SignatureVerifier> {
    state: RouterState,
    config: RouterConfig,
    persister: P,
    verifier: V,
    events: EventsBus<RouterEvent>,
}

impl<P: ChannelPersister, V: SignatureVerifier> Router<P, V> {
    /// Load channels and updates from persistence and rebuild the graph.
    /// Node announcements are intentionally not restored (see
    /// `DESIGN.md`'s Open Question decisions).
    pub async fn load(config: RouterConfig, persister: P, verifier: V) -> Result<Self, RouterError> {
        let channels = persister.list_channels().await?;
        let updates = persister.list_channel_updates().await?;
        let state = RouterState::from_snapshot(channels, updates);
        Ok(Self {
            state,
            config,
            persister,
            verifier,
            events: EventsBus::new(),
        })
    }

    pub fn subscribe_events(&self) -> EventsRx<RouterEvent> {
        self.events.subscribe()
    }

    fn publish_all(&self, events: Vec<RouterEvent>) {
        for event in events {
            self.events.notify(event);
        }
    }

    pub async fn handle_channel_announcement(&mut self, announcement: ChannelAnnouncement, origin: PeerId) -> Result<IngestOutcome, RouterError> {
        if announcement.chain_hash != self.config.chain_hash {
            return Ok(IngestOutcome {
                events: Vec::new(),
                error: Some(RouterError::ProtocolViolation("chain hash mismatch".to_owned())),
            });
        }
        let outcome = gossip::ingest_channel_announcement(&mut self.state, &self.persister, &self.verifier, announcement, origin).await?;
        self.publish_all(outcome.events.clone());
        Ok(outcome)
    }

    pub async fn handle_channel_update(&mut self, update: ChannelUpdate, origin: PeerId) -> Result<IngestOutcome, RouterError> {
        if update.chain_hash != self.config.chain_hash {
            return Ok(IngestOutcome {
                events: Vec::new(),
                error: Some(RouterError::ProtocolViolation("chain hash mismatch".to_owned())),
            });
        }
        let outcome = gossip::ingest_channel_update(&mut self.state, &self.persister, &self.verifier, self.config.node_id, update, origin).await?;
        self.publish_all(outcome.events.clone());
        Ok(outcome)
    }

    pub async fn handle_node_announcement(&mut self, node: NodeAnnouncement, origin: PeerId) -> Result<IngestOutcome, RouterError> {
        let outcome = gossip::ingest_node_announcement(&mut self.state, &self.persister, &self.verifier, node, origin).await?;
        self.publish_all(outcome.events.clone());
        Ok(outcome)
    }

    pub async fn handle_local_channel_update(&mut self, event: LocalChannelUpdate) -> Result<IngestOutcome, RouterError> {
        let outcome = local::on_local_channel_update(&mut self.state, &self.persister, &self.verifier, self.config.node_id, event).await?;
        self.publish_all(outcome.events.clone());
        Ok(outcome)
    }

    pub fn handle_local_channel_down(&mut self, event: LocalChannelDown) {
        local::on_local_channel_down(&mut self.state, event);
    }

    pub async fn handle_external_funding_spent(&mut self, event: ExternalFundingSpent) -> Result<Vec<RouterEvent>, RouterError> {
        let events = local::on_external_funding_spent(&mut self.state, &self.persister, event).await?;
        self.publish_all(events.clone());
        Ok(events)
    }

    /// Answer a route request (§4.3). If `request.ignore_channels` is
    /// non-empty, each listed channel is first forgotten for good via a
    /// synthesized `ExternalFundingSpent` (§4.6), then the query runs
    /// against the resulting graph.
    pub async fn route(&mut self, request: RouteRequest) -> Result<RouteResponse, RouterError> {
        for short_channel_id in request.ignore_channels.clone() {
            self.handle_external_funding_spent(ExternalFundingSpent { short_channel_id }).await?;
        }
        routing::find_route(&self.state, &request)
    }

    pub fn exclude_channel(&mut self, desc: ChannelDesc) {
        self.state.excluded_channels.insert(desc);
    }

    pub fn lift_channel_exclusion(&mut self, desc: &ChannelDesc) {
        self.state.excluded_channels.remove(desc);
    }

    /// §4.4: issue the outbound query that kicks off a sync handshake with a
    /// freshly (re)connected peer.
    pub fn build_sync_query(&self) -> QueryChannelRange {
        QueryChannelRange::whole_chain(self.config.chain_hash)
    }

    /// §4.4: process a peer's `ReplyChannelRange`, returning the ids to
    /// request via an outbound `QueryShortChannelId`, if any.
    pub fn handle_reply_channel_range(&self, current_block: u32, reply: &ReplyChannelRange) -> Option<Vec<ShortChannelId>> {
        sync::diff_channel_range(&self.state, self.config.chain_hash, current_block, reply)
    }

    /// §4.5: run one `TickPruneStaleChannels` pass.
    pub async fn prune_stale_channels(&mut self, current_block: u32) -> Result<Vec<RouterEvent>, RouterError> {
        let events = pruning::prune_stale_channels(&mut self.state, &self.persister, current_block).await?;
        self.publish_all(events.clone());
        Ok(events)
    }

    pub fn routing_state(&self) -> RoutingStateSnapshot {
        RoutingStateSnapshot {
            nodes: self.state.nodes.clone(),
            channels: self.state.channels.clone(),
            updates: self.state.updates.clone(),
        }
    }

    pub fn nodes(&self) -> &HashMap<PublicKey, NodeAnnouncement> {
        &self.state.nodes
    }

    pub fn channels(&self) -> &std::collections::BTreeMap<ShortChannelId, ChannelAnnouncement> {
        &self.state.channels
    }

    pub fn updates(&self) -> &HashMap<ChannelDesc, ChannelUpdate> {
        &self.state.updates
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}
