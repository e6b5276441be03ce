//! The real persistence layer (a key-value store of channels/updates/nodes)
//! is an external collaborator per §1/§6; this module defines the trait
//! contract the router calls through, plus an in-memory reference
//! implementation for tests and examples, mirroring the kind of in-memory
//! mock backend a test harness for a real store would provide.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bitcoin::secp256k1::PublicKey;
use router_types::{ChannelAnnouncement, ChannelUpdate, NodeAnnouncement, PersistError, ShortChannelId};

/// Persistence contract for public gossip state. `removeChannel` must
/// cascade to that channel's updates (§6).
#[async_trait]
pub trait ChannelPersister: Send + Sync {
    async fn list_channels(&self) -> Result<BTreeMap<ShortChannelId, ChannelAnnouncement>, PersistError>;
    async fn list_channel_updates(&self) -> Result<Vec<ChannelUpdate>, PersistError>;

    async fn add_channel(&self, channel: &ChannelAnnouncement) -> Result<(), PersistError>;
    /// Removes the channel and cascades to its updates.
    async fn remove_channel(&self, short_channel_id: ShortChannelId) -> Result<(), PersistError>;

    async fn add_channel_update(&self, update: &ChannelUpdate) -> Result<(), PersistError>;
    async fn update_channel_update(&self, update: &ChannelUpdate) -> Result<(), PersistError>;

    async fn add_node(&self, node: &NodeAnnouncement) -> Result<(), PersistError>;
    async fn update_node(&self, node: &NodeAnnouncement) -> Result<(), PersistError>;
    async fn remove_node(&self, node_id: PublicKey) -> Result<(), PersistError>;
}

#[derive(Default)]
struct Tables {
    channels: BTreeMap<ShortChannelId, ChannelAnnouncement>,
    // Keyed by (short_channel_id, direction_is_node_2) so both directions of
    // a channel can be stored independently, same as `RouterState::updates`.
    updates: BTreeMap<(ShortChannelId, bool), ChannelUpdate>,
    nodes: BTreeMap<Vec<u8>, NodeAnnouncement>,
}

/// An in-memory [`ChannelPersister`]. Not a production store - it exists so
/// the router's event loop and tests can run without a real database.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChannelPersister for InMemoryStore {
    async fn list_channels(&self) -> Result<BTreeMap<ShortChannelId, ChannelAnnouncement>, PersistError> {
        Ok(self.tables.lock().expect("poisoned").channels.clone())
    }

    async fn list_channel_updates(&self) -> Result<Vec<ChannelUpdate>, PersistError> {
        Ok(self
            .tables
            .lock()
            .expect("poisoned")
            .updates
            .values()
            .cloned()
            .collect())
    }

    async fn add_channel(&self, channel: &ChannelAnnouncement) -> Result<(), PersistError> {
        self.tables
            .lock()
            .expect("poisoned")
            .channels
            .insert(channel.short_channel_id, channel.clone());
        Ok(())
    }

    async fn remove_channel(&self, short_channel_id: ShortChannelId) -> Result<(), PersistError> {
        let mut tables = self.tables.lock().expect("poisoned");
        tables.channels.remove(&short_channel_id);
        tables.updates.retain(|(scid, _), _| *scid != short_channel_id);
        Ok(())
    }

    async fn add_channel_update(&self, update: &ChannelUpdate) -> Result<(), PersistError> {
        self.update_channel_update(update).await
    }

    async fn update_channel_update(&self, update: &ChannelUpdate) -> Result<(), PersistError> {
        let key = (update.short_channel_id, update.channel_flags.direction_is_node_2());
        self.tables
            .lock()
            .expect("poisoned")
            .updates
            .insert(key, update.clone());
        Ok(())
    }

    async fn add_node(&self, node: &NodeAnnouncement) -> Result<(), PersistError> {
        self.update_node(node).await
    }

    async fn update_node(&self, node: &NodeAnnouncement) -> Result<(), PersistError> {
        self.tables
            .lock()
            .expect("poisoned")
            .nodes
            .insert(node.node_id.serialize().to_vec(), node.clone());
        Ok(())
    }

    async fn remove_node(&self, node_id: PublicKey) -> Result<(), PersistError> {
        self.tables
            .lock()
            .expect("poisoned")
            .nodes
            .remove(&node_id.serialize().to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use router_types::{ChainHash, ChannelFlags};

    use super::*;
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

    fn update(scid: ShortChannelId) -> ChannelUpdate {
        ChannelUpdate {
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
        }
    }

    #[tokio::test]
    async fn remove_channel_cascades_to_its_updates() {
        let store = InMemoryStore::new();
        let a = test_pubkey(1);
        let b = test_pubkey(2);
        let scid = ShortChannelId::new(1, 0, 0);
        store.add_channel(&announcement(scid, a, b)).await.unwrap();
        store.add_channel_update(&update(scid)).await.unwrap();
        assert_eq!(store.list_channel_updates().await.unwrap().len(), 1);

        store.remove_channel(scid).await.unwrap();
        assert!(store.list_channels().await.unwrap().is_empty());
        assert!(store.list_channel_updates().await.unwrap().is_empty());
    }
}
