//! Signature verification is an external collaborator per the spec's scope
//! (§1): this module only defines the seam the router calls through, plus
//! two implementations: a real secp256k1-backed one, and an always-accept
//! stub used by tests and by synthetic routing-hint overlays, which the
//! spec says are unsigned (§4.3).

use bitcoin::hashes::{sha256d, Hash};
use bitcoin::secp256k1::ecdsa::Signature as EcdsaSignature;
use bitcoin::secp256k1::{Message, PublicKey, Secp256k1, VerifyOnly};
use router_types::{ChannelAnnouncement, ChannelUpdate, NodeAnnouncement};

/// The seam between the router and whatever does actual cryptographic
/// verification and wire decoding upstream. The payloads handed to
/// `verify_*` are this crate's own deterministic serialization of each
/// message's essential fields, not the real BOLT7 wire encoding (which is
/// explicitly out of scope, see §1).
pub trait SignatureVerifier: Send + Sync {
    fn verify_channel_announcement(&self, msg: &ChannelAnnouncement) -> bool;
    fn verify_channel_update(&self, signer: &PublicKey, msg: &ChannelUpdate) -> bool;
    fn verify_node_announcement(&self, msg: &NodeAnnouncement) -> bool;
}

/// A real, secp256k1-backed verifier. Checks each signature against a
/// deterministic digest of the message's essential fields.
pub struct Secp256k1Verifier {
    secp: Secp256k1<VerifyOnly>,
}

impl Secp256k1Verifier {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }

    fn verify_one(&self, pubkey: &PublicKey, payload: &[u8], signature: &[u8; 64]) -> bool {
        let digest = sha256d::Hash::hash(payload);
        let Ok(message) = Message::from_slice(digest.as_ref()) else {
            return false;
        };
        let Ok(sig) = EcdsaSignature::from_compact(signature) else {
            return false;
        };
        self.secp.verify_ecdsa(&message, &sig, pubkey).is_ok()
    }
}

impl Default for Secp256k1Verifier {
    fn default() -> Self {
        Self::new()
    }
}

fn channel_announcement_payload(msg: &ChannelAnnouncement) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&msg.chain_hash.0);
    buf.extend_from_slice(&msg.short_channel_id.as_u64().to_be_bytes());
    buf.extend_from_slice(&msg.node_id_1.serialize());
    buf.extend_from_slice(&msg.node_id_2.serialize());
    buf.extend_from_slice(&msg.bitcoin_key_1.serialize());
    buf.extend_from_slice(&msg.bitcoin_key_2.serialize());
    buf
}

fn channel_update_payload(msg: &ChannelUpdate) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&msg.chain_hash.0);
    buf.extend_from_slice(&msg.short_channel_id.as_u64().to_be_bytes());
    buf.extend_from_slice(&msg.timestamp.to_be_bytes());
    buf.push(msg.message_flags);
    buf.push(msg.channel_flags.0);
    buf.extend_from_slice(&msg.cltv_expiry_delta.to_be_bytes());
    buf.extend_from_slice(&msg.htlc_minimum_msat.to_be_bytes());
    buf.extend_from_slice(&msg.fee_base_msat.to_be_bytes());
    buf.extend_from_slice(&msg.fee_proportional_millionths.to_be_bytes());
    if let Some(max) = msg.htlc_maximum_msat {
        buf.extend_from_slice(&max.to_be_bytes());
    }
    buf
}

fn node_announcement_payload(msg: &NodeAnnouncement) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&msg.node_id.serialize());
    buf.extend_from_slice(&msg.timestamp.to_be_bytes());
    buf.extend_from_slice(&msg.features);
    buf.extend_from_slice(&msg.rgb_color);
    buf.extend_from_slice(msg.alias.as_bytes());
    for addr in &msg.addresses {
        buf.extend_from_slice(addr.as_bytes());
    }
    buf
}

impl SignatureVerifier for Secp256k1Verifier {
    fn verify_channel_announcement(&self, msg: &ChannelAnnouncement) -> bool {
        let payload = channel_announcement_payload(msg);
        self.verify_one(&msg.node_id_1, &payload, &msg.node_signature_1)
            && self.verify_one(&msg.node_id_2, &payload, &msg.node_signature_2)
            && self.verify_one(&msg.bitcoin_key_1, &payload, &msg.bitcoin_signature_1)
            && self.verify_one(&msg.bitcoin_key_2, &payload, &msg.bitcoin_signature_2)
    }

    fn verify_channel_update(&self, signer: &PublicKey, msg: &ChannelUpdate) -> bool {
        let payload = channel_update_payload(msg);
        self.verify_one(signer, &payload, &msg.signature)
    }

    fn verify_node_announcement(&self, msg: &NodeAnnouncement) -> bool {
        let payload = node_announcement_payload(msg);
        self.verify_one(&msg.node_id, &payload, &msg.signature)
    }
}

/// Accepts everything. Used in tests, and for the router's own synthetic
/// routing-hint overlay updates, which are unsigned by construction (§4.3).
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAllVerifier;

impl SignatureVerifier for AcceptAllVerifier {
    fn verify_channel_announcement(&self, _msg: &ChannelAnnouncement) -> bool {
        true
    }
    fn verify_channel_update(&self, _signer: &PublicKey, _msg: &ChannelUpdate) -> bool {
        true
    }
    fn verify_node_announcement(&self, _msg: &NodeAnnouncement) -> bool {
        true
    }
}

#[cfg(test)]
mod test {
    use bitcoin::secp256k1::{Secp256k1, SecretKey};
    use router_types::{ChainHash, ChannelFlags, ShortChannelId};

    use super::*;

    #[test]
    fn real_verifier_accepts_correctly_signed_update_and_rejects_tampered() {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(&[7u8; 32]).unwrap();
        let pubkey = PublicKey::from_secret_key(&secp, &secret_key);

        let mut update = ChannelUpdate {
            short_channel_id: ShortChannelId::new(1, 2, 3),
            chain_hash: ChainHash([0u8; 32]),
            signature: [0u8; 64],
            timestamp: 1234,
            message_flags: 0,
            channel_flags: ChannelFlags::new(false, false),
            cltv_expiry_delta: 40,
            htlc_minimum_msat: 1,
            fee_base_msat: 1000,
            fee_proportional_millionths: 10,
            htlc_maximum_msat: None,
        };
        let payload = channel_update_payload(&update);
        let digest = sha256d::Hash::hash(&payload);
        let message = Message::from_slice(digest.as_ref()).unwrap();
        let sig = secp.sign_ecdsa(&message, &secret_key);
        update.signature = sig.serialize_compact();

        let verifier = Secp256k1Verifier::new();
        assert!(verifier.verify_channel_update(&pubkey, &update));

        update.timestamp += 1; // tamper
        assert!(!verifier.verify_channel_update(&pubkey, &update));
    }
}
