//! Test fixtures shared across this crate's unit and scenario tests.

use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};

/// A deterministic, valid public key derived from `seed`. Used wherever
/// tests need "some node" without caring about its actual identity.
pub fn test_pubkey(seed: u8) -> PublicKey {
    let mut bytes = [0u8; 32];
    bytes[31] = seed.max(1);
    let secret_key = SecretKey::from_slice(&bytes).expect("valid seed");
    let secp = Secp256k1::new();
    PublicKey::from_secret_key(&secp, &secret_key)
}
