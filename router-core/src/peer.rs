//! A minimal stand-in for "whoever sent us this message". The real peer
//! connection/transport layer is out of scope (§1); this crate only needs
//! something hashable and orderable to track origins for acknowledgement and
//! stash bookkeeping.

/// Opaque reference to a gossip peer, supplied by the embedding node's
/// transport layer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u64);
