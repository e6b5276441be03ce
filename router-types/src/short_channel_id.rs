use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The high byte that marks a [`ShortChannelId`] as a synthetic "peer-id"
/// rather than a real on-chain outpoint reference. Peer-ids encode the
/// trailing bytes of a node's public key in the lower 56 bits and must never
/// appear as an edge key in the routing graph.
const PEER_ID_MARKER: u8 = 0xFF;

/// A compact 64-bit encoding of a funding transaction's outpoint: block
/// height (24 bits), transaction index within the block (24 bits), and
/// output index (16 bits), packed most-significant-first.
///
/// Ordering is unsigned total order over the packed `u64`, which is also the
/// order the router's channel table iterates in: the sync handshake relies
/// on this order lining up with block height.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ShortChannelId(pub u64);

impl ShortChannelId {
    pub const fn new(block_height: u32, tx_index: u32, output_index: u16) -> Self {
        let block_height = (block_height & 0x00FF_FFFF) as u64;
        let tx_index = (tx_index & 0x00FF_FFFF) as u64;
        let output_index = output_index as u64;
        Self((block_height << 40) | (tx_index << 16) | output_index)
    }

    pub const fn from_u64(id: u64) -> Self {
        Self(id)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub const fn block_height(&self) -> u32 {
        ((self.0 >> 40) & 0x00FF_FFFF) as u32
    }

    pub const fn tx_index(&self) -> u32 {
        ((self.0 >> 16) & 0x00FF_FFFF) as u32
    }

    pub const fn output_index(&self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Build a synthetic peer-id short-channel-id from the trailing 7 bytes
    /// of a node public key. These never appear as real edges in the graph.
    pub fn synthetic_peer_id(pubkey_tail: [u8; 7]) -> Self {
        let mut buf = [0u8; 8];
        buf[0] = PEER_ID_MARKER;
        buf[1..].copy_from_slice(&pubkey_tail);
        Self(u64::from_be_bytes(buf))
    }

    /// Whether this id is a synthetic peer-id rather than a real outpoint
    /// reference.
    pub fn is_synthetic_peer_id(&self) -> bool {
        (self.0 >> 56) as u8 == PEER_ID_MARKER
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ParseShortChannelIdError {
    #[error("expected `<height>x<txIndex>x<outputIndex>`, got `{0}`")]
    WrongShape(String),
    #[error("invalid integer component in short-channel-id `{0}`")]
    InvalidComponent(String),
}

impl FromStr for ShortChannelId {
    type Err = ParseShortChannelIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('x');
        let (Some(height), Some(tx_index), Some(output_index), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseShortChannelIdError::WrongShape(s.to_owned()));
        };

        let parse_u32 = |part: &str| {
            part.parse::<u32>()
                .map_err(|_| ParseShortChannelIdError::InvalidComponent(s.to_owned()))
        };
        let block_height = parse_u32(height)?;
        let tx_index = parse_u32(tx_index)?;
        let output_index = output_index
            .parse::<u16>()
            .map_err(|_| ParseShortChannelIdError::InvalidComponent(s.to_owned()))?;

        Ok(Self::new(block_height, tx_index, output_index))
    }
}

impl Display for ShortChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{}",
            self.block_height(),
            self.tx_index(),
            self.output_index()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pack_unpack_roundtrip() {
        let scid = ShortChannelId::new(0x0102_03, 0x0405_06, 0x0708);
        assert_eq!(scid.block_height(), 0x0102_03);
        assert_eq!(scid.tx_index(), 0x0405_06);
        assert_eq!(scid.output_index(), 0x0708);
    }

    #[test]
    fn display_and_parse_are_inverse() {
        let scid = ShortChannelId::new(700_000, 42, 1);
        let s = scid.to_string();
        assert_eq!(s, "700000x42x1");
        assert_eq!(s.parse::<ShortChannelId>().unwrap(), scid);
    }

    #[test]
    fn ordering_is_unsigned_numeric() {
        let a = ShortChannelId::new(1, 2, 3);
        let b = ShortChannelId::new(1, 2, 4);
        let c = ShortChannelId::new(2, 0, 0);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn synthetic_peer_ids_are_flagged() {
        let real = ShortChannelId::new(500_000, 1, 0);
        assert!(!real.is_synthetic_peer_id());

        let synthetic = ShortChannelId::synthetic_peer_id([1, 2, 3, 4, 5, 6, 7]);
        assert!(synthetic.is_synthetic_peer_id());
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!("1x2".parse::<ShortChannelId>().is_err());
        assert!("1x2x3x4".parse::<ShortChannelId>().is_err());
        assert!("ax2x3".parse::<ShortChannelId>().is_err());
    }
}
