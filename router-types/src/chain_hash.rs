use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The genesis block hash of the chain this router serves, used to reject
/// gossip from a different network. Stored in the same byte order it's
/// gossiped in (not reversed for display, unlike a `Txid`), since this value
/// is never shown to end users.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ChainHash(pub [u8; 32]);

impl ChainHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Display for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseChainHashError {
    #[error("chain hash must be exactly 64 hex chars, got {0}")]
    WrongLength(usize),
    #[error("invalid hex in chain hash")]
    InvalidHex,
}

impl FromStr for ChainHash {
    type Err = ParseChainHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(ParseChainHashError::WrongLength(s.len()));
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| ParseChainHashError::InvalidHex)?;
        }
        Ok(Self(bytes))
    }
}
