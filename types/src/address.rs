//! Wallet address type: `0x` followed by 40 hex digits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// A student or administrator wallet identity.
///
/// Addresses are compared case-insensitively by normalising to lowercase on
/// construction, so `0xABC…` and `0xabc…` are the same wallet. The all-zero
/// address is the null identity and is never a valid actor.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// The standard prefix for all wallet addresses.
    pub const PREFIX: &'static str = "0x";

    /// Number of hex digits after the prefix.
    pub const HEX_LEN: usize = 40;

    /// Parse and normalise an address string.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix(Self::PREFIX)
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| TypeError::InvalidAddress(raw.to_string()))?;
        if digits.len() != Self::HEX_LEN || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(format!("{}{}", Self::PREFIX, digits.to_ascii_lowercase())))
    }

    /// Build an address from its 20 raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(format!("{}{}", Self::PREFIX, hex::encode(bytes)))
    }

    /// The null identity (all zero bytes).
    pub fn null() -> Self {
        Self::from_bytes([0u8; 20])
    }

    /// Whether this is the null identity.
    pub fn is_null(&self) -> bool {
        self.0[Self::PREFIX.len()..].bytes().all(|b| b == b'0')
    }

    /// Return the normalised address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the 20 raw bytes behind the address.
    pub fn to_bytes(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        // Construction guarantees 40 valid hex digits.
        if hex::decode_to_slice(&self.0[Self::PREFIX.len()..], &mut out).is_err() {
            return [0u8; 20];
        }
        out
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<WalletAddress> for String {
    fn from(addr: WalletAddress) -> Self {
        addr.0
    }
}
