//! Certificate token and token identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Score, Timestamp, WalletAddress};

/// Sequential certificate identifier. `0` is reserved for "no certificate".
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TokenId(u64);

impl TokenId {
    /// Sentinel returned by reverse lookups when a wallet holds no certificate.
    pub const NONE: Self = Self(0);

    /// The first id ever issued.
    pub const FIRST: Self = Self(1);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// The id following this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A proof-of-completion certificate. Immutable once issued; never transferable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateToken {
    pub token_id: TokenId,
    pub owner: WalletAddress,
    pub student_id: String,
    pub subject: String,
    pub exam_session: String,
    pub score: Score,
    pub mint_date: Timestamp,
    pub ip_address: String,
    pub metadata_uri: String,
}
