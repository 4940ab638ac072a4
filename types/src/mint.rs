//! Mint queue entries: the pending/completed partition.

use serde::{Deserialize, Serialize};

use crate::{Timestamp, TokenId, WalletAddress};

/// Exam score carried by queue entries and certificates.
pub type Score = u32;

/// Highest accepted exam score.
pub const MAX_SCORE: Score = 100;

/// A student waiting for certificate issuance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMintEntry {
    pub wallet: WalletAddress,
    pub student_id: String,
    pub subject: String,
    pub exam_session: String,
    pub score: Score,
    pub exam_date: Timestamp,
    pub ip_address: String,
    /// When the entry entered the pending set.
    pub added_at: Timestamp,
}

/// A pending entry that has been issued a certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedMintEntry {
    /// Fields carried over unchanged from the pending entry.
    pub entry: PendingMintEntry,
    pub token_id: TokenId,
    pub mint_date: Timestamp,
}

impl CompletedMintEntry {
    pub fn wallet(&self) -> &WalletAddress {
        &self.entry.wallet
    }
}
