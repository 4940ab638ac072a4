//! Typed ledger events: one variant per state transition.
//!
//! An event is both the notification handed to indexers and the exact
//! description of the effect applied to the ledger, so replaying a committed
//! event log in order rebuilds the state.

use examcert_types::{
    CertificateToken, PendingMintEntry, Timestamp, TokenId, WalletAddress,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    OwnershipTransferred {
        previous: WalletAddress,
        new_admin: WalletAddress,
        at: Timestamp,
    },
    WhitelistAdded {
        wallet: WalletAddress,
        at: Timestamp,
    },
    WhitelistRemoved {
        wallet: WalletAddress,
        at: Timestamp,
    },
    Registered {
        wallet: WalletAddress,
        student_id: String,
        subject: String,
        exam_session: String,
        at: Timestamp,
    },
    Verified {
        wallet: WalletAddress,
        ip_address: String,
        image_hash: String,
        at: Timestamp,
    },
    MisconductFlagged {
        wallet: WalletAddress,
        reason: String,
        at: Timestamp,
    },
    MisconductCleared {
        wallet: WalletAddress,
        at: Timestamp,
    },
    CertificateMinted {
        token: CertificateToken,
    },
    MintQueued {
        entry: PendingMintEntry,
    },
    MintCompleted {
        wallet: WalletAddress,
        token_id: TokenId,
        mint_date: Timestamp,
        at: Timestamp,
    },
}

impl LedgerEvent {
    /// The wallet this event is about. For ownership changes, the new administrator.
    pub fn wallet(&self) -> &WalletAddress {
        match self {
            Self::OwnershipTransferred { new_admin, .. } => new_admin,
            Self::WhitelistAdded { wallet, .. }
            | Self::WhitelistRemoved { wallet, .. }
            | Self::Registered { wallet, .. }
            | Self::Verified { wallet, .. }
            | Self::MisconductFlagged { wallet, .. }
            | Self::MisconductCleared { wallet, .. }
            | Self::MintCompleted { wallet, .. } => wallet,
            Self::CertificateMinted { token } => &token.owner,
            Self::MintQueued { entry } => &entry.wallet,
        }
    }

    /// Commit time of the transaction that produced this event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::OwnershipTransferred { at, .. }
            | Self::WhitelistAdded { at, .. }
            | Self::WhitelistRemoved { at, .. }
            | Self::Registered { at, .. }
            | Self::Verified { at, .. }
            | Self::MisconductFlagged { at, .. }
            | Self::MisconductCleared { at, .. }
            | Self::MintCompleted { at, .. } => *at,
            Self::CertificateMinted { token } => token.mint_date,
            Self::MintQueued { entry } => entry.added_at,
        }
    }

    /// Stable name for logs and indexers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OwnershipTransferred { .. } => "OwnershipTransferred",
            Self::WhitelistAdded { .. } => "WhitelistAdded",
            Self::WhitelistRemoved { .. } => "WhitelistRemoved",
            Self::Registered { .. } => "Registered",
            Self::Verified { .. } => "Verified",
            Self::MisconductFlagged { .. } => "MisconductFlagged",
            Self::MisconductCleared { .. } => "MisconductCleared",
            Self::CertificateMinted { .. } => "CertificateMinted",
            Self::MintQueued { .. } => "MintQueued",
            Self::MintCompleted { .. } => "MintCompleted",
        }
    }
}
