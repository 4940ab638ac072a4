//! Mutating entry points, as data.

use examcert_types::{Score, Timestamp, TokenId, WalletAddress};

/// One mutating call against the ledger.
///
/// [`crate::ExamLedger::plan`] validates an operation for a caller and returns
/// the events it would commit; [`crate::ExamLedger::execute`] also applies them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    TransferOwnership {
        new_admin: WalletAddress,
    },
    AddToWhitelist {
        wallet: WalletAddress,
    },
    /// All-or-nothing bulk whitelist.
    AddBatchToWhitelist {
        wallets: Vec<WalletAddress>,
    },
    RemoveFromWhitelist {
        wallet: WalletAddress,
    },
    Register {
        wallet: WalletAddress,
        student_id: String,
        subject: String,
        exam_session: String,
    },
    Verify {
        wallet: WalletAddress,
        ip_address: String,
        image_hash: String,
    },
    FlagMisconduct {
        wallet: WalletAddress,
        reason: String,
    },
    ClearMisconduct {
        wallet: WalletAddress,
    },
    Mint {
        wallet: WalletAddress,
        student_id: String,
        subject: String,
        exam_session: String,
        ip_address: String,
        metadata_uri: String,
    },
    /// Issue a certificate from the wallet's pending entry and complete it in
    /// the same transaction.
    MintPending {
        wallet: WalletAddress,
        metadata_uri: String,
    },
    EnqueuePending {
        wallet: WalletAddress,
        student_id: String,
        subject: String,
        exam_session: String,
        score: Score,
        exam_date: Timestamp,
        ip_address: String,
    },
    CompleteMint {
        wallet: WalletAddress,
        token_id: TokenId,
        mint_date: Timestamp,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TransferOwnership { .. } => "transfer_ownership",
            Self::AddToWhitelist { .. } => "whitelist_add",
            Self::AddBatchToWhitelist { .. } => "whitelist_add_batch",
            Self::RemoveFromWhitelist { .. } => "whitelist_remove",
            Self::Register { .. } => "register",
            Self::Verify { .. } => "verify",
            Self::FlagMisconduct { .. } => "flag_misconduct",
            Self::ClearMisconduct { .. } => "clear_misconduct",
            Self::Mint { .. } => "mint",
            Self::MintPending { .. } => "mint_pending",
            Self::EnqueuePending { .. } => "enqueue_pending",
            Self::CompleteMint { .. } => "complete_mint",
        }
    }

    /// The wallet the operation targets. `None` for batch whitelisting.
    pub fn wallet(&self) -> Option<&WalletAddress> {
        match self {
            Self::TransferOwnership { new_admin } => Some(new_admin),
            Self::AddBatchToWhitelist { .. } => None,
            Self::AddToWhitelist { wallet }
            | Self::RemoveFromWhitelist { wallet }
            | Self::Register { wallet, .. }
            | Self::Verify { wallet, .. }
            | Self::FlagMisconduct { wallet, .. }
            | Self::ClearMisconduct { wallet }
            | Self::Mint { wallet, .. }
            | Self::MintPending { wallet, .. }
            | Self::EnqueuePending { wallet, .. }
            | Self::CompleteMint { wallet, .. } => Some(wallet),
        }
    }
}
