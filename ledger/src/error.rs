use examcert_types::{Score, TokenId, WalletAddress};
use std::fmt;
use thiserror::Error;

/// Every way a ledger operation can be refused.
///
/// A returned error always means nothing was mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("caller {caller} is not authorized for this operation")]
    Unauthorized { caller: WalletAddress },

    #[error("the null identity is not allowed here")]
    InvalidIdentity,

    #[error("wallet {0} is not whitelisted")]
    NotWhitelisted(WalletAddress),

    #[error("wallet {0} is not registered")]
    NotRegistered(WalletAddress),

    #[error("wallet {0} is not verified")]
    NotVerified(WalletAddress),

    #[error("wallet {wallet} is not eligible for a certificate: {missing}")]
    NotEligible {
        wallet: WalletAddress,
        missing: Requirement,
    },

    #[error("wallet {0} has no pending mint entry")]
    NotPending(WalletAddress),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("wallet {0} is not flagged for misconduct")]
    NotFlagged(WalletAddress),

    #[error("wallet {0} is already whitelisted")]
    AlreadyWhitelisted(WalletAddress),

    #[error("wallet {0} is already registered")]
    AlreadyRegistered(WalletAddress),

    #[error("wallet {0} is already verified")]
    AlreadyVerified(WalletAddress),

    #[error("wallet {wallet} already holds certificate #{token_id}")]
    AlreadyMinted {
        wallet: WalletAddress,
        token_id: TokenId,
    },

    #[error("wallet {0} already has a pending mint entry")]
    AlreadyPending(WalletAddress),

    #[error("wallet {0} already has a completed mint entry")]
    AlreadyCompleted(WalletAddress),

    #[error("wallet {0} is already flagged for misconduct")]
    AlreadyFlagged(WalletAddress),

    #[error("wallet {0} appears more than once in the batch")]
    DuplicateInBatch(WalletAddress),

    #[error("score {score} is out of range (max {max})")]
    ScoreOutOfRange { score: Score, max: Score },

    #[error("wallet {wallet} holds certificate #{held}, not #{claimed}")]
    TokenMismatch {
        wallet: WalletAddress,
        claimed: TokenId,
        held: TokenId,
    },

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// The first unmet eligibility requirement reported by [`LedgerError::NotEligible`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Registered,
    Verified,
    Whitelisted,
    NoMisconduct,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Registered => "not registered",
            Self::Verified => "not verified",
            Self::Whitelisted => "not whitelisted",
            Self::NoMisconduct => "flagged for misconduct",
        };
        f.write_str(s)
    }
}
