//! Mint queue storage trait.

use examcert_types::{CompletedMintEntry, PendingMintEntry, WalletAddress};

use crate::StoreError;

/// Persisted pending and completed mint entries, keyed by wallet.
pub trait MintQueueStore {
    fn put_pending(&self, seq: u64, entry: &PendingMintEntry) -> Result<(), StoreError>;

    fn delete_pending(&self, wallet: &WalletAddress) -> Result<(), StoreError>;

    fn put_completed(&self, seq: u64, entry: &CompletedMintEntry) -> Result<(), StoreError>;

    /// Pending entries as `(seq, entry)`, ordered by `seq`.
    fn iter_pending(&self) -> Result<Vec<(u64, PendingMintEntry)>, StoreError>;

    /// Completed entries as `(seq, entry)`, ordered by `seq`.
    fn iter_completed(&self) -> Result<Vec<(u64, CompletedMintEntry)>, StoreError>;
}
