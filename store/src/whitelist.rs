//! Whitelist storage trait.

use examcert_types::WalletAddress;

use crate::StoreError;

/// Persisted whitelist membership.
///
/// Each member carries the insertion sequence number the ledger assigned, so
/// listing order survives a restart.
pub trait WhitelistStore {
    fn put_whitelisted(&self, seq: u64, wallet: &WalletAddress) -> Result<(), StoreError>;

    fn delete_whitelisted(&self, wallet: &WalletAddress) -> Result<(), StoreError>;

    fn is_whitelisted(&self, wallet: &WalletAddress) -> Result<bool, StoreError>;

    /// All members as `(seq, wallet)`, ordered by `seq`.
    fn iter_whitelist(&self) -> Result<Vec<(u64, WalletAddress)>, StoreError>;
}
