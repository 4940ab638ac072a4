//! Administrator-curated whitelist of wallets allowed to register.

use examcert_types::WalletAddress;

use crate::error::LedgerError;
use crate::sequenced::SequencedMap;

/// The set of currently whitelisted wallets, enumerable in insertion order.
///
/// Authorization is checked by the caller ([`crate::ExamLedger`]); this type
/// only knows about membership.
#[derive(Clone, Debug, Default)]
pub struct WhitelistRegistry {
    members: SequencedMap<WalletAddress, ()>,
}

impl WhitelistRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_whitelisted(&self, wallet: &WalletAddress) -> bool {
        self.members.contains(wallet)
    }

    /// Currently whitelisted wallets in insertion order.
    pub fn list(&self) -> impl Iterator<Item = &WalletAddress> + '_ {
        self.members.keys()
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Sequence number the next added wallet will be stored under.
    pub fn next_seq(&self) -> u64 {
        self.members.next_seq()
    }

    /// Sequence number of a present wallet.
    pub fn seq_of(&self, wallet: &WalletAddress) -> Option<u64> {
        self.members.seq_of(wallet)
    }

    /// Present wallets paired with their sequence numbers.
    pub fn entries(&self) -> impl Iterator<Item = (u64, &WalletAddress)> + '_ {
        self.members
            .keys()
            .filter_map(move |w| self.members.seq_of(w).map(|seq| (seq, w)))
    }

    pub fn check_add(&self, wallet: &WalletAddress) -> Result<(), LedgerError> {
        if wallet.is_null() {
            return Err(LedgerError::InvalidIdentity);
        }
        if self.is_whitelisted(wallet) {
            return Err(LedgerError::AlreadyWhitelisted(wallet.clone()));
        }
        Ok(())
    }

    pub fn check_remove(&self, wallet: &WalletAddress) -> Result<(), LedgerError> {
        if !self.is_whitelisted(wallet) {
            return Err(LedgerError::NotWhitelisted(wallet.clone()));
        }
        Ok(())
    }

    pub(crate) fn insert(&mut self, wallet: WalletAddress) {
        self.members.insert(wallet, ());
    }

    pub(crate) fn remove(&mut self, wallet: &WalletAddress) {
        self.members.remove(wallet);
    }

    /// Rebuild a persisted membership entry.
    pub fn restore(&mut self, seq: u64, wallet: WalletAddress) {
        self.members.insert_at(seq, wallet, ());
    }

    /// Resume the insertion cursor from a persisted value.
    pub fn resume_seq(&mut self, next_seq: u64) {
        self.members.resume_from(next_seq);
    }
}
