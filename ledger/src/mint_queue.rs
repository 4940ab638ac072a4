//! Mint queue index: the pending/completed partition.
//!
//! For every wallet exactly one of {pending, completed, neither} holds. The
//! only way out of pending is [`MintQueueIndex::complete`], which moves the
//! entry into completed in one step.

use examcert_types::{
    CompletedMintEntry, PendingMintEntry, Timestamp, TokenId, WalletAddress, MAX_SCORE,
};

use crate::error::LedgerError;
use crate::sequenced::SequencedMap;

#[derive(Clone, Debug, Default)]
pub struct MintQueueIndex {
    pending: SequencedMap<WalletAddress, PendingMintEntry>,
    completed: SequencedMap<WalletAddress, CompletedMintEntry>,
}

impl MintQueueIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, wallet: &WalletAddress) -> bool {
        self.pending.contains(wallet)
    }

    pub fn is_completed(&self, wallet: &WalletAddress) -> bool {
        self.completed.contains(wallet)
    }

    pub fn get_pending(&self, wallet: &WalletAddress) -> Result<&PendingMintEntry, LedgerError> {
        self.pending
            .get(wallet)
            .ok_or_else(|| LedgerError::NotFound(format!("pending mint entry for {wallet}")))
    }

    pub fn get_completed(
        &self,
        wallet: &WalletAddress,
    ) -> Result<&CompletedMintEntry, LedgerError> {
        self.completed
            .get(wallet)
            .ok_or_else(|| LedgerError::NotFound(format!("completed mint entry for {wallet}")))
    }

    pub fn list_pending_wallets(&self) -> impl Iterator<Item = &WalletAddress> + '_ {
        self.pending.keys()
    }

    pub fn list_completed_wallets(&self) -> impl Iterator<Item = &WalletAddress> + '_ {
        self.completed.keys()
    }

    pub fn pending_entries(&self) -> impl Iterator<Item = (u64, &PendingMintEntry)> + '_ {
        self.pending.sequenced()
    }

    pub fn completed_entries(&self) -> impl Iterator<Item = (u64, &CompletedMintEntry)> + '_ {
        self.completed.sequenced()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn next_pending_seq(&self) -> u64 {
        self.pending.next_seq()
    }

    pub fn next_completed_seq(&self) -> u64 {
        self.completed.next_seq()
    }

    pub fn pending_seq_of(&self, wallet: &WalletAddress) -> Option<u64> {
        self.pending.seq_of(wallet)
    }

    /// Validate a new pending entry.
    pub fn check_enqueue(&self, entry: &PendingMintEntry) -> Result<(), LedgerError> {
        if entry.wallet.is_null() {
            return Err(LedgerError::InvalidIdentity);
        }
        if entry.score > MAX_SCORE {
            return Err(LedgerError::ScoreOutOfRange {
                score: entry.score,
                max: MAX_SCORE,
            });
        }
        if self.is_pending(&entry.wallet) {
            return Err(LedgerError::AlreadyPending(entry.wallet.clone()));
        }
        if self.is_completed(&entry.wallet) {
            return Err(LedgerError::AlreadyCompleted(entry.wallet.clone()));
        }
        Ok(())
    }

    /// Validate a pending → completed move and return the entry that would move.
    pub fn check_complete(&self, wallet: &WalletAddress) -> Result<&PendingMintEntry, LedgerError> {
        self.pending
            .get(wallet)
            .ok_or_else(|| LedgerError::NotPending(wallet.clone()))
    }

    pub(crate) fn enqueue(&mut self, entry: PendingMintEntry) {
        if self.is_pending(&entry.wallet) || self.is_completed(&entry.wallet) {
            return;
        }
        self.pending.insert(entry.wallet.clone(), entry);
    }

    /// Move `wallet` from pending to completed. No-op if it is not pending.
    pub(crate) fn complete(
        &mut self,
        wallet: &WalletAddress,
        token_id: TokenId,
        mint_date: Timestamp,
    ) {
        if let Some(entry) = self.pending.remove(wallet) {
            self.completed.insert(
                wallet.clone(),
                CompletedMintEntry {
                    entry,
                    token_id,
                    mint_date,
                },
            );
        }
    }

    /// Rebuild a persisted pending entry.
    pub fn restore_pending(&mut self, seq: u64, entry: PendingMintEntry) {
        self.pending.insert_at(seq, entry.wallet.clone(), entry);
    }

    /// Rebuild a persisted completed entry.
    pub fn restore_completed(&mut self, seq: u64, entry: CompletedMintEntry) {
        self.completed.insert_at(seq, entry.wallet().clone(), entry);
    }

    /// Resume both insertion cursors from persisted values.
    pub fn resume_seqs(&mut self, next_pending: u64, next_completed: u64) {
        self.pending.resume_from(next_pending);
        self.completed.resume_from(next_completed);
    }
}
