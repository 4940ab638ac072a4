//! Ledger snapshots: capture the whole ledger state at a point in time.
//!
//! A snapshot lets an operator export the ledger and rebuild it elsewhere
//! without replaying the event log. Every collection is stored in its
//! canonical order (insertion sequence, wallet order for flags, token id for
//! certificates) so the Blake2b-256 hash is deterministic.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};

use examcert_types::{
    CertificateToken, CompletedMintEntry, MisconductFlag, PendingMintEntry, StudentRecord,
    TableCursors, Timestamp, WalletAddress,
};

use crate::access::AccessControl;
use crate::certificate::CertificateLedger;
use crate::error::LedgerError;
use crate::ledger::ExamLedger;
use crate::mint_queue::MintQueueIndex;
use crate::registration::RegistrationLedger;
use crate::whitelist::WhitelistRegistry;

/// Current snapshot format.
pub const SNAPSHOT_VERSION: u32 = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Snapshot format version.
    pub version: u32,
    pub admin: WalletAddress,
    /// `(seq, wallet)` in insertion order.
    pub whitelist: Vec<(u64, WalletAddress)>,
    /// `(seq, record)` in registration order.
    pub students: Vec<(u64, StudentRecord)>,
    pub flags: Vec<MisconductFlag>,
    /// Certificates in token id order.
    pub certificates: Vec<CertificateToken>,
    pub pending: Vec<(u64, PendingMintEntry)>,
    pub completed: Vec<(u64, CompletedMintEntry)>,
    /// Insertion cursors, so a restored ledger numbers new entries the same way.
    pub cursors: TableCursors,
    /// When the snapshot was taken. Not covered by the hash.
    pub created_at: Timestamp,
    /// Blake2b-256 over the content fields.
    pub hash: [u8; 32],
}

impl LedgerSnapshot {
    /// Capture `ledger` as of `now`.
    pub fn capture(ledger: &ExamLedger, now: Timestamp) -> Result<Self, LedgerError> {
        let mut snap = Self {
            version: SNAPSHOT_VERSION,
            admin: ledger.admin().clone(),
            whitelist: ledger
                .whitelist()
                .entries()
                .map(|(seq, w)| (seq, w.clone()))
                .collect(),
            students: ledger
                .registrations()
                .entries()
                .map(|(seq, r)| (seq, r.clone()))
                .collect(),
            flags: ledger.registrations().flags().cloned().collect(),
            certificates: ledger.certificates().list().cloned().collect(),
            pending: ledger
                .mint_queue()
                .pending_entries()
                .map(|(seq, e)| (seq, e.clone()))
                .collect(),
            completed: ledger
                .mint_queue()
                .completed_entries()
                .map(|(seq, e)| (seq, e.clone()))
                .collect(),
            cursors: ledger.cursors(),
            created_at: now,
            hash: [0u8; 32],
        };
        snap.hash = snap.compute_hash()?;
        Ok(snap)
    }

    fn compute_hash(&self) -> Result<[u8; 32], LedgerError> {
        let content = bincode::serialize(&(
            self.version,
            &self.admin,
            &self.whitelist,
            &self.students,
            &self.flags,
            &self.certificates,
            &self.pending,
            &self.completed,
            &self.cursors,
        ))
        .map_err(|e| LedgerError::Snapshot(e.to_string()))?;

        let mut hasher = Blake2b::<U32>::new();
        hasher.update(&content);
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        Ok(out)
    }

    /// True if the stored hash matches the content.
    pub fn verify(&self) -> bool {
        self.compute_hash().is_ok_and(|h| h == self.hash)
    }

    /// Hex form of the hash, for display.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Rebuild a ledger from this snapshot after checking version and hash.
    pub fn restore(&self) -> Result<ExamLedger, LedgerError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(LedgerError::Snapshot(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                self.version
            )));
        }
        if !self.verify() {
            return Err(LedgerError::Snapshot("hash mismatch".to_string()));
        }

        let access = AccessControl::new(self.admin.clone())?;

        let mut whitelist = WhitelistRegistry::new();
        for (seq, wallet) in &self.whitelist {
            whitelist.restore(*seq, wallet.clone());
        }

        let mut registrations = RegistrationLedger::new();
        for (seq, record) in &self.students {
            registrations.restore(*seq, record.clone());
        }
        for flag in &self.flags {
            registrations.restore_flag(flag.clone());
        }

        let mut certificates = CertificateLedger::new();
        for token in &self.certificates {
            certificates.restore(token.clone());
        }
        if certificates.total_supply() != self.certificates.len() as u64 {
            return Err(LedgerError::Snapshot(
                "certificate ids are not sequential".to_string(),
            ));
        }

        let mut mint_queue = MintQueueIndex::new();
        for (seq, entry) in &self.pending {
            mint_queue.restore_pending(*seq, entry.clone());
        }
        for (seq, entry) in &self.completed {
            mint_queue.restore_completed(*seq, entry.clone());
        }

        let mut ledger =
            ExamLedger::from_parts(access, whitelist, registrations, certificates, mint_queue);
        ledger.resume_cursors(self.cursors);
        Ok(ledger)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        bincode::serialize(self).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        bincode::deserialize(bytes).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }
}
