//! Write batching: groups every table write of one ledger transaction into a
//! single LMDB write transaction.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = env.write_batch()?;
//! batch.put_whitelisted(0, &wallet)?;
//! batch.append_event(0, &event_bytes)?;
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`WriteBatch::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).

use heed::RwTxn;

use examcert_store::StoreWrite;
use examcert_types::{
    CertificateToken, CompletedMintEntry, MisconductFlag, PendingMintEntry, StudentRecord,
    WalletAddress,
};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> WriteBatch<'a> {
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, LmdbError> {
        let txn = env.env.write_txn()?;
        Ok(Self { txn, env })
    }

    // ── Meta ────────────────────────────────────────────────────────────

    pub fn put_meta(&mut self, key: &str, value: &[u8]) -> Result<(), LmdbError> {
        self.env.meta_db.put(&mut self.txn, key.as_bytes(), value)?;
        Ok(())
    }

    // ── Whitelist ───────────────────────────────────────────────────────

    pub fn put_whitelisted(&mut self, seq: u64, wallet: &WalletAddress) -> Result<(), LmdbError> {
        self.env.whitelist_db.put(
            &mut self.txn,
            wallet.as_str().as_bytes(),
            seq.to_be_bytes().as_slice(),
        )?;
        Ok(())
    }

    pub fn delete_whitelisted(&mut self, wallet: &WalletAddress) -> Result<(), LmdbError> {
        self.env
            .whitelist_db
            .delete(&mut self.txn, wallet.as_str().as_bytes())?;
        Ok(())
    }

    // ── Students and flags ──────────────────────────────────────────────

    pub fn put_student(&mut self, seq: u64, record: &StudentRecord) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(&(seq, record))?;
        self.env
            .students_db
            .put(&mut self.txn, record.wallet.as_str().as_bytes(), &bytes)?;
        Ok(())
    }

    pub fn put_flag(&mut self, flag: &MisconductFlag) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(flag)?;
        self.env
            .flags_db
            .put(&mut self.txn, flag.wallet.as_str().as_bytes(), &bytes)?;
        Ok(())
    }

    pub fn delete_flag(&mut self, wallet: &WalletAddress) -> Result<(), LmdbError> {
        self.env
            .flags_db
            .delete(&mut self.txn, wallet.as_str().as_bytes())?;
        Ok(())
    }

    // ── Certificates ────────────────────────────────────────────────────

    pub fn put_certificate(&mut self, token: &CertificateToken) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(token)?;
        self.env.certificates_db.put(
            &mut self.txn,
            token.token_id.as_u64().to_be_bytes().as_slice(),
            &bytes,
        )?;
        Ok(())
    }

    // ── Mint queue ──────────────────────────────────────────────────────

    pub fn put_pending(&mut self, seq: u64, entry: &PendingMintEntry) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(&(seq, entry))?;
        self.env
            .pending_db
            .put(&mut self.txn, entry.wallet.as_str().as_bytes(), &bytes)?;
        Ok(())
    }

    pub fn delete_pending(&mut self, wallet: &WalletAddress) -> Result<(), LmdbError> {
        self.env
            .pending_db
            .delete(&mut self.txn, wallet.as_str().as_bytes())?;
        Ok(())
    }

    pub fn put_completed(&mut self, seq: u64, entry: &CompletedMintEntry) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(&(seq, entry))?;
        self.env
            .completed_db
            .put(&mut self.txn, entry.wallet().as_str().as_bytes(), &bytes)?;
        Ok(())
    }

    // ── Event log ───────────────────────────────────────────────────────

    pub fn append_event(&mut self, seq: u64, event: &[u8]) -> Result<(), LmdbError> {
        self.env
            .events_db
            .put(&mut self.txn, seq.to_be_bytes().as_slice(), event)?;
        Ok(())
    }

    /// Apply one abstract store write.
    pub fn apply(&mut self, write: &StoreWrite) -> Result<(), LmdbError> {
        match write {
            StoreWrite::PutAdmin(admin) => {
                self.put_meta(examcert_store::meta::ADMIN_KEY, admin.as_str().as_bytes())
            }
            StoreWrite::PutWhitelisted { seq, wallet } => self.put_whitelisted(*seq, wallet),
            StoreWrite::DeleteWhitelisted(wallet) => self.delete_whitelisted(wallet),
            StoreWrite::PutStudent { seq, record } => self.put_student(*seq, record),
            StoreWrite::PutFlag(flag) => self.put_flag(flag),
            StoreWrite::DeleteFlag(wallet) => self.delete_flag(wallet),
            StoreWrite::PutCertificate(token) => self.put_certificate(token),
            StoreWrite::PutPending { seq, entry } => self.put_pending(*seq, entry),
            StoreWrite::DeletePending(wallet) => self.delete_pending(wallet),
            StoreWrite::PutCompleted { seq, entry } => self.put_completed(*seq, entry),
            StoreWrite::AppendEvent { seq, bytes } => self.append_event(*seq, bytes),
            StoreWrite::PutCursors(cursors) => {
                self.put_meta(examcert_store::meta::CURSORS_KEY, &cursors.to_bytes())
            }
        }
    }

    /// Commit all batched operations atomically.
    pub fn commit(self) -> Result<(), LmdbError> {
        self.txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examcert_store::{EventLogStore, WhitelistStore};

    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).expect("failed to open env");
        (dir, env)
    }

    #[test]
    fn batch_writes_committed_together() {
        let (_dir, env) = temp_env();
        let wallet = WalletAddress::from_bytes([1; 20]);

        let mut batch = env.write_batch().expect("write_batch");
        batch.put_whitelisted(0, &wallet).expect("put_whitelisted");
        batch.append_event(0, b"event-0").expect("append_event");
        batch.commit().expect("commit");

        assert!(env.is_whitelisted(&wallet).unwrap());
        assert_eq!(env.event_count().unwrap(), 1);
    }

    #[test]
    fn dropped_batch_does_not_persist() {
        let (_dir, env) = temp_env();
        let wallet = WalletAddress::from_bytes([2; 20]);
        {
            let mut batch = env.write_batch().expect("write_batch");
            batch.put_whitelisted(0, &wallet).expect("put_whitelisted");
            // dropped here: implicit rollback
        }
        assert!(!env.is_whitelisted(&wallet).unwrap());
        assert_eq!(env.event_count().unwrap(), 0);
    }
}
