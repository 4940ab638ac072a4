//! LMDB implementation of MintQueueStore.

use examcert_store::{MintQueueStore, StoreError};
use examcert_types::{CompletedMintEntry, PendingMintEntry, WalletAddress};

use crate::LmdbEnvironment;

impl MintQueueStore for LmdbEnvironment {
    fn put_pending(&self, seq: u64, entry: &PendingMintEntry) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        batch.put_pending(seq, entry)?;
        batch.commit()?;
        Ok(())
    }

    fn delete_pending(&self, wallet: &WalletAddress) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        batch.delete_pending(wallet)?;
        batch.commit()?;
        Ok(())
    }

    fn put_completed(&self, seq: u64, entry: &CompletedMintEntry) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        batch.put_completed(seq, entry)?;
        batch.commit()?;
        Ok(())
    }

    fn iter_pending(&self) -> Result<Vec<(u64, PendingMintEntry)>, StoreError> {
        Ok(self.read_sequenced(&self.pending_db)?)
    }

    fn iter_completed(&self) -> Result<Vec<(u64, CompletedMintEntry)>, StoreError> {
        Ok(self.read_sequenced(&self.completed_db)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examcert_types::{Timestamp, TokenId};

    fn entry(n: u8) -> PendingMintEntry {
        PendingMintEntry {
            wallet: WalletAddress::from_bytes([n; 20]),
            student_id: format!("SV{n:03}"),
            subject: "Math".into(),
            exam_session: "S1".into(),
            score: 70,
            exam_date: Timestamp::new(1),
            ip_address: "ip".into(),
            added_at: Timestamp::new(2),
        }
    }

    #[test]
    fn pending_moves_to_completed() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).unwrap();
        env.put_pending(0, &entry(9)).unwrap();
        env.put_pending(1, &entry(1)).unwrap();
        assert_eq!(
            env.iter_pending().unwrap(),
            vec![(0, entry(9)), (1, entry(1))]
        );

        let done = CompletedMintEntry {
            entry: entry(9),
            token_id: TokenId::FIRST,
            mint_date: Timestamp::new(3),
        };
        let mut batch = env.write_batch().unwrap();
        batch.delete_pending(&done.entry.wallet).unwrap();
        batch.put_completed(0, &done).unwrap();
        batch.commit().unwrap();

        assert_eq!(env.iter_pending().unwrap(), vec![(1, entry(1))]);
        assert_eq!(env.iter_completed().unwrap(), vec![(0, done)]);
    }
}
