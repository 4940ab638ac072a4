//! LMDB implementations of StudentStore and FlagStore.

use examcert_store::{FlagStore, StoreError, StudentStore};
use examcert_types::{MisconductFlag, StudentRecord, WalletAddress};

use crate::{LmdbEnvironment, LmdbError};

impl StudentStore for LmdbEnvironment {
    fn put_student(&self, seq: u64, record: &StudentRecord) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        batch.put_student(seq, record)?;
        batch.commit()?;
        Ok(())
    }

    fn get_student(&self, wallet: &WalletAddress) -> Result<StudentRecord, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .students_db
            .get(&rtxn, wallet.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("student {wallet}")))?;
        let (_, record): (u64, StudentRecord) =
            bincode::deserialize(bytes).map_err(LmdbError::from)?;
        Ok(record)
    }

    fn iter_students(&self) -> Result<Vec<(u64, StudentRecord)>, StoreError> {
        Ok(self.read_sequenced(&self.students_db)?)
    }

    fn student_count(&self) -> Result<u64, StoreError> {
        Ok(self.count(&self.students_db)?)
    }
}

impl FlagStore for LmdbEnvironment {
    fn put_flag(&self, flag: &MisconductFlag) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        batch.put_flag(flag)?;
        batch.commit()?;
        Ok(())
    }

    fn delete_flag(&self, wallet: &WalletAddress) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        batch.delete_flag(wallet)?;
        batch.commit()?;
        Ok(())
    }

    fn iter_flags(&self) -> Result<Vec<MisconductFlag>, StoreError> {
        Ok(self.read_all(&self.flags_db)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examcert_types::Timestamp;

    #[test]
    fn student_records_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = WalletAddress::from_bytes([5; 20]);
        let mut record =
            StudentRecord::new(wallet.clone(), "SV001", "Math", "S1", Timestamp::new(10));
        {
            let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).unwrap();
            env.put_student(0, &record).unwrap();
            record.is_verified = true;
            record.verification_time = Some(Timestamp::new(11));
            env.put_student(0, &record).unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).unwrap();
        assert_eq!(env.get_student(&wallet).unwrap(), record);
        assert_eq!(env.student_count().unwrap(), 1);
        assert_eq!(env.iter_students().unwrap(), vec![(0, record)]);
        assert!(matches!(
            env.get_student(&WalletAddress::from_bytes([6; 20])),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn flags_put_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).unwrap();
        let flag = MisconductFlag {
            wallet: WalletAddress::from_bytes([5; 20]),
            reason: "phone".into(),
            flagged_at: Timestamp::new(3),
        };
        env.put_flag(&flag).unwrap();
        assert_eq!(env.iter_flags().unwrap(), vec![flag.clone()]);
        env.delete_flag(&flag.wallet).unwrap();
        assert!(env.iter_flags().unwrap().is_empty());
    }
}
