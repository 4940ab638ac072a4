//! Student registration and misconduct storage traits.

use examcert_types::{MisconductFlag, StudentRecord, WalletAddress};

use crate::StoreError;

/// Persisted registration records, keyed by wallet.
pub trait StudentStore {
    /// Insert or overwrite the record for `record.wallet`.
    fn put_student(&self, seq: u64, record: &StudentRecord) -> Result<(), StoreError>;

    fn get_student(&self, wallet: &WalletAddress) -> Result<StudentRecord, StoreError>;

    /// All records as `(seq, record)`, ordered by `seq`.
    fn iter_students(&self) -> Result<Vec<(u64, StudentRecord)>, StoreError>;

    fn student_count(&self) -> Result<u64, StoreError>;
}

/// Persisted misconduct flags, keyed by wallet.
pub trait FlagStore {
    fn put_flag(&self, flag: &MisconductFlag) -> Result<(), StoreError>;

    fn delete_flag(&self, wallet: &WalletAddress) -> Result<(), StoreError>;

    /// All flags ordered by wallet.
    fn iter_flags(&self) -> Result<Vec<MisconductFlag>, StoreError>;
}
