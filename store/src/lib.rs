//! Abstract storage traits for the examcert ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod batch;
pub mod certificate;
pub mod error;
pub mod event_log;
pub mod meta;
pub mod mint_queue;
pub mod student;
pub mod whitelist;

pub use batch::{ChangeSet, StoreWrite};
pub use certificate::CertificateStore;
pub use error::StoreError;
pub use event_log::EventLogStore;
pub use meta::MetaStore;
pub use mint_queue::MintQueueStore;
pub use student::{FlagStore, StudentStore};
pub use whitelist::WhitelistStore;

use examcert_types::{
    CertificateToken, CompletedMintEntry, MisconductFlag, PendingMintEntry, StudentRecord,
    TableCursors, WalletAddress,
};

/// Schema version written by this release.
pub const SCHEMA_VERSION: u32 = 1;

/// A complete backend: every table plus atomic multi-table commits.
pub trait LedgerStore:
    MetaStore
    + WhitelistStore
    + StudentStore
    + FlagStore
    + CertificateStore
    + MintQueueStore
    + EventLogStore
    + Send
    + Sync
{
    /// Apply every write in `changes` atomically.
    fn commit(&self, changes: &ChangeSet) -> Result<(), StoreError>;
}

/// Every persisted table, read in canonical order.
#[derive(Clone, Debug, Default)]
pub struct StoredLedger {
    pub admin: Option<WalletAddress>,
    pub whitelist: Vec<(u64, WalletAddress)>,
    pub students: Vec<(u64, StudentRecord)>,
    pub flags: Vec<MisconductFlag>,
    pub certificates: Vec<CertificateToken>,
    pub pending: Vec<(u64, PendingMintEntry)>,
    pub completed: Vec<(u64, CompletedMintEntry)>,
    pub cursors: TableCursors,
}

impl StoredLedger {
    /// Read all tables from `store`.
    pub fn load<S: LedgerStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        Ok(Self {
            admin: store.get_admin()?,
            whitelist: store.iter_whitelist()?,
            students: store.iter_students()?,
            flags: store.iter_flags()?,
            certificates: store.iter_certificates()?,
            pending: store.iter_pending()?,
            completed: store.iter_completed()?,
            cursors: store.get_cursors()?,
        })
    }

    /// True if nothing was ever committed.
    pub fn is_fresh(&self) -> bool {
        self.admin.is_none()
    }
}
