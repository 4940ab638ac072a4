//! LMDB storage backend for the examcert ledger.
//!
//! Implements every storage trait from `examcert-store` using the `heed` LMDB
//! bindings. Each logical table maps to one named database within a single
//! environment, and [`LedgerStore::commit`] writes a whole change set in one
//! LMDB write transaction.

pub mod certificate;
pub mod environment;
pub mod error;
pub mod event_log;
pub mod integrity;
pub mod meta;
pub mod migration;
pub mod mint_queue;
pub mod student;
pub mod whitelist;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use migration::Migrator;
pub use write_batch::WriteBatch;

use examcert_store::{ChangeSet, LedgerStore, StoreError};

impl LedgerStore for LmdbEnvironment {
    fn commit(&self, changes: &ChangeSet) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        for write in changes.writes() {
            batch.apply(write)?;
        }
        batch.commit()?;
        tracing::trace!(writes = changes.len(), "committed change set");
        Ok(())
    }
}
