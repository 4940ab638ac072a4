//! LMDB implementation of MetaStore.

use examcert_store::meta::MetaStore;
use examcert_store::StoreError;

use crate::{LmdbEnvironment, LmdbError};

impl MetaStore for LmdbEnvironment {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        batch.put_meta(key, value)?;
        batch.commit()?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(val.map(<[u8]>::to_vec))
    }

    fn delete_meta(&self, key: &str) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .delete(&mut wtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
