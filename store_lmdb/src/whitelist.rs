//! LMDB implementation of WhitelistStore.

use examcert_store::{StoreError, WhitelistStore};
use examcert_types::WalletAddress;

use crate::environment::decode_u64;
use crate::{LmdbEnvironment, LmdbError};

impl WhitelistStore for LmdbEnvironment {
    fn put_whitelisted(&self, seq: u64, wallet: &WalletAddress) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        batch.put_whitelisted(seq, wallet)?;
        batch.commit()?;
        Ok(())
    }

    fn delete_whitelisted(&self, wallet: &WalletAddress) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        batch.delete_whitelisted(wallet)?;
        batch.commit()?;
        Ok(())
    }

    fn is_whitelisted(&self, wallet: &WalletAddress) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .whitelist_db
            .get(&rtxn, wallet.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        Ok(found.is_some())
    }

    fn iter_whitelist(&self) -> Result<Vec<(u64, WalletAddress)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for item in self.whitelist_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (key, value) = item.map_err(LmdbError::from)?;
            let text = std::str::from_utf8(key)
                .map_err(|e| StoreError::Corruption(format!("whitelist key: {e}")))?;
            let wallet = WalletAddress::parse(text)
                .map_err(|e| StoreError::Corruption(format!("whitelist key: {e}")))?;
            out.push((decode_u64(value)?, wallet));
        }
        out.sort_by_key(|(seq, _)| *seq);
        Ok(out)
    }
}
