//! LMDB implementation of CertificateStore.

use examcert_store::{CertificateStore, StoreError};
use examcert_types::{CertificateToken, TokenId};

use crate::{LmdbEnvironment, LmdbError};

impl CertificateStore for LmdbEnvironment {
    fn put_certificate(&self, token: &CertificateToken) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        batch.put_certificate(token)?;
        batch.commit()?;
        Ok(())
    }

    fn get_certificate(&self, token_id: TokenId) -> Result<CertificateToken, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .certificates_db
            .get(&rtxn, token_id.as_u64().to_be_bytes().as_slice())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("certificate #{token_id}")))?;
        Ok(bincode::deserialize(bytes).map_err(LmdbError::from)?)
    }

    fn iter_certificates(&self) -> Result<Vec<CertificateToken>, StoreError> {
        // Big-endian keys iterate in token id order.
        Ok(self.read_all(&self.certificates_db)?)
    }

    fn certificate_count(&self) -> Result<u64, StoreError> {
        Ok(self.count(&self.certificates_db)?)
    }
}
