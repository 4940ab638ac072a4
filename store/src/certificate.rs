//! Certificate storage trait.

use examcert_types::{CertificateToken, TokenId};

use crate::StoreError;

/// Persisted certificate tokens, keyed by token id.
pub trait CertificateStore {
    fn put_certificate(&self, token: &CertificateToken) -> Result<(), StoreError>;

    fn get_certificate(&self, token_id: TokenId) -> Result<CertificateToken, StoreError>;

    /// All tokens in token id order.
    fn iter_certificates(&self) -> Result<Vec<CertificateToken>, StoreError>;

    fn certificate_count(&self) -> Result<u64, StoreError>;
}
