//! Metadata storage trait.

use examcert_types::{TableCursors, WalletAddress};

use crate::StoreError;

/// Key under which the administrator address is kept.
pub const ADMIN_KEY: &str = "admin";
/// Key under which the table insertion cursors are kept.
pub const CURSORS_KEY: &str = "table_cursors";
/// Key under which the schema version is kept.
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Trait for storing database metadata (schema version, administrator).
///
/// A generic key-value store for bookkeeping that doesn't belong in any
/// domain-specific store.
pub trait MetaStore {
    /// Store a metadata value.
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Retrieve a metadata value. `None` if the key was never written.
    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Delete a metadata entry.
    fn delete_meta(&self, key: &str) -> Result<(), StoreError>;

    /// Current schema version, 0 for a fresh database.
    fn get_schema_version(&self) -> Result<u32, StoreError> {
        match self.get_meta(SCHEMA_VERSION_KEY)? {
            None => Ok(0),
            Some(bytes) => {
                let arr: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Corruption("schema_version has unexpected byte length".into())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.put_meta(SCHEMA_VERSION_KEY, &version.to_le_bytes())
    }

    /// The persisted administrator, if the ledger was ever initialised.
    fn get_admin(&self) -> Result<Option<WalletAddress>, StoreError> {
        match self.get_meta(ADMIN_KEY)? {
            None => Ok(None),
            Some(bytes) => {
                let text = String::from_utf8(bytes)
                    .map_err(|e| StoreError::Corruption(format!("admin: {e}")))?;
                WalletAddress::parse(&text)
                    .map(Some)
                    .map_err(|e| StoreError::Corruption(format!("admin: {e}")))
            }
        }
    }

    /// Persisted insertion cursors. Zero for a ledger that never wrote them.
    fn get_cursors(&self) -> Result<TableCursors, StoreError> {
        match self.get_meta(CURSORS_KEY)? {
            None => Ok(TableCursors::default()),
            Some(bytes) => TableCursors::from_bytes(&bytes).ok_or_else(|| {
                StoreError::Corruption("table_cursors has unexpected byte length".into())
            }),
        }
    }
}
