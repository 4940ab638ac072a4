//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the node accepts
//! transactions.

use std::path::Path;

use heed::types::Bytes;

use crate::environment::{LmdbEnvironment, DATABASE_NAMES};
use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Open each expected database and count its entries.
///
/// Read failures are recorded in the report rather than causing a hard error.
pub fn check_integrity(env: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };

    let rtxn = env.env().read_txn()?;

    for &db_name in DATABASE_NAMES {
        match env.env().open_database::<Bytes, Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{db_name}': {e}")),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{db_name}' is missing")),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{db_name}': {e}")),
        }
    }

    Ok(report)
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists but `data.mdb` is missing.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use examcert_store::WhitelistStore;
    use examcert_types::WalletAddress;

    #[test]
    fn check_data_dir_fresh_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(&dir.path().join("missing")).is_ok());
    }

    #[test]
    fn check_data_dir_without_data_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(dir.path()).is_err());
    }

    #[test]
    fn fresh_environment_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).unwrap();
        env.put_whitelisted(0, &WalletAddress::from_bytes([1; 20]))
            .unwrap();

        let report = check_integrity(&env).unwrap();
        assert!(report.is_healthy(), "{:?}", report.errors);
        assert_eq!(report.databases_checked, DATABASE_NAMES.len() as u32);
        assert_eq!(report.total_entries, 1);
    }
}
