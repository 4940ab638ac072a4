//! Nullable store: thread-safe in-memory storage for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use examcert_store::{
    CertificateStore, ChangeSet, EventLogStore, FlagStore, LedgerStore, MetaStore, MintQueueStore,
    StoreError, StoreWrite, StudentStore, WhitelistStore,
};
use examcert_store::meta::{ADMIN_KEY, CURSORS_KEY};
use examcert_types::{
    CertificateToken, CompletedMintEntry, MisconductFlag, PendingMintEntry, StudentRecord,
    TokenId, WalletAddress,
};

#[derive(Clone, Debug, Default)]
struct Tables {
    meta: BTreeMap<String, Vec<u8>>,
    whitelist: BTreeMap<WalletAddress, u64>,
    students: BTreeMap<WalletAddress, (u64, StudentRecord)>,
    flags: BTreeMap<WalletAddress, MisconductFlag>,
    certificates: BTreeMap<u64, CertificateToken>,
    pending: BTreeMap<WalletAddress, (u64, PendingMintEntry)>,
    completed: BTreeMap<WalletAddress, (u64, CompletedMintEntry)>,
    events: BTreeMap<u64, Vec<u8>>,
}

impl Tables {
    fn apply(&mut self, write: &StoreWrite) {
        match write {
            StoreWrite::PutAdmin(admin) => {
                self.meta
                    .insert(ADMIN_KEY.to_string(), admin.as_str().as_bytes().to_vec());
            }
            StoreWrite::PutWhitelisted { seq, wallet } => {
                self.whitelist.insert(wallet.clone(), *seq);
            }
            StoreWrite::DeleteWhitelisted(wallet) => {
                self.whitelist.remove(wallet);
            }
            StoreWrite::PutStudent { seq, record } => {
                self.students
                    .insert(record.wallet.clone(), (*seq, record.clone()));
            }
            StoreWrite::PutFlag(flag) => {
                self.flags.insert(flag.wallet.clone(), flag.clone());
            }
            StoreWrite::DeleteFlag(wallet) => {
                self.flags.remove(wallet);
            }
            StoreWrite::PutCertificate(token) => {
                self.certificates
                    .insert(token.token_id.as_u64(), token.clone());
            }
            StoreWrite::PutPending { seq, entry } => {
                self.pending
                    .insert(entry.wallet.clone(), (*seq, entry.clone()));
            }
            StoreWrite::DeletePending(wallet) => {
                self.pending.remove(wallet);
            }
            StoreWrite::PutCompleted { seq, entry } => {
                self.completed
                    .insert(entry.wallet().clone(), (*seq, entry.clone()));
            }
            StoreWrite::AppendEvent { seq, bytes } => {
                self.events.insert(*seq, bytes.clone());
            }
            StoreWrite::PutCursors(cursors) => {
                self.meta
                    .insert(CURSORS_KEY.to_string(), cursors.to_bytes().to_vec());
            }
        }
    }
}

fn sorted_by_seq<T: Clone>(map: &BTreeMap<WalletAddress, (u64, T)>) -> Vec<(u64, T)> {
    let mut out: Vec<(u64, T)> = map.values().cloned().collect();
    out.sort_by_key(|(seq, _)| *seq);
    out
}

/// An in-memory [`LedgerStore`] for testing.
///
/// [`NullStore::fail_next_commit`] makes the next commit return a backend
/// error without writing anything, for exercising rollback paths.
#[derive(Debug, Default)]
pub struct NullStore {
    tables: Mutex<Tables>,
    fail_next_commit: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("null store lock poisoned".into()))
    }

    fn write(&self, write: StoreWrite) -> Result<(), StoreError> {
        let mut changes = ChangeSet::new();
        changes.push(write);
        self.commit(&changes)
    }
}

impl MetaStore for NullStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.tables()?.meta.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.tables()?.meta.get(key).cloned())
    }

    fn delete_meta(&self, key: &str) -> Result<(), StoreError> {
        self.tables()?.meta.remove(key);
        Ok(())
    }
}

impl WhitelistStore for NullStore {
    fn put_whitelisted(&self, seq: u64, wallet: &WalletAddress) -> Result<(), StoreError> {
        self.write(StoreWrite::PutWhitelisted {
            seq,
            wallet: wallet.clone(),
        })
    }

    fn delete_whitelisted(&self, wallet: &WalletAddress) -> Result<(), StoreError> {
        self.write(StoreWrite::DeleteWhitelisted(wallet.clone()))
    }

    fn is_whitelisted(&self, wallet: &WalletAddress) -> Result<bool, StoreError> {
        Ok(self.tables()?.whitelist.contains_key(wallet))
    }

    fn iter_whitelist(&self) -> Result<Vec<(u64, WalletAddress)>, StoreError> {
        let tables = self.tables()?;
        let mut out: Vec<(u64, WalletAddress)> = tables
            .whitelist
            .iter()
            .map(|(w, seq)| (*seq, w.clone()))
            .collect();
        out.sort_by_key(|(seq, _)| *seq);
        Ok(out)
    }
}

impl StudentStore for NullStore {
    fn put_student(&self, seq: u64, record: &StudentRecord) -> Result<(), StoreError> {
        self.write(StoreWrite::PutStudent {
            seq,
            record: record.clone(),
        })
    }

    fn get_student(&self, wallet: &WalletAddress) -> Result<StudentRecord, StoreError> {
        self.tables()?
            .students
            .get(wallet)
            .map(|(_, r)| r.clone())
            .ok_or_else(|| StoreError::NotFound(format!("student {wallet}")))
    }

    fn iter_students(&self) -> Result<Vec<(u64, StudentRecord)>, StoreError> {
        Ok(sorted_by_seq(&self.tables()?.students))
    }

    fn student_count(&self) -> Result<u64, StoreError> {
        Ok(self.tables()?.students.len() as u64)
    }
}

impl FlagStore for NullStore {
    fn put_flag(&self, flag: &MisconductFlag) -> Result<(), StoreError> {
        self.write(StoreWrite::PutFlag(flag.clone()))
    }

    fn delete_flag(&self, wallet: &WalletAddress) -> Result<(), StoreError> {
        self.write(StoreWrite::DeleteFlag(wallet.clone()))
    }

    fn iter_flags(&self) -> Result<Vec<MisconductFlag>, StoreError> {
        Ok(self.tables()?.flags.values().cloned().collect())
    }
}

impl CertificateStore for NullStore {
    fn put_certificate(&self, token: &CertificateToken) -> Result<(), StoreError> {
        self.write(StoreWrite::PutCertificate(token.clone()))
    }

    fn get_certificate(&self, token_id: TokenId) -> Result<CertificateToken, StoreError> {
        self.tables()?
            .certificates
            .get(&token_id.as_u64())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("certificate #{token_id}")))
    }

    fn iter_certificates(&self) -> Result<Vec<CertificateToken>, StoreError> {
        Ok(self.tables()?.certificates.values().cloned().collect())
    }

    fn certificate_count(&self) -> Result<u64, StoreError> {
        Ok(self.tables()?.certificates.len() as u64)
    }
}

impl MintQueueStore for NullStore {
    fn put_pending(&self, seq: u64, entry: &PendingMintEntry) -> Result<(), StoreError> {
        self.write(StoreWrite::PutPending {
            seq,
            entry: entry.clone(),
        })
    }

    fn delete_pending(&self, wallet: &WalletAddress) -> Result<(), StoreError> {
        self.write(StoreWrite::DeletePending(wallet.clone()))
    }

    fn put_completed(&self, seq: u64, entry: &CompletedMintEntry) -> Result<(), StoreError> {
        self.write(StoreWrite::PutCompleted {
            seq,
            entry: entry.clone(),
        })
    }

    fn iter_pending(&self) -> Result<Vec<(u64, PendingMintEntry)>, StoreError> {
        Ok(sorted_by_seq(&self.tables()?.pending))
    }

    fn iter_completed(&self) -> Result<Vec<(u64, CompletedMintEntry)>, StoreError> {
        Ok(sorted_by_seq(&self.tables()?.completed))
    }
}

impl EventLogStore for NullStore {
    fn append_event(&self, seq: u64, event: &[u8]) -> Result<(), StoreError> {
        self.write(StoreWrite::AppendEvent {
            seq,
            bytes: event.to_vec(),
        })
    }

    fn iter_events(&self, from: u64) -> Result<Vec<(u64, Vec<u8>)>, StoreError> {
        Ok(self
            .tables()?
            .events
            .range(from..)
            .map(|(seq, bytes)| (*seq, bytes.clone()))
            .collect())
    }

    fn event_count(&self) -> Result<u64, StoreError> {
        Ok(self.tables()?.events.len() as u64)
    }
}

impl LedgerStore for NullStore {
    fn commit(&self, changes: &ChangeSet) -> Result<(), StoreError> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit failure".into()));
        }
        let mut tables = self.tables()?;
        let mut staged = tables.clone();
        for write in changes.writes() {
            staged.apply(write);
        }
        *tables = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examcert_store::StoredLedger;
    use examcert_types::Timestamp;

    fn addr(n: u8) -> WalletAddress {
        WalletAddress::from_bytes([n; 20])
    }

    #[test]
    fn commit_then_load() {
        let store = NullStore::new();
        let mut changes = ChangeSet::new();
        changes.push(StoreWrite::PutAdmin(addr(0xad)));
        changes.push(StoreWrite::PutWhitelisted { seq: 1, wallet: addr(2) });
        changes.push(StoreWrite::PutWhitelisted { seq: 0, wallet: addr(9) });
        changes.push(StoreWrite::PutStudent {
            seq: 0,
            record: StudentRecord::new(addr(9), "SV", "Math", "S1", Timestamp::new(1)),
        });
        store.commit(&changes).unwrap();

        let loaded = StoredLedger::load(&store).unwrap();
        assert_eq!(loaded.admin, Some(addr(0xad)));
        assert_eq!(loaded.whitelist, vec![(0, addr(9)), (1, addr(2))]);
        assert_eq!(loaded.students.len(), 1);
        assert_eq!(store.student_count().unwrap(), 1);
    }

    #[test]
    fn injected_failure_writes_nothing() {
        let store = NullStore::new();
        store.fail_next_commit();
        let mut changes = ChangeSet::new();
        changes.push(StoreWrite::PutWhitelisted { seq: 0, wallet: addr(1) });
        assert!(matches!(store.commit(&changes), Err(StoreError::Backend(_))));
        assert!(!store.is_whitelisted(&addr(1)).unwrap());

        store.commit(&changes).unwrap();
        assert!(store.is_whitelisted(&addr(1)).unwrap());
    }

    #[test]
    fn event_log_ranges() {
        let store = NullStore::new();
        for seq in 0..4u64 {
            store.append_event(seq, &[seq as u8]).unwrap();
        }
        assert_eq!(store.event_count().unwrap(), 4);
        assert_eq!(store.iter_events(2).unwrap(), vec![(2, vec![2]), (3, vec![3])]);
    }
}
