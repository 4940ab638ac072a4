//! Atomic change sets.
//!
//! A [`ChangeSet`] collects every table write produced by one ledger
//! transaction. Backends commit it as a single unit: either every write lands
//! or none does.

use examcert_types::{
    CertificateToken, CompletedMintEntry, MisconductFlag, PendingMintEntry, StudentRecord,
    TableCursors, WalletAddress,
};

/// One table write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreWrite {
    PutAdmin(WalletAddress),
    PutWhitelisted { seq: u64, wallet: WalletAddress },
    DeleteWhitelisted(WalletAddress),
    PutStudent { seq: u64, record: StudentRecord },
    PutFlag(MisconductFlag),
    DeleteFlag(WalletAddress),
    PutCertificate(CertificateToken),
    PutPending { seq: u64, entry: PendingMintEntry },
    DeletePending(WalletAddress),
    PutCompleted { seq: u64, entry: CompletedMintEntry },
    AppendEvent { seq: u64, bytes: Vec<u8> },
    /// Insertion cursors after the transaction.
    PutCursors(TableCursors),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    writes: Vec<StoreWrite>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: StoreWrite) {
        self.writes.push(write);
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Writes in the order they must be applied.
    pub fn writes(&self) -> &[StoreWrite] {
        &self.writes
    }
}

impl Extend<StoreWrite> for ChangeSet {
    fn extend<T: IntoIterator<Item = StoreWrite>>(&mut self, iter: T) {
        self.writes.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_push_order() {
        let a = WalletAddress::from_bytes([1; 20]);
        let mut changes = ChangeSet::new();
        assert!(changes.is_empty());
        changes.push(StoreWrite::PutWhitelisted { seq: 0, wallet: a.clone() });
        changes.extend([StoreWrite::DeleteWhitelisted(a.clone())]);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes.writes()[1], StoreWrite::DeleteWhitelisted(a));
    }
}
