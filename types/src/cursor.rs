//! Insertion cursors for the sequence-ordered tables.

use serde::{Deserialize, Serialize};

/// Next insertion sequence number of every sequence-ordered table.
///
/// A cursor only moves forward. Removing the newest entry of a table does
/// not hand its sequence number out again, so the cursors are persisted next
/// to the tables instead of being derived from the surviving entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableCursors {
    pub whitelist: u64,
    pub students: u64,
    pub pending: u64,
    pub completed: u64,
}

impl TableCursors {
    /// Size of the fixed-width encoding.
    pub const ENCODED_LEN: usize = 32;

    /// Fixed-width little-endian encoding, in field order.
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        for (chunk, value) in out
            .chunks_exact_mut(8)
            .zip([self.whitelist, self.students, self.pending, self.completed])
        {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Decode [`TableCursors::to_bytes`] output. `None` on a length mismatch.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::ENCODED_LEN {
            return None;
        }
        let mut values = [0u64; 4];
        for (value, chunk) in values.iter_mut().zip(bytes.chunks_exact(8)) {
            let arr: [u8; 8] = chunk.try_into().ok()?;
            *value = u64::from_le_bytes(arr);
        }
        let [whitelist, students, pending, completed] = values;
        Some(Self {
            whitelist,
            students,
            pending,
            completed,
        })
    }

    /// Field-wise maximum.
    pub fn max(self, other: Self) -> Self {
        Self {
            whitelist: self.whitelist.max(other.whitelist),
            students: self.students.max(other.students),
            pending: self.pending.max(other.pending),
            completed: self.completed.max(other.completed),
        }
    }
}
