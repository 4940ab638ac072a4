//! Append-only event log storage trait.

use crate::StoreError;

/// Committed ledger events as opaque encoded bytes, keyed by a dense sequence
/// number starting at 0.
pub trait EventLogStore {
    fn append_event(&self, seq: u64, event: &[u8]) -> Result<(), StoreError>;

    /// Events with `seq >= from`, in order.
    fn iter_events(&self, from: u64) -> Result<Vec<(u64, Vec<u8>)>, StoreError>;

    /// Number of events, which is also the next sequence number.
    fn event_count(&self) -> Result<u64, StoreError>;
}
