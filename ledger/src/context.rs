//! Per-transaction context passed into every operation.

use examcert_types::{Timestamp, WalletAddress};

/// Who is calling and when the transaction commits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxContext {
    pub caller: WalletAddress,
    pub now: Timestamp,
}

impl TxContext {
    pub fn new(caller: WalletAddress, now: Timestamp) -> Self {
        Self { caller, now }
    }
}
