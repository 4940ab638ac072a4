use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("ledger error: {0}")]
    Ledger(#[from] examcert_ledger::LedgerError),

    #[error("store error: {0}")]
    Store(#[from] examcert_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] examcert_store_lmdb::LmdbError),

    #[error("config error: {0}")]
    Config(String),

    #[error("event codec error: {0}")]
    Codec(String),

    #[error("data directory is not initialized; run `init --admin <address>` first")]
    NotInitialized,

    #[error("data directory is already initialized (admin {0})")]
    AlreadyInitialized(examcert_types::WalletAddress),

    #[error("stored state is inconsistent: {0}")]
    Inconsistent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("node state lock poisoned")]
    LockPoisoned,
}

impl From<bincode::Error> for NodeError {
    fn from(e: bincode::Error) -> Self {
        NodeError::Codec(e.to_string())
    }
}
