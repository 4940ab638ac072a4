//! Fundamental types for the examcert ledger.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! wallet addresses, timestamps, token ids, and the records persisted for each
//! student (registration, misconduct, certificate, mint queue entries).

pub mod address;
pub mod certificate;
pub mod cursor;
pub mod error;
pub mod mint;
pub mod state;
pub mod student;
pub mod time;

pub use address::WalletAddress;
pub use certificate::{CertificateToken, TokenId};
pub use cursor::TableCursors;
pub use error::TypeError;
pub use mint::{CompletedMintEntry, PendingMintEntry, Score, MAX_SCORE};
pub use state::StudentState;
pub use student::{MisconductFlag, StudentRecord};
pub use time::Timestamp;
