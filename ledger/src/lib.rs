//! Eligibility and issuance ledger.
//!
//! Five coupled state machines, leaves first:
//! - [`AccessControl`]: the single administrator identity.
//! - [`WhitelistRegistry`]: administrator-curated set of eligible wallets.
//! - [`RegistrationLedger`]: one-time registration and identity verification per wallet.
//! - [`CertificateLedger`]: at most one certificate token per wallet.
//! - [`MintQueueIndex`]: pending/completed partition mirroring issuance.
//!
//! [`ExamLedger`] composes them and is the only mutation path. Every mutating
//! operation is planned first (all preconditions checked against `&self`,
//! producing the [`LedgerEvent`]s that describe the effect) and then applied.
//! A failed plan leaves the ledger untouched.

pub mod access;
pub mod certificate;
pub mod context;
pub mod error;
pub mod event;
pub mod ledger;
pub mod metadata;
pub mod mint_queue;
pub mod operation;
pub mod registration;
mod sequenced;
pub mod snapshot;
pub mod whitelist;

pub use access::AccessControl;
pub use certificate::CertificateLedger;
pub use context::TxContext;
pub use error::{LedgerError, Requirement};
pub use event::LedgerEvent;
pub use ledger::{ExamLedger, LedgerSummary};
pub use metadata::{CertificateMetadata, MetadataAttribute, MetadataLinks};
pub use mint_queue::MintQueueIndex;
pub use operation::Operation;
pub use registration::RegistrationLedger;
pub use snapshot::LedgerSnapshot;
pub use whitelist::WhitelistRegistry;
