//! examcert node: owns the ledger, persists every transaction, and fans out
//! committed events.
//!
//! The node is the single writer in front of the ledger:
//! - Plans each operation against the in-memory [`examcert_ledger::ExamLedger`]
//! - Commits table writes and event-log entries atomically to the store
//! - Applies the committed events in memory
//! - Notifies subscribers through the [`EventBus`]

pub mod config;
pub mod error;
pub mod event_bus;
pub mod ledger_bridge;
pub mod logging;
pub mod node;

pub use config::NodeConfig;
pub use error::NodeError;
pub use event_bus::EventBus;
pub use ledger_bridge::{changes_for, decode_event, encode_event, rebuild};
pub use logging::{init_logging, LogFormat};
pub use node::{minted_token, ExamNode, STAT_NAMES};
