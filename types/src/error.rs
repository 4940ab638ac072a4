//! Errors raised while constructing fundamental types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
