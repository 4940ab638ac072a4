//! Registration lifecycle of a student wallet.

use serde::{Deserialize, Serialize};

/// Where a wallet stands in the `Unregistered → Registered → Verified` machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudentState {
    /// No registration record exists.
    Unregistered,
    /// Registered for an exam, identity not yet verified.
    Registered,
    /// Identity verification evidence recorded. Terminal.
    Verified,
}

impl StudentState {
    /// Whether the wallet has a registration record.
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered | Self::Verified)
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::Registered => "registered",
            Self::Verified => "verified",
        }
    }
}
