//! Single-administrator access control.

use examcert_types::WalletAddress;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Holds the administrator identity and answers "may this caller administer?".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    admin: WalletAddress,
}

impl AccessControl {
    /// Create with the deploying caller as administrator.
    pub fn new(admin: WalletAddress) -> Result<Self, LedgerError> {
        if admin.is_null() {
            return Err(LedgerError::InvalidIdentity);
        }
        Ok(Self { admin })
    }

    pub fn admin(&self) -> &WalletAddress {
        &self.admin
    }

    pub fn is_admin(&self, who: &WalletAddress) -> bool {
        &self.admin == who
    }

    /// Fail with `Unauthorized` unless `caller` is the administrator.
    pub fn require_admin(&self, caller: &WalletAddress) -> Result<(), LedgerError> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized {
                caller: caller.clone(),
            })
        }
    }

    /// Validate an ownership transfer without performing it.
    pub fn check_transfer(
        &self,
        caller: &WalletAddress,
        new_admin: &WalletAddress,
    ) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        if new_admin.is_null() {
            return Err(LedgerError::InvalidIdentity);
        }
        Ok(())
    }

    pub(crate) fn set_admin(&mut self, new_admin: WalletAddress) {
        self.admin = new_admin;
    }
}
