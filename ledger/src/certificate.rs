//! Certificate ledger: at most one non-transferable certificate per wallet.
//!
//! Tokens live in an arena indexed by `token_id - 1`; a `wallet → token_id`
//! map answers the reverse lookup. Token ids are handed out sequentially from 1,
//! so `total_supply` is always the arena length.

use std::collections::HashMap;

use examcert_types::{CertificateToken, TokenId, WalletAddress};

use crate::error::{LedgerError, Requirement};
use crate::registration::RegistrationLedger;
use crate::whitelist::WhitelistRegistry;

#[derive(Clone, Debug, Default)]
pub struct CertificateLedger {
    tokens: Vec<CertificateToken>,
    by_wallet: HashMap<WalletAddress, TokenId>,
}

impl CertificateLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token held by `wallet`, or [`TokenId::NONE`].
    pub fn token_id_of(&self, wallet: &WalletAddress) -> TokenId {
        self.by_wallet.get(wallet).copied().unwrap_or(TokenId::NONE)
    }

    pub fn get(&self, token_id: TokenId) -> Option<&CertificateToken> {
        let index = usize::try_from(token_id.as_u64()).ok()?.checked_sub(1)?;
        self.tokens.get(index)
    }

    /// The token with `token_id`, or `NotFound` if it was never issued.
    pub fn token_info(&self, token_id: TokenId) -> Result<&CertificateToken, LedgerError> {
        self.get(token_id)
            .ok_or_else(|| LedgerError::NotFound(format!("certificate #{token_id}")))
    }

    pub fn owner_of(&self, token_id: TokenId) -> Result<&WalletAddress, LedgerError> {
        self.token_info(token_id).map(|t| &t.owner)
    }

    pub fn token_uri(&self, token_id: TokenId) -> Result<&str, LedgerError> {
        self.token_info(token_id).map(|t| t.metadata_uri.as_str())
    }

    /// Certificate held by `wallet`, if any.
    pub fn certificate_of(&self, wallet: &WalletAddress) -> Option<&CertificateToken> {
        self.by_wallet.get(wallet).and_then(|id| self.get(*id))
    }

    /// 0 or 1.
    pub fn balance_of(&self, wallet: &WalletAddress) -> u64 {
        u64::from(self.by_wallet.contains_key(wallet))
    }

    pub fn total_supply(&self) -> u64 {
        self.tokens.len() as u64
    }

    /// Id the next issued certificate will receive.
    pub fn next_token_id(&self) -> TokenId {
        TokenId::new(self.total_supply() + 1)
    }

    /// All certificates in issuance order.
    pub fn list(&self) -> impl Iterator<Item = &CertificateToken> + '_ {
        self.tokens.iter()
    }

    /// Why `wallet` may not receive a certificate, if anything.
    pub fn eligibility(
        registrations: &RegistrationLedger,
        whitelist: &WhitelistRegistry,
        wallet: &WalletAddress,
    ) -> Result<(), Requirement> {
        if !registrations.is_registered(wallet) {
            return Err(Requirement::Registered);
        }
        if !registrations.is_verified(wallet) {
            return Err(Requirement::Verified);
        }
        if !whitelist.is_whitelisted(wallet) {
            return Err(Requirement::Whitelisted);
        }
        if registrations.is_flagged(wallet) {
            return Err(Requirement::NoMisconduct);
        }
        Ok(())
    }

    /// Validate issuance for `wallet` and return the id it would receive.
    ///
    /// Authorization is the caller's job.
    pub fn check_mint(
        &self,
        registrations: &RegistrationLedger,
        whitelist: &WhitelistRegistry,
        wallet: &WalletAddress,
    ) -> Result<TokenId, LedgerError> {
        Self::eligibility(registrations, whitelist, wallet).map_err(|missing| {
            LedgerError::NotEligible {
                wallet: wallet.clone(),
                missing,
            }
        })?;
        let held = self.token_id_of(wallet);
        if !held.is_none() {
            return Err(LedgerError::AlreadyMinted {
                wallet: wallet.clone(),
                token_id: held,
            });
        }
        Ok(self.next_token_id())
    }

    /// Append a token. Ignored unless it carries the next sequential id for an
    /// owner without a certificate.
    pub(crate) fn insert(&mut self, token: CertificateToken) {
        if token.token_id != self.next_token_id() || self.by_wallet.contains_key(&token.owner) {
            return;
        }
        self.by_wallet.insert(token.owner.clone(), token.token_id);
        self.tokens.push(token);
    }

    /// Rebuild from persisted tokens. Tokens must arrive in id order.
    pub fn restore(&mut self, token: CertificateToken) {
        self.insert(token);
    }
}
