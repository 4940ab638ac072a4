//! Registration ledger: one-time registration and identity verification per wallet.
//!
//! State machine per wallet: `Unregistered → Registered → Verified`.
//! Records are never deleted; later whitelist removal does not touch them.

use std::collections::BTreeMap;

use examcert_types::{MisconductFlag, StudentRecord, StudentState, Timestamp, WalletAddress};

use crate::error::LedgerError;
use crate::sequenced::SequencedMap;
use crate::whitelist::WhitelistRegistry;

#[derive(Clone, Debug, Default)]
pub struct RegistrationLedger {
    students: SequencedMap<WalletAddress, StudentRecord>,
    flags: BTreeMap<WalletAddress, MisconductFlag>,
}

impl RegistrationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn is_registered(&self, wallet: &WalletAddress) -> bool {
        self.students.contains(wallet)
    }

    pub fn is_verified(&self, wallet: &WalletAddress) -> bool {
        self.students.get(wallet).is_some_and(|r| r.is_verified)
    }

    pub fn state(&self, wallet: &WalletAddress) -> StudentState {
        self.students
            .get(wallet)
            .map_or(StudentState::Unregistered, StudentRecord::state)
    }

    pub fn get(&self, wallet: &WalletAddress) -> Option<&StudentRecord> {
        self.students.get(wallet)
    }

    /// The record for `wallet`, or `NotFound`.
    pub fn student_info(&self, wallet: &WalletAddress) -> Result<&StudentRecord, LedgerError> {
        self.students
            .get(wallet)
            .ok_or_else(|| LedgerError::NotFound(format!("student record for {wallet}")))
    }

    /// All records in registration order.
    pub fn list(&self) -> impl Iterator<Item = &StudentRecord> + '_ {
        self.students.values()
    }

    pub fn count(&self) -> usize {
        self.students.len()
    }

    pub fn next_seq(&self) -> u64 {
        self.students.next_seq()
    }

    pub fn seq_of(&self, wallet: &WalletAddress) -> Option<u64> {
        self.students.seq_of(wallet)
    }

    /// Records paired with their registration sequence numbers.
    pub fn entries(&self) -> impl Iterator<Item = (u64, &StudentRecord)> + '_ {
        self.students.sequenced()
    }

    pub fn is_flagged(&self, wallet: &WalletAddress) -> bool {
        self.flags.contains_key(wallet)
    }

    pub fn misconduct_of(&self, wallet: &WalletAddress) -> Option<&MisconductFlag> {
        self.flags.get(wallet)
    }

    /// All misconduct flags ordered by wallet.
    pub fn flags(&self) -> impl Iterator<Item = &MisconductFlag> + '_ {
        self.flags.values()
    }

    // ── Checks ──────────────────────────────────────────────────────────

    /// Validate a self-registration.
    pub fn check_register(
        &self,
        whitelist: &WhitelistRegistry,
        caller: &WalletAddress,
        wallet: &WalletAddress,
    ) -> Result<(), LedgerError> {
        if caller != wallet {
            return Err(LedgerError::Unauthorized {
                caller: caller.clone(),
            });
        }
        if !whitelist.is_whitelisted(wallet) {
            return Err(LedgerError::NotWhitelisted(wallet.clone()));
        }
        if self.is_registered(wallet) {
            return Err(LedgerError::AlreadyRegistered(wallet.clone()));
        }
        Ok(())
    }

    /// Validate recording of verification evidence for `wallet`.
    pub fn check_verify(
        &self,
        caller: &WalletAddress,
        wallet: &WalletAddress,
    ) -> Result<(), LedgerError> {
        if caller != wallet {
            return Err(LedgerError::Unauthorized {
                caller: caller.clone(),
            });
        }
        match self.students.get(wallet) {
            None => Err(LedgerError::NotRegistered(wallet.clone())),
            Some(r) if r.is_verified => Err(LedgerError::AlreadyVerified(wallet.clone())),
            Some(_) => Ok(()),
        }
    }

    pub fn check_flag(&self, wallet: &WalletAddress) -> Result<(), LedgerError> {
        if !self.is_registered(wallet) {
            return Err(LedgerError::NotRegistered(wallet.clone()));
        }
        if self.is_flagged(wallet) {
            return Err(LedgerError::AlreadyFlagged(wallet.clone()));
        }
        Ok(())
    }

    pub fn check_clear(&self, wallet: &WalletAddress) -> Result<(), LedgerError> {
        if !self.is_flagged(wallet) {
            return Err(LedgerError::NotFlagged(wallet.clone()));
        }
        Ok(())
    }

    // ── Effects ─────────────────────────────────────────────────────────

    pub(crate) fn insert(&mut self, record: StudentRecord) {
        if self.students.contains(&record.wallet) {
            return;
        }
        self.students.insert(record.wallet.clone(), record);
    }

    pub(crate) fn mark_verified(
        &mut self,
        wallet: &WalletAddress,
        ip_address: &str,
        image_hash: &str,
        at: Timestamp,
    ) {
        if let Some(record) = self.students.get_mut(wallet) {
            record.is_verified = true;
            record.verification_time = Some(at);
            record.ip_address = ip_address.to_string();
            record.image_hash = image_hash.to_string();
        }
    }

    pub(crate) fn set_flag(&mut self, flag: MisconductFlag) {
        self.flags.insert(flag.wallet.clone(), flag);
    }

    pub(crate) fn clear_flag(&mut self, wallet: &WalletAddress) {
        self.flags.remove(wallet);
    }

    /// Rebuild a persisted student record.
    pub fn restore(&mut self, seq: u64, record: StudentRecord) {
        self.students.insert_at(seq, record.wallet.clone(), record);
    }

    pub fn resume_seq(&mut self, next_seq: u64) {
        self.students.resume_from(next_seq);
    }

    /// Rebuild a persisted misconduct flag.
    pub fn restore_flag(&mut self, flag: MisconductFlag) {
        self.set_flag(flag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> WalletAddress {
        WalletAddress::from_bytes([n; 20])
    }

    fn whitelist_with(wallets: &[WalletAddress]) -> WhitelistRegistry {
        let mut wl = WhitelistRegistry::new();
        for w in wallets {
            wl.insert(w.clone());
        }
        wl
    }

    #[test]
    fn register_requires_self_call() {
        let reg = RegistrationLedger::new();
        let wl = whitelist_with(&[addr(1)]);
        assert_eq!(
            reg.check_register(&wl, &addr(2), &addr(1)),
            Err(LedgerError::Unauthorized { caller: addr(2) })
        );
    }

    #[test]
    fn register_requires_whitelist() {
        let reg = RegistrationLedger::new();
        let wl = WhitelistRegistry::new();
        assert_eq!(
            reg.check_register(&wl, &addr(1), &addr(1)),
            Err(LedgerError::NotWhitelisted(addr(1)))
        );
    }

    #[test]
    fn state_machine_progresses_once() {
        let mut reg = RegistrationLedger::new();
        let wl = whitelist_with(&[addr(1)]);
        assert_eq!(reg.state(&addr(1)), StudentState::Unregistered);

        reg.check_register(&wl, &addr(1), &addr(1)).unwrap();
        reg.insert(StudentRecord::new(addr(1), "SV001", "Math", "S1", Timestamp::new(10)));
        assert_eq!(reg.state(&addr(1)), StudentState::Registered);
        assert_eq!(
            reg.check_register(&wl, &addr(1), &addr(1)),
            Err(LedgerError::AlreadyRegistered(addr(1)))
        );

        reg.check_verify(&addr(1), &addr(1)).unwrap();
        reg.mark_verified(&addr(1), "1.2.3.4", "hash1", Timestamp::new(20));
        assert_eq!(reg.state(&addr(1)), StudentState::Verified);
        assert_eq!(
            reg.check_verify(&addr(1), &addr(1)),
            Err(LedgerError::AlreadyVerified(addr(1)))
        );

        let record = reg.student_info(&addr(1)).unwrap();
        assert_eq!(record.verification_time, Some(Timestamp::new(20)));
        assert_eq!(record.ip_address, "1.2.3.4");
        assert_eq!(record.image_hash, "hash1");
    }

    #[test]
    fn verify_before_register_rejected() {
        let reg = RegistrationLedger::new();
        assert_eq!(
            reg.check_verify(&addr(4), &addr(4)),
            Err(LedgerError::NotRegistered(addr(4)))
        );
    }

    #[test]
    fn flags_require_registration_and_are_one_shot() {
        let mut reg = RegistrationLedger::new();
        assert_eq!(
            reg.check_flag(&addr(1)),
            Err(LedgerError::NotRegistered(addr(1)))
        );
        reg.insert(StudentRecord::new(addr(1), "SV001", "Math", "S1", Timestamp::new(1)));
        reg.check_flag(&addr(1)).unwrap();
        reg.set_flag(MisconductFlag {
            wallet: addr(1),
            reason: "tab switching".into(),
            flagged_at: Timestamp::new(2),
        });
        assert_eq!(
            reg.check_flag(&addr(1)),
            Err(LedgerError::AlreadyFlagged(addr(1)))
        );
        reg.clear_flag(&addr(1));
        assert_eq!(
            reg.check_clear(&addr(1)),
            Err(LedgerError::NotFlagged(addr(1)))
        );
    }

    #[test]
    fn missing_student_is_not_found() {
        let reg = RegistrationLedger::new();
        assert!(matches!(
            reg.student_info(&addr(3)),
            Err(LedgerError::NotFound(_))
        ));
    }
}
