//! The exam ledger facade, the only way to mutate ledger state.
//!
//! Every operation runs in two phases:
//! 1. [`ExamLedger::plan`] checks authorization and every precondition against
//!    `&self` and returns the events describing the effect.
//! 2. [`ExamLedger::apply`] writes those events into the components.
//!
//! No state is written while validating, so a failed operation leaves the
//! ledger exactly as it was. Persistence layers plan, commit the events to
//! storage, and only then apply them in memory.

use std::collections::HashSet;

use serde::Serialize;

use examcert_types::{
    CertificateToken, CompletedMintEntry, MisconductFlag, PendingMintEntry, Score, StudentRecord,
    TableCursors, Timestamp, TokenId, WalletAddress,
};

use crate::access::AccessControl;
use crate::certificate::CertificateLedger;
use crate::context::TxContext;
use crate::error::{LedgerError, Requirement};
use crate::event::LedgerEvent;
use crate::metadata::{CertificateMetadata, MetadataLinks};
use crate::mint_queue::MintQueueIndex;
use crate::operation::Operation;
use crate::registration::RegistrationLedger;
use crate::whitelist::WhitelistRegistry;

#[derive(Clone, Debug)]
pub struct ExamLedger {
    access: AccessControl,
    whitelist: WhitelistRegistry,
    registrations: RegistrationLedger,
    certificates: CertificateLedger,
    mint_queue: MintQueueIndex,
}

/// Summary counters for the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub admin: WalletAddress,
    pub whitelisted: usize,
    pub students: usize,
    pub verified: usize,
    pub flagged: usize,
    pub total_supply: u64,
    pub pending: usize,
    pub completed: usize,
}

impl ExamLedger {
    /// Create an empty ledger administered by the deploying caller.
    pub fn new(admin: WalletAddress) -> Result<Self, LedgerError> {
        Ok(Self {
            access: AccessControl::new(admin)?,
            whitelist: WhitelistRegistry::new(),
            registrations: RegistrationLedger::new(),
            certificates: CertificateLedger::new(),
            mint_queue: MintQueueIndex::new(),
        })
    }

    /// Reassemble a ledger from restored components.
    pub fn from_parts(
        access: AccessControl,
        whitelist: WhitelistRegistry,
        registrations: RegistrationLedger,
        certificates: CertificateLedger,
        mint_queue: MintQueueIndex,
    ) -> Self {
        Self {
            access,
            whitelist,
            registrations,
            certificates,
            mint_queue,
        }
    }

    /// Rebuild a ledger by applying a committed event log to a fresh genesis state.
    pub fn replay<'a>(
        genesis_admin: WalletAddress,
        events: impl IntoIterator<Item = &'a LedgerEvent>,
    ) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(genesis_admin)?;
        for event in events {
            ledger.apply(event);
        }
        Ok(ledger)
    }

    /// Insertion cursors of the sequence-ordered tables.
    pub fn cursors(&self) -> TableCursors {
        TableCursors {
            whitelist: self.whitelist.next_seq(),
            students: self.registrations.next_seq(),
            pending: self.mint_queue.next_pending_seq(),
            completed: self.mint_queue.next_completed_seq(),
        }
    }

    /// Move every insertion cursor forward to at least `cursors`.
    pub fn resume_cursors(&mut self, cursors: TableCursors) {
        self.whitelist.resume_seq(cursors.whitelist);
        self.registrations.resume_seq(cursors.students);
        self.mint_queue.resume_seqs(cursors.pending, cursors.completed);
    }

    // ── Components ──────────────────────────────────────────────────────

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn whitelist(&self) -> &WhitelistRegistry {
        &self.whitelist
    }

    pub fn registrations(&self) -> &RegistrationLedger {
        &self.registrations
    }

    pub fn certificates(&self) -> &CertificateLedger {
        &self.certificates
    }

    pub fn mint_queue(&self) -> &MintQueueIndex {
        &self.mint_queue
    }

    // ── Planning ────────────────────────────────────────────────────────

    /// Validate `op` for `ctx.caller` and return the events it would commit.
    pub fn plan(&self, ctx: &TxContext, op: &Operation) -> Result<Vec<LedgerEvent>, LedgerError> {
        let now = ctx.now;
        match op {
            Operation::TransferOwnership { new_admin } => {
                self.access.check_transfer(&ctx.caller, new_admin)?;
                Ok(vec![LedgerEvent::OwnershipTransferred {
                    previous: self.access.admin().clone(),
                    new_admin: new_admin.clone(),
                    at: now,
                }])
            }
            Operation::AddToWhitelist { wallet } => {
                self.access.require_admin(&ctx.caller)?;
                self.whitelist.check_add(wallet)?;
                Ok(vec![LedgerEvent::WhitelistAdded {
                    wallet: wallet.clone(),
                    at: now,
                }])
            }
            Operation::AddBatchToWhitelist { wallets } => {
                self.access.require_admin(&ctx.caller)?;
                let mut seen = HashSet::with_capacity(wallets.len());
                for wallet in wallets {
                    self.whitelist.check_add(wallet)?;
                    if !seen.insert(wallet) {
                        return Err(LedgerError::DuplicateInBatch(wallet.clone()));
                    }
                }
                Ok(wallets
                    .iter()
                    .map(|wallet| LedgerEvent::WhitelistAdded {
                        wallet: wallet.clone(),
                        at: now,
                    })
                    .collect())
            }
            Operation::RemoveFromWhitelist { wallet } => {
                self.access.require_admin(&ctx.caller)?;
                self.whitelist.check_remove(wallet)?;
                Ok(vec![LedgerEvent::WhitelistRemoved {
                    wallet: wallet.clone(),
                    at: now,
                }])
            }
            Operation::Register {
                wallet,
                student_id,
                subject,
                exam_session,
            } => {
                self.registrations
                    .check_register(&self.whitelist, &ctx.caller, wallet)?;
                Ok(vec![LedgerEvent::Registered {
                    wallet: wallet.clone(),
                    student_id: student_id.clone(),
                    subject: subject.clone(),
                    exam_session: exam_session.clone(),
                    at: now,
                }])
            }
            Operation::Verify {
                wallet,
                ip_address,
                image_hash,
            } => {
                self.registrations.check_verify(&ctx.caller, wallet)?;
                Ok(vec![LedgerEvent::Verified {
                    wallet: wallet.clone(),
                    ip_address: ip_address.clone(),
                    image_hash: image_hash.clone(),
                    at: now,
                }])
            }
            Operation::FlagMisconduct { wallet, reason } => {
                self.access.require_admin(&ctx.caller)?;
                self.registrations.check_flag(wallet)?;
                Ok(vec![LedgerEvent::MisconductFlagged {
                    wallet: wallet.clone(),
                    reason: reason.clone(),
                    at: now,
                }])
            }
            Operation::ClearMisconduct { wallet } => {
                self.access.require_admin(&ctx.caller)?;
                self.registrations.check_clear(wallet)?;
                Ok(vec![LedgerEvent::MisconductCleared {
                    wallet: wallet.clone(),
                    at: now,
                }])
            }
            Operation::Mint {
                wallet,
                student_id,
                subject,
                exam_session,
                ip_address,
                metadata_uri,
            } => {
                self.access.require_admin(&ctx.caller)?;
                let token_id =
                    self.certificates
                        .check_mint(&self.registrations, &self.whitelist, wallet)?;
                let score = self
                    .mint_queue
                    .get_pending(wallet)
                    .map(|e| e.score)
                    .unwrap_or(0);
                Ok(vec![LedgerEvent::CertificateMinted {
                    token: CertificateToken {
                        token_id,
                        owner: wallet.clone(),
                        student_id: student_id.clone(),
                        subject: subject.clone(),
                        exam_session: exam_session.clone(),
                        score,
                        mint_date: now,
                        ip_address: ip_address.clone(),
                        metadata_uri: metadata_uri.clone(),
                    },
                }])
            }
            Operation::MintPending {
                wallet,
                metadata_uri,
            } => {
                self.access.require_admin(&ctx.caller)?;
                let entry = self.mint_queue.check_complete(wallet)?;
                let token_id =
                    self.certificates
                        .check_mint(&self.registrations, &self.whitelist, wallet)?;
                Ok(vec![
                    LedgerEvent::CertificateMinted {
                        token: CertificateToken {
                            token_id,
                            owner: wallet.clone(),
                            student_id: entry.student_id.clone(),
                            subject: entry.subject.clone(),
                            exam_session: entry.exam_session.clone(),
                            score: entry.score,
                            mint_date: now,
                            ip_address: entry.ip_address.clone(),
                            metadata_uri: metadata_uri.clone(),
                        },
                    },
                    LedgerEvent::MintCompleted {
                        wallet: wallet.clone(),
                        token_id,
                        mint_date: now,
                        at: now,
                    },
                ])
            }
            Operation::EnqueuePending {
                wallet,
                student_id,
                subject,
                exam_session,
                score,
                exam_date,
                ip_address,
            } => {
                self.access.require_admin(&ctx.caller)?;
                let entry = PendingMintEntry {
                    wallet: wallet.clone(),
                    student_id: student_id.clone(),
                    subject: subject.clone(),
                    exam_session: exam_session.clone(),
                    score: *score,
                    exam_date: *exam_date,
                    ip_address: ip_address.clone(),
                    added_at: now,
                };
                self.mint_queue.check_enqueue(&entry)?;
                let held = self.certificates.token_id_of(wallet);
                if !held.is_none() {
                    return Err(LedgerError::AlreadyMinted {
                        wallet: wallet.clone(),
                        token_id: held,
                    });
                }
                Ok(vec![LedgerEvent::MintQueued { entry }])
            }
            Operation::CompleteMint {
                wallet,
                token_id,
                mint_date,
            } => {
                self.access.require_admin(&ctx.caller)?;
                self.mint_queue.check_complete(wallet)?;
                let held = self.certificates.token_id_of(wallet);
                if held.is_none() || held != *token_id {
                    return Err(LedgerError::TokenMismatch {
                        wallet: wallet.clone(),
                        claimed: *token_id,
                        held,
                    });
                }
                Ok(vec![LedgerEvent::MintCompleted {
                    wallet: wallet.clone(),
                    token_id: *token_id,
                    mint_date: *mint_date,
                    at: now,
                }])
            }
        }
    }

    // ── Applying ────────────────────────────────────────────────────────

    /// Write one planned (or replayed) event into the components.
    pub fn apply(&mut self, event: &LedgerEvent) {
        match event {
            LedgerEvent::OwnershipTransferred { new_admin, .. } => {
                self.access.set_admin(new_admin.clone());
            }
            LedgerEvent::WhitelistAdded { wallet, .. } => {
                self.whitelist.insert(wallet.clone());
            }
            LedgerEvent::WhitelistRemoved { wallet, .. } => {
                self.whitelist.remove(wallet);
            }
            LedgerEvent::Registered {
                wallet,
                student_id,
                subject,
                exam_session,
                at,
            } => {
                self.registrations.insert(StudentRecord::new(
                    wallet.clone(),
                    student_id.clone(),
                    subject.clone(),
                    exam_session.clone(),
                    *at,
                ));
            }
            LedgerEvent::Verified {
                wallet,
                ip_address,
                image_hash,
                at,
            } => {
                self.registrations
                    .mark_verified(wallet, ip_address, image_hash, *at);
            }
            LedgerEvent::MisconductFlagged { wallet, reason, at } => {
                self.registrations.set_flag(MisconductFlag {
                    wallet: wallet.clone(),
                    reason: reason.clone(),
                    flagged_at: *at,
                });
            }
            LedgerEvent::MisconductCleared { wallet, .. } => {
                self.registrations.clear_flag(wallet);
            }
            LedgerEvent::CertificateMinted { token } => {
                self.certificates.insert(token.clone());
            }
            LedgerEvent::MintQueued { entry } => {
                self.mint_queue.enqueue(entry.clone());
            }
            LedgerEvent::MintCompleted {
                wallet,
                token_id,
                mint_date,
                ..
            } => {
                self.mint_queue.complete(wallet, *token_id, *mint_date);
            }
        }
    }

    /// Plan and apply `op` as one transaction.
    pub fn execute(
        &mut self,
        ctx: &TxContext,
        op: Operation,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let events = self.plan(ctx, &op)?;
        for event in &events {
            self.apply(event);
        }
        Ok(events)
    }

    // ── Entry points ────────────────────────────────────────────────────

    pub fn transfer_ownership(
        &mut self,
        ctx: &TxContext,
        new_admin: WalletAddress,
    ) -> Result<(), LedgerError> {
        self.execute(ctx, Operation::TransferOwnership { new_admin })
            .map(drop)
    }

    pub fn add_to_whitelist(
        &mut self,
        ctx: &TxContext,
        wallet: WalletAddress,
    ) -> Result<(), LedgerError> {
        self.execute(ctx, Operation::AddToWhitelist { wallet }).map(drop)
    }

    pub fn add_batch_to_whitelist(
        &mut self,
        ctx: &TxContext,
        wallets: Vec<WalletAddress>,
    ) -> Result<(), LedgerError> {
        self.execute(ctx, Operation::AddBatchToWhitelist { wallets })
            .map(drop)
    }

    pub fn remove_from_whitelist(
        &mut self,
        ctx: &TxContext,
        wallet: WalletAddress,
    ) -> Result<(), LedgerError> {
        self.execute(ctx, Operation::RemoveFromWhitelist { wallet })
            .map(drop)
    }

    pub fn register(
        &mut self,
        ctx: &TxContext,
        wallet: WalletAddress,
        student_id: &str,
        subject: &str,
        exam_session: &str,
    ) -> Result<(), LedgerError> {
        self.execute(
            ctx,
            Operation::Register {
                wallet,
                student_id: student_id.to_string(),
                subject: subject.to_string(),
                exam_session: exam_session.to_string(),
            },
        )
        .map(drop)
    }

    pub fn verify(
        &mut self,
        ctx: &TxContext,
        wallet: WalletAddress,
        ip_address: &str,
        image_hash: &str,
    ) -> Result<(), LedgerError> {
        self.execute(
            ctx,
            Operation::Verify {
                wallet,
                ip_address: ip_address.to_string(),
                image_hash: image_hash.to_string(),
            },
        )
        .map(drop)
    }

    pub fn flag_misconduct(
        &mut self,
        ctx: &TxContext,
        wallet: WalletAddress,
        reason: &str,
    ) -> Result<(), LedgerError> {
        self.execute(
            ctx,
            Operation::FlagMisconduct {
                wallet,
                reason: reason.to_string(),
            },
        )
        .map(drop)
    }

    pub fn clear_misconduct(
        &mut self,
        ctx: &TxContext,
        wallet: WalletAddress,
    ) -> Result<(), LedgerError> {
        self.execute(ctx, Operation::ClearMisconduct { wallet }).map(drop)
    }

    /// Issue a certificate and return its id.
    #[allow(clippy::too_many_arguments)]
    pub fn mint(
        &mut self,
        ctx: &TxContext,
        wallet: WalletAddress,
        student_id: &str,
        subject: &str,
        exam_session: &str,
        ip_address: &str,
        metadata_uri: &str,
    ) -> Result<TokenId, LedgerError> {
        let owner = wallet.clone();
        self.execute(
            ctx,
            Operation::Mint {
                wallet,
                student_id: student_id.to_string(),
                subject: subject.to_string(),
                exam_session: exam_session.to_string(),
                ip_address: ip_address.to_string(),
                metadata_uri: metadata_uri.to_string(),
            },
        )?;
        Ok(self.certificates.token_id_of(&owner))
    }

    /// Issue a certificate from the pending entry and complete it atomically.
    pub fn mint_pending(
        &mut self,
        ctx: &TxContext,
        wallet: WalletAddress,
        metadata_uri: &str,
    ) -> Result<TokenId, LedgerError> {
        let owner = wallet.clone();
        self.execute(
            ctx,
            Operation::MintPending {
                wallet,
                metadata_uri: metadata_uri.to_string(),
            },
        )?;
        Ok(self.certificates.token_id_of(&owner))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn enqueue_pending(
        &mut self,
        ctx: &TxContext,
        wallet: WalletAddress,
        student_id: &str,
        subject: &str,
        exam_session: &str,
        score: Score,
        exam_date: Timestamp,
        ip_address: &str,
    ) -> Result<(), LedgerError> {
        self.execute(
            ctx,
            Operation::EnqueuePending {
                wallet,
                student_id: student_id.to_string(),
                subject: subject.to_string(),
                exam_session: exam_session.to_string(),
                score,
                exam_date,
                ip_address: ip_address.to_string(),
            },
        )
        .map(drop)
    }

    pub fn complete_mint(
        &mut self,
        ctx: &TxContext,
        wallet: WalletAddress,
        token_id: TokenId,
        mint_date: Timestamp,
    ) -> Result<(), LedgerError> {
        self.execute(
            ctx,
            Operation::CompleteMint {
                wallet,
                token_id,
                mint_date,
            },
        )
        .map(drop)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn admin(&self) -> &WalletAddress {
        self.access.admin()
    }

    pub fn is_whitelisted(&self, wallet: &WalletAddress) -> bool {
        self.whitelist.is_whitelisted(wallet)
    }

    pub fn list_whitelisted(&self) -> impl Iterator<Item = &WalletAddress> + '_ {
        self.whitelist.list()
    }

    pub fn whitelist_count(&self) -> usize {
        self.whitelist.count()
    }

    pub fn is_registered(&self, wallet: &WalletAddress) -> bool {
        self.registrations.is_registered(wallet)
    }

    pub fn is_verified(&self, wallet: &WalletAddress) -> bool {
        self.registrations.is_verified(wallet)
    }

    pub fn student_info(&self, wallet: &WalletAddress) -> Result<&StudentRecord, LedgerError> {
        self.registrations.student_info(wallet)
    }

    pub fn is_flagged(&self, wallet: &WalletAddress) -> bool {
        self.registrations.is_flagged(wallet)
    }

    pub fn token_id_of(&self, wallet: &WalletAddress) -> TokenId {
        self.certificates.token_id_of(wallet)
    }

    pub fn token_info(&self, token_id: TokenId) -> Result<&CertificateToken, LedgerError> {
        self.certificates.token_info(token_id)
    }

    pub fn balance_of(&self, wallet: &WalletAddress) -> u64 {
        self.certificates.balance_of(wallet)
    }

    pub fn total_supply(&self) -> u64 {
        self.certificates.total_supply()
    }

    /// `Ok(())` if `wallet` could be issued a certificate right now, ignoring
    /// whether it already holds one.
    pub fn eligibility(&self, wallet: &WalletAddress) -> Result<(), Requirement> {
        CertificateLedger::eligibility(&self.registrations, &self.whitelist, wallet)
    }

    pub fn is_pending(&self, wallet: &WalletAddress) -> bool {
        self.mint_queue.is_pending(wallet)
    }

    pub fn is_completed(&self, wallet: &WalletAddress) -> bool {
        self.mint_queue.is_completed(wallet)
    }

    pub fn get_pending(&self, wallet: &WalletAddress) -> Result<&PendingMintEntry, LedgerError> {
        self.mint_queue.get_pending(wallet)
    }

    pub fn get_completed(
        &self,
        wallet: &WalletAddress,
    ) -> Result<&CompletedMintEntry, LedgerError> {
        self.mint_queue.get_completed(wallet)
    }

    pub fn list_pending_wallets(&self) -> impl Iterator<Item = &WalletAddress> + '_ {
        self.mint_queue.list_pending_wallets()
    }

    pub fn list_completed_wallets(&self) -> impl Iterator<Item = &WalletAddress> + '_ {
        self.mint_queue.list_completed_wallets()
    }

    pub fn pending_count(&self) -> usize {
        self.mint_queue.pending_count()
    }

    pub fn completed_count(&self) -> usize {
        self.mint_queue.completed_count()
    }

    /// Metadata document for an issued certificate.
    pub fn certificate_metadata(
        &self,
        token_id: TokenId,
        links: &MetadataLinks,
    ) -> Result<CertificateMetadata, LedgerError> {
        let token = self.certificates.token_info(token_id)?;
        let exam_date = self
            .mint_queue
            .get_completed(&token.owner)
            .ok()
            .filter(|c| c.token_id == token_id)
            .map(|c| c.entry.exam_date);
        Ok(CertificateMetadata::build(
            token,
            self.registrations.get(&token.owner),
            exam_date,
            links,
        ))
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            admin: self.access.admin().clone(),
            whitelisted: self.whitelist.count(),
            students: self.registrations.count(),
            verified: self.registrations.list().filter(|r| r.is_verified).count(),
            flagged: self.registrations.flags().count(),
            total_supply: self.certificates.total_supply(),
            pending: self.mint_queue.pending_count(),
            completed: self.mint_queue.completed_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> WalletAddress {
        WalletAddress::from_bytes([n; 20])
    }

    fn admin() -> WalletAddress {
        addr(0xad)
    }

    fn as_admin(now: u64) -> TxContext {
        TxContext::new(admin(), Timestamp::new(now))
    }

    fn as_wallet(wallet: &WalletAddress, now: u64) -> TxContext {
        TxContext::new(wallet.clone(), Timestamp::new(now))
    }

    /// Whitelisted, registered, verified wallet.
    fn ready_ledger(wallet: &WalletAddress) -> ExamLedger {
        let mut ledger = ExamLedger::new(admin()).unwrap();
        ledger.add_to_whitelist(&as_admin(1), wallet.clone()).unwrap();
        ledger
            .register(&as_wallet(wallet, 2), wallet.clone(), "SV001", "Math", "Session1")
            .unwrap();
        ledger
            .verify(&as_wallet(wallet, 3), wallet.clone(), "1.2.3.4", "hash1")
            .unwrap();
        ledger
    }

    fn mint_w(ledger: &mut ExamLedger, wallet: &WalletAddress) -> Result<TokenId, LedgerError> {
        ledger.mint(
            &as_admin(10),
            wallet.clone(),
            "SV001",
            "Math",
            "Session1",
            "1.2.3.4",
            "uri://1",
        )
    }

    #[test]
    fn concrete_scenario() {
        let w1 = addr(1);
        let mut ledger = ready_ledger(&w1);
        assert_eq!(mint_w(&mut ledger, &w1), Ok(TokenId::FIRST));
        assert_eq!(ledger.token_id_of(&w1), TokenId::FIRST);
        assert_eq!(ledger.total_supply(), 1);

        assert_eq!(
            mint_w(&mut ledger, &w1),
            Err(LedgerError::AlreadyMinted {
                wallet: w1.clone(),
                token_id: TokenId::FIRST
            })
        );
        assert_eq!(ledger.total_supply(), 1);

        let token = ledger.token_info(TokenId::FIRST).unwrap();
        assert_eq!(token.owner, w1);
        assert_eq!(token.metadata_uri, "uri://1");
        assert_eq!(token.mint_date, Timestamp::new(10));
    }

    #[test]
    fn whitelist_mutations_are_admin_only() {
        let mut ledger = ExamLedger::new(admin()).unwrap();
        let err = ledger
            .add_to_whitelist(&as_wallet(&addr(5), 1), addr(5))
            .unwrap_err();
        assert_eq!(err, LedgerError::Unauthorized { caller: addr(5) });
        assert!(!ledger.is_whitelisted(&addr(5)));

        ledger.add_to_whitelist(&as_admin(1), addr(5)).unwrap();
        assert_eq!(
            ledger.remove_from_whitelist(&as_wallet(&addr(5), 2), addr(5)),
            Err(LedgerError::Unauthorized { caller: addr(5) })
        );
        assert!(ledger.is_whitelisted(&addr(5)));
    }

    #[test]
    fn re_adding_whitelisted_wallet_fails_without_change() {
        let mut ledger = ExamLedger::new(admin()).unwrap();
        ledger.add_to_whitelist(&as_admin(1), addr(1)).unwrap();
        ledger.add_to_whitelist(&as_admin(1), addr(2)).unwrap();
        assert_eq!(
            ledger.add_to_whitelist(&as_admin(2), addr(1)),
            Err(LedgerError::AlreadyWhitelisted(addr(1)))
        );
        assert_eq!(
            ledger.list_whitelisted().cloned().collect::<Vec<_>>(),
            vec![addr(1), addr(2)]
        );
    }

    #[test]
    fn batch_whitelist_is_all_or_nothing() {
        let mut ledger = ExamLedger::new(admin()).unwrap();
        ledger.add_to_whitelist(&as_admin(1), addr(3)).unwrap();

        let err = ledger
            .add_batch_to_whitelist(&as_admin(2), vec![addr(1), addr(2), addr(3)])
            .unwrap_err();
        assert_eq!(err, LedgerError::AlreadyWhitelisted(addr(3)));
        assert_eq!(ledger.whitelist_count(), 1);

        let err = ledger
            .add_batch_to_whitelist(&as_admin(2), vec![addr(1), addr(1)])
            .unwrap_err();
        assert_eq!(err, LedgerError::DuplicateInBatch(addr(1)));
        assert_eq!(ledger.whitelist_count(), 1);

        let events = ledger
            .execute(
                &as_admin(3),
                Operation::AddBatchToWhitelist {
                    wallets: vec![addr(1), addr(2)],
                },
            )
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(ledger.whitelist_count(), 3);
    }

    #[test]
    fn whitelist_gate_blocks_registration() {
        let mut ledger = ExamLedger::new(admin()).unwrap();
        let w = addr(1);
        assert_eq!(
            ledger.register(&as_wallet(&w, 1), w.clone(), "SV001", "Math", "S1"),
            Err(LedgerError::NotWhitelisted(w.clone()))
        );
        assert!(!ledger.is_registered(&w));
        assert!(ledger.student_info(&w).is_err());
    }

    #[test]
    fn registration_fields_match_first_call() {
        let mut ledger = ExamLedger::new(admin()).unwrap();
        let w = addr(1);
        ledger.add_to_whitelist(&as_admin(1), w.clone()).unwrap();
        ledger
            .register(&as_wallet(&w, 7), w.clone(), "SV001", "Math", "Session1")
            .unwrap();
        assert_eq!(
            ledger.register(&as_wallet(&w, 8), w.clone(), "SV999", "Art", "Session2"),
            Err(LedgerError::AlreadyRegistered(w.clone()))
        );
        let record = ledger.student_info(&w).unwrap();
        assert_eq!(record.student_id, "SV001");
        assert_eq!(record.subject, "Math");
        assert_eq!(record.exam_session, "Session1");
        assert_eq!(record.registration_time, Timestamp::new(7));
        assert!(!record.is_verified);
        assert_eq!(record.verification_time, None);
    }

    #[test]
    fn registering_someone_else_is_unauthorized() {
        let mut ledger = ExamLedger::new(admin()).unwrap();
        ledger.add_to_whitelist(&as_admin(1), addr(1)).unwrap();
        assert_eq!(
            ledger.register(&as_admin(2), addr(1), "SV001", "Math", "S1"),
            Err(LedgerError::Unauthorized { caller: admin() })
        );
    }

    #[test]
    fn whitelist_removal_does_not_cascade() {
        let a = addr(1);
        let mut ledger = ready_ledger(&a);
        ledger.remove_from_whitelist(&as_admin(4), a.clone()).unwrap();
        assert!(ledger.is_registered(&a));
        assert!(ledger.is_verified(&a));
        ledger.add_to_whitelist(&as_admin(5), a.clone()).unwrap();
        assert!(ledger.is_registered(&a));
        assert!(ledger.is_verified(&a));
    }

    #[test]
    fn mint_eligibility_gates() {
        let w = addr(1);
        let mut ledger = ExamLedger::new(admin()).unwrap();
        assert_eq!(
            mint_w(&mut ledger, &w),
            Err(LedgerError::NotEligible {
                wallet: w.clone(),
                missing: Requirement::Registered
            })
        );

        ledger.add_to_whitelist(&as_admin(1), w.clone()).unwrap();
        ledger
            .register(&as_wallet(&w, 2), w.clone(), "SV001", "Math", "S1")
            .unwrap();
        assert_eq!(
            mint_w(&mut ledger, &w),
            Err(LedgerError::NotEligible {
                wallet: w.clone(),
                missing: Requirement::Verified
            })
        );

        ledger
            .verify(&as_wallet(&w, 3), w.clone(), "ip", "hash")
            .unwrap();
        ledger.remove_from_whitelist(&as_admin(4), w.clone()).unwrap();
        assert_eq!(
            mint_w(&mut ledger, &w),
            Err(LedgerError::NotEligible {
                wallet: w.clone(),
                missing: Requirement::Whitelisted
            })
        );
        assert_eq!(ledger.total_supply(), 0);
        assert_eq!(ledger.token_id_of(&w), TokenId::NONE);
    }

    #[test]
    fn mint_is_admin_only() {
        let w = addr(1);
        let mut ledger = ready_ledger(&w);
        let err = ledger
            .mint(&as_wallet(&w, 9), w.clone(), "SV001", "Math", "S1", "ip", "uri")
            .unwrap_err();
        assert_eq!(err, LedgerError::Unauthorized { caller: w.clone() });
        assert_eq!(ledger.total_supply(), 0);
    }

    #[test]
    fn misconduct_blocks_minting_until_cleared() {
        let w = addr(1);
        let mut ledger = ready_ledger(&w);
        ledger.flag_misconduct(&as_admin(4), w.clone(), "tab switch").unwrap();
        assert_eq!(
            mint_w(&mut ledger, &w),
            Err(LedgerError::NotEligible {
                wallet: w.clone(),
                missing: Requirement::NoMisconduct
            })
        );
        ledger.clear_misconduct(&as_admin(5), w.clone()).unwrap();
        assert_eq!(mint_w(&mut ledger, &w), Ok(TokenId::FIRST));
    }

    #[test]
    fn token_ids_are_sequential_across_wallets() {
        let mut ledger = ExamLedger::new(admin()).unwrap();
        for n in 1..=3u8 {
            let w = addr(n);
            ledger.add_to_whitelist(&as_admin(1), w.clone()).unwrap();
            ledger
                .register(&as_wallet(&w, 2), w.clone(), "SV", "Math", "S1")
                .unwrap();
            ledger.verify(&as_wallet(&w, 3), w.clone(), "ip", "h").unwrap();
        }
        for n in [2u8, 3, 1] {
            mint_w(&mut ledger, &addr(n)).unwrap();
        }
        assert_eq!(ledger.token_id_of(&addr(2)), TokenId::new(1));
        assert_eq!(ledger.token_id_of(&addr(3)), TokenId::new(2));
        assert_eq!(ledger.token_id_of(&addr(1)), TokenId::new(3));
        assert_eq!(ledger.total_supply(), 3);
    }

    #[test]
    fn queue_lifecycle_via_mint_then_complete() {
        let w = addr(1);
        let mut ledger = ready_ledger(&w);
        ledger
            .enqueue_pending(
                &as_admin(5),
                w.clone(),
                "SV001",
                "Math",
                "Session1",
                92,
                Timestamp::new(4),
                "1.2.3.4",
            )
            .unwrap();
        assert!(ledger.is_pending(&w));

        let token_id = mint_w(&mut ledger, &w).unwrap();
        assert_eq!(ledger.token_info(token_id).unwrap().score, 92);
        // Minting alone does not touch the index.
        assert!(ledger.is_pending(&w));

        assert_eq!(
            ledger.complete_mint(&as_admin(11), w.clone(), TokenId::new(7), Timestamp::new(11)),
            Err(LedgerError::TokenMismatch {
                wallet: w.clone(),
                claimed: TokenId::new(7),
                held: token_id
            })
        );
        ledger
            .complete_mint(&as_admin(11), w.clone(), token_id, Timestamp::new(11))
            .unwrap();
        assert!(!ledger.is_pending(&w));
        assert!(ledger.is_completed(&w));
        assert_eq!(ledger.get_completed(&w).unwrap().token_id, token_id);
        assert_eq!(
            ledger.complete_mint(&as_admin(12), w.clone(), token_id, Timestamp::new(12)),
            Err(LedgerError::NotPending(w.clone()))
        );
    }

    #[test]
    fn complete_before_mint_rejected() {
        let w = addr(1);
        let mut ledger = ready_ledger(&w);
        ledger
            .enqueue_pending(
                &as_admin(5),
                w.clone(),
                "SV001",
                "Math",
                "S1",
                50,
                Timestamp::new(4),
                "ip",
            )
            .unwrap();
        assert_eq!(
            ledger.complete_mint(&as_admin(6), w.clone(), TokenId::FIRST, Timestamp::new(6)),
            Err(LedgerError::TokenMismatch {
                wallet: w.clone(),
                claimed: TokenId::FIRST,
                held: TokenId::NONE
            })
        );
        assert!(ledger.is_pending(&w));
        assert!(!ledger.is_completed(&w));
    }

    #[test]
    fn mint_pending_issues_and_completes_atomically() {
        let w = addr(1);
        let mut ledger = ready_ledger(&w);
        assert_eq!(
            ledger.mint_pending(&as_admin(5), w.clone(), "uri://p"),
            Err(LedgerError::NotPending(w.clone()))
        );
        ledger
            .enqueue_pending(
                &as_admin(5),
                w.clone(),
                "SV001",
                "Math",
                "Session1",
                77,
                Timestamp::new(4),
                "9.9.9.9",
            )
            .unwrap();
        let token_id = ledger.mint_pending(&as_admin(6), w.clone(), "uri://p").unwrap();
        assert_eq!(token_id, TokenId::FIRST);

        let token = ledger.token_info(token_id).unwrap();
        assert_eq!(token.score, 77);
        assert_eq!(token.ip_address, "9.9.9.9");
        assert!(ledger.is_completed(&w));
        assert!(!ledger.is_pending(&w));
        assert_eq!(ledger.get_completed(&w).unwrap().mint_date, Timestamp::new(6));
    }

    #[test]
    fn mint_pending_failure_leaves_queue_untouched() {
        let w = addr(1);
        let mut ledger = ready_ledger(&w);
        ledger
            .enqueue_pending(
                &as_admin(5),
                w.clone(),
                "SV001",
                "Math",
                "S1",
                60,
                Timestamp::new(4),
                "ip",
            )
            .unwrap();
        ledger.flag_misconduct(&as_admin(6), w.clone(), "phone").unwrap();
        assert!(matches!(
            ledger.mint_pending(&as_admin(7), w.clone(), "uri"),
            Err(LedgerError::NotEligible { .. })
        ));
        assert!(ledger.is_pending(&w));
        assert_eq!(ledger.total_supply(), 0);
    }

    #[test]
    fn enqueue_rejects_only_duplicates_and_certified_wallets() {
        let w = addr(1);
        let mut ledger = ExamLedger::new(admin()).unwrap();
        let enqueue = |ledger: &mut ExamLedger, wallet: &WalletAddress| {
            ledger.enqueue_pending(
                &as_admin(5),
                wallet.clone(),
                "SV001",
                "Math",
                "S1",
                60,
                Timestamp::new(4),
                "ip",
            )
        };

        // Queued ahead of registration; eligibility is checked at mint time.
        enqueue(&mut ledger, &w).unwrap();
        assert!(ledger.is_pending(&w));
        assert_eq!(
            enqueue(&mut ledger, &w),
            Err(LedgerError::AlreadyPending(w.clone()))
        );
        assert_eq!(
            ledger.mint_pending(&as_admin(6), w.clone(), "uri"),
            Err(LedgerError::NotEligible {
                wallet: w.clone(),
                missing: Requirement::Registered,
            })
        );

        let certified = addr(2);
        let mut ledger = ready_ledger(&certified);
        mint_w(&mut ledger, &certified).unwrap();
        assert!(matches!(
            enqueue(&mut ledger, &certified),
            Err(LedgerError::AlreadyMinted { .. })
        ));
        assert_eq!(ledger.pending_count(), 0);
    }

    #[test]
    fn ownership_transfer() {
        let mut ledger = ExamLedger::new(admin()).unwrap();
        assert_eq!(
            ledger.transfer_ownership(&as_wallet(&addr(2), 1), addr(2)),
            Err(LedgerError::Unauthorized { caller: addr(2) })
        );
        assert_eq!(
            ledger.transfer_ownership(&as_admin(1), WalletAddress::null()),
            Err(LedgerError::InvalidIdentity)
        );
        let events = ledger
            .execute(&as_admin(2), Operation::TransferOwnership { new_admin: addr(2) })
            .unwrap();
        assert_eq!(
            events,
            vec![LedgerEvent::OwnershipTransferred {
                previous: admin(),
                new_admin: addr(2),
                at: Timestamp::new(2),
            }]
        );
        assert_eq!(ledger.admin(), &addr(2));
        assert!(ledger.add_to_whitelist(&as_admin(3), addr(9)).is_err());
        assert!(ledger
            .add_to_whitelist(&as_wallet(&addr(2), 3), addr(9))
            .is_ok());
    }

    #[test]
    fn replay_reproduces_state() {
        let w = addr(1);
        let mut ledger = ExamLedger::new(admin()).unwrap();
        let mut log = Vec::new();
        let ops = vec![
            (as_admin(1), Operation::AddToWhitelist { wallet: w.clone() }),
            (
                as_wallet(&w, 2),
                Operation::Register {
                    wallet: w.clone(),
                    student_id: "SV001".into(),
                    subject: "Math".into(),
                    exam_session: "S1".into(),
                },
            ),
            (
                as_wallet(&w, 3),
                Operation::Verify {
                    wallet: w.clone(),
                    ip_address: "ip".into(),
                    image_hash: "h".into(),
                },
            ),
            (
                as_admin(4),
                Operation::EnqueuePending {
                    wallet: w.clone(),
                    student_id: "SV001".into(),
                    subject: "Math".into(),
                    exam_session: "S1".into(),
                    score: 81,
                    exam_date: Timestamp::new(4),
                    ip_address: "ip".into(),
                },
            ),
            (
                as_admin(5),
                Operation::MintPending {
                    wallet: w.clone(),
                    metadata_uri: "uri".into(),
                },
            ),
        ];
        for (ctx, op) in ops {
            log.extend(ledger.execute(&ctx, op).unwrap());
        }

        let replayed = ExamLedger::replay(admin(), &log).unwrap();
        assert_eq!(replayed.summary(), ledger.summary());
        assert_eq!(replayed.student_info(&w), ledger.student_info(&w));
        assert_eq!(replayed.token_info(TokenId::FIRST), ledger.token_info(TokenId::FIRST));
        assert_eq!(replayed.get_completed(&w), ledger.get_completed(&w));
    }

    #[test]
    fn failed_plan_changes_nothing() {
        let w = addr(1);
        let ledger = ready_ledger(&w);
        let before = ledger.summary();
        let mut copy = ledger.clone();
        let result = copy.execute(
            &as_admin(9),
            Operation::CompleteMint {
                wallet: w.clone(),
                token_id: TokenId::FIRST,
                mint_date: Timestamp::new(9),
            },
        );
        assert!(result.is_err());
        assert_eq!(copy.summary(), before);
    }

    #[test]
    fn metadata_uses_completed_exam_date() {
        let w = addr(1);
        let mut ledger = ready_ledger(&w);
        ledger
            .enqueue_pending(
                &as_admin(5),
                w.clone(),
                "SV001",
                "Math",
                "S1",
                95,
                Timestamp::new(1_717_230_600),
                "ip",
            )
            .unwrap();
        let id = ledger.mint_pending(&as_admin(6), w.clone(), "uri").unwrap();
        let doc = ledger
            .certificate_metadata(id, &MetadataLinks::default())
            .unwrap();
        assert_eq!(doc.attribute("Exam Date"), Some("2024-06-01"));
        assert_eq!(doc.image, "https://ipfs.io/ipfs/hash1");
        assert!(matches!(
            ledger.certificate_metadata(TokenId::new(2), &MetadataLinks::default()),
            Err(LedgerError::NotFound(_))
        ));
    }
}
