//! Bridges the in-memory ledger and the persistent store.
//!
//! [`changes_for`] turns the events of one planned transaction into the
//! table writes that persist them, *before* the events are applied in memory.
//! Insertion sequence numbers come from the ledger's current cursors, so the
//! stored order matches what [`examcert_ledger::ExamLedger::apply`] will
//! produce. [`rebuild`] goes the other way on startup.

use std::collections::HashMap;

use examcert_ledger::{
    AccessControl, CertificateLedger, ExamLedger, LedgerEvent, MintQueueIndex,
    RegistrationLedger, WhitelistRegistry,
};
use examcert_store::{ChangeSet, StoreWrite, StoredLedger};
use examcert_types::{
    CompletedMintEntry, MisconductFlag, PendingMintEntry, StudentRecord, WalletAddress,
};

use crate::NodeError;

/// Encode one event for the event log.
pub fn encode_event(event: &LedgerEvent) -> Result<Vec<u8>, NodeError> {
    Ok(bincode::serialize(event)?)
}

/// Decode one event-log entry.
pub fn decode_event(bytes: &[u8]) -> Result<LedgerEvent, NodeError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Table writes plus event-log appends for `events`, planned against `ledger`.
///
/// `first_event_seq` is the log sequence number of the first event. When the
/// transaction inserts into a sequence-ordered table the advanced cursors are
/// written too, so a restart resumes numbering where the ledger left off.
pub fn changes_for(
    ledger: &ExamLedger,
    events: &[LedgerEvent],
    first_event_seq: u64,
) -> Result<ChangeSet, NodeError> {
    let mut changes = ChangeSet::new();

    let start = ledger.cursors();
    let mut cursors = start;

    // Records created earlier in the same transaction.
    let mut staged_students: HashMap<WalletAddress, (u64, StudentRecord)> = HashMap::new();
    let mut staged_pending: HashMap<WalletAddress, PendingMintEntry> = HashMap::new();

    for event in events {
        match event {
            LedgerEvent::OwnershipTransferred { new_admin, .. } => {
                changes.push(StoreWrite::PutAdmin(new_admin.clone()));
            }
            LedgerEvent::WhitelistAdded { wallet, .. } => {
                changes.push(StoreWrite::PutWhitelisted {
                    seq: cursors.whitelist,
                    wallet: wallet.clone(),
                });
                cursors.whitelist += 1;
            }
            LedgerEvent::WhitelistRemoved { wallet, .. } => {
                changes.push(StoreWrite::DeleteWhitelisted(wallet.clone()));
            }
            LedgerEvent::Registered {
                wallet,
                student_id,
                subject,
                exam_session,
                at,
            } => {
                let record = StudentRecord::new(
                    wallet.clone(),
                    student_id.clone(),
                    subject.clone(),
                    exam_session.clone(),
                    *at,
                );
                changes.push(StoreWrite::PutStudent {
                    seq: cursors.students,
                    record: record.clone(),
                });
                staged_students.insert(wallet.clone(), (cursors.students, record));
                cursors.students += 1;
            }
            LedgerEvent::Verified {
                wallet,
                ip_address,
                image_hash,
                at,
            } => {
                let (seq, mut record) = match staged_students.remove(wallet) {
                    Some(staged) => staged,
                    None => {
                        let registrations = ledger.registrations();
                        let seq = registrations.seq_of(wallet);
                        let record = registrations.get(wallet).cloned();
                        seq.zip(record).ok_or_else(|| {
                            NodeError::Inconsistent(format!("verified unknown student {wallet}"))
                        })?
                    }
                };
                record.is_verified = true;
                record.verification_time = Some(*at);
                record.ip_address = ip_address.clone();
                record.image_hash = image_hash.clone();
                changes.push(StoreWrite::PutStudent {
                    seq,
                    record: record.clone(),
                });
                staged_students.insert(wallet.clone(), (seq, record));
            }
            LedgerEvent::MisconductFlagged { wallet, reason, at } => {
                changes.push(StoreWrite::PutFlag(MisconductFlag {
                    wallet: wallet.clone(),
                    reason: reason.clone(),
                    flagged_at: *at,
                }));
            }
            LedgerEvent::MisconductCleared { wallet, .. } => {
                changes.push(StoreWrite::DeleteFlag(wallet.clone()));
            }
            LedgerEvent::CertificateMinted { token } => {
                changes.push(StoreWrite::PutCertificate(token.clone()));
            }
            LedgerEvent::MintQueued { entry } => {
                changes.push(StoreWrite::PutPending {
                    seq: cursors.pending,
                    entry: entry.clone(),
                });
                staged_pending.insert(entry.wallet.clone(), entry.clone());
                cursors.pending += 1;
            }
            LedgerEvent::MintCompleted {
                wallet,
                token_id,
                mint_date,
                ..
            } => {
                let entry = match staged_pending.remove(wallet) {
                    Some(entry) => entry,
                    None => ledger.mint_queue().get_pending(wallet)?.clone(),
                };
                changes.push(StoreWrite::DeletePending(wallet.clone()));
                changes.push(StoreWrite::PutCompleted {
                    seq: cursors.completed,
                    entry: CompletedMintEntry {
                        entry,
                        token_id: *token_id,
                        mint_date: *mint_date,
                    },
                });
                cursors.completed += 1;
            }
        }
    }

    for (offset, event) in events.iter().enumerate() {
        changes.push(StoreWrite::AppendEvent {
            seq: first_event_seq + offset as u64,
            bytes: encode_event(event)?,
        });
    }
    if cursors != start {
        changes.push(StoreWrite::PutCursors(cursors));
    }

    Ok(changes)
}

/// Rebuild the in-memory ledger from persisted tables.
pub fn rebuild(stored: StoredLedger) -> Result<ExamLedger, NodeError> {
    let admin = stored.admin.ok_or(NodeError::NotInitialized)?;
    let access = AccessControl::new(admin)?;

    let mut whitelist = WhitelistRegistry::new();
    for (seq, wallet) in stored.whitelist {
        whitelist.restore(seq, wallet);
    }

    let mut registrations = RegistrationLedger::new();
    for (seq, record) in stored.students {
        registrations.restore(seq, record);
    }
    for flag in stored.flags {
        registrations.restore_flag(flag);
    }

    let expected = stored.certificates.len() as u64;
    let mut certificates = CertificateLedger::new();
    for token in stored.certificates {
        certificates.restore(token);
    }
    if certificates.total_supply() != expected {
        return Err(NodeError::Inconsistent(
            "certificate ids are not sequential from 1".to_string(),
        ));
    }

    let mut mint_queue = MintQueueIndex::new();
    for (seq, entry) in stored.pending {
        mint_queue.restore_pending(seq, entry);
    }
    for (seq, entry) in stored.completed {
        mint_queue.restore_completed(seq, entry);
    }

    let mut ledger =
        ExamLedger::from_parts(access, whitelist, registrations, certificates, mint_queue);
    ledger.resume_cursors(stored.cursors);
    Ok(ledger)
}
