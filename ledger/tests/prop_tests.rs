use std::collections::HashSet;

use proptest::prelude::*;

use examcert_ledger::{ExamLedger, LedgerSnapshot, Operation, TxContext};
use examcert_types::{Timestamp, TokenId, WalletAddress};

const WALLETS: u8 = 5;

fn admin() -> WalletAddress {
    WalletAddress::from_bytes([0xad; 20])
}

fn wallet(n: u8) -> WalletAddress {
    WalletAddress::from_bytes([n + 1; 20])
}

/// A step is an operation plus whether the administrator submits it.
#[derive(Clone, Debug)]
struct Step {
    by_admin: bool,
    op: Operation,
}

fn arb_step() -> impl Strategy<Value = Step> {
    let w = 0..WALLETS;
    prop_oneof![
        w.clone().prop_map(|n| Step {
            by_admin: true,
            op: Operation::AddToWhitelist { wallet: wallet(n) },
        }),
        w.clone().prop_map(|n| Step {
            by_admin: true,
            op: Operation::RemoveFromWhitelist { wallet: wallet(n) },
        }),
        w.clone().prop_map(|n| Step {
            by_admin: false,
            op: Operation::Register {
                wallet: wallet(n),
                student_id: format!("SV{n:03}"),
                subject: "Math".into(),
                exam_session: "S1".into(),
            },
        }),
        w.clone().prop_map(|n| Step {
            by_admin: false,
            op: Operation::Verify {
                wallet: wallet(n),
                ip_address: "10.0.0.1".into(),
                image_hash: format!("img{n}"),
            },
        }),
        (w.clone(), 0u32..=110).prop_map(|(n, score)| Step {
            by_admin: true,
            op: Operation::EnqueuePending {
                wallet: wallet(n),
                student_id: format!("SV{n:03}"),
                subject: "Math".into(),
                exam_session: "S1".into(),
                score,
                exam_date: Timestamp::new(1),
                ip_address: "10.0.0.1".into(),
            },
        }),
        w.clone().prop_map(|n| Step {
            by_admin: true,
            op: Operation::Mint {
                wallet: wallet(n),
                student_id: format!("SV{n:03}"),
                subject: "Math".into(),
                exam_session: "S1".into(),
                ip_address: "10.0.0.1".into(),
                metadata_uri: format!("uri://{n}"),
            },
        }),
        w.clone().prop_map(|n| Step {
            by_admin: true,
            op: Operation::MintPending {
                wallet: wallet(n),
                metadata_uri: format!("uri://{n}"),
            },
        }),
        (w.clone(), 1u64..4).prop_map(|(n, id)| Step {
            by_admin: true,
            op: Operation::CompleteMint {
                wallet: wallet(n),
                token_id: TokenId::new(id),
                mint_date: Timestamp::new(9),
            },
        }),
        (w.clone(), any::<bool>()).prop_map(|(n, by_admin)| Step {
            by_admin,
            op: Operation::FlagMisconduct {
                wallet: wallet(n),
                reason: "flagged".into(),
            },
        }),
        w.prop_map(|n| Step {
            by_admin: true,
            op: Operation::ClearMisconduct { wallet: wallet(n) },
        }),
    ]
}

fn run(steps: &[Step]) -> (ExamLedger, Vec<examcert_ledger::LedgerEvent>) {
    let mut ledger = ExamLedger::new(admin()).unwrap();
    let mut log = Vec::new();
    for (i, step) in steps.iter().enumerate() {
        let caller = if step.by_admin {
            admin()
        } else {
            step.op.wallet().cloned().unwrap_or_else(admin)
        };
        let ctx = TxContext::new(caller, Timestamp::new(10 + i as u64));
        if let Ok(events) = ledger.execute(&ctx, step.op.clone()) {
            log.extend(events);
        }
    }
    (ledger, log)
}

proptest! {
    /// Token ids are exactly 1..=total_supply and no wallet holds two.
    #[test]
    fn token_ids_sequential_and_unique(steps in prop::collection::vec(arb_step(), 0..60)) {
        let (ledger, _) = run(&steps);
        let certs = ledger.certificates();
        let mut owners = HashSet::new();
        for (i, token) in certs.list().enumerate() {
            prop_assert_eq!(token.token_id, TokenId::new(i as u64 + 1));
            prop_assert!(owners.insert(token.owner.clone()));
            prop_assert_eq!(ledger.token_id_of(&token.owner), token.token_id);
            prop_assert!(ledger.is_registered(&token.owner));
            prop_assert!(ledger.is_verified(&token.owner));
        }
        prop_assert_eq!(certs.total_supply(), owners.len() as u64);
    }

    /// Pending and completed never share a wallet, and every completed
    /// entry points at the token its wallet holds.
    #[test]
    fn queue_partition_disjoint(steps in prop::collection::vec(arb_step(), 0..60)) {
        let (ledger, _) = run(&steps);
        for w in ledger.list_pending_wallets() {
            prop_assert!(!ledger.is_completed(w));
        }
        for w in ledger.list_completed_wallets() {
            prop_assert!(!ledger.is_pending(w));
            let done = ledger.get_completed(w).unwrap();
            prop_assert_eq!(ledger.token_id_of(w), done.token_id);
        }
        for w in ledger.list_pending_wallets() {
            prop_assert!(ledger.get_pending(w).unwrap().score <= 100);
        }
    }

    /// Registration and verification only ever happen for wallets that were
    /// whitelisted at the time; verification implies registration.
    #[test]
    fn verified_implies_registered(steps in prop::collection::vec(arb_step(), 0..60)) {
        let (ledger, _) = run(&steps);
        for n in 0..WALLETS {
            let w = wallet(n);
            if ledger.is_verified(&w) {
                prop_assert!(ledger.is_registered(&w));
            }
        }
        let listed: HashSet<_> = ledger.list_whitelisted().collect();
        prop_assert_eq!(listed.len(), ledger.whitelist_count());
    }

    /// Replaying the committed event log rebuilds the same state.
    #[test]
    fn replay_matches_live_state(steps in prop::collection::vec(arb_step(), 0..60)) {
        let (ledger, log) = run(&steps);
        let replayed = ExamLedger::replay(admin(), &log).unwrap();
        prop_assert_eq!(replayed.summary(), ledger.summary());
        prop_assert_eq!(
            replayed.list_whitelisted().collect::<Vec<_>>(),
            ledger.list_whitelisted().collect::<Vec<_>>()
        );
        prop_assert_eq!(
            replayed.certificates().list().collect::<Vec<_>>(),
            ledger.certificates().list().collect::<Vec<_>>()
        );
    }

    /// Snapshot capture/restore is lossless for any reachable state.
    #[test]
    fn snapshot_restore_matches(steps in prop::collection::vec(arb_step(), 0..40)) {
        let (ledger, _) = run(&steps);
        let snap = LedgerSnapshot::capture(&ledger, Timestamp::new(1_000)).unwrap();
        let restored = snap.restore().unwrap();
        prop_assert_eq!(restored.summary(), ledger.summary());
        prop_assert_eq!(restored.cursors(), ledger.cursors());
        let again = LedgerSnapshot::capture(&restored, Timestamp::new(2_000)).unwrap();
        prop_assert_eq!(again.hash, snap.hash);
    }
}
