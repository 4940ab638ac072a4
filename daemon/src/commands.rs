//! Subcommands and their handlers.
//!
//! Every command opens the node, runs at most one transaction and prints
//! its result as pretty JSON on stdout.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::json;

use examcert_ledger::{LedgerEvent, LedgerSnapshot, Operation};
use examcert_node::{minted_token, ExamNode, NodeConfig};
use examcert_types::{Score, Timestamp, TokenId, WalletAddress};
use examcert_utils::{evidence_digest, format_duration};

#[derive(Subcommand)]
pub enum Command {
    /// Initialise a fresh data directory.
    Init {
        /// The first administrator.
        #[arg(long)]
        admin: WalletAddress,
    },
    /// Print ledger counters.
    Status,
    /// Administrator management.
    #[command(subcommand)]
    Owner(OwnerCommand),
    /// Whitelist management.
    #[command(subcommand)]
    Whitelist(WhitelistCommand),
    /// Self-register a whitelisted wallet.
    Register {
        wallet: WalletAddress,
        #[command(flatten)]
        exam: ExamArgs,
    },
    /// Record identity verification evidence for a registered wallet.
    Verify {
        wallet: WalletAddress,
        #[arg(long)]
        ip: String,
        /// Evidence image; its SHA-256 digest is recorded.
        #[arg(long, conflicts_with = "image_hash", required_unless_present = "image_hash")]
        image: Option<PathBuf>,
        /// Precomputed evidence reference.
        #[arg(long)]
        image_hash: Option<String>,
    },
    /// Flag a registered wallet for misconduct.
    Flag {
        wallet: WalletAddress,
        #[arg(long)]
        reason: String,
    },
    /// Clear a misconduct flag.
    Unflag { wallet: WalletAddress },
    /// Student records.
    #[command(subcommand)]
    Student(StudentCommand),
    /// Issue a certificate directly.
    Mint {
        wallet: WalletAddress,
        #[command(flatten)]
        exam: ExamArgs,
        #[arg(long)]
        ip: String,
        #[arg(long)]
        uri: String,
    },
    /// Mint queue.
    #[command(subcommand)]
    Queue(QueueCommand),
    /// Issued certificates.
    #[command(subcommand)]
    Certificate(CertificateCommand),
    /// Print the committed event log.
    Events {
        #[arg(long, default_value_t = 0)]
        from: u64,
    },
    /// Ledger snapshots.
    #[command(subcommand)]
    Snapshot(SnapshotCommand),
    /// Replay the event log and compare it with the stored state.
    Check,
}

#[derive(Args)]
pub struct ExamArgs {
    #[arg(long)]
    student_id: String,
    #[arg(long)]
    subject: String,
    #[arg(long)]
    session: String,
}

#[derive(Subcommand)]
pub enum OwnerCommand {
    Show,
    Transfer { new_admin: WalletAddress },
}

#[derive(Subcommand)]
pub enum WhitelistCommand {
    Add { wallet: WalletAddress },
    /// Add several wallets in one all-or-nothing transaction.
    AddBatch {
        #[arg(required = true)]
        wallets: Vec<WalletAddress>,
    },
    Remove { wallet: WalletAddress },
    List,
    Status { wallet: WalletAddress },
}

#[derive(Subcommand)]
pub enum StudentCommand {
    Show { wallet: WalletAddress },
    List,
    /// Explain whether a wallet may receive a certificate.
    Eligibility { wallet: WalletAddress },
}

#[derive(Subcommand)]
pub enum QueueCommand {
    /// Add a wallet to the pending queue; eligibility is checked at mint time.
    Add {
        wallet: WalletAddress,
        #[command(flatten)]
        exam: ExamArgs,
        #[arg(long)]
        score: Score,
        /// Epoch seconds, `YYYY-MM-DD` or RFC 3339.
        #[arg(long)]
        exam_date: Timestamp,
        #[arg(long)]
        ip: String,
    },
    /// Mint from the pending entry and complete it in one transaction.
    Mint {
        wallet: WalletAddress,
        #[arg(long)]
        uri: String,
    },
    /// Move a pending entry to completed after its certificate was minted.
    Complete {
        wallet: WalletAddress,
        #[arg(long)]
        token_id: u64,
        /// Defaults to now.
        #[arg(long)]
        mint_date: Option<Timestamp>,
    },
    Show { wallet: WalletAddress },
    Pending,
    Completed,
}

#[derive(Subcommand)]
pub enum CertificateCommand {
    Show { token_id: u64 },
    /// Certificate held by a wallet.
    Of { wallet: WalletAddress },
    List,
    /// Print the metadata document for a certificate.
    Metadata { token_id: u64 },
}

#[derive(Subcommand)]
pub enum SnapshotCommand {
    /// Write a hashed snapshot of the ledger to a file.
    Export { path: PathBuf },
    /// Check a snapshot file's hash and restorability.
    Verify { path: PathBuf },
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Explicit caller, or the current administrator.
fn admin_caller(node: &ExamNode, caller: &Option<WalletAddress>) -> anyhow::Result<WalletAddress> {
    match caller {
        Some(c) => Ok(c.clone()),
        None => Ok(node.admin()?),
    }
}

/// Explicit caller, or the student's own wallet.
fn student_caller(wallet: &WalletAddress, caller: &Option<WalletAddress>) -> WalletAddress {
    caller.clone().unwrap_or_else(|| wallet.clone())
}

fn transact(
    node: &ExamNode,
    caller: &WalletAddress,
    op: Operation,
) -> anyhow::Result<Vec<LedgerEvent>> {
    let name = op.name();
    let events = node
        .execute(caller, op)
        .with_context(|| format!("{name} failed"))?;
    print_json(&events)?;
    Ok(events)
}

fn read_snapshot(path: &Path) -> anyhow::Result<LedgerSnapshot> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(LedgerSnapshot::from_bytes(&bytes)?)
}

pub fn run(
    command: Command,
    config: &NodeConfig,
    caller: Option<WalletAddress>,
) -> anyhow::Result<()> {
    match command {
        Command::Init { admin } => {
            let node = ExamNode::init(config, admin)?;
            tracing::info!(data_dir = %config.data_dir.display(), "data directory initialised");
            print_json(&node.summary()?)
        }
        Command::Snapshot(SnapshotCommand::Verify { path }) => {
            let snapshot = read_snapshot(&path)?;
            let restored = snapshot.restore()?;
            print_json(&json!({
                "hash": snapshot.hash_hex(),
                "created_at": snapshot.created_at.to_rfc3339(),
                "valid": true,
                "summary": restored.summary(),
            }))
        }
        other => {
            let node = ExamNode::open(config)?;
            run_on_node(&node, other, caller)
        }
    }
}

fn run_on_node(
    node: &ExamNode,
    command: Command,
    caller: Option<WalletAddress>,
) -> anyhow::Result<()> {
    match command {
        Command::Init { .. } => bail!("ledger is already open"),
        Command::Snapshot(SnapshotCommand::Verify { path }) => {
            bail!("snapshot verification does not use the ledger: {}", path.display())
        }
        Command::Status => print_json(&node.summary()?),

        Command::Owner(cmd) => match cmd {
            OwnerCommand::Show => print_json(&node.admin()?),
            OwnerCommand::Transfer { new_admin } => {
                let who = admin_caller(node, &caller)?;
                transact(node, &who, Operation::TransferOwnership { new_admin }).map(drop)
            }
        },

        Command::Whitelist(cmd) => match cmd {
            WhitelistCommand::Add { wallet } => {
                let who = admin_caller(node, &caller)?;
                transact(node, &who, Operation::AddToWhitelist { wallet }).map(drop)
            }
            WhitelistCommand::AddBatch { wallets } => {
                let who = admin_caller(node, &caller)?;
                transact(node, &who, Operation::AddBatchToWhitelist { wallets }).map(drop)
            }
            WhitelistCommand::Remove { wallet } => {
                let who = admin_caller(node, &caller)?;
                transact(node, &who, Operation::RemoveFromWhitelist { wallet }).map(drop)
            }
            WhitelistCommand::List => {
                let wallets =
                    node.with_ledger(|l| l.list_whitelisted().cloned().collect::<Vec<_>>())?;
                print_json(&wallets)
            }
            WhitelistCommand::Status { wallet } => {
                let listed = node.with_ledger(|l| l.is_whitelisted(&wallet))?;
                print_json(&json!({ "wallet": wallet, "whitelisted": listed }))
            }
        },

        Command::Register { wallet, exam } => {
            let who = student_caller(&wallet, &caller);
            let op = Operation::Register {
                wallet,
                student_id: exam.student_id,
                subject: exam.subject,
                exam_session: exam.session,
            };
            transact(node, &who, op).map(drop)
        }

        Command::Verify {
            wallet,
            ip,
            image,
            image_hash,
        } => {
            let image_hash = match (image, image_hash) {
                (Some(path), _) => {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    evidence_digest(&bytes)
                }
                (None, Some(hash)) => hash,
                (None, None) => bail!("either --image or --image-hash is required"),
            };
            let who = student_caller(&wallet, &caller);
            let op = Operation::Verify {
                wallet,
                ip_address: ip,
                image_hash,
            };
            transact(node, &who, op).map(drop)
        }

        Command::Flag { wallet, reason } => {
            let who = admin_caller(node, &caller)?;
            transact(node, &who, Operation::FlagMisconduct { wallet, reason }).map(drop)
        }
        Command::Unflag { wallet } => {
            let who = admin_caller(node, &caller)?;
            transact(node, &who, Operation::ClearMisconduct { wallet }).map(drop)
        }

        Command::Student(cmd) => match cmd {
            StudentCommand::Show { wallet } => {
                let info = node.with_ledger(|l| {
                    l.student_info(&wallet).cloned().map(|record| {
                        json!({
                            "record": record,
                            "misconduct": l.registrations().misconduct_of(&wallet),
                        })
                    })
                })??;
                print_json(&info)
            }
            StudentCommand::List => {
                let records = node.with_ledger(|l| {
                    l.registrations().list().cloned().collect::<Vec<_>>()
                })?;
                print_json(&records)
            }
            StudentCommand::Eligibility { wallet } => {
                let result = node.with_ledger(|l| l.eligibility(&wallet))?;
                let missing = result.err().map(|r| r.to_string());
                print_json(&json!({
                    "wallet": wallet,
                    "eligible": missing.is_none(),
                    "missing": missing,
                }))
            }
        },

        Command::Mint {
            wallet,
            exam,
            ip,
            uri,
        } => {
            let who = admin_caller(node, &caller)?;
            let op = Operation::Mint {
                wallet,
                student_id: exam.student_id,
                subject: exam.subject,
                exam_session: exam.session,
                ip_address: ip,
                metadata_uri: uri,
            };
            let events = transact(node, &who, op)?;
            if let Some(token_id) = minted_token(&events) {
                tracing::info!(%token_id, "certificate issued");
            }
            Ok(())
        }

        Command::Queue(cmd) => match cmd {
            QueueCommand::Add {
                wallet,
                exam,
                score,
                exam_date,
                ip,
            } => {
                let who = admin_caller(node, &caller)?;
                let op = Operation::EnqueuePending {
                    wallet,
                    student_id: exam.student_id,
                    subject: exam.subject,
                    exam_session: exam.session,
                    score,
                    exam_date,
                    ip_address: ip,
                };
                transact(node, &who, op).map(drop)
            }
            QueueCommand::Mint { wallet, uri } => {
                let who = admin_caller(node, &caller)?;
                let op = Operation::MintPending {
                    wallet,
                    metadata_uri: uri,
                };
                transact(node, &who, op).map(drop)
            }
            QueueCommand::Complete {
                wallet,
                token_id,
                mint_date,
            } => {
                let who = admin_caller(node, &caller)?;
                let op = Operation::CompleteMint {
                    wallet,
                    token_id: TokenId::new(token_id),
                    mint_date: mint_date.unwrap_or_else(Timestamp::now),
                };
                transact(node, &who, op).map(drop)
            }
            QueueCommand::Show { wallet } => {
                let entry = node.with_ledger(|l| {
                    if let Ok(done) = l.get_completed(&wallet) {
                        return Some(json!({ "status": "completed", "entry": done }));
                    }
                    l.get_pending(&wallet).ok().map(|entry| {
                        let waiting = entry.added_at.elapsed_since(Timestamp::now());
                        json!({
                            "status": "pending",
                            "waiting": format_duration(waiting),
                            "entry": entry,
                        })
                    })
                })?;
                match entry {
                    Some(entry) => print_json(&entry),
                    None => bail!("wallet {wallet} is not in the mint queue"),
                }
            }
            QueueCommand::Pending => {
                let entries = node.with_ledger(|l| {
                    l.mint_queue()
                        .pending_entries()
                        .map(|(_, e)| e.clone())
                        .collect::<Vec<_>>()
                })?;
                print_json(&entries)
            }
            QueueCommand::Completed => {
                let entries = node.with_ledger(|l| {
                    l.mint_queue()
                        .completed_entries()
                        .map(|(_, e)| e.clone())
                        .collect::<Vec<_>>()
                })?;
                print_json(&entries)
            }
        },

        Command::Certificate(cmd) => match cmd {
            CertificateCommand::Show { token_id } => {
                let token =
                    node.with_ledger(|l| l.token_info(TokenId::new(token_id)).cloned())??;
                print_json(&token)
            }
            CertificateCommand::Of { wallet } => {
                let token = node.with_ledger(|l| {
                    l.certificates().certificate_of(&wallet).cloned()
                })?;
                match token {
                    Some(token) => print_json(&token),
                    None => bail!("wallet {wallet} holds no certificate"),
                }
            }
            CertificateCommand::List => {
                let tokens = node.with_ledger(|l| {
                    l.certificates().list().cloned().collect::<Vec<_>>()
                })?;
                print_json(&tokens)
            }
            CertificateCommand::Metadata { token_id } => {
                print_json(&node.certificate_metadata(TokenId::new(token_id))?)
            }
        },

        Command::Events { from } => {
            let events: Vec<_> = node
                .events(from)?
                .into_iter()
                .map(|(seq, event)| json!({ "seq": seq, "kind": event.kind(), "event": event }))
                .collect();
            print_json(&events)
        }

        Command::Snapshot(SnapshotCommand::Export { path }) => {
            let snapshot = node.snapshot()?;
            std::fs::write(&path, snapshot.to_bytes()?)
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), hash = %snapshot.hash_hex(), "snapshot written");
            print_json(&json!({
                "path": path,
                "hash": snapshot.hash_hex(),
                "created_at": snapshot.created_at.to_rfc3339(),
            }))
        }

        Command::Check => {
            let consistent = node.verify_event_log()?;
            let stats = node.stats().snapshot();
            print_json(&json!({
                "event_log_consistent": consistent,
                "events": node.event_count()?,
                "stats": stats,
            }))?;
            if !consistent {
                bail!("event log replay does not match stored state");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &tempfile::TempDir) -> NodeConfig {
        NodeConfig {
            data_dir: dir.path().join("ledger"),
            map_size_mb: 16,
            ..NodeConfig::default()
        }
    }

    fn addr(n: u8) -> WalletAddress {
        WalletAddress::from_bytes([n; 20])
    }

    fn exam() -> ExamArgs {
        ExamArgs {
            student_id: "SV001".into(),
            subject: "Math".into(),
            session: "Session1".into(),
        }
    }

    #[test]
    fn student_flow_through_commands() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let w = addr(1);

        run(Command::Init { admin: addr(0xad) }, &config, None).unwrap();
        run(
            Command::Whitelist(WhitelistCommand::Add { wallet: w.clone() }),
            &config,
            None,
        )
        .unwrap();
        run(
            Command::Register {
                wallet: w.clone(),
                exam: exam(),
            },
            &config,
            None,
        )
        .unwrap();

        let image = dir.path().join("face.jpg");
        std::fs::write(&image, b"jpeg bytes").unwrap();
        run(
            Command::Verify {
                wallet: w.clone(),
                ip: "1.2.3.4".into(),
                image: Some(image),
                image_hash: None,
            },
            &config,
            None,
        )
        .unwrap();
        run(
            Command::Mint {
                wallet: w.clone(),
                exam: exam(),
                ip: "1.2.3.4".into(),
                uri: "uri://1".into(),
            },
            &config,
            None,
        )
        .unwrap();

        let node = ExamNode::open(&config).unwrap();
        node.with_ledger(|l| {
            assert_eq!(l.token_id_of(&w), TokenId::FIRST);
            assert_eq!(
                l.student_info(&w).unwrap().image_hash,
                evidence_digest(b"jpeg bytes")
            );
        })
        .unwrap();
    }

    #[test]
    fn register_as_someone_else_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        run(Command::Init { admin: addr(0xad) }, &config, None).unwrap();
        run(
            Command::Whitelist(WhitelistCommand::Add { wallet: addr(1) }),
            &config,
            None,
        )
        .unwrap();
        let result = run(
            Command::Register {
                wallet: addr(1),
                exam: exam(),
            },
            &config,
            Some(addr(2)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn snapshot_export_then_verify() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        run(Command::Init { admin: addr(0xad) }, &config, None).unwrap();
        let path = dir.path().join("ledger.snap");
        run(
            Command::Snapshot(SnapshotCommand::Export { path: path.clone() }),
            &config,
            None,
        )
        .unwrap();
        run(
            Command::Snapshot(SnapshotCommand::Verify { path: path.clone() }),
            &config,
            None,
        )
        .unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(&path, bytes).unwrap();
        assert!(run(
            Command::Snapshot(SnapshotCommand::Verify { path }),
            &config,
            None
        )
        .is_err());
    }

    #[test]
    fn commands_before_init_fail() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(Command::Status, &config_in(&dir), None).is_err());
    }
}
