//! The examcert node: one ledger, one store, one writer at a time.
//!
//! Every operation runs as a single transaction. The node plans it against
//! the in-memory ledger, commits the resulting table writes and event-log
//! entries in one atomic store commit, applies the events in memory and only
//! then notifies subscribers. A rejected plan or a failed commit leaves both
//! the store and the in-memory ledger untouched.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use examcert_ledger::{
    CertificateMetadata, ExamLedger, LedgerEvent, LedgerSnapshot, LedgerSummary, MetadataLinks,
    Operation, TxContext,
};
use examcert_store::{ChangeSet, EventLogStore, LedgerStore, MetaStore, StoreWrite, StoredLedger};
use examcert_store_lmdb::{check_data_dir, check_integrity, LmdbEnvironment, Migrator};
use examcert_types::{TokenId, WalletAddress};
use examcert_utils::{Clock, StatsCounter, SystemClock};

use crate::config::NodeConfig;
use crate::event_bus::EventBus;
use crate::ledger_bridge;
use crate::NodeError;

/// Counter names tracked by [`ExamNode::stats`].
pub const STAT_NAMES: &[&str] = &["committed", "rejected", "commit_failed", "events"];

struct NodeState {
    ledger: ExamLedger,
    next_event_seq: u64,
}

/// A running examcert ledger backed by a persistent store.
pub struct ExamNode {
    state: Mutex<NodeState>,
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    stats: StatsCounter,
    links: MetadataLinks,
}

/// Open the LMDB environment named by `config`, checking and migrating it.
fn open_lmdb(config: &NodeConfig) -> Result<LmdbEnvironment, NodeError> {
    check_data_dir(&config.data_dir).map_err(NodeError::Config)?;
    let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes())?;

    let report = check_integrity(&env)?;
    if !report.is_healthy() {
        return Err(NodeError::Inconsistent(report.errors.join("; ")));
    }
    debug!(
        databases = report.databases_checked,
        entries = report.total_entries,
        "integrity check passed"
    );

    Migrator::run(&env)?;
    Ok(env)
}

impl ExamNode {
    /// Open an existing data directory.
    ///
    /// A fresh directory is initialised only if `config.admin` is set;
    /// otherwise this fails with [`NodeError::NotInitialized`].
    pub fn open(config: &NodeConfig) -> Result<Self, NodeError> {
        let env = open_lmdb(config)?;
        Self::with_store(
            Arc::new(env),
            Arc::new(SystemClock),
            config.admin.clone(),
            config.metadata_links(),
        )
    }

    /// Initialise a fresh data directory with `admin` as the first administrator.
    pub fn init(config: &NodeConfig, admin: WalletAddress) -> Result<Self, NodeError> {
        let env = open_lmdb(config)?;
        if let Some(existing) = env.get_admin()? {
            return Err(NodeError::AlreadyInitialized(existing));
        }
        Self::with_store(
            Arc::new(env),
            Arc::new(SystemClock),
            Some(admin),
            config.metadata_links(),
        )
    }

    /// Build a node over any [`LedgerStore`].
    ///
    /// If the store has never been written, `genesis_admin` becomes the
    /// administrator and a genesis `OwnershipTransferred` event is logged.
    pub fn with_store(
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
        genesis_admin: Option<WalletAddress>,
        links: MetadataLinks,
    ) -> Result<Self, NodeError> {
        let stored = StoredLedger::load(store.as_ref())?;

        let ledger = if stored.is_fresh() {
            let admin = genesis_admin.ok_or(NodeError::NotInitialized)?;
            let ledger = ExamLedger::new(admin.clone())?;
            let genesis = LedgerEvent::OwnershipTransferred {
                previous: WalletAddress::null(),
                new_admin: admin.clone(),
                at: clock.now(),
            };
            let mut changes = ChangeSet::new();
            changes.push(StoreWrite::PutAdmin(admin.clone()));
            changes.push(StoreWrite::AppendEvent {
                seq: store.event_count()?,
                bytes: ledger_bridge::encode_event(&genesis)?,
            });
            store.commit(&changes)?;
            info!(admin = %admin, "initialised new ledger");
            ledger
        } else {
            if let Some(requested) = &genesis_admin {
                if stored.admin.as_ref() != Some(requested) {
                    warn!(
                        requested = %requested,
                        "ignoring configured admin; ledger already initialised"
                    );
                }
            }
            let ledger = ledger_bridge::rebuild(stored)?;
            let summary = ledger.summary();
            info!(
                admin = %summary.admin,
                students = summary.students,
                certificates = summary.total_supply,
                pending = summary.pending,
                "loaded ledger"
            );
            ledger
        };

        let next_event_seq = store.event_count()?;

        Ok(Self {
            state: Mutex::new(NodeState {
                ledger,
                next_event_seq,
            }),
            store,
            clock,
            events: EventBus::new(),
            stats: StatsCounter::new(STAT_NAMES),
            links,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, NodeState>, NodeError> {
        self.state.lock().map_err(|_| NodeError::LockPoisoned)
    }

    // ── Transactions ────────────────────────────────────────────────────

    /// Run `op` on behalf of `caller` as one atomic transaction.
    ///
    /// Returns the committed events, in log order.
    pub fn execute(
        &self,
        caller: &WalletAddress,
        op: Operation,
    ) -> Result<Vec<LedgerEvent>, NodeError> {
        let span = tracing::info_span!("execute", op = op.name(), caller = %caller);
        let _enter = span.enter();

        let mut state = self.lock()?;
        let ctx = TxContext::new(caller.clone(), self.clock.now());

        let events = match state.ledger.plan(&ctx, &op) {
            Ok(events) => events,
            Err(e) => {
                self.stats.increment("rejected");
                debug!(error = %e, "operation rejected");
                return Err(e.into());
            }
        };

        let first_seq = state.next_event_seq;
        let changes = ledger_bridge::changes_for(&state.ledger, &events, first_seq)?;
        if !changes.is_empty() {
            if let Err(e) = self.store.commit(&changes) {
                self.stats.increment("commit_failed");
                warn!(error = %e, "commit failed; ledger unchanged");
                return Err(e.into());
            }
        }

        for event in &events {
            state.ledger.apply(event);
        }
        state.next_event_seq += events.len() as u64;

        // Emitted under the lock so listeners see events in log order.
        for (offset, event) in events.iter().enumerate() {
            self.events.emit(first_seq + offset as u64, event);
        }
        drop(state);

        self.stats.increment("committed");
        for _ in &events {
            self.stats.increment("events");
        }
        info!(events = events.len(), first_seq, "transaction committed");
        Ok(events)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Run a read-only closure against the current ledger state.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&ExamLedger) -> R) -> Result<R, NodeError> {
        let state = self.lock()?;
        Ok(f(&state.ledger))
    }

    pub fn summary(&self) -> Result<LedgerSummary, NodeError> {
        self.with_ledger(ExamLedger::summary)
    }

    pub fn admin(&self) -> Result<WalletAddress, NodeError> {
        self.with_ledger(|l| l.admin().clone())
    }

    /// Metadata document for `token_id`, using the configured links.
    pub fn certificate_metadata(
        &self,
        token_id: TokenId,
    ) -> Result<CertificateMetadata, NodeError> {
        let state = self.lock()?;
        Ok(state.ledger.certificate_metadata(token_id, &self.links)?)
    }

    /// Committed events with sequence number `>= from`, in order.
    pub fn events(&self, from: u64) -> Result<Vec<(u64, LedgerEvent)>, NodeError> {
        self.store
            .iter_events(from)?
            .into_iter()
            .map(|(seq, bytes)| Ok((seq, ledger_bridge::decode_event(&bytes)?)))
            .collect()
    }

    pub fn event_count(&self) -> Result<u64, NodeError> {
        Ok(self.lock()?.next_event_seq)
    }

    /// Capture a hashed snapshot of the current state.
    pub fn snapshot(&self) -> Result<LedgerSnapshot, NodeError> {
        let state = self.lock()?;
        Ok(LedgerSnapshot::capture(&state.ledger, self.clock.now())?)
    }

    /// Replay the persisted event log and compare it with the live state.
    ///
    /// Returns `true` when both produce the same snapshot hash.
    pub fn verify_event_log(&self) -> Result<bool, NodeError> {
        let events: Vec<LedgerEvent> = self.events(0)?.into_iter().map(|(_, e)| e).collect();
        let genesis_admin = match events.first() {
            Some(LedgerEvent::OwnershipTransferred { new_admin, .. }) => new_admin.clone(),
            _ => {
                return Err(NodeError::Inconsistent(
                    "event log does not start with a genesis ownership event".to_string(),
                ))
            }
        };
        let replayed = ExamLedger::replay(genesis_admin, &events)?;

        let now = self.clock.now();
        let live = self.with_ledger(|l| LedgerSnapshot::capture(l, now))??;
        let rebuilt = LedgerSnapshot::capture(&replayed, now)?;
        Ok(live.hash == rebuilt.hash)
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    /// Register a listener for committed events.
    ///
    /// Listeners run on the committing thread while the node holds its ledger
    /// lock, so they must not call back into the node.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(u64, &LedgerEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }
}

/// The token id minted by a committed transaction, if any.
pub fn minted_token(events: &[LedgerEvent]) -> Option<TokenId> {
    events.iter().find_map(|e| match e {
        LedgerEvent::CertificateMinted { token } => Some(token.token_id),
        _ => None,
    })
}
