//! Synchronous fan-out of committed ledger events.

use examcert_ledger::LedgerEvent;

type Listener = Box<dyn Fn(u64, &LedgerEvent) + Send + Sync>;

/// Synchronous fan-out event bus for committed ledger events.
///
/// Listeners receive the event's log sequence number and the event. They are
/// invoked inline on the committing thread after the commit, in log order;
/// keep handlers fast to avoid stalling the next transaction.
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, seq: u64, event: &LedgerEvent) {
        for listener in &self.listeners {
            listener(seq, event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
