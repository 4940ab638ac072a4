//! Insertion-ordered map used by every wallet-keyed table.
//!
//! Lookups go through a hash index; enumeration walks a sequence-ordered
//! B-tree, so listings come out in insertion order and restart cleanly.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

#[derive(Clone, Debug)]
pub(crate) struct SequencedMap<K, V> {
    entries: HashMap<K, (u64, V)>,
    order: BTreeMap<u64, K>,
    next_seq: u64,
}

impl<K: Clone + Eq + Hash, V> SequencedMap<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|(_, v)| v)
    }

    pub(crate) fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key).map(|(_, v)| v)
    }

    pub(crate) fn seq_of(&self, key: &K) -> Option<u64> {
        self.entries.get(key).map(|(seq, _)| *seq)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sequence number the next insertion will receive.
    pub(crate) fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Append at the end of the order. Replaces the value in place if the key exists.
    pub(crate) fn insert(&mut self, key: K, value: V) {
        if let Some((_, slot)) = self.entries.get_mut(&key) {
            *slot = value;
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.clone());
        self.entries.insert(key, (seq, value));
    }

    /// Re-insert a persisted entry under its original sequence number.
    pub(crate) fn insert_at(&mut self, seq: u64, key: K, value: V) {
        if let Some((old_seq, _)) = self.entries.remove(&key) {
            self.order.remove(&old_seq);
        }
        self.order.insert(seq, key.clone());
        self.entries.insert(key, (seq, value));
        self.next_seq = self.next_seq.max(seq + 1);
    }

    /// Move the insertion cursor forward to at least `next_seq`.
    pub(crate) fn resume_from(&mut self, next_seq: u64) {
        self.next_seq = self.next_seq.max(next_seq);
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let (seq, value) = self.entries.remove(key)?;
        self.order.remove(&seq);
        Some(value)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.order.values()
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.order
            .values()
            .filter_map(move |k| self.entries.get(k).map(|(_, v)| v))
    }

    pub(crate) fn sequenced(&self) -> impl Iterator<Item = (u64, &V)> + '_ {
        self.order
            .iter()
            .filter_map(move |(seq, k)| self.entries.get(k).map(|(_, v)| (*seq, v)))
    }
}

impl<K: Clone + Eq + Hash, V> Default for SequencedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
