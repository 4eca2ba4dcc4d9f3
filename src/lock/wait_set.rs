//! Compact, mutable bitset of client ids a client is (transitively) waiting
//! for. Sized once at construction to the lock manager's configured client
//! capacity, then shared concurrently without locking.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::common::ClientId;

const BITS_PER_WORD: usize = 64;

pub struct WaitSet {
    words: Vec<AtomicU64>,
}

impl WaitSet {
    pub fn new(capacity: usize) -> Self {
        let word_count = (capacity + BITS_PER_WORD - 1) / BITS_PER_WORD;
        let mut words = Vec::with_capacity(word_count.max(1));
        for _ in 0..word_count.max(1) {
            words.push(AtomicU64::new(0));
        }
        WaitSet { words }
    }

    pub fn clear(&self) {
        for word in &self.words {
            word.store(0, Ordering::Relaxed);
        }
    }

    pub fn insert(&self, client: ClientId) {
        if let Some((word, mask)) = self.locate(client) {
            word.fetch_or(mask, Ordering::AcqRel);
        }
    }

    pub fn contains(&self, client: ClientId) -> bool {
        match self.locate(client) {
            Some((word, mask)) => word.load(Ordering::Acquire) & mask != 0,
            None => false,
        }
    }

    /// ORs `other`'s bits into `self`, the propagation step used when a
    /// client starts waiting on a lock: it inherits the union of its
    /// holders' wait-sets.
    pub fn or_from(&self, other: &WaitSet) {
        for (mine, theirs) in self.words.iter().zip(other.words.iter()) {
            mine.fetch_or(theirs.load(Ordering::Acquire), Ordering::AcqRel);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| w.load(Ordering::Acquire) == 0)
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.load(Ordering::Acquire).count_ones() as usize).sum()
    }

    fn locate(&self, client: ClientId) -> Option<(&AtomicU64, u64)> {
        if client < 0 {
            return None;
        }
        let client = client as usize;
        let word_index = client / BITS_PER_WORD;
        let bit_index = client % BITS_PER_WORD;
        self.words.get(word_index).map(|w| (w, 1u64 << bit_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_contains() {
        let ws = WaitSet::new(128);
        assert!(!ws.contains(5));
        ws.insert(5);
        assert!(ws.contains(5));
        assert!(!ws.contains(64));
    }

    #[test]
    fn clear_empties_all_words() {
        let ws = WaitSet::new(200);
        ws.insert(3);
        ws.insert(150);
        ws.clear();
        assert!(ws.is_empty());
        assert!(!ws.contains(3));
        assert!(!ws.contains(150));
    }

    #[test]
    fn or_from_propagates_bits_across_word_boundaries() {
        let a = WaitSet::new(128);
        let b = WaitSet::new(128);
        b.insert(1);
        b.insert(70);
        a.insert(2);
        a.or_from(&b);
        assert!(a.contains(1));
        assert!(a.contains(2));
        assert!(a.contains(70));
    }

    #[test]
    fn negative_client_id_is_ignored() {
        let ws = WaitSet::new(64);
        ws.insert(-1);
        assert!(ws.is_empty());
    }
}
