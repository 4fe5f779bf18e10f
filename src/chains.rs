//! Chains: the structural layer under `ChainedHashMap`.
//!
//! Entries live in a generational `SlotMap` arena and are threaded into
//! singly linked chains through their `next` handle. Each slot of the slot
//! array records the head and tail of its chain so that appends are O(1)
//! and chain order stays insertion order.
//!
//! Nothing in this module calls user hash functions; every entry carries
//! the hash computed when it was inserted, and rehashing reuses it. The only
//! user code that runs here is the equality predicate passed to `locate`
//! and `unlink`.

use core::fmt;
use slotmap::{DefaultKey, SlotMap};

#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    pub(crate) next: Option<DefaultKey>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct Slot {
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

pub(crate) struct Chains<K, V> {
    slots: Box<[Slot]>,
    entries: SlotMap<DefaultKey, Entry<K, V>>,
}

impl<K, V> Chains<K, V> {
    /// Empty slot array of `capacity` slots; `capacity` must be non-zero.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "a slot array needs at least one slot");
        Self {
            slots: empty_slots(capacity),
            entries: SlotMap::with_key(),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn slot_of(&self, hash: u64) -> usize {
        slot_index(hash, self.slots.len())
    }

    pub(crate) fn head(&self, index: usize) -> Option<DefaultKey> {
        self.slots.get(index).and_then(|s| s.head)
    }

    pub(crate) fn entry(&self, k: DefaultKey) -> Option<&Entry<K, V>> {
        self.entries.get(k)
    }

    pub(crate) fn entry_mut(&mut self, k: DefaultKey) -> Option<&mut Entry<K, V>> {
        self.entries.get_mut(k)
    }

    /// Walk the chain `hash` maps to and return the first entry whose key
    /// satisfies `eq`.
    pub(crate) fn locate<F>(&self, hash: u64, mut eq: F) -> Option<DefaultKey>
    where
        F: FnMut(&K) -> bool,
    {
        let mut cur = self.head(self.slot_of(hash));
        while let Some(k) = cur {
            let e = self.entries.get(k)?;
            if e.hash == hash && eq(&e.key) {
                return Some(k);
            }
            cur = e.next;
        }
        None
    }

    /// Append a new entry at the tail of its chain. The caller guarantees the
    /// key is not already present.
    pub(crate) fn push_back(&mut self, key: K, value: V, hash: u64) -> DefaultKey {
        let index = self.slot_of(hash);
        let k = self.entries.insert(Entry {
            key,
            value,
            hash,
            next: None,
        });
        link_tail(&mut self.slots[index], &mut self.entries, k);
        k
    }

    /// Detach the matching entry from its chain and release its arena slot.
    /// The chain is consistent again before the entry is handed back.
    pub(crate) fn unlink<F>(&mut self, hash: u64, mut eq: F) -> Option<Entry<K, V>>
    where
        F: FnMut(&K) -> bool,
    {
        let index = self.slot_of(hash);
        let mut prev: Option<DefaultKey> = None;
        let mut cur = self.slots[index].head;
        while let Some(k) = cur {
            let e = self.entries.get(k)?;
            if e.hash == hash && eq(&e.key) {
                break;
            }
            prev = cur;
            cur = e.next;
        }
        let k = cur?;
        let entry = self.entries.remove(k)?;

        match prev {
            Some(p) => {
                if let Some(pe) = self.entries.get_mut(p) {
                    pe.next = entry.next;
                }
            }
            None => self.slots[index].head = entry.next,
        }
        if self.slots[index].tail == Some(k) {
            self.slots[index].tail = prev;
        }
        Some(entry)
    }

    /// Rebuild the slot array at `new_capacity`.
    ///
    /// The new array is allocated before any entry moves, so an allocation
    /// failure leaves the current layout untouched. Old slots are drained in
    /// order, each chain head to tail, and every entry is appended to the
    /// tail of its new chain. Entries keep their arena slot; only `next`
    /// links change.
    pub(crate) fn rehash(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity > 0);
        let mut fresh = empty_slots(new_capacity);
        for slot in self.slots.iter_mut() {
            let mut cur = slot.head.take();
            slot.tail = None;
            while let Some(k) = cur {
                let Some(e) = self.entries.get_mut(k) else {
                    break;
                };
                cur = e.next.take();
                let dest = slot_index(e.hash, new_capacity);
                link_tail(&mut fresh[dest], &mut self.entries, k);
            }
        }
        self.slots = fresh;
    }

    /// Entries of the chain starting at `start`, head to tail.
    pub(crate) fn chain_from(&self, start: Option<DefaultKey>) -> ChainIter<'_, K, V> {
        ChainIter {
            chains: self,
            cur: start,
        }
    }

    #[cfg(test)]
    pub(crate) fn chain_keys(&self, index: usize) -> Vec<&K> {
        self.chain_from(self.head(index)).map(|e| &e.key).collect()
    }

    /// Cross-check slot heads/tails, links, stored hashes and the entry count.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let mut seen = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            let mut last = None;
            for e in self.chain_from(slot.head) {
                assert_eq!(self.slot_of(e.hash), index, "entry in the wrong chain");
                seen += 1;
                last = Some(e);
            }
            match (slot.tail, last) {
                (None, None) => {}
                (Some(t), Some(e)) => {
                    assert!(core::ptr::eq(&self.entries[t], e), "stale tail");
                    assert!(e.next.is_none());
                }
                _ => panic!("head/tail disagree in slot {index}"),
            }
        }
        assert_eq!(seen, self.entries.len(), "orphaned or duplicated entries");
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Chains<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut m = f.debug_map();
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.head.is_some() {
                let chain: Vec<_> = self
                    .chain_from(slot.head)
                    .map(|e| (&e.key, &e.value))
                    .collect();
                m.entry(&index, &chain);
            }
        }
        m.finish()
    }
}

/// Iterator over the entries of one chain.
pub(crate) struct ChainIter<'a, K, V> {
    chains: &'a Chains<K, V>,
    cur: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for ChainIter<'a, K, V> {
    type Item = &'a Entry<K, V>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = self.chains.entries.get(self.cur?)?;
        self.cur = e.next;
        Some(e)
    }
}

#[inline]
fn slot_index(hash: u64, capacity: usize) -> usize {
    // The remainder is below `capacity`, so it fits back into usize.
    (hash % capacity as u64) as usize
}

fn empty_slots(capacity: usize) -> Box<[Slot]> {
    vec![Slot::default(); capacity].into_boxed_slice()
}

fn link_tail<K, V>(slot: &mut Slot, entries: &mut SlotMap<DefaultKey, Entry<K, V>>, k: DefaultKey) {
    match slot.tail {
        Some(t) => {
            if let Some(last) = entries.get_mut(t) {
                last.next = Some(k);
            }
        }
        None => slot.head = Some(k),
    }
    slot.tail = Some(k);
}
