//! ChainedHashMap: separate-chaining table with load-factor driven growth.

use crate::bucket::{BucketMut, BucketRef};
use crate::chains::Chains;
use crate::config::Config;
use crate::error::BucketError;
use crate::hasher::{DefaultKeyHasher, KeyHasher};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::Hash;
use log::{debug, trace};

pub struct ChainedHashMap<K, V, H = DefaultKeyHasher> {
    hasher: H,
    chains: Chains<K, V>,
    load_factor: f64,
    reentrancy: DebugReentrancy,
}

impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    /// 100 slots, load factor 0.5.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// An invalid `load_factor` (outside (0.0, 1.0]) falls back to 0.5.
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f64) -> Self {
        Self::with_config(Config::new(capacity, load_factor))
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_config_and_hasher(config, DefaultKeyHasher::default())
    }
}

impl<K, V> Default for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, H> ChainedHashMap<K, V, H>
where
    K: Eq,
    H: KeyHasher<K>,
{
    /// Default capacity and load factor with a caller-supplied hasher.
    pub fn with_hasher(hasher: H) -> Self {
        Self::with_config_and_hasher(Config::default(), hasher)
    }

    pub fn with_config_and_hasher(config: Config, hasher: H) -> Self {
        let capacity = config.effective_capacity();
        let load_factor = config.effective_load_factor();
        trace!("new ChainedHashMap: capacity={capacity} load_factor={load_factor}");
        Self {
            hasher,
            chains: Chains::with_capacity(capacity),
            load_factor,
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.len() == 0
    }

    /// Current number of slots.
    pub fn capacity(&self) -> usize {
        self.chains.capacity()
    }

    /// The effective growth threshold.
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Insert `key -> value`.
    ///
    /// An existing equal key has its value replaced in place and the old
    /// value is returned; the table neither grows nor reorders. A new key is
    /// appended to the tail of its chain, and if that pushes
    /// `len / capacity` above the load factor the slot array is doubled
    /// (repeatedly, if one doubling is not enough) and rebuilt.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_key(&key);
        if let Some(k) = self.chains.locate(hash, |kk| *kk == key) {
            let e = self.chains.entry_mut(k)?;
            return Some(core::mem::replace(&mut e.value, value));
        }

        self.chains.push_back(key, value, hash);

        let len = self.chains.len();
        let old_capacity = self.chains.capacity();
        let new_capacity = grown_capacity(len, old_capacity, self.load_factor);
        if new_capacity != old_capacity {
            debug!("growing ChainedHashMap: len={len} capacity {old_capacity} -> {new_capacity}");
            self.chains.rehash(new_capacity);
        }
        None
    }

    /// Borrow the value stored under `q`.
    ///
    /// The borrow lasts until the next mutation of the table. `q` must hash
    /// to the same value as the stored key it is equal to.
    pub fn find<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        H: KeyHasher<Q>,
    {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_key(q);
        let k = self.chains.locate(hash, |kk| kk.borrow() == q)?;
        self.chains.entry(k).map(|e| &e.value)
    }

    pub fn find_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        H: KeyHasher<Q>,
    {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_key(q);
        let k = self.chains.locate(hash, |kk| kk.borrow() == q)?;
        self.chains.entry_mut(k).map(|e| &mut e.value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        H: KeyHasher<Q>,
    {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_key(q);
        self.chains.locate(hash, |kk| kk.borrow() == q).is_some()
    }

    /// Remove `q` and return its value. An absent key is a no-op. The table
    /// never shrinks.
    pub fn erase<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        H: KeyHasher<Q>,
    {
        let removed = {
            let _g = self.reentrancy.enter();
            let hash = self.hasher.hash_key(q);
            self.chains.unlink(hash, |kk| kk.borrow() == q)
        };
        // The key is dropped outside the guard; its Drop may use the table.
        removed.map(|e| e.value)
    }

    /// Head entry of slot `index`.
    ///
    /// Fails with [`BucketError::OutOfRange`] when `index >= capacity()` and
    /// with [`BucketError::EmptySlot`] when the slot has no entries. Slot
    /// layout changes on every rehash.
    pub fn bucket(&self, index: usize) -> Result<BucketRef<'_, K, V>, BucketError> {
        let head = self.head_of(index)?;
        let e = self
            .chains
            .entry(head)
            .ok_or(BucketError::EmptySlot { index })?;
        Ok(BucketRef::new(&self.chains, e))
    }

    /// Head entry of slot `index` with its value open for writing.
    pub fn bucket_mut(&mut self, index: usize) -> Result<BucketMut<'_, K, V>, BucketError> {
        let head = self.head_of(index)?;
        let e = self
            .chains
            .entry_mut(head)
            .ok_or(BucketError::EmptySlot { index })?;
        Ok(BucketMut::new(e))
    }

    /// Owned copy of the head entry of slot `index`.
    pub fn bucket_cloned(&self, index: usize) -> Result<(K, V), BucketError>
    where
        K: Clone,
        V: Clone,
    {
        self.bucket(index)
            .map(|b| (b.key().clone(), b.value().clone()))
    }

    fn head_of(&self, index: usize) -> Result<slotmap::DefaultKey, BucketError> {
        let capacity = self.chains.capacity();
        if index >= capacity {
            return Err(BucketError::OutOfRange { index, capacity });
        }
        self.chains
            .head(index)
            .ok_or(BucketError::EmptySlot { index })
    }

    #[cfg(test)]
    pub(crate) fn chains(&self) -> &Chains<K, V> {
        &self.chains
    }
}

/// Capacity after inserting the `len`-th entry: `capacity` doubled until
/// `len / capacity <= load_factor`, or unchanged when the bound already holds.
fn grown_capacity(len: usize, capacity: usize, load_factor: f64) -> usize {
    let over = |cap: usize| len as f64 / cap as f64 > load_factor;
    let mut cap = capacity;
    while over(cap) {
        match cap.checked_mul(2) {
            Some(next) => cap = next,
            None => break,
        }
    }
    cap
}

impl<K: fmt::Debug, V: fmt::Debug, H> fmt::Debug for ChainedHashMap<K, V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedHashMap")
            .field("len", &self.chains.len())
            .field("capacity", &self.chains.capacity())
            .field("load_factor", &self.load_factor)
            .field("slots", &self.chains)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::hash::Hasher;

    fn identity(k: &u64) -> u64 {
        *k
    }

    #[test]
    fn grown_capacity_doubles_only_when_needed() {
        assert_eq!(grown_capacity(2, 4, 0.5), 4);
        assert_eq!(grown_capacity(3, 4, 0.5), 8);
        // One doubling is not enough for a tiny capacity x load factor.
        assert_eq!(grown_capacity(1, 1, 0.1), 16);
        assert_eq!(grown_capacity(usize::MAX, usize::MAX / 2 + 1, 0.1), usize::MAX / 2 + 1);
    }

    /// Invariant: the third insert into capacity 4 at load factor 0.5 doubles
    /// the table, and every key is still found afterwards.
    #[test]
    fn growth_scenario_from_four_to_eight() {
        let mut m: ChainedHashMap<String, i32> = ChainedHashMap::with_capacity_and_load_factor(4, 0.5);
        m.insert("a".to_string(), 1);
        assert_eq!((m.len(), m.capacity()), (1, 4));
        m.insert("b".to_string(), 2);
        assert_eq!((m.len(), m.capacity()), (2, 4));
        m.insert("c".to_string(), 3);
        assert_eq!((m.len(), m.capacity()), (3, 8));
        assert_eq!(m.find("a"), Some(&1));
        assert_eq!(m.find("b"), Some(&2));
        assert_eq!(m.find("c"), Some(&3));
        m.chains().check_invariants();
    }

    /// Invariant: re-inserting a key replaces the value in place, returns the
    /// old one, and leaves len and capacity alone.
    #[test]
    fn overwrite_keeps_single_entry() {
        let mut m: ChainedHashMap<String, i32> = ChainedHashMap::with_capacity_and_load_factor(4, 0.5);
        assert_eq!(m.insert("x".to_string(), 10), None);
        assert_eq!(m.insert("x".to_string(), 20), Some(10));
        assert_eq!(m.len(), 1);
        assert_eq!(m.capacity(), 4);
        assert_eq!(m.find("x"), Some(&20));
    }

    /// Invariant: overwriting in a full chain keeps the chain order.
    #[test]
    fn overwrite_in_chain_preserves_order() {
        let mut m = ChainedHashMap::with_config_and_hasher(Config::new(4, 1.0), identity);
        for k in [1u64, 5, 9] {
            m.insert(k, k * 10);
        }
        m.insert(5, 0);
        assert_eq!(m.chains().chain_keys(1), vec![&1, &5, &9]);
        assert_eq!(m.find(&5), Some(&0));
    }

    #[test]
    fn erase_on_empty_is_noop() {
        let mut m: ChainedHashMap<String, i32> = ChainedHashMap::with_capacity_and_load_factor(4, 0.5);
        assert_eq!(m.erase("z"), None);
        assert_eq!(m.len(), 0);
        assert_eq!(m.capacity(), 4);
    }

    /// Invariant: a second erase of the same key is a no-op and erase never
    /// shrinks the table.
    #[test]
    fn erase_twice_and_no_shrink() {
        let mut m: ChainedHashMap<u64, u64> = ChainedHashMap::with_capacity_and_load_factor(2, 0.5);
        for k in 0..10 {
            m.insert(k, k);
        }
        let cap = m.capacity();
        assert_eq!(m.erase(&3), Some(3));
        assert_eq!(m.erase(&3), None);
        for k in 0..10 {
            m.erase(&k);
        }
        assert!(m.is_empty());
        assert_eq!(m.capacity(), cap);
        m.chains().check_invariants();
    }

    #[test]
    fn bucket_out_of_range_and_empty_are_distinct() {
        let mut m = ChainedHashMap::with_config_and_hasher(Config::new(4, 0.5), identity);
        m.insert(1u64, "one");
        assert_eq!(
            m.bucket(4).unwrap_err(),
            BucketError::OutOfRange {
                index: 4,
                capacity: 4
            }
        );
        assert_eq!(m.bucket(0).unwrap_err(), BucketError::EmptySlot { index: 0 });
        let b = m.bucket(1).unwrap();
        assert_eq!((b.key(), b.value()), (&1, &"one"));
        assert!(b.next().is_none());
    }

    #[test]
    fn bucket_walks_its_chain() {
        let mut m = ChainedHashMap::with_config_and_hasher(Config::new(4, 1.0), identity);
        m.insert(2u64, 'a');
        m.insert(6, 'b');
        m.insert(10, 'c');
        let head = m.bucket(2).unwrap();
        assert_eq!(head.key(), &2);
        let second = head.next().unwrap();
        assert_eq!(second.key(), &6);
        let pairs: Vec<_> = head.chain().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(pairs, vec![(2, 'a'), (6, 'b'), (10, 'c')]);
    }

    #[test]
    fn bucket_mut_and_cloned() {
        let mut m = ChainedHashMap::with_config_and_hasher(Config::new(4, 0.5), identity);
        m.insert(3u64, String::from("v"));
        m.bucket_mut(3).unwrap().value_mut().push('!');
        assert_eq!(m.find(&3).map(String::as_str), Some("v!"));
        assert_eq!(m.bucket_cloned(3), Ok((3, String::from("v!"))));
        assert_eq!(m.bucket_cloned(9), Err(BucketError::OutOfRange { index: 9, capacity: 4 }));
        assert!(matches!(m.bucket_mut(0), Err(BucketError::EmptySlot { index: 0 })));
    }

    #[test]
    fn find_mut_updates_in_place() {
        let mut m: ChainedHashMap<&'static str, i32> = ChainedHashMap::new();
        m.insert("k", 1);
        *m.find_mut(&"k").unwrap() += 4;
        assert_eq!(m.find(&"k"), Some(&5));
        assert!(m.find_mut(&"missing").is_none());
        assert!(m.contains_key(&"k"));
    }

    #[test]
    fn invalid_load_factor_falls_back() {
        let m: ChainedHashMap<u8, u8> = ChainedHashMap::with_capacity_and_load_factor(4, 1.5);
        assert_eq!(m.load_factor(), 0.5);
        let m: ChainedHashMap<u8, u8> = ChainedHashMap::with_capacity_and_load_factor(4, 0.0);
        assert_eq!(m.load_factor(), 0.5);
    }

    #[test]
    fn defaults_and_zero_capacity() {
        let m: ChainedHashMap<u8, u8> = ChainedHashMap::default();
        assert_eq!((m.capacity(), m.load_factor(), m.len()), (100, 0.5, 0));
        let mut m: ChainedHashMap<u8, u8> = ChainedHashMap::with_capacity_and_load_factor(0, 1.0);
        assert_eq!(m.capacity(), 1);
        m.insert(1, 1);
        assert_eq!(m.capacity(), 1);
        m.insert(2, 2);
        assert_eq!(m.capacity(), 2);
    }

    /// Invariant: lookups and removal resolve by equality when every key
    /// lands in one chain.
    #[test]
    fn constant_hasher_collisions() {
        let mut m = ChainedHashMap::with_config_and_hasher(Config::new(8, 1.0), |_: &String| 0u64);
        for (i, k) in ["a", "b", "c", "d"].iter().enumerate() {
            m.insert(k.to_string(), i);
        }
        assert_eq!(m.capacity(), 8);
        assert_eq!(m.find(&"c".to_string()), Some(&2));
        assert_eq!(m.erase(&"b".to_string()), Some(1));
        let keys: Vec<_> = m.bucket(0).unwrap().chain().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec!["a", "c", "d"]);
        m.chains().check_invariants();
    }

    /// Invariant: the user hasher runs once per operation and never during
    /// rehash, since entries keep their computed hash.
    #[test]
    fn rehash_does_not_call_hasher() {
        let calls = Cell::new(0);
        let mut m = ChainedHashMap::with_config_and_hasher(Config::new(1, 1.0), |k: &u64| {
            calls.set(calls.get() + 1);
            *k
        });
        for k in 0..64 {
            m.insert(k, ());
        }
        assert_eq!(m.capacity(), 64);
        assert_eq!(calls.get(), 64);
    }

    #[test]
    fn debug_lists_nonempty_slots() {
        let mut m = ChainedHashMap::with_config_and_hasher(Config::new(4, 1.0), identity);
        m.insert(1u64, 'x');
        let s = format!("{m:?}");
        assert!(s.contains("len: 1"), "{s}");
        assert!(s.contains("1: [(1, 'x')]"), "{s}");
    }

    /// Invariant (debug-only): re-entering the table from `K: Eq` while a
    /// chain is being scanned panics.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_eq_during_find() {
        struct ReentryKey {
            id: u64,
            map: *const ChainedHashMap<ReentryKey, i32, fn(&ReentryKey) -> u64>,
        }
        impl PartialEq for ReentryKey {
            fn eq(&self, other: &Self) -> bool {
                if !other.map.is_null() {
                    // Reach back into the table mid-scan.
                    unsafe {
                        let m = &*other.map;
                        let _ = m.len();
                        let _ = m.contains_key(self);
                    }
                }
                self.id == other.id
            }
        }
        impl Eq for ReentryKey {}

        fn zero(_: &ReentryKey) -> u64 {
            0
        }

        let mut m: ChainedHashMap<ReentryKey, i32, fn(&ReentryKey) -> u64> =
            ChainedHashMap::with_hasher(zero as fn(&ReentryKey) -> u64);
        m.insert(
            ReentryKey {
                id: 1,
                map: core::ptr::null(),
            },
            1,
        );
        let query = ReentryKey {
            id: 2,
            map: &m as *const _,
        };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = m.find(&query);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }

    /// Invariant: a `std` `BuildHasher` can drive the table through
    /// `DefaultKeyHasher`.
    #[test]
    fn std_build_hasher_injection() {
        #[derive(Clone, Default)]
        struct Fnv;
        struct FnvHasher(u64);
        impl std::hash::BuildHasher for Fnv {
            type Hasher = FnvHasher;
            fn build_hasher(&self) -> FnvHasher {
                FnvHasher(0xcbf2_9ce4_8422_2325)
            }
        }
        impl Hasher for FnvHasher {
            fn write(&mut self, bytes: &[u8]) {
                for b in bytes {
                    self.0 = (self.0 ^ u64::from(*b)).wrapping_mul(0x100_0000_01b3);
                }
            }
            fn finish(&self) -> u64 {
                self.0
            }
        }

        let mut m = ChainedHashMap::with_hasher(DefaultKeyHasher::with_build_hasher(Fnv));
        m.insert("k".to_string(), 1);
        assert_eq!(m.find("k"), Some(&1));
        assert_eq!(m.erase("k"), Some(1));
    }
}
