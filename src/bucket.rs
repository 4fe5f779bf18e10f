//! Borrowed views of a slot's head entry, returned by the slot-index
//! accessors on `ChainedHashMap`.
//!
//! These expose internal layout and are meant for diagnostics; look values
//! up by key with `find`. A view borrows the table, so it cannot outlive an
//! `insert` that may rehash or an `erase` that may release its entry.

use crate::chains::{ChainIter, Chains, Entry};
use core::fmt;

/// Shared view of one entry in a chain.
pub struct BucketRef<'a, K, V> {
    chains: &'a Chains<K, V>,
    entry: &'a Entry<K, V>,
}

impl<'a, K, V> BucketRef<'a, K, V> {
    pub(crate) fn new(chains: &'a Chains<K, V>, entry: &'a Entry<K, V>) -> Self {
        Self { chains, entry }
    }

    pub fn key(&self) -> &'a K {
        &self.entry.key
    }

    pub fn value(&self) -> &'a V {
        &self.entry.value
    }

    /// The entry linked after this one in the same chain.
    pub fn next(&self) -> Option<BucketRef<'a, K, V>> {
        let k = self.entry.next?;
        self.chains.entry(k).map(|e| BucketRef::new(self.chains, e))
    }

    /// This entry followed by the rest of its chain.
    pub fn chain(&self) -> Chain<'a, K, V> {
        Chain {
            head: Some(self.entry),
            rest: self.chains.chain_from(self.entry.next),
        }
    }
}

impl<K, V> Clone for BucketRef<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for BucketRef<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BucketRef<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketRef")
            .field("key", &self.entry.key)
            .field("value", &self.entry.value)
            .field("has_next", &self.entry.next.is_some())
            .finish()
    }
}

/// Iterator over `(key, value)` pairs of one chain, head to tail.
pub struct Chain<'a, K, V> {
    head: Option<&'a Entry<K, V>>,
    rest: ChainIter<'a, K, V>,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = match self.head.take() {
            Some(e) => e,
            None => self.rest.next()?,
        };
        Some((&e.key, &e.value))
    }
}

/// Exclusive view of a slot's head entry; the value may be replaced in
/// place, the key may not.
pub struct BucketMut<'a, K, V> {
    entry: &'a mut Entry<K, V>,
}

impl<'a, K, V> BucketMut<'a, K, V> {
    pub(crate) fn new(entry: &'a mut Entry<K, V>) -> Self {
        Self { entry }
    }

    pub fn key(&self) -> &K {
        &self.entry.key
    }

    pub fn value(&self) -> &V {
        &self.entry.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.entry.value
    }

    pub fn into_value_mut(self) -> &'a mut V {
        &mut self.entry.value
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BucketMut<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketMut")
            .field("key", &self.entry.key)
            .field("value", &self.entry.value)
            .finish()
    }
}
