//! Key hashing seam: the table only ever sees `&K -> u64`.

use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// Maps a key to an opaque `u64`.
///
/// Must be deterministic for equal keys. Uniformity is not required; a poor
/// distribution only lengthens chains.
pub trait KeyHasher<K: ?Sized> {
    fn hash_key(&self, key: &K) -> u64;
}

impl<K: ?Sized, F> KeyHasher<K> for F
where
    F: Fn(&K) -> u64,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        self(key)
    }
}

/// Hashes any `K: Hash` through a `BuildHasher`.
#[derive(Clone, Debug, Default)]
pub struct DefaultKeyHasher<S = DefaultHashBuilder> {
    build: S,
}

impl<S> DefaultKeyHasher<S> {
    pub fn with_build_hasher(build: S) -> Self {
        Self { build }
    }
}

impl<K, S> KeyHasher<K> for DefaultKeyHasher<S>
where
    K: ?Sized + Hash,
    S: BuildHasher,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        self.build.hash_one(key)
    }
}
