//! chained-hashmap: a separate-chaining hash table with load-factor driven
//! growth and an injectable key hasher.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: key -> value lookup in amortized O(1) that never loses or
//!   duplicates an entry while the slot array is resized.
//! - Layers:
//!   - `Chains<K, V>`: structural layer. Entries live in a generational
//!     `SlotMap` arena and are linked into per-slot singly linked chains
//!     by handle; each slot keeps head and tail so appends are O(1).
//!   - `ChainedHashMap<K, V, H>`: public API. Hashes keys through the
//!     injected `KeyHasher`, enforces key uniqueness, and decides when to
//!     grow.
//!
//! Constraints
//! - Single-threaded: the table is `!Sync`.
//! - Every key appears at most once; inserting an existing key replaces
//!   its value in place.
//! - An entry always sits in chain `hash(key) % capacity()`.
//! - After any insert, `len() / capacity() <= load_factor()`.
//! - The load factor is in (0.0, 1.0]; anything else falls back to 0.5.
//!
//! Growth
//! - Only `insert` of a new key can grow the table. Capacity doubles
//!   (as many times as needed for the bound to hold) and every entry is
//!   relinked into the new slot array. Old slots are drained in order, each
//!   chain head to tail, and entries are appended to the tail of their new
//!   chain, so entries that share a destination keep their relative order.
//! - Erase never shrinks.
//! - The new slot array is allocated before any entry moves. Allocation
//!   failure aborts, as with every Rust collection; up to that point the
//!   old layout is intact.
//!
//! Hasher and rehashing invariants
//! - Each entry stores the `u64` its key hashed to and rehashing reuses it;
//!   the user hasher runs once per insert/find/erase and never during
//!   growth.
//! - Keys borrowed as `Q` (e.g. `str` for `String`) must hash the same
//!   under `KeyHasher<Q>` as the owned key does under `KeyHasher<K>`.
//!   `DefaultKeyHasher` satisfies this through `Hash`/`Borrow`.
//!
//! Reentrancy policy
//! - Public methods that call user code (`KeyHasher`, `K: Eq`) hold a
//!   debug-only reentrancy guard. Reaching back into the table from those
//!   callbacks panics in debug builds.
//!
//! Non-goals
//! - No iteration beyond slot-index access (`bucket`) and walking that
//!   slot's chain.
//! - No shrinking, custom allocators, persistence or concurrent access.
//!
//! ```
//! use chained_hashmap::ChainedHashMap;
//!
//! let mut m = ChainedHashMap::with_capacity_and_load_factor(4, 0.5);
//! m.insert("a".to_string(), 1);
//! m.insert("b".to_string(), 2);
//! m.insert("c".to_string(), 3);
//! assert_eq!(m.capacity(), 8);
//! assert_eq!(m.find("b"), Some(&2));
//! ```

mod bucket;
mod chained_hash_map;
mod chained_hash_map_proptest;
mod chains;
pub mod config;
mod error;
pub mod hasher;
mod reentrancy;

// Public surface
pub use bucket::{BucketMut, BucketRef, Chain};
pub use chained_hash_map::ChainedHashMap;
pub use config::Config;
pub use error::BucketError;
pub use hasher::{DefaultKeyHasher, KeyHasher};
