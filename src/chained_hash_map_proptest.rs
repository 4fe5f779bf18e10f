#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can
// cross-check the private chain structure after every operation.

use crate::chained_hash_map::ChainedHashMap;
use crate::config::Config;
use crate::error::BucketError;
use crate::hasher::KeyHasher;
use proptest::prelude::*;
use std::collections::HashMap;
use std::fmt;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations: indices shrink to earlier keys, the pool shrinks,
// and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Erase(usize),
    Find(usize),
    Mutate(usize, i32),
    Contains(String),
    Bucket(usize),
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            1 => idx.clone().prop_map(Op::Erase),
            1 => idx.clone().prop_map(Op::Find),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => "[a-z]{0,5}".prop_map(Op::Contains),
            1 => (0usize..300).prop_map(Op::Bucket),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn arb_config() -> impl Strategy<Value = Config> {
    (0usize..16, prop_oneof![0.05f64..=1.0, Just(1.0), -1.0f64..3.0])
        .prop_map(|(cap, lf)| Config::new(cap, lf))
}

// Runs one scenario against std's HashMap as the model.
// Invariants checked after every op:
// - `len` parity with the model; every model key is found with its value.
// - `len / capacity <= load_factor` after inserts.
// - Capacity never shrinks, only changes on an insert of a new key, and
//   only by a power-of-two factor.
// - Chains are well formed: each entry in the chain its hash selects, heads
//   and tails agree, no orphaned entries.
// - `bucket` reports OutOfRange exactly for index >= capacity.
fn run<H>(
    mut sut: ChainedHashMap<Key, i32, H>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError>
where
    H: KeyHasher<Key> + KeyHasher<str>,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    let lf = sut.load_factor();
    prop_assert!(lf > 0.0 && lf <= 1.0);

    for op in ops {
        let cap_before = sut.capacity();
        let mut grew_allowed = false;
        match op {
            Op::Insert(i, v) => {
                let k = key_from(pool, i);
                let prev = sut.insert(k.clone(), v);
                let model_prev = model.insert(k, v);
                grew_allowed = model_prev.is_none();
                prop_assert_eq!(prev, model_prev);
            }
            Op::Erase(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.erase(&k), model.remove(&k));
                // Erasing again is a no-op.
                prop_assert_eq!(sut.erase(k.0.as_str()), None);
            }
            Op::Find(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.find(&k), model.get(&k));
            }
            Op::Mutate(i, d) => {
                let k = key_from(pool, i);
                match (sut.find_mut(&k), model.get_mut(&k)) {
                    (Some(s), Some(m)) => {
                        *s = s.saturating_add(d);
                        *m = m.saturating_add(d);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "find_mut mismatch: {:?} vs {:?}", s, m),
                }
            }
            Op::Contains(s) => {
                let has_model = model.contains_key(s.as_str());
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            Op::Bucket(index) => match sut.bucket(index) {
                Ok(b) => {
                    prop_assert!(index < sut.capacity());
                    prop_assert_eq!(model.get(b.key()), Some(b.value()));
                    for (k, v) in b.chain() {
                        prop_assert_eq!(model.get(k), Some(v));
                    }
                }
                Err(BucketError::OutOfRange { index: i, capacity }) => {
                    prop_assert_eq!(i, index);
                    prop_assert_eq!(capacity, sut.capacity());
                    prop_assert!(index >= capacity);
                }
                Err(BucketError::EmptySlot { index: i }) => {
                    prop_assert_eq!(i, index);
                    prop_assert!(index < sut.capacity());
                }
            },
        }

        // Post-conditions after each op
        let cap = sut.capacity();
        if grew_allowed {
            prop_assert!(cap >= cap_before);
            prop_assert_eq!(cap % cap_before, 0);
            prop_assert!((cap / cap_before).is_power_of_two());
        } else {
            prop_assert_eq!(cap, cap_before, "capacity changed without a new key");
        }
        prop_assert!(sut.len() as f64 / cap as f64 <= lf);
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        for (k, v) in &model {
            prop_assert_eq!(sut.find(k), Some(v));
        }
        sut.chains().check_invariants();
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap with
// the default hasher and random construction options.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(config in arb_config(), (pool, ops) in arb_scenario()) {
        let sut: ChainedHashMap<Key, i32> = ChainedHashMap::with_config(config);
        run(sut, &pool, ops)?;
    }
}

// Constant hasher: every key lands in one chain, so equality alone resolves
// lookups and growth never changes which chain an entry is in.
#[derive(Clone, Copy, Default)]
struct ConstHasher;
impl KeyHasher<Key> for ConstHasher {
    fn hash_key(&self, _: &Key) -> u64 {
        0
    }
}
impl KeyHasher<str> for ConstHasher {
    fn hash_key(&self, _: &str) -> u64 {
        0
    }
}

// Property: same invariants under worst-case collisions.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions(config in arb_config(), (pool, ops) in arb_scenario()) {
        let sut = ChainedHashMap::with_config_and_hasher(config, ConstHasher);
        run(sut, &pool, ops)?;
    }
}

// Length-only hasher: few distinct hashes, so chains are long but spread
// over several slots and growth moves entries between them.
#[derive(Clone, Copy, Default)]
struct LenHasher;
impl KeyHasher<Key> for LenHasher {
    fn hash_key(&self, k: &Key) -> u64 {
        k.0.len() as u64
    }
}
impl KeyHasher<str> for LenHasher {
    fn hash_key(&self, k: &str) -> u64 {
        k.len() as u64
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_clustered_hashes(config in arb_config(), (pool, ops) in arb_scenario()) {
        let sut = ChainedHashMap::with_config_and_hasher(config, LenHasher);
        run(sut, &pool, ops)?;
    }
}
