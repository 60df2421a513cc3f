#![cfg(test)]

// Property tests for ConcurrentMap kept inside the crate, next to the
// implementation they check.

use crate::concurrent_map::ConcurrentMap;
use core::hash::BuildHasher;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::HashMap;
use std::hash::Hasher;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Update(usize, i32),
    Bump(usize, i32),
    Get(usize),
    Contains(String),
    Len,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Update(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Bump(i, d)),
            idx.clone().prop_map(OpI::Get),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            Just(OpI::Len),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Drives `sut` and a std HashMap model through the same operations and
// checks every observable result against the model.
fn check_against_model<S>(
    sut: &ConcurrentMap<String, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<String, i32> = HashMap::new();
    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i].clone();
                sut.insert(k.clone(), v);
                model.insert(k, v);
            }
            OpI::Update(i, v) => {
                let k = pool[i].clone();
                match sut.update(k.clone(), v) {
                    Ok(()) => {
                        let slot = model.get_mut(&k);
                        prop_assert!(slot.is_some(), "update must fail on absent key");
                        if let Some(mv) = slot {
                            *mv = v;
                        }
                    }
                    Err(e) => {
                        prop_assert!(!model.contains_key(&k), "error only when key is absent");
                        prop_assert_eq!(e.key(), &k);
                    }
                }
            }
            OpI::Bump(i, d) => {
                let k = &pool[i];
                let res = sut.update_with(k.clone(), |v| *v = v.saturating_add(d));
                match model.get_mut(k) {
                    Some(mv) => {
                        prop_assert!(res.is_ok());
                        *mv = mv.saturating_add(d);
                    }
                    None => prop_assert!(res.is_err()),
                }
            }
            OpI::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.find(k.as_str()), model.get(k).copied());
                match (sut.get(k.clone()), model.get(k)) {
                    (Ok(v), Some(mv)) => prop_assert_eq!(v, *mv),
                    (Err(e), None) => prop_assert_eq!(e.key(), k),
                    (got, want) => {
                        prop_assert!(false, "get mismatch: {:?} vs {:?}", got, want)
                    }
                }
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(s.as_str()), model.contains_key(&s));
            }
            OpI::Len => {
                prop_assert_eq!(sut.len(), model.len());
            }
        }

        // Post-condition after each op: size parity
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - insert always succeeds and overwrites; later gets observe the last write.
// - update/update_with succeed iff the key is present and never create it.
// - get misses carry the requested key; find/contains_key parity with the model.
// - len/is_empty parity with the model after each op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: ConcurrentMap<String, i32> = ConcurrentMap::new();
        check_against_model(&sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut: ConcurrentMap<String, i32, ConstBuildHasher> =
            ConcurrentMap::with_hasher(ConstBuildHasher);
        check_against_model(&sut, &pool, ops)?;
    }
}
