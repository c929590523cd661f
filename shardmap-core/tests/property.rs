use std::collections::HashMap;
use std::sync::Mutex;

use proptest::prelude::*;
use shardmap_common::Profile;
use shardmap_core::Store;

#[derive(Clone, Debug)]
enum Op {
    Set(u64, i64),
    Delete(u64),
    Get(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..64, any::<i64>()).prop_map(|(k, v)| Op::Set(k, v)),
        (0u64..64).prop_map(Op::Delete),
        (0u64..64).prop_map(Op::Get),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, ..ProptestConfig::default() })]

    /// Replays a random operation sequence against both `Store` and a
    /// ground-truth `Mutex<HashMap<u64, i64>>`, asserting the two agree
    /// after every step. Exercises auto-rehash incidentally: with a small
    /// profile and up to 64 distinct keys, both growth and shrink
    /// thresholds get crossed during a typical run.
    #[test]
    fn matches_reference_hash_map(ops in prop::collection::vec(op_strategy(), 1..500)) {
        let store = Store::<i64>::new(Profile::new().with_size(4).with_shards(2));
        let model: Mutex<HashMap<u64, i64>> = Mutex::new(HashMap::new());

        for op in ops {
            match op {
                Op::Set(key, value) => {
                    store.set(key, value);
                    model.lock().unwrap().insert(key, value);
                }
                Op::Delete(key) => {
                    let expected = model.lock().unwrap().remove(&key).is_some();
                    let actual = store.delete(key);
                    prop_assert_eq!(actual, expected);
                }
                Op::Get(key) => {
                    let expected = model.lock().unwrap().get(&key).copied();
                    let actual = store.get(key).map(|g| *g.value());
                    prop_assert_eq!(actual, expected);
                }
            }
        }

        let model = model.lock().unwrap();
        for (&key, &value) in model.iter() {
            let guard = store.get(key);
            prop_assert_eq!(guard.map(|g| *g.value()), Some(value));
        }
    }
}

#[test]
fn resize_stress_preserves_all_live_entries() {
    let _ = tracing_subscriber::fmt::try_init();
    let store = Store::<u64>::new(Profile::new().with_size(2).with_shards(2));

    for key in 0..1000u64 {
        store.set(key, key * 2);
    }
    for key in (0..1000u64).step_by(3) {
        store.delete(key);
    }
    for key in 0..1000u64 {
        if key % 3 == 0 {
            assert!(store.get(key).is_none(), "key {key} should be deleted");
        } else {
            let guard = store.get(key).unwrap_or_else(|| panic!("missing key {key}"));
            assert_eq!(*guard.value(), key * 2);
        }
    }
}
