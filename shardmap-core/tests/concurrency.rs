use std::sync::{Arc, Barrier};
use std::thread;

use shardmap_common::Profile;
use shardmap_core::Store;

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

#[test]
fn concurrent_set_get_delete_stays_consistent() {
    init_tracing();
    let store = Arc::new(Store::<i64>::new(
        Profile::new().with_size(16).with_shards(4),
    ));
    let threads = 8;
    let iters = 2000;
    let barrier = Arc::new(Barrier::new(threads));
    let mut handles = Vec::new();

    for t in 0..threads {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for i in 0..iters {
                let key = ((i * 17 + t) % 256) as u64;
                store.set(key, (t * 100_000 + i) as i64);
                if let Some(guard) = store.get_ro(key) {
                    let _ = *guard.value();
                }
                if i % 13 == 0 {
                    store.delete(key);
                }
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    // No assertion on exact contents survives concurrent interleaving of
    // overlapping keys across threads; the property under test is that
    // every operation above completes without panicking or deadlocking,
    // and that the store remains usable afterward.
    store.set(9999, 1);
    assert_eq!(*store.get(9999).unwrap().value(), 1);
}

#[test]
fn concurrent_writers_on_disjoint_keys_all_land() {
    let store = Arc::new(Store::<u64>::new(
        Profile::new().with_size(8).with_shards(4),
    ));
    let threads = 6;
    let per_thread = 500;
    let barrier = Arc::new(Barrier::new(threads));
    let mut handles = Vec::new();

    for t in 0..threads {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for i in 0..per_thread {
                let key = (t * per_thread + i) as u64;
                store.set(key, key);
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    for t in 0..threads {
        for i in 0..per_thread {
            let key = (t * per_thread + i) as u64;
            let guard = store.get(key).unwrap_or_else(|| panic!("missing key {key}"));
            assert_eq!(*guard.value(), key);
        }
    }
}

#[test]
fn foreach_guard_contract_releases_before_returning() {
    let store = Store::<i32>::new(Profile::new().with_size(8).with_shards(2));
    for key in 0..50u64 {
        store.set(key, key as i32);
    }

    let mut visited = 0;
    store.foreach(|_key, guard| {
        visited += 1;
        guard.unlock();
    });
    assert_eq!(visited, 50);

    // Every guard handed to the first pass must have been released by the
    // time foreach returns, or a second pass over the same store would
    // deadlock trying to take the same node locks again.
    let mut second_pass = 0;
    store.foreach_ro(|_key, guard| {
        second_pass += 1;
        guard.unlock();
    });
    assert_eq!(second_pass, 50);
}

#[test]
fn foreach_delete_does_not_deadlock_the_shard() {
    // A single shard, so every key below lands in the same bucket array
    // and every `.delete()` call reaches back into the one shard mutex
    // `foreach` is iterating under.
    let store = Store::<i32>::new(Profile::new().with_size(8).with_shards(1));
    for key in 0..40u64 {
        store.set(key, key as i32);
    }

    store.foreach(|key, guard| {
        if key % 3 == 0 {
            guard.delete();
        } else {
            guard.unlock();
        }
    });

    // The shard mutex must have been released after the pass above, or
    // this would hang rather than return.
    for key in 0..40u64 {
        if key % 3 == 0 {
            assert!(store.get(key).is_none());
        } else {
            assert_eq!(*store.get(key).unwrap().value(), key as i32);
        }
    }
}
