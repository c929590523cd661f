//! # Store
//!
//! Purpose: the public, sharded, concurrent map. Routes each key to one
//! shard by `key % shard_count`, then delegates lookup/insert/delete to
//! that shard while holding only its mutex — two threads touching
//! different shards never block each other.
//!
//! ## Design Principles
//! 1. **Borrow, Then Act**: `get`/`get_ro` hand back a guard rather than
//!    a value, so a caller who wants to mutate or delete in response to
//!    what they read never has to re-look-up the key or race a concurrent
//!    writer between the read and the write.
//! 2. **No Lifetime On Guards**: because node locks live in their own
//!    `Arc`s, guards own everything they need and don't borrow `&Store`;
//!    a guard can be passed to another thread or stored past the call
//!    that produced it.
//! 3. **Resize Is an Implementation Detail**: callers never see or
//!    trigger it directly; it runs, synchronously, inside `set` and
//!    `delete` while the affected shard's mutex is already held.

use std::sync::Arc;

use parking_lot::RwLock;
use shardmap_common::{CopyError, Profile};

use crate::handle::{EntryGuard, EntryGuardRo};
use crate::node::Node;
use crate::shard::Shard;

/// A sharded, concurrent map keyed by `u64`.
///
/// Cloning a value in and back out is the only copy this type performs
/// on your behalf; everything else is handed back through a lock-holding
/// guard so the caller decides when the copy (if any) happens.
pub struct Store<V: 'static> {
    profile: Profile,
    shards: Vec<Arc<Shard<V>>>,
}

impl<V> Store<V> {
    /// Builds a store from a [`Profile`]. The profile is sanitized before
    /// use; see [`Profile::sanitized`] for the exact rules.
    pub fn new(profile: Profile) -> Self {
        let profile = profile.sanitized();
        let shard_count = profile.shards();
        let per_shard = profile.initial_shard_size();
        let shards = (0..shard_count)
            .map(|_| Arc::new(Shard::new(per_shard.max(1), profile.load_factor())))
            .collect();
        Store { profile, shards }
    }

    /// Returns the sanitized profile this store was built from.
    pub fn profile(&self) -> Profile {
        self.profile
    }

    fn shard_for(&self, key: u64) -> &Arc<Shard<V>> {
        let idx = (key % self.shards.len() as u64) as usize;
        &self.shards[idx]
    }

    /// Inserts `value` under `key`, overwriting and resurrecting a
    /// tombstoned entry in place if one exists. May trigger an in-place
    /// grow of the owning shard.
    ///
    /// Does not hand back a guard: `Shard::set` already locks the node to
    /// write `value`/`deleted` and releases that lock before returning, so
    /// a second lock taken here to build a guard would leave a window in
    /// which a concurrent `delete` on the same key could tombstone the
    /// node — and decrement the shard's live count — before the caller
    /// ever saw it. A caller that wants to act on the value it just set
    /// should look it up again with [`Store::get`].
    pub fn set(&self, key: u64, value: V) {
        let shard = self.shard_for(key);
        shard.set(key, value);
    }

    /// Looks up `key` and, if a live entry exists, returns a write guard
    /// on it. May trigger an in-place shrink of the owning shard if a
    /// prior `delete` pushed it under its threshold.
    pub fn get(&self, key: u64) -> Option<EntryGuard<V>> {
        let shard = self.shard_for(key);
        let node = shard.find(key)?;
        let guard = write_arc(&node);
        if guard.deleted {
            return None;
        }
        Some(EntryGuard::new(key, node, Arc::clone(shard), guard))
    }

    /// Identical to [`Store::get`] except the entry is read-locked:
    /// multiple readers may hold a guard for the same entry at once, but
    /// none of them can delete it.
    pub fn get_ro(&self, key: u64) -> Option<EntryGuardRo<V>> {
        let shard = self.shard_for(key);
        let node = shard.find(key)?;
        let guard = read_arc(&node);
        if guard.deleted {
            return None;
        }
        Some(EntryGuardRo::new(key, guard))
    }

    /// Tombstones `key`, returning whether a live entry existed. The
    /// entry's slot is reclaimed the next time its shard resizes.
    pub fn delete(&self, key: u64) -> bool {
        let shard = self.shard_for(key);
        shard.delete(key)
    }

    /// Runs `f` over every live entry, shard by shard, passing each one's
    /// key alongside its write guard. `f` is responsible for releasing (or
    /// deleting) the guard it's given — taking the guard by value makes
    /// forgetting to do so a compile error, not a runtime contract.
    pub fn foreach(&self, mut f: impl FnMut(u64, EntryGuard<V>)) {
        for shard in &self.shards {
            shard.for_each(|node| {
                let guard = write_arc(node);
                if !guard.deleted {
                    f(
                        node.key,
                        EntryGuard::new(node.key, Arc::clone(node), Arc::clone(shard), guard),
                    );
                }
            });
        }
    }

    /// Identical to [`Store::foreach`] except each entry is read-locked.
    pub fn foreach_ro(&self, mut f: impl FnMut(u64, EntryGuardRo<V>)) {
        for shard in &self.shards {
            shard.for_each(|node| {
                let guard = read_arc(node);
                if !guard.deleted {
                    f(node.key, EntryGuardRo::new(node.key, guard));
                }
            });
        }
    }

    /// Consumes the store, calling `f` once for each still-live value
    /// before dropping the rest. A store with no cleanup to run can
    /// simply be dropped instead.
    ///
    /// A node whose lock is still held by a leaked guard elsewhere is
    /// skipped rather than awaited, since consuming `self` guarantees no
    /// *well-behaved* caller still has a live reference into the store.
    pub fn into_values_with(self, mut f: impl FnMut(u64, V)) {
        for shard in &self.shards {
            let buckets = {
                let mut inner = shard.inner.lock();
                std::mem::take(&mut inner.buckets)
            };
            for bucket in buckets {
                for node in bucket {
                    let key = node.key;
                    let Ok(node) = Arc::try_unwrap(node) else {
                        continue;
                    };
                    let Ok(body) = Arc::try_unwrap(node.body) else {
                        continue;
                    };
                    let body = body.into_inner();
                    if !body.deleted {
                        f(key, body.value);
                    }
                }
            }
        }
    }

    /// Copies the value stored under `key` into `dst`, requiring `dst`'s
    /// length to exactly match the stored value's serialized length.
    ///
    /// Safe Rust has no unchecked-length `memcpy`, so this operation
    /// requires the caller to know (and match) the value's exact byte
    /// length, reporting [`CopyError::LengthMismatch`] otherwise.
    pub fn get_copy(&self, key: u64, dst: &mut [u8]) -> Result<(), CopyError>
    where
        V: AsRef<[u8]>,
    {
        let guard = self.get_ro(key).ok_or(CopyError::NotFound)?;
        let bytes = guard.value().as_ref();
        if bytes.len() != dst.len() {
            return Err(CopyError::LengthMismatch {
                expected: bytes.len(),
                found: dst.len(),
            });
        }
        dst.copy_from_slice(bytes);
        Ok(())
    }
}

impl<V> Default for Store<V> {
    fn default() -> Self {
        Store::new(Profile::default())
    }
}

fn write_arc<V>(node: &Arc<Node<V>>) -> parking_lot::ArcRwLockWriteGuard<crate::node::NodeBody<V>> {
    RwLock::write_arc(&node.body)
}

fn read_arc<V>(node: &Arc<Node<V>>) -> parking_lot::ArcRwLockReadGuard<crate::node::NodeBody<V>> {
    RwLock::read_arc(&node.body)
}
