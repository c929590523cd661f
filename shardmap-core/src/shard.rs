//! # Shard
//!
//! Purpose: one independently-locked slice of the store — a mutex
//! guarding a bucket array plus the bookkeeping auto-rehash needs to
//! decide when that array should grow or shrink.
//!
//! ## Design Principles
//! 1. **Node Addresses Survive Resize**: a bucket holds `Arc<Node<V>>`,
//!    so relinking a node into a differently-sized bucket array never
//!    invalidates an `Arc`-cloned guard a caller is still holding.
//! 2. **Count Tracks Live Entries Only**: `n` is adjusted the moment a
//!    node is inserted, resurrected, or tombstoned — never deferred to
//!    the next resize — so it always equals the number of live,
//!    non-tombstoned nodes in the shard. Resize only ever *frees*
//!    tombstones; it never adjusts `n`.
//! 3. **Shrink Never Crosses The Floor**: a shard never shrinks its
//!    bucket array below the size it was given at construction.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::node::Node;

pub(crate) struct ShardInner<V> {
    pub(crate) buckets: Vec<Vec<Arc<Node<V>>>>,
    /// Live (non-tombstoned) node count in this shard.
    pub(crate) count: usize,
}

pub(crate) struct Shard<V> {
    pub(crate) inner: Mutex<ShardInner<V>>,
    load_factor: u32,
    min_buckets: usize,
}

fn bucket_index(key: u64, bucket_count: usize) -> usize {
    (key % bucket_count as u64) as usize
}

fn find_index<V>(bucket: &[Arc<Node<V>>], key: u64) -> Option<usize> {
    bucket.iter().position(|node| node.key == key)
}

impl<V> Shard<V> {
    pub(crate) fn new(initial_buckets: usize, load_factor: u32) -> Self {
        Shard {
            inner: Mutex::new(ShardInner {
                buckets: (0..initial_buckets).map(|_| Vec::new()).collect(),
                count: 0,
            }),
            load_factor,
            min_buckets: initial_buckets.max(1),
        }
    }

    /// Inserts or overwrites `key`. Resurrects a tombstoned node in place
    /// rather than allocating a new one. Does not hand the node back: the
    /// write lock taken here to set `value`/`deleted` is released before
    /// this returns, so nothing outside this call can rely on the entry
    /// still being live by the time it returns.
    pub(crate) fn set(&self, key: u64, value: V) {
        let mut inner = self.inner.lock();
        let len = inner.buckets.len();
        let bidx = bucket_index(key, len);
        if let Some(pos) = find_index(&inner.buckets[bidx], key) {
            let node = Arc::clone(&inner.buckets[bidx][pos]);
            let mut body = node.body.write();
            if body.deleted {
                inner.count += 1;
            }
            body.value = value;
            body.deleted = false;
        } else {
            let node = Node::new(key, value);
            inner.buckets[bidx].push(Arc::clone(&node));
            inner.count += 1;
        }
        self.rehash_if_needed(&mut inner, None);
    }

    /// Finds a live node by key without locking it, so the caller can
    /// acquire the node lock itself (write or read, per the caller's
    /// chosen guard type) after releasing the shard mutex.
    pub(crate) fn find(&self, key: u64) -> Option<Arc<Node<V>>> {
        let inner = self.inner.lock();
        let len = inner.buckets.len();
        let bidx = bucket_index(key, len);
        find_index(&inner.buckets[bidx], key).map(|pos| Arc::clone(&inner.buckets[bidx][pos]))
    }

    /// Tombstones `key` if a live entry for it exists, returning whether
    /// it did. Does not itself take the node's lock for longer than the
    /// flip; physical reclamation happens on the next resize.
    pub(crate) fn delete(&self, key: u64) -> bool {
        let mut inner = self.inner.lock();
        let len = inner.buckets.len();
        let bidx = bucket_index(key, len);
        let found = if let Some(pos) = find_index(&inner.buckets[bidx], key) {
            let mut body = inner.buckets[bidx][pos].body.write();
            if body.deleted {
                false
            } else {
                body.deleted = true;
                inner.count -= 1;
                true
            }
        } else {
            false
        };
        self.rehash_if_needed(&mut inner, None);
        found
    }

    /// Called by [`crate::handle::EntryGuard::delete`] after it has already
    /// flipped the tombstone flag under the node's own write lock, which
    /// the caller still holds when this runs. Decrements the live count
    /// and evaluates auto-rehash exactly as the by-key [`Shard::delete`]
    /// does, but tells the resize sweep which node's lock is already held
    /// by this thread so it never tries to re-acquire it — a second
    /// write-lock attempt on the same node from the same thread would
    /// deadlock outright, since `parking_lot`'s `RwLock` is not reentrant.
    pub(crate) fn note_tombstoned(&self, node: &Arc<Node<V>>) {
        let mut inner = self.inner.lock();
        inner.count -= 1;
        self.rehash_if_needed(&mut inner, Some(node));
    }

    /// Runs `f` over every live node in this shard, skipping tombstones.
    /// `f` receives the node directly so the caller can lock it write or
    /// read, depending on which kind of pass it's running.
    ///
    /// Snapshots the bucket array's `Arc<Node<V>>` handles under the shard
    /// mutex, then releases the mutex before calling `f` on any of them.
    /// `f` is a caller-supplied callback and, per the handle contract, is
    /// allowed to release by deleting — and deleting reaches back into
    /// this same shard's mutex via `note_tombstoned`. Holding the mutex
    /// across the callback would make that a same-thread re-lock of a
    /// non-reentrant `parking_lot::Mutex`, an unconditional deadlock.
    /// Releasing first costs the "stable bucket array for the whole
    /// iteration" guarantee resize otherwise gets from holding the mutex
    /// throughout, but every node visited is kept alive by the `Arc` clone
    /// in `nodes` regardless of what a concurrent resize does to the
    /// shard's own bucket array.
    pub(crate) fn for_each(&self, mut f: impl FnMut(&Arc<Node<V>>)) {
        let nodes: Vec<Arc<Node<V>>> = {
            let inner = self.inner.lock();
            inner.buckets.iter().flatten().cloned().collect()
        };
        for node in &nodes {
            if !node.is_deleted() {
                f(node);
            }
        }
    }

    fn grow_at(&self, bucket_count: usize) -> usize {
        bucket_count * self.load_factor as usize / 100
    }

    fn shrink_at(&self, bucket_count: usize) -> usize {
        self.grow_at(bucket_count) / 5
    }

    /// Grows or shrinks the bucket array in place when `count` has
    /// crossed a threshold, draining and dropping tombstoned nodes along
    /// the way. Must be called with `inner`'s mutex already held.
    ///
    /// `already_locked`, when set, names a node whose write lock the
    /// calling thread currently holds (the node `del` just tombstoned).
    /// The sweep treats it as already drained — known tombstoned, known to
    /// have no other borrower — and frees it without taking its lock
    /// again, since a second write-lock attempt from the same thread on a
    /// non-reentrant lock would deadlock.
    fn rehash_if_needed(&self, inner: &mut ShardInner<V>, already_locked: Option<&Arc<Node<V>>>) {
        let current = inner.buckets.len();
        let grow_at = self.grow_at(current);
        let shrink_at = self.shrink_at(current);

        let new_size = if inner.count > grow_at {
            Some(current * 2)
        } else if inner.count < shrink_at && current > self.min_buckets {
            Some((current / 2).max(self.min_buckets))
        } else {
            None
        };

        let Some(new_size) = new_size else {
            return;
        };
        if new_size == current {
            return;
        }

        debug!(
            old_buckets = current,
            new_buckets = new_size,
            count = inner.count,
            "shard auto-rehash"
        );

        let mut new_buckets: Vec<Vec<Arc<Node<V>>>> = (0..new_size).map(|_| Vec::new()).collect();
        for bucket in inner.buckets.drain(..) {
            for node in bucket {
                if already_locked.is_some_and(|held| Arc::ptr_eq(held, &node)) {
                    // Already known tombstoned and lock-drained by the
                    // caller; skip straight to freeing it.
                    continue;
                }
                // Drain any in-flight borrower before deciding the node's
                // fate; the shard mutex we hold blocks new borrowers from
                // appearing while we do.
                node.drain();
                if node.is_deleted() {
                    continue;
                }
                let bidx = bucket_index(node.key, new_size);
                new_buckets[bidx].push(node);
            }
        }
        inner.buckets = new_buckets;
    }
}
