//! # Entry Guards
//!
//! Purpose: a value the caller holds between finding an entry and
//! releasing it, during which no other thread can observe a half-written
//! value.
//!
//! ## Design Principles
//! 1. **Owned, Not Borrowed**: a guard owns an `Arc`-cloned lock guard
//!    rather than borrowing `&Store`, so it has no lifetime tied to the
//!    store at all — it can be held, moved, and dropped independently.
//! 2. **Write Implies Delete, Read Cannot**: only [`EntryGuard`] exposes
//!    `delete`; [`EntryGuardRo`] has no way to reach the tombstone flag.
//!    The two-guard split makes "`del` requires a write lock" a property
//!    the compiler checks rather than a documented caller obligation.
//! 3. **Explicit Release Or Drop**: `unlock` exists for callers who want
//!    to name the release point explicitly; letting the guard simply drop
//!    has the same effect.

use std::sync::Arc;

use parking_lot::{ArcRwLockReadGuard, ArcRwLockWriteGuard};

use crate::node::{Node, NodeBody};
use crate::shard::Shard;

/// A write-locked handle on a live entry, returned by [`crate::Store::set`]
/// and [`crate::Store::get`].
///
/// Dropping the guard (or calling [`EntryGuard::unlock`]) releases the
/// node's lock. Calling [`EntryGuard::delete`] instead tombstones the
/// entry before releasing it; the physical slot is reclaimed on the next
/// resize of its shard.
pub struct EntryGuard<V: 'static> {
    key: u64,
    node: Arc<Node<V>>,
    shard: Arc<Shard<V>>,
    guard: ArcRwLockWriteGuard<NodeBody<V>>,
}

impl<V> EntryGuard<V> {
    pub(crate) fn new(
        key: u64,
        node: Arc<Node<V>>,
        shard: Arc<Shard<V>>,
        guard: ArcRwLockWriteGuard<NodeBody<V>>,
    ) -> Self {
        EntryGuard {
            key,
            node,
            shard,
            guard,
        }
    }

    /// The key this guard was returned for.
    pub fn key(&self) -> u64 {
        self.key
    }

    /// Borrows the stored value.
    pub fn value(&self) -> &V {
        &self.guard.value
    }

    /// Mutably borrows the stored value.
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.guard.value
    }

    /// Releases the lock without changing the entry. Equivalent to
    /// dropping the guard; kept as a named call for symmetry with
    /// [`EntryGuard::delete`].
    pub fn unlock(self) {}

    /// Tombstones the entry and releases the lock. The entry is no
    /// longer visible to `get`/`get_ro`/`get_copy`/`foreach`. This also
    /// decrements the owning shard's live count and evaluates auto-rehash
    /// while this guard's node lock is still held (node lock first, then
    /// the shard mutex — the one path in this crate that takes them in
    /// that order); the slot itself is freed the next time its shard
    /// grows or shrinks.
    pub fn delete(mut self) {
        self.guard.deleted = true;
        self.shard.note_tombstoned(&self.node);
    }
}

/// A read-locked handle on a live entry, returned by
/// [`crate::Store::get_ro`].
///
/// Multiple `EntryGuardRo`s for distinct entries (or, within `parking_lot`'s
/// reader-writer semantics, for the same entry) can coexist; none of them
/// can reach the tombstone flag.
pub struct EntryGuardRo<V: 'static> {
    key: u64,
    guard: ArcRwLockReadGuard<NodeBody<V>>,
}

impl<V> EntryGuardRo<V> {
    pub(crate) fn new(key: u64, guard: ArcRwLockReadGuard<NodeBody<V>>) -> Self {
        EntryGuardRo { key, guard }
    }

    /// The key this guard was returned for.
    pub fn key(&self) -> u64 {
        self.key
    }

    /// Borrows the stored value.
    pub fn value(&self) -> &V {
        &self.guard.value
    }

    /// Releases the lock. Equivalent to dropping the guard.
    pub fn unlock(self) {}
}
