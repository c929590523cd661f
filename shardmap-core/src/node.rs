//! # Node
//!
//! Purpose: one stored entry — an immutable key plus an `Arc`-shared,
//! `RwLock`-guarded body holding the value and the tombstone flag.
//!
//! ## Design Principles
//! 1. **Lock Lives In The Arc**: the body's lock is wrapped in its own
//!    `Arc`, not borrowed from the bucket, so a guard obtained through
//!    `get`/`get_ro` can outlive the shard-mutex critical section that
//!    found it — this is what lets a resize drain outstanding borrowers
//!    by briefly re-acquiring the same lock rather than needing a
//!    reference-counted node to track live handles separately.
//! 2. **Key Outside The Lock**: the key never changes after insertion, so
//!    bucket scans read it without taking the node's lock at all.

use std::sync::Arc;

use parking_lot::RwLock;

/// The part of a node actually protected by its lock: the value and
/// whether the entry has been tombstoned by `del`.
pub(crate) struct NodeBody<V> {
    pub(crate) value: V,
    pub(crate) deleted: bool,
}

/// One entry in a shard's bucket chain.
pub(crate) struct Node<V> {
    pub(crate) key: u64,
    pub(crate) body: Arc<RwLock<NodeBody<V>>>,
}

impl<V> Node<V> {
    pub(crate) fn new(key: u64, value: V) -> Arc<Self> {
        Arc::new(Node {
            key,
            body: Arc::new(RwLock::new(NodeBody {
                value,
                deleted: false,
            })),
        })
    }

    /// Briefly takes and releases the write lock. Used by resize to drain
    /// any outstanding borrower before a tombstoned node is freed or a
    /// live node is re-linked into the new bucket array. The shard mutex
    /// must already be held by the caller so no new borrower can appear.
    pub(crate) fn drain(&self) {
        drop(self.body.write());
    }

    pub(crate) fn is_deleted(&self) -> bool {
        self.body.read().deleted
    }
}
