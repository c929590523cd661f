//! `shardmap-core` is a sharded, concurrent `u64`-keyed map with
//! synchronous in-place auto-rehash: fine-grained per-shard and per-entry
//! locking so unrelated keys stay uncontended, and RAII guards in place of
//! a manually-released handle. See [`Store`] for the public surface.

mod handle;
mod node;
mod shard;
mod store;

pub use handle::{EntryGuard, EntryGuardRo};
pub use shardmap_common::{CopyError, Profile};
pub use store::Store;
