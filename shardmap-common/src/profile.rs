//! # Store Profile
//!
//! Purpose: configuration for a new store — initial/minimum total
//! capacity, shard count, and the load factor that drives auto-rehash.
//!
//! ## Design Principles
//! 1. **Sanitize Once**: nonsense values (zero/negative size, zero
//!    shards, a size that doesn't divide evenly) are clamped exactly once,
//!    at store construction, never on every field write.
//! 2. **Fluent Builder**: `with_*` setters return `Self` so callers can
//!    chain construction without needing a separate "apply" step.

/// Default total capacity across all shards.
pub const DEFAULT_SIZE: usize = 10;
/// Default shard count.
pub const DEFAULT_SHARDS: usize = 2;
/// Default load factor, as a percentage of a shard's bucket-array size.
pub const DEFAULT_LOAD_FACTOR: u32 = 80;

/// Configuration for a new store.
///
/// Values are sanitized exactly once, when a store is constructed from a
/// profile — not on every setter call — so a profile built up through
/// several `with_*` calls and then mutated again is still only ever
/// clamped a single time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    size: usize,
    shards: usize,
    load_factor: u32,
}

impl Default for Profile {
    fn default() -> Self {
        Profile {
            size: DEFAULT_SIZE,
            shards: DEFAULT_SHARDS,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl Profile {
    /// Creates a profile with the default size, shard count, and load
    /// factor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial and minimum total capacity across all shards.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Sets the shard count.
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Sets the load factor (percent of a shard's bucket-array size before
    /// it grows).
    pub fn with_load_factor(mut self, load_factor: u32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Returns the configured total capacity (pre-sanitization).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the configured shard count (pre-sanitization).
    pub fn shards(&self) -> usize {
        self.shards
    }

    /// Returns the configured load factor (pre-sanitization).
    pub fn load_factor(&self) -> u32 {
        self.load_factor
    }

    /// Clamps nonsense values to a sane configuration. Run exactly once,
    /// at store construction, against a copy of the caller's profile.
    ///
    /// Rules:
    /// - `size` becomes at least 1.
    /// - `shards` becomes at least 1.
    /// - `size` becomes at least `shards` (one bucket slot per shard).
    /// - `size` rounds up to the next multiple of `shards`.
    /// - `load_factor` falls back to [`DEFAULT_LOAD_FACTOR`] when
    ///   non-positive.
    #[must_use]
    pub(crate) fn sanitized(mut self) -> Self {
        if self.size == 0 {
            self.size = 1;
        }
        if self.shards == 0 {
            self.shards = 1;
        }
        if self.size < self.shards {
            self.size = self.shards;
        }
        let remainder = self.size % self.shards;
        if remainder != 0 {
            self.size += self.shards - remainder;
        }
        if self.load_factor == 0 {
            self.load_factor = DEFAULT_LOAD_FACTOR;
        }
        self
    }

    /// Returns the per-shard initial bucket-array length implied by this
    /// (already-sanitized) profile.
    pub(crate) fn initial_shard_size(&self) -> usize {
        self.size / self.shards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference() {
        let p = Profile::default();
        assert_eq!(p.size(), 10);
        assert_eq!(p.shards(), 2);
        assert_eq!(p.load_factor(), 80);
        assert_eq!(p.sanitized().initial_shard_size(), 5);
    }

    #[test]
    fn sanitizes_all_zero() {
        let p = Profile::new()
            .with_size(0)
            .with_shards(0)
            .with_load_factor(0)
            .sanitized();
        assert_eq!(p.size(), 1);
        assert_eq!(p.shards(), 1);
        assert_eq!(p.load_factor(), 80);
    }

    #[test]
    fn size_bumped_up_to_shard_count() {
        let p = Profile::new().with_size(1).with_shards(4).sanitized();
        assert_eq!(p.size(), 4);
    }

    #[test]
    fn size_rounded_up_to_even_division() {
        let p = Profile::new().with_size(10).with_shards(4).sanitized();
        assert_eq!(p.size(), 12);
    }

    #[test]
    fn builder_chains() {
        let p = Profile::new()
            .with_size(16)
            .with_shards(4)
            .with_load_factor(80);
        assert_eq!(p.size(), 16);
        assert_eq!(p.shards(), 4);
        assert_eq!(p.load_factor(), 80);
    }
}
