//! # Error Types
//!
//! Purpose: the one genuinely fallible outcome in the store's public API.
//!
//! ## Design Principles
//! 1. **Narrow Surface**: every other null/invalid-argument failure mode
//!    a C-shaped API would need to check is closed off by the type system
//!    instead (owned values, non-null references), so there is exactly one
//!    error type here rather than a broad error hierarchy.
//! 2. **No Unchecked Copies**: `CopyError` exists because safe Rust cannot
//!    perform an unchecked-length `memcpy`; a length mismatch is reported
//!    rather than silently truncated or (unsafely) over-read.

use thiserror::Error;

/// Failure modes for [`crate::profile`]-adjacent bounded-copy reads.
///
/// Returned by the store's `get_copy` operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CopyError {
    /// No live entry exists for the requested key (absent or tombstoned).
    #[error("key not found")]
    NotFound,

    /// The destination buffer's length did not match the stored value's
    /// byte length exactly.
    #[error("destination length {found} does not match value length {expected}")]
    LengthMismatch {
        /// Length of the stored value, in bytes.
        expected: usize,
        /// Length of the caller-supplied destination buffer.
        found: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_stable() {
        assert_eq!(CopyError::NotFound.to_string(), "key not found");
        assert_eq!(
            CopyError::LengthMismatch {
                expected: 4,
                found: 3
            }
            .to_string(),
            "destination length 3 does not match value length 4"
        );
    }
}
