//! Error types for sequence operations.
//!
//! Only caller-controlled preconditions and detected misuse are errors.
//! Lenient lookups (`get`, `set`, `remove_at`) report absence through
//! `Option`/`bool` instead.

use thiserror::Error;

/// Errors returned by [`Sequence`](crate::Sequence) and its cursors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    /// Insertion position outside `[0, len]` after resolving negatives.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// The index as passed by the caller.
        index: isize,
        /// Length of the sequence at the time of the call.
        len: usize,
    },
    /// `reduce` without a seed on an empty sequence.
    #[error("reduce of empty sequence with no initial value")]
    EmptyReduce,
    /// `range` called with a zero step.
    #[error("range step must not be zero")]
    InvalidStep,
    /// The sequence was mutated while a traversal was in flight.
    #[error("sequence modified during traversal (expected modification {expected}, found {found})")]
    ConcurrentModification {
        /// Modification count captured when the traversal started.
        expected: u64,
        /// Modification count observed at the failing step.
        found: u64,
    },
    /// A handle or cursor refers to a node that is no longer in the sequence.
    #[error("stale handle: node is no longer in the sequence")]
    StaleHandle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = SequenceError::IndexOutOfBounds { index: -7, len: 3 };
        assert_eq!(err.to_string(), "index -7 out of bounds for length 3");

        let err = SequenceError::ConcurrentModification {
            expected: 4,
            found: 5,
        };
        assert!(err.to_string().contains("expected modification 4"));
        assert_eq!(
            SequenceError::InvalidStep.to_string(),
            "range step must not be zero"
        );
    }
}
