//! Stable node handles.
//!
//! A [`Handle`] names one node in a sequence's arena. It pairs the arena
//! slot with the node's insertion sequence number, so a slot that was freed
//! and reused by a later insert never resolves through an old handle.
//!
//! ```
//! use nexus_seq::{Sequence, SequenceError};
//!
//! let mut seq: Sequence<u64> = Sequence::new();
//! let a = seq.push_back(1);
//! seq.push_back(2);
//!
//! assert_eq!(seq.get_by_handle(a), Ok(&1));
//!
//! seq.remove_handle(a).unwrap();
//! assert_eq!(seq.get_by_handle(a), Err(SequenceError::StaleHandle));
//! ```

/// Sentinel slot value for "no link".
///
/// Carried by the outer links of the sentinels and by nodes that were never
/// linked.
pub(crate) const NIL: usize = usize::MAX;

/// Non-owning reference to a node.
///
/// Handles are `Copy` and never keep a node alive. Resolving a handle after
/// its node was removed yields [`SequenceError::StaleHandle`](crate::SequenceError::StaleHandle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    pub(crate) slot: usize,
    pub(crate) seq: u64,
}

impl Handle {
    #[inline]
    pub(crate) const fn new(slot: usize, seq: u64) -> Self {
        Self { slot, seq }
    }

    /// Returns the insertion sequence number of the node.
    ///
    /// Numbers are assigned from a per-sequence monotonic counter when the
    /// node is created.
    #[inline]
    pub const fn seq(&self) -> u64 {
        self.seq
    }
}
