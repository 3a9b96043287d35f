//! Change events delivered to listeners.

/// A structural change to a [`Sequence`](crate::Sequence).
///
/// Events are produced only by sequences configured as observable. Inside a
/// transaction they are buffered and delivered on commit, in mutation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent<T> {
    /// A value was inserted.
    Add(T),
    /// A value was removed.
    Remove(T),
    /// The value at `index` was replaced.
    Update {
        /// Position of the replaced value.
        index: usize,
        /// Value before the write.
        old: T,
        /// Value after the write.
        new: T,
    },
    /// The sequence was emptied. `len` is the length before clearing.
    Clear {
        /// Number of elements removed.
        len: usize,
    },
    /// The order of elements was reversed.
    Reverse,
    /// Another sequence was drained onto the end. `len` is the donor's length.
    Concat {
        /// Number of elements appended.
        len: usize,
    },
    /// The elements were sorted.
    Sort,
    /// A transaction was rolled back.
    Rollback,
}

impl<T> ChangeEvent<T> {
    /// Returns a short name for the event kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
            Self::Update { .. } => "update",
            Self::Clear { .. } => "clear",
            Self::Reverse => "reverse",
            Self::Concat { .. } => "concat",
            Self::Sort => "sort",
            Self::Rollback => "rollback",
        }
    }
}
