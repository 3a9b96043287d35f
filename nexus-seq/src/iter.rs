//! Iterators over a sequence.
//!
//! - [`Iter`] borrows the sequence, so mutation while it is alive is a
//!   compile error.
//! - [`IntoIter`] consumes the sequence.
//! - [`Traversal`] holds no borrow between steps and detects mutation at run
//!   time through the modification counter.

use std::iter::FusedIterator;

use crate::error::SequenceError;
use crate::handle::Handle;
use crate::sequence::Sequence;
use crate::store::NodeStore;

/// Borrowing iterator, front to back. Double-ended.
pub struct Iter<'a, T> {
    store: &'a NodeStore<T>,
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(store: &'a NodeStore<T>) -> Self {
        Self {
            store,
            front: store.first(),
            back: store.last(),
            remaining: store.len(),
        }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.front;
        self.front = self.store.node(slot).next;
        self.remaining -= 1;
        self.store.value(slot)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.back;
        self.back = self.store.node(slot).prev;
        self.remaining -= 1;
        self.store.value(slot)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// Owning iterator, front to back. Double-ended.
pub struct IntoIter<T> {
    store: NodeStore<T>,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(store: NodeStore<T>) -> Self {
        Self { store }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.store.len() == 0 {
            return None;
        }
        let slot = self.store.first();
        self.store.unlink(slot);
        self.store.free(slot)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.store.len(), Some(self.store.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.store.len() == 0 {
            return None;
        }
        let slot = self.store.last();
        self.store.unlink(slot);
        self.store.free(slot)
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

/// A detached, fail-fast traversal.
///
/// Created by [`Sequence::traverse`]. Each step takes the sequence by
/// reference, so the caller is free to mutate it between steps; the next
/// step then fails with [`SequenceError::ConcurrentModification`].
///
/// ```
/// use nexus_seq::{Sequence, SequenceError};
///
/// let mut seq = Sequence::from_iter([1, 2, 3]);
/// let mut walk = seq.traverse();
///
/// assert_eq!(walk.next(&seq), Ok(Some(&1)));
/// seq.push_back(4);
/// assert!(matches!(
///     walk.next(&seq),
///     Err(SequenceError::ConcurrentModification { .. })
/// ));
/// ```
#[derive(Debug, Clone)]
pub struct Traversal {
    origin: u64,
    next: Handle,
    expected: u64,
}

impl Traversal {
    pub(crate) const fn new(origin: u64, next: Handle, expected: u64) -> Self {
        Self {
            origin,
            next,
            expected,
        }
    }

    /// Modification count captured when the traversal started.
    pub const fn expected_modification_count(&self) -> u64 {
        self.expected
    }

    /// Returns the next element, or `Ok(None)` once past the end.
    ///
    /// # Errors
    ///
    /// - [`SequenceError::ConcurrentModification`] if `seq` was structurally
    ///   modified since the traversal started.
    /// - [`SequenceError::StaleHandle`] if `seq` is not the sequence the
    ///   traversal was created from.
    pub fn next<'a, T>(&mut self, seq: &'a Sequence<T>) -> Result<Option<&'a T>, SequenceError> {
        if seq.id != self.origin {
            return Err(SequenceError::StaleHandle);
        }
        let found = seq.modification_count();
        if found != self.expected {
            return Err(SequenceError::ConcurrentModification {
                expected: self.expected,
                found,
            });
        }

        let store = &seq.store;
        let slot = store.resolve(self.next).ok_or(SequenceError::StaleHandle)?;
        if slot == store.tail() {
            return Ok(None);
        }
        self.next = store.handle(store.node(slot).next);
        Ok(store.value(slot))
    }
}
