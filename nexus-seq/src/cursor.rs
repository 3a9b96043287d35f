//! Detached cursor over a sequence.
//!
//! A [`Cursor`] is a position: a handle to the current node, its logical
//! index, and a direction. It holds no borrow, so it can be kept across
//! mutations and re-seeked with [`reset`](Cursor::reset). Every method takes
//! the sequence it walks.
//!
//! Stepping past either end parks the cursor on a boundary; it is then
//! [invalid](Cursor::is_valid) and stepping further outward keeps it there.
//!
//! # Hazard
//!
//! Cursors do not watch the modification counter. If the node under the
//! cursor is removed, later operations report
//! [`SequenceError::StaleHandle`]. If nodes *around* the cursor are
//! inserted or removed, the cursor keeps walking the current chain but its
//! logical index no longer matches the element's position. A
//! [`reverse`](Sequence::reverse) flips the chain under the cursor: it keeps
//! its node, so its index is the old position until it next reaches a
//! boundary. Stepping off a boundary always re-synchronizes the index.
//!
//! ```
//! use nexus_seq::Sequence;
//!
//! let seq = Sequence::from_iter(["a", "b", "c"]);
//! let mut cursor = seq.cursor();
//!
//! cursor.move_next(&seq).unwrap();
//! assert_eq!(cursor.current(&seq), Some(&"a"));
//!
//! let rest: Vec<_> = cursor.values(&seq).copied().collect();
//! assert_eq!(rest, vec!["a", "b", "c"]);
//! assert!(!cursor.is_valid(&seq));
//! ```

use crate::error::SequenceError;
use crate::handle::{Handle, NIL};
use crate::sequence::Sequence;

/// Direction a cursor steps in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Head to tail.
    Forward,
    /// Tail to head.
    Backward,
}

impl Direction {
    /// Change in logical index per step: `1` or `-1`.
    #[inline]
    pub const fn step(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }

    /// Returns the opposite direction.
    #[inline]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// A re-seekable position in a [`Sequence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    current: Option<Handle>,
    index: isize,
    direction: Direction,
}

impl Cursor {
    /// Creates an unpositioned cursor.
    pub const fn new(direction: Direction) -> Self {
        Self {
            current: None,
            index: -1,
            direction,
        }
    }

    /// Returns the direction.
    #[inline]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Changes the direction of future steps without moving.
    #[inline]
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Returns the logical index.
    ///
    /// On a boundary this is `-1` or `len`.
    #[inline]
    pub const fn index(&self) -> isize {
        self.index
    }

    /// Returns the handle of the current node, if positioned.
    #[inline]
    pub const fn handle(&self) -> Option<Handle> {
        self.current
    }

    /// Returns `true` once the cursor has been positioned.
    #[inline]
    pub const fn is_positioned(&self) -> bool {
        self.current.is_some()
    }

    /// Returns `true` if the cursor sits on a live element.
    pub fn is_valid<T>(&self, seq: &Sequence<T>) -> bool {
        self.current
            .and_then(|handle| seq.store.resolve(handle))
            .is_some_and(|slot| !seq.store.is_sentinel(slot))
    }

    /// Returns the current element, or `None` when invalid.
    pub fn current<'a, T>(&self, seq: &'a Sequence<T>) -> Option<&'a T> {
        let slot = seq.store.resolve(self.current?)?;
        seq.store.value(slot)
    }

    /// Returns the element one step ahead without moving.
    pub fn peek_next<'a, T>(&self, seq: &'a Sequence<T>) -> Option<&'a T> {
        let store = &seq.store;
        let slot = match self.current {
            None => self.entry_slot(seq),
            Some(handle) => {
                let node = store.node(store.resolve(handle)?);
                self.neighbor(node.next, node.prev)
            }
        };
        if slot == NIL {
            return None;
        }
        store.value(slot)
    }

    /// Steps once in the cursor's direction.
    ///
    /// An unpositioned cursor lands on the first element in its direction
    /// (on an empty sequence that is already the boundary).
    ///
    /// # Errors
    ///
    /// [`SequenceError::StaleHandle`] if the current node was removed.
    pub fn move_next<T>(&mut self, seq: &Sequence<T>) -> Result<(), SequenceError> {
        let store = &seq.store;
        let Some(handle) = self.current else {
            self.reset(seq, self.direction == Direction::Backward);
            return Ok(());
        };

        let slot = store.resolve(handle).ok_or(SequenceError::StaleHandle)?;
        let node = store.node(slot);
        let next = self.neighbor(node.next, node.prev);
        if next == NIL {
            return Ok(());
        }

        // Sentinels pin the index, so a boundary re-synchronizes it even
        // after the sentinels have traded roles.
        self.index = if next == store.tail() {
            seq.len() as isize
        } else if next == store.head() {
            -1
        } else if slot == store.head() {
            0
        } else if slot == store.tail() {
            seq.len() as isize - 1
        } else {
            self.index + self.direction.step()
        };
        self.current = Some(store.handle(next));
        Ok(())
    }

    /// Moves to the first element, or the last when `to_end` is set.
    ///
    /// Direction is left unchanged.
    pub fn reset<T>(&mut self, seq: &Sequence<T>, to_end: bool) {
        let store = &seq.store;
        let (slot, index) = if to_end {
            (store.last(), seq.len() as isize - 1)
        } else {
            (store.first(), 0)
        };
        self.current = Some(store.handle(slot));
        self.index = index;
    }

    /// Returns a lazy iterator over the values from the current position
    /// onward, in the cursor's direction.
    ///
    /// The iterator moves the cursor. Exhausting it leaves the cursor on a
    /// boundary.
    pub fn values<'c, 'a, T>(&'c mut self, seq: &'a Sequence<T>) -> CursorValues<'c, 'a, T> {
        CursorValues { cursor: self, seq }
    }

    /// Overwrites the current element, returning the old value.
    ///
    /// # Errors
    ///
    /// [`SequenceError::StaleHandle`] if the cursor is not on a live
    /// element.
    pub fn set_current<T: Clone>(
        &self,
        seq: &mut Sequence<T>,
        value: T,
    ) -> Result<T, SequenceError> {
        let handle = self.current.ok_or(SequenceError::StaleHandle)?;
        seq.replace(handle, value)
    }

    /// Removes the current element and steps to its neighbor in the
    /// cursor's direction.
    ///
    /// # Errors
    ///
    /// [`SequenceError::StaleHandle`] if the cursor is not on a live
    /// element.
    pub fn remove_current<T: Clone>(&mut self, seq: &mut Sequence<T>) -> Result<T, SequenceError> {
        let handle = self.current.ok_or(SequenceError::StaleHandle)?;
        let slot = seq.live_slot(handle)?;

        let node = seq.store.node(slot);
        let next = seq.store.handle(self.neighbor(node.next, node.prev));

        let value = seq.remove_handle(handle)?;
        self.current = Some(next);
        if self.direction == Direction::Backward {
            self.index -= 1;
        }
        Ok(value)
    }

    /// Inserts a value immediately after the current element in chain
    /// order. The cursor does not move.
    ///
    /// # Errors
    ///
    /// [`SequenceError::StaleHandle`] if the cursor is not on a live
    /// element.
    pub fn insert_after<T: Clone>(
        &mut self,
        seq: &mut Sequence<T>,
        value: T,
    ) -> Result<Handle, SequenceError> {
        let handle = self.current.ok_or(SequenceError::StaleHandle)?;
        seq.insert_after(handle, value)
    }

    /// Inserts a value immediately before the current element in chain
    /// order. The cursor does not move; its index shifts by one.
    ///
    /// # Errors
    ///
    /// [`SequenceError::StaleHandle`] if the cursor is not on a live
    /// element.
    pub fn insert_before<T: Clone>(
        &mut self,
        seq: &mut Sequence<T>,
        value: T,
    ) -> Result<Handle, SequenceError> {
        let handle = self.current.ok_or(SequenceError::StaleHandle)?;
        let inserted = seq.insert_before(handle, value)?;
        self.index += 1;
        Ok(inserted)
    }

    /// First slot in this direction.
    fn entry_slot<T>(&self, seq: &Sequence<T>) -> usize {
        match self.direction {
            Direction::Forward => seq.store.first(),
            Direction::Backward => seq.store.last(),
        }
    }

    #[inline]
    fn neighbor(&self, next: usize, prev: usize) -> usize {
        match self.direction {
            Direction::Forward => next,
            Direction::Backward => prev,
        }
    }
}

/// Lazy iterator returned by [`Cursor::values`].
pub struct CursorValues<'c, 'a, T> {
    cursor: &'c mut Cursor,
    seq: &'a Sequence<T>,
}

impl<'a, T> Iterator for CursorValues<'_, 'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.cursor.is_positioned() {
            self.cursor.move_next(self.seq).ok()?;
        }
        let value = self.cursor.current(self.seq)?;
        self.cursor.move_next(self.seq).ok()?;
        Some(value)
    }
}
