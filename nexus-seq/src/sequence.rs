//! The sequence container.
//!
//! [`Sequence`] owns the node store, the skip-link index, the listener
//! registry and, while one is open, the transaction journal. Every mutation
//! goes through a handful of primitives (`link_value`, `unlink_value`,
//! `write_value`) that keep four things in step:
//!
//! - the modification counter
//! - skip-index freshness and rebuild thresholds
//! - the undo journal of an open transaction
//! - change events (delivered now, or buffered by the transaction)
//!
//! # Index conventions
//!
//! Positions are `isize`. Negative values count from the end (`-1` is the
//! last element). `insert_at` is strict and returns
//! [`SequenceError::IndexOutOfBounds`]; `get`, `set` and `remove_at` are
//! lenient and report a miss through `Option`/`bool`.
//!
//! # Example
//!
//! ```
//! use nexus_seq::Sequence;
//!
//! let mut seq: Sequence<u64> = Sequence::new();
//! seq.push_back(10);
//! seq.push_back(20);
//! seq.push_front(5);
//! assert_eq!(seq.to_vec(), vec![5, 10, 20]);
//!
//! seq.insert_at(2, 15).unwrap();
//! assert_eq!(seq.to_vec(), vec![5, 10, 15, 20]);
//!
//! assert_eq!(seq.remove_at(-1), Some(20));
//! assert_eq!(seq.to_vec(), vec![5, 10, 15]);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::config::SequenceConfig;
use crate::cursor::{Cursor, Direction};
use crate::error::SequenceError;
use crate::event::ChangeEvent;
use crate::handle::Handle;
use crate::iter::{IntoIter, Iter, Traversal};
use crate::observer::{ListenerError, Observers, Subscription, boxed};
use crate::skip::SkipIndex;
use crate::store::NodeStore;
use crate::transaction::{Journal, Undo};

/// A doubly-linked sequence with array-like operations.
///
/// See the [module docs](self) for index conventions.
pub struct Sequence<T> {
    /// Process-unique; detached traversals check it.
    pub(crate) id: u64,
    pub(crate) store: NodeStore<T>,
    pub(crate) index: SkipIndex,
    pub(crate) mod_count: u64,
    pub(crate) config: SequenceConfig,
    pub(crate) observers: Observers<T>,
    pub(crate) journal: Option<Journal<T>>,
}

fn next_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    NEXT.fetch_add(1, AtomicOrdering::Relaxed)
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Construction and reads - no bounds on T
// =============================================================================

impl<T> Sequence<T> {
    /// Creates an empty sequence with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SequenceConfig::default())
    }

    /// Creates an empty sequence.
    pub fn with_config(config: SequenceConfig) -> Self {
        Self::with_capacity_and_config(0, config)
    }

    /// Creates an empty sequence whose arena holds `capacity` elements
    /// before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_config(capacity, SequenceConfig::default())
    }

    /// Creates an empty sequence with both a capacity hint and a config.
    pub fn with_capacity_and_config(capacity: usize, config: SequenceConfig) -> Self {
        Self {
            id: next_id(),
            store: NodeStore::with_capacity(capacity),
            index: SkipIndex::new(config.has_skip_links()),
            mod_count: 0,
            config,
            observers: Observers::new(),
            journal: None,
        }
    }

    /// Builds a sequence from an iterator.
    ///
    /// No events are emitted; the sequence has no listeners yet.
    pub fn from_iter_with_config<I>(config: SequenceConfig, iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let iter = iter.into_iter();
        let mut seq = Self::with_capacity_and_config(iter.size_hint().0, config);
        for value in iter {
            let slot = seq.store.alloc(value);
            seq.store.link_before(seq.store.tail(), slot);
        }
        seq.index.refresh(&mut seq.store);
        seq
    }

    /// Returns the configuration.
    #[inline]
    pub const fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// Returns the number of elements.
    #[inline]
    pub const fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if there are no elements.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    /// Returns the modification counter.
    ///
    /// The counter increases on every structural mutation and never
    /// decreases, rollbacks included.
    #[inline]
    pub const fn modification_count(&self) -> u64 {
        self.mod_count
    }

    /// Returns `true` while a transaction is open.
    #[inline]
    pub const fn is_in_transaction(&self) -> bool {
        self.journal.is_some()
    }

    /// Returns the number of registered listeners.
    #[inline]
    pub fn listener_count(&self) -> usize {
        self.observers.len()
    }

    /// Resolves a possibly negative position to `[0, len)`.
    #[inline]
    fn resolve_position(&self, index: isize) -> Option<usize> {
        let len = self.len();
        let pos = if index < 0 {
            len.checked_sub(index.unsigned_abs())?
        } else {
            index as usize
        };
        (pos < len).then_some(pos)
    }

    /// Resolves a position and clamps it into `[0, len]`.
    #[inline]
    fn clamp_position(&self, index: isize) -> usize {
        let len = self.len();
        if index < 0 {
            len.saturating_sub(index.unsigned_abs())
        } else {
            (index as usize).min(len)
        }
    }

    /// Resolves a position, steps one past it, and clamps into `[0, len]`.
    #[inline]
    fn clamp_after(&self, index: isize) -> usize {
        let len = self.len();
        if index < 0 {
            // `-1` resolves to `len - 1`; one past it is `len`.
            len.saturating_sub(index.unsigned_abs() - 1)
        } else {
            (index as usize).saturating_add(1).min(len)
        }
    }

    /// Slot of the element at `pos` (`pos < len`).
    #[inline]
    pub(crate) fn slot_at(&self, pos: usize) -> usize {
        self.index.seek(&self.store, pos)
    }

    /// Resolves a handle to the slot of a live element.
    #[inline]
    pub(crate) fn live_slot(&self, handle: Handle) -> Result<usize, SequenceError> {
        self.store
            .resolve(handle)
            .filter(|&slot| !self.store.is_sentinel(slot))
            .ok_or(SequenceError::StaleHandle)
    }

    /// Counts the elements before `slot`.
    fn position_of(&self, slot: usize) -> usize {
        self.store
            .slots()
            .position(|s| s == slot)
            .unwrap_or(self.len())
    }

    /// Returns the first element.
    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.store.value(self.store.first())
    }

    /// Returns the last element.
    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.store.value(self.store.last())
    }

    /// Returns the element at `index`, or `None` when out of range.
    pub fn get(&self, index: isize) -> Option<&T> {
        let pos = self.resolve_position(index)?;
        self.store.value(self.slot_at(pos))
    }

    /// Alias of [`get`](Self::get).
    #[inline]
    pub fn at(&self, index: isize) -> Option<&T> {
        self.get(index)
    }

    /// Returns a handle to the element at `index`.
    pub fn handle_at(&self, index: isize) -> Option<Handle> {
        let pos = self.resolve_position(index)?;
        Some(self.store.handle(self.slot_at(pos)))
    }

    /// Returns the element a handle refers to.
    ///
    /// # Errors
    ///
    /// [`SequenceError::StaleHandle`] if the node was removed.
    pub fn get_by_handle(&self, handle: Handle) -> Result<&T, SequenceError> {
        let slot = self.live_slot(handle)?;
        self.store.value(slot).ok_or(SequenceError::StaleHandle)
    }

    /// Returns an iterator over the elements, front to back.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.store)
    }

    /// Starts a detached traversal.
    ///
    /// Unlike [`iter`](Self::iter), a traversal does not borrow the
    /// sequence between steps. Any structural mutation made in between is
    /// reported at the next step as
    /// [`SequenceError::ConcurrentModification`].
    pub fn traverse(&self) -> Traversal {
        Traversal::new(self.id, self.store.handle(self.store.first()), self.mod_count)
    }

    /// Returns an unpositioned forward cursor.
    ///
    /// The first [`move_next`](Cursor::move_next) lands on the first element.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(Direction::Forward)
    }

    /// Returns a forward cursor positioned on the first element.
    pub fn cursor_front(&self) -> Cursor {
        let mut cursor = Cursor::new(Direction::Forward);
        cursor.reset(self, false);
        cursor
    }

    /// Returns a backward cursor positioned on the last element.
    pub fn cursor_back(&self) -> Cursor {
        let mut cursor = Cursor::new(Direction::Backward);
        cursor.reset(self, true);
        cursor
    }

    // ========================================================================
    // Searching
    // ========================================================================

    /// Returns the position of the first element equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.index_of_by(value, T::eq)
    }

    /// Returns the position of the first element `eq` accepts.
    pub fn index_of_by<F>(&self, value: &T, mut eq: F) -> Option<usize>
    where
        F: FnMut(&T, &T) -> bool,
    {
        self.iter().position(|item| eq(item, value))
    }

    /// Returns the position of the last element equal to `value`.
    pub fn last_index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.last_index_of_by(value, T::eq)
    }

    /// Returns the position of the last element `eq` accepts, scanning from
    /// the back.
    pub fn last_index_of_by<F>(&self, value: &T, mut eq: F) -> Option<usize>
    where
        F: FnMut(&T, &T) -> bool,
    {
        self.iter().rposition(|item| eq(item, value))
    }

    /// Returns `true` if some element equals `value`.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.index_of(value).is_some()
    }

    /// Returns `true` if `eq` accepts some element.
    pub fn contains_by<F>(&self, value: &T, eq: F) -> bool
    where
        F: FnMut(&T, &T) -> bool,
    {
        self.index_of_by(value, eq).is_some()
    }

    /// Returns the first element matching `pred`.
    pub fn find<P>(&self, mut pred: P) -> Option<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.iter().find(|item| pred(item))
    }

    /// Returns the position of the first element matching `pred`.
    pub fn find_index<P>(&self, pred: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.iter().position(pred)
    }

    /// Returns `true` if every element matches `pred` (vacuously for empty).
    pub fn every<P>(&self, pred: P) -> bool
    where
        P: FnMut(&T) -> bool,
    {
        self.iter().all(pred)
    }

    /// Returns `true` if any element matches `pred`.
    pub fn some<P>(&self, pred: P) -> bool
    where
        P: FnMut(&T) -> bool,
    {
        self.iter().any(pred)
    }

    /// Calls `f` on every element, front to back.
    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&T),
    {
        self.iter().for_each(f);
    }

    /// Folds the elements front to back, starting from `init`.
    pub fn fold<B, F>(&self, init: B, f: F) -> B
    where
        F: FnMut(B, &T) -> B,
    {
        self.iter().fold(init, f)
    }

    /// Builds a new sequence from `f` applied to every element.
    ///
    /// The result shares this sequence's configuration but has no
    /// listeners.
    pub fn map<U, F>(&self, f: F) -> Sequence<U>
    where
        F: FnMut(&T) -> U,
    {
        Sequence::from_iter_with_config(self.config, self.iter().map(f))
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Registers a listener for change events.
    ///
    /// Events are only produced when the sequence is
    /// [observable](SequenceConfig::observable).
    pub fn subscribe<F>(&mut self, mut listener: F) -> Subscription
    where
        F: FnMut(&ChangeEvent<T>) + 'static,
    {
        self.observers.subscribe(boxed(move |event: &ChangeEvent<T>| {
            listener(event);
            Ok(())
        }))
    }

    /// Registers a listener that may fail.
    ///
    /// Errors are logged and do not stop delivery to other listeners.
    pub fn try_subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&ChangeEvent<T>) -> Result<(), ListenerError> + 'static,
    {
        self.observers.subscribe(boxed(listener))
    }

    /// Removes a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.observers.unsubscribe(subscription)
    }
}

// =============================================================================
// Mutation - requires T: Clone for events and rollback
// =============================================================================

impl<T: Clone> Sequence<T> {
    #[inline]
    fn touch(&mut self) {
        self.mod_count += 1;
    }

    #[inline]
    fn record(&mut self, undo: Undo<T>) {
        if let Some(journal) = self.journal.as_mut() {
            journal.record(undo);
        }
    }

    /// Delivers an event now, or buffers it in the open transaction.
    ///
    /// `make` only runs for observable sequences.
    fn emit<F>(&mut self, make: F)
    where
        F: FnOnce() -> ChangeEvent<T>,
    {
        if !self.config.is_observable() {
            return;
        }
        let event = make();
        match self.journal.as_mut() {
            Some(journal) => journal.buffer(event),
            None => {
                self.observers.notify(&event);
            }
        }
    }

    /// Links a new node after `after` without touching the counter or
    /// emitting.
    fn link_value(&mut self, after: usize, value: T) -> usize {
        let at_end = after == self.store.head() || after == self.store.last();
        let slot = self.store.alloc(value);
        self.store.link_after(after, slot);
        self.record(Undo::Linked(slot));
        if !at_end {
            self.index.invalidate();
        }
        slot
    }

    fn insert_after_slot(&mut self, after: usize, value: T) -> Handle {
        let event_value = self.config.is_observable().then(|| value.clone());
        let slot = self.link_value(after, value);
        self.touch();
        self.index.maybe_rebuild(&mut self.store);
        if let Some(value) = event_value {
            self.emit(|| ChangeEvent::Add(value));
        }
        self.store.handle(slot)
    }

    /// Unlinks a live node and returns its value.
    ///
    /// Inside a transaction the node is retained for rollback and a clone
    /// of its value is returned.
    fn unlink_value(&mut self, slot: usize) -> Option<T> {
        let is_first = slot == self.store.first();
        let is_last = slot == self.store.last();
        let breaks_hops = if is_first {
            false
        } else if is_last {
            self.store.node(slot).skip_target
        } else {
            true
        };
        if breaks_hops {
            self.index.invalidate();
        }

        self.store.unlink(slot);
        let value = if self.journal.is_some() {
            self.store.node_mut(slot).detached = true;
            self.record(Undo::Unlinked(slot));
            self.store.node(slot).value.clone()
        } else {
            self.store.free(slot)
        };

        self.touch();
        self.index.maybe_rebuild(&mut self.store);
        if let Some(value) = value.as_ref() {
            self.emit(|| ChangeEvent::Remove(value.clone()));
        }
        value
    }

    /// Overwrites the value of a live node and returns the old value.
    fn write_value(&mut self, slot: usize, pos: Option<usize>, value: T) -> Option<T> {
        let event_new = self.config.is_observable().then(|| value.clone());
        let old = self.store.value_mut(slot).map(|v| std::mem::replace(v, value))?;
        if self.journal.is_some() {
            self.record(Undo::Value(slot, old.clone()));
        }
        self.touch();

        if let Some(new) = event_new {
            let index = pos.unwrap_or_else(|| self.position_of(slot));
            let prior = old.clone();
            self.emit(|| ChangeEvent::Update {
                index,
                old: prior,
                new,
            });
        }
        Some(old)
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Appends a value. O(1).
    pub fn push_back(&mut self, value: T) -> Handle {
        self.insert_after_slot(self.store.last(), value)
    }

    /// Prepends a value. O(1).
    pub fn push_front(&mut self, value: T) -> Handle {
        self.insert_after_slot(self.store.head(), value)
    }

    /// Inserts a value so that it ends up at `index`.
    ///
    /// `index == len` appends; negative indices count from the end, so
    /// `-1` inserts before the last element.
    ///
    /// # Errors
    ///
    /// [`SequenceError::IndexOutOfBounds`] if the resolved index lies
    /// outside `[0, len]`.
    pub fn insert_at(&mut self, index: isize, value: T) -> Result<Handle, SequenceError> {
        let len = self.len();
        let pos = match index {
            i if i < 0 => len.checked_sub(i.unsigned_abs()),
            i => Some(i as usize).filter(|&pos| pos <= len),
        };
        let pos = pos.ok_or(SequenceError::IndexOutOfBounds { index, len })?;

        Ok(match pos {
            0 => self.push_front(value),
            pos if pos == len => self.push_back(value),
            pos => {
                let after = self.slot_at(pos - 1);
                self.insert_after_slot(after, value)
            }
        })
    }

    /// Inserts a value directly after the node `handle` refers to.
    ///
    /// # Errors
    ///
    /// [`SequenceError::StaleHandle`] if the node is gone.
    pub fn insert_after(&mut self, handle: Handle, value: T) -> Result<Handle, SequenceError> {
        let slot = self.live_slot(handle)?;
        Ok(self.insert_after_slot(slot, value))
    }

    /// Inserts a value directly before the node `handle` refers to.
    ///
    /// # Errors
    ///
    /// [`SequenceError::StaleHandle`] if the node is gone.
    pub fn insert_before(&mut self, handle: Handle, value: T) -> Result<Handle, SequenceError> {
        let slot = self.live_slot(handle)?;
        let prev = self.store.node(slot).prev;
        Ok(self.insert_after_slot(prev, value))
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Removes and returns the first element.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.unlink_value(self.store.first())
    }

    /// Removes and returns the last element.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.unlink_value(self.store.last())
    }

    /// Removes and returns the element at `index`.
    ///
    /// Returns `None` when the index is out of range; this is a not-found
    /// signal, not an error.
    pub fn remove_at(&mut self, index: isize) -> Option<T> {
        let pos = self.resolve_position(index)?;
        let slot = self.slot_at(pos);
        self.unlink_value(slot)
    }

    /// Removes the first element equal to `value`.
    pub fn remove(&mut self, value: &T) -> Option<T>
    where
        T: PartialEq,
    {
        self.remove_by(value, T::eq)
    }

    /// Removes the first element `eq` accepts, scanning from the front.
    pub fn remove_by<F>(&mut self, value: &T, mut eq: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> bool,
    {
        let slot = self
            .store
            .slots()
            .find(|&slot| self.store.value(slot).is_some_and(|item| eq(item, value)))?;
        self.unlink_value(slot)
    }

    /// Removes the node `handle` refers to.
    ///
    /// # Errors
    ///
    /// [`SequenceError::StaleHandle`] if the node is gone.
    pub fn remove_handle(&mut self, handle: Handle) -> Result<T, SequenceError> {
        let slot = self.live_slot(handle)?;
        self.unlink_value(slot).ok_or(SequenceError::StaleHandle)
    }

    /// Removes every element. Emits `Clear` with the previous length.
    pub fn clear(&mut self) {
        let len = self.len();
        if self.journal.is_some() {
            if let Some((first, last, len)) = self.store.detach_range() {
                let mut slot = first;
                loop {
                    let node = self.store.node_mut(slot);
                    node.detached = true;
                    if slot == last {
                        break;
                    }
                    slot = node.next;
                }
                self.record(Undo::Cleared { first, last, len });
            }
        } else {
            self.store.reset();
        }
        self.index.invalidate();
        self.touch();
        self.emit(|| ChangeEvent::Clear { len });
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Replaces the element at `index`.
    ///
    /// Returns `false` when the index is out of range.
    pub fn set(&mut self, index: isize, value: T) -> bool {
        let Some(pos) = self.resolve_position(index) else {
            return false;
        };
        let slot = self.slot_at(pos);
        self.write_value(slot, Some(pos), value).is_some()
    }

    /// Replaces the value of the node `handle` refers to, returning the old
    /// value.
    ///
    /// # Errors
    ///
    /// [`SequenceError::StaleHandle`] if the node is gone.
    pub fn replace(&mut self, handle: Handle, value: T) -> Result<T, SequenceError> {
        let slot = self.live_slot(handle)?;
        self.write_value(slot, None, value)
            .ok_or(SequenceError::StaleHandle)
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    /// Reverses the order of elements in place. O(n).
    ///
    /// Handles stay attached to their values.
    pub fn reverse(&mut self) {
        self.store.reverse();
        self.record(Undo::Reversed);
        self.touch();
        self.index.refresh(&mut self.store);
        self.emit(|| ChangeEvent::Reverse);
    }

    /// Sorts the elements. Stable.
    pub fn sort(&mut self)
    where
        T: Ord,
    {
        self.sort_by(T::cmp);
    }

    /// Sorts with a comparator. Stable: elements that compare equal keep
    /// their relative order.
    ///
    /// Values move between nodes; the nodes themselves stay in place, so
    /// handles keep pointing at positions, not values.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let slots: Vec<usize> = self.store.slots().collect();

        // Order by reference first so a panicking comparator leaves the
        // chain untouched.
        let mut order: Vec<usize> = (0..slots.len()).collect();
        {
            let values: Vec<&T> = slots
                .iter()
                .filter_map(|&slot| self.store.value(slot))
                .collect();
            order.sort_by(|&a, &b| compare(values[a], values[b]));
        }

        let mut taken: Vec<Option<T>> = slots
            .iter()
            .map(|&slot| self.store.node_mut(slot).value.take())
            .collect();
        if self.journal.is_some() {
            let old = slots
                .iter()
                .zip(&taken)
                .filter_map(|(&slot, value)| value.clone().map(|value| (slot, value)))
                .collect();
            self.record(Undo::Values(old));
        }
        for (&slot, &from) in slots.iter().zip(&order) {
            self.store.node_mut(slot).value = taken[from].take();
        }

        self.touch();
        self.emit(|| ChangeEvent::Sort);
    }

    /// Moves every element of `other` onto the end of `self`.
    ///
    /// `other` is left empty. Each sequence owns its own arena, so values
    /// are moved one by one (no clones outside a transaction on `other`):
    /// O(m) in the length of `other`. The nodes of `self` are not touched,
    /// so its handles and cursors stay valid, even when `other` is longer.
    /// Emits `Concat` on `self` and `Clear` on `other`.
    pub fn concat(&mut self, other: &mut Sequence<T>) {
        let values = other.take_values();
        let len = values.len();

        for value in values {
            self.link_value(self.store.last(), value);
        }

        self.touch();
        self.index.maybe_rebuild(&mut self.store);
        self.emit(|| ChangeEvent::Concat { len });
    }

    /// Empties the sequence, returning its values in order.
    fn take_values(&mut self) -> Vec<T> {
        if self.journal.is_some() {
            let values = self.iter().cloned().collect();
            self.clear();
            return values;
        }

        let len = self.len();
        let values = self.store.take_values();
        self.index.invalidate();
        self.touch();
        self.emit(|| ChangeEvent::Clear { len });
        values
    }

    // ========================================================================
    // Derivation
    // ========================================================================

    /// Returns a copy of the elements in `range`.
    ///
    /// Bounds are resolved like indices (negative counts from the end) and
    /// clamped into `[0, len]`. An empty or inverted range gives an empty
    /// sequence.
    ///
    /// ```
    /// use nexus_seq::Sequence;
    ///
    /// let seq = Sequence::range(1, 11, 1).unwrap();
    /// assert_eq!(seq.slice(2..7).to_vec(), vec![3, 4, 5, 6, 7]);
    /// assert_eq!(seq.slice(-3..).to_vec(), vec![8, 9, 10]);
    /// ```
    pub fn slice<R>(&self, range: R) -> Sequence<T>
    where
        R: RangeBounds<isize>,
    {
        let len = self.len();
        let start = match range.start_bound() {
            Bound::Included(&start) => self.clamp_position(start),
            Bound::Excluded(&start) => self.clamp_after(start),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&end) => self.clamp_after(end),
            Bound::Excluded(&end) => self.clamp_position(end),
            Bound::Unbounded => len,
        };

        if start >= end {
            return Sequence::with_config(self.config);
        }

        let mut slot = self.slot_at(start);
        let mut values = Vec::with_capacity(end - start);
        for _ in start..end {
            if let Some(value) = self.store.value(slot) {
                values.push(value.clone());
            }
            slot = self.store.node(slot).next;
        }
        Sequence::from_iter_with_config(self.config, values)
    }

    /// Returns a new sequence with the elements matching `pred`.
    pub fn filter<P>(&self, mut pred: P) -> Sequence<T>
    where
        P: FnMut(&T) -> bool,
    {
        Sequence::from_iter_with_config(
            self.config,
            self.iter().filter(|item| pred(item)).cloned(),
        )
    }

    /// Folds the elements using the first one as the seed.
    ///
    /// # Errors
    ///
    /// [`SequenceError::EmptyReduce`] when the sequence is empty.
    pub fn reduce<F>(&self, mut f: F) -> Result<T, SequenceError>
    where
        F: FnMut(T, &T) -> T,
    {
        let mut iter = self.iter();
        let seed = iter.next().cloned().ok_or(SequenceError::EmptyReduce)?;
        Ok(iter.fold(seed, |acc, item| f(acc, item)))
    }

    /// Copies the elements into a `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl Sequence<i64> {
    /// Builds `start, start + step, ...` up to but excluding `end`.
    ///
    /// A step pointing away from `end` yields an empty sequence.
    ///
    /// # Errors
    ///
    /// [`SequenceError::InvalidStep`] when `step == 0`.
    pub fn range(start: i64, end: i64, step: i64) -> Result<Self, SequenceError> {
        if step == 0 {
            return Err(SequenceError::InvalidStep);
        }
        let in_range = move |v: &i64| if step > 0 { *v < end } else { *v > end };
        let values = std::iter::successors(Some(start).filter(in_range), move |v| {
            v.checked_add(step).filter(in_range)
        });
        Ok(values.collect())
    }
}

// =============================================================================
// Trait impls
// =============================================================================

impl<T> FromIterator<T> for Sequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_iter_with_config(SequenceConfig::default(), iter)
    }
}

impl<T: Clone> Extend<T> for Sequence<T> {
    /// Appends element by element, emitting `Add` for each.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T> IntoIterator for Sequence<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.store)
    }
}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone> Clone for Sequence<T> {
    /// Copies the values and configuration. Listeners are not copied.
    fn clone(&self) -> Self {
        Self::from_iter_with_config(self.config, self.iter().cloned())
    }
}

impl<T: PartialEq> PartialEq for Sequence<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Sequence<T> {}

impl<T: fmt::Debug> fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for Sequence<T> {
    /// Formats as `1 -> 2 -> 3 -> null`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for value in self {
            write!(f, "{value} -> ")?;
        }
        f.write_str("null")
    }
}

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for Sequence<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for Sequence<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<T>::deserialize(deserializer)?;
        Ok(values.into_iter().collect())
    }
}


#[cfg(test)]
mod bench_sequence {
    use super::*;
    use hdrhistogram::Histogram;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[inline]
    fn rdtscp() -> u64 {
        #[cfg(target_arch = "x86_64")]
        unsafe {
            core::arch::x86_64::__rdtscp(&mut 0)
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            std::time::Instant::now().elapsed().as_nanos() as u64
        }
    }

    fn print_histogram(name: &str, hist: &Histogram<u64>) {
        println!(
            "{:24} p50: {:4} cycles | p99: {:4} cycles | p999: {:5} cycles | min: {:4} | max: {:5}",
            name,
            hist.value_at_quantile(0.50),
            hist.value_at_quantile(0.99),
            hist.value_at_quantile(0.999),
            hist.min(),
            hist.max(),
        );
    }

    const LEN: u64 = 10_000;
    const ITERATIONS: usize = 100_000;

    fn filled(config: SequenceConfig) -> Sequence<u64> {
        Sequence::from_iter_with_config(config, 0..LEN)
    }

    fn bench_get(name: &str, config: SequenceConfig) {
        let seq = filled(config);
        let mut rng = SmallRng::seed_from_u64(12345);
        let mut hist = Histogram::<u64>::new(3).unwrap();

        let indices: Vec<isize> = (0..ITERATIONS)
            .map(|_| rng.random_range(0..LEN) as isize)
            .collect();

        for &i in &indices {
            let start = rdtscp();
            let value = seq.get(i);
            let elapsed = rdtscp() - start;
            std::hint::black_box(value);
            hist.record(elapsed).unwrap();
        }

        print_histogram(name, &hist);
    }

    #[test]
    #[ignore]
    fn bench_get_indexed() {
        bench_get("get_indexed", SequenceConfig::default());
    }

    #[test]
    #[ignore]
    fn bench_get_linear() {
        bench_get("get_linear", SequenceConfig::default().skip_links(false));
    }

    #[test]
    #[ignore]
    fn bench_push_pop() {
        let mut seq = filled(SequenceConfig::default());
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for i in 0..ITERATIONS as u64 {
            let start = rdtscp();
            seq.push_back(i);
            seq.pop_front();
            let elapsed = rdtscp() - start;
            hist.record(elapsed).unwrap();
        }

        print_histogram("push_back+pop_front", &hist);
    }

    #[test]
    #[ignore]
    fn bench_transaction_rollback() {
        let mut seq = filled(SequenceConfig::default());
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for i in 0..ITERATIONS as u64 / 10 {
            let start = rdtscp();
            let mut tx = seq.begin_transaction();
            tx.push_back(i);
            tx.remove_at(5);
            tx.rollback();
            let elapsed = rdtscp() - start;
            hist.record(elapsed).unwrap();
        }

        print_histogram("txn_rollback", &hist);
    }
}
