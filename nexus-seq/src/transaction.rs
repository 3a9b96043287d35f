//! Transactions: an undo journal plus a scoped guard.
//!
//! While a transaction is open every primitive mutation records how to undo
//! itself. Removed nodes are not freed; they are marked detached and kept in
//! the arena so rollback can relink them exactly where they were. Events are
//! buffered rather than delivered.
//!
//! - **Commit** frees the retained nodes, delivers the buffered events in
//!   order, and closes the journal.
//! - **Rollback** replays the journal backwards, restores the sentinel ends,
//!   discards the buffered events and delivers a single
//!   [`ChangeEvent::Rollback`].
//!
//! The [`Transaction`] guard dereferences to the sequence. Dropping the guard
//! that opened the transaction without committing rolls it back.
//!
//! ```
//! use nexus_seq::Sequence;
//!
//! let mut seq = Sequence::from_iter([1, 2, 3]);
//!
//! let mut tx = seq.begin_transaction();
//! tx.push_back(4);
//! tx.remove_at(0);
//! assert_eq!(tx.to_vec(), vec![2, 3, 4]);
//! tx.rollback();
//!
//! assert_eq!(seq.to_vec(), vec![1, 2, 3]);
//! ```

use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::event::ChangeEvent;
use crate::sequence::Sequence;
use crate::store::NodeStore;

/// Chain ends at the time the transaction opened.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    head: usize,
    tail: usize,
    len: usize,
}

/// How to undo one primitive mutation.
#[derive(Debug)]
pub(crate) enum Undo<T> {
    /// A node was linked in. Undo: unlink and free it.
    Linked(usize),
    /// A node was unlinked and retained. Undo: relink it.
    Unlinked(usize),
    /// A node's value was overwritten. Undo: restore the old value.
    Value(usize, T),
    /// Several values were overwritten at once (sort).
    Values(Vec<(usize, T)>),
    /// The chain was reversed. Undo: reverse again.
    Reversed,
    /// The whole live range was detached. Undo: reattach it.
    Cleared { first: usize, last: usize, len: usize },
}

/// Undo log and buffered events of an open transaction.
#[derive(Debug)]
pub(crate) struct Journal<T> {
    snapshot: Snapshot,
    undo: Vec<Undo<T>>,
    pending: Vec<ChangeEvent<T>>,
}

impl<T> Journal<T> {
    fn open(store: &NodeStore<T>) -> Self {
        Self {
            snapshot: Snapshot {
                head: store.head(),
                tail: store.tail(),
                len: store.len(),
            },
            undo: Vec::new(),
            pending: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn record(&mut self, undo: Undo<T>) {
        self.undo.push(undo);
    }

    #[inline]
    pub(crate) fn buffer(&mut self, event: ChangeEvent<T>) {
        self.pending.push(event);
    }
}

/// Collects the slots of a detached range, first to last.
fn walk_range<T>(store: &NodeStore<T>, first: usize, last: usize) -> Vec<usize> {
    let mut slots = Vec::new();
    let mut slot = first;
    loop {
        slots.push(slot);
        if slot == last {
            break;
        }
        slot = store.node(slot).next;
    }
    slots
}

impl<T: Clone> Sequence<T> {
    /// Opens a transaction.
    ///
    /// If one is already open the returned guard joins it: committing or
    /// rolling back through the inner guard does nothing, and dropping it
    /// leaves the outer transaction open.
    pub fn begin_transaction(&mut self) -> Transaction<'_, T> {
        let owner = self.journal.is_none();
        if owner {
            self.journal = Some(Journal::open(&self.store));
            debug!(len = self.len(), "transaction opened");
        }
        Transaction {
            seq: self,
            owner,
            finished: false,
        }
    }

    /// Closes the open transaction, keeping its mutations.
    ///
    /// Returns `false` if no transaction was open.
    pub(crate) fn commit_journal(&mut self) -> bool {
        let Some(journal) = self.journal.take() else {
            return false;
        };

        let steps = journal.undo.len();
        for undo in journal.undo {
            match undo {
                Undo::Unlinked(slot) => {
                    self.store.free(slot);
                }
                Undo::Cleared { first, last, .. } => {
                    for slot in walk_range(&self.store, first, last) {
                        self.store.free(slot);
                    }
                }
                Undo::Linked(_) | Undo::Value(..) | Undo::Values(_) | Undo::Reversed => {}
            }
        }

        let events = journal.pending.len();
        for event in &journal.pending {
            self.observers.notify(event);
        }
        debug!(steps, events, "transaction committed");
        true
    }

    /// Closes the open transaction, undoing its mutations.
    ///
    /// Returns `false` if no transaction was open.
    pub(crate) fn rollback_journal(&mut self) -> bool {
        let Some(journal) = self.journal.take() else {
            return false;
        };

        let steps = journal.undo.len();
        for undo in journal.undo.into_iter().rev() {
            match undo {
                Undo::Linked(slot) => {
                    self.store.unlink(slot);
                    self.store.free(slot);
                }
                Undo::Unlinked(slot) => self.store.relink(slot),
                Undo::Value(slot, old) => {
                    self.store.node_mut(slot).value = Some(old);
                }
                Undo::Values(old) => {
                    for (slot, value) in old {
                        self.store.node_mut(slot).value = Some(value);
                    }
                }
                Undo::Reversed => self.store.reverse(),
                Undo::Cleared { first, last, len } => {
                    for slot in walk_range(&self.store, first, last) {
                        self.store.node_mut(slot).detached = false;
                    }
                    self.store.reattach_range(first, last, len);
                }
            }
        }

        let Snapshot { head, tail, len } = journal.snapshot;
        self.store.restore_ends(head, tail, len);
        self.mod_count += 1;
        self.index.refresh(&mut self.store);

        debug!(
            steps,
            discarded = journal.pending.len(),
            "transaction rolled back"
        );
        if self.config.is_observable() {
            self.observers.notify(&ChangeEvent::Rollback);
        }
        true
    }
}

/// Scoped access to a sequence inside a transaction.
///
/// Dereferences to [`Sequence`], so every operation is available through the
/// guard.
#[must_use = "dropping the transaction immediately rolls it back"]
pub struct Transaction<'a, T: Clone> {
    seq: &'a mut Sequence<T>,
    owner: bool,
    finished: bool,
}

impl<T: Clone> Transaction<'_, T> {
    /// Returns `true` if this guard opened the transaction.
    ///
    /// Guards from nested `begin_transaction` calls join the outer
    /// transaction and do not own it.
    #[inline]
    pub const fn is_owner(&self) -> bool {
        self.owner
    }

    /// Keeps every mutation made in the transaction and delivers the
    /// buffered events.
    ///
    /// Returns `false` for a nested guard, which leaves the outer
    /// transaction open.
    pub fn commit(mut self) -> bool {
        self.finished = true;
        self.owner && self.seq.commit_journal()
    }

    /// Undoes every mutation made in the transaction.
    ///
    /// Returns `false` for a nested guard, which leaves the outer
    /// transaction open.
    pub fn rollback(mut self) -> bool {
        self.finished = true;
        self.owner && self.seq.rollback_journal()
    }
}

impl<T: Clone> Deref for Transaction<'_, T> {
    type Target = Sequence<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.seq
    }
}

impl<T: Clone> DerefMut for Transaction<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.seq
    }
}

impl<T: Clone> Drop for Transaction<'_, T> {
    fn drop(&mut self) {
        if self.owner && !self.finished && self.seq.is_in_transaction() {
            debug!("transaction dropped without commit");
            self.seq.rollback_journal();
        }
    }
}
