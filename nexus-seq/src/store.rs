//! Node store: a slab arena holding the adjacency chain.
//!
//! Every node, including the two sentinels, lives in one [`Slab`]. Links
//! are slab keys rather than pointers. The `next` direction defines the
//! order of the chain; `prev` is a back-reference kept in sync for O(1)
//! predecessor lookup and for reversal.
//!
//! ```text
//! HEAD ⇄ a ⇄ b ⇄ c ⇄ TAIL
//! ```
//!
//! The store performs no bookkeeping beyond links and the element count.
//! Index maintenance, events and journaling live in the layers above.

use slab::Slab;

use crate::handle::{Handle, NIL};

/// A forward hop recorded by the skip index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Skip {
    /// Slot of the node this hop lands on.
    pub(crate) to: usize,
    /// Number of positions the hop advances.
    pub(crate) span: usize,
}

/// A node in the chain.
#[derive(Debug)]
pub(crate) struct Node<T> {
    /// `None` only for the sentinels.
    pub(crate) value: Option<T>,
    pub(crate) next: usize,
    pub(crate) prev: usize,
    pub(crate) skip: Option<Skip>,
    /// Some hop lands on this node.
    pub(crate) skip_target: bool,
    /// Unlinked but retained so a transaction can relink it.
    pub(crate) detached: bool,
    /// Insertion sequence number.
    pub(crate) seq: u64,
}

impl<T> Node<T> {
    #[inline]
    fn new(value: Option<T>, seq: u64) -> Self {
        Self {
            value,
            next: NIL,
            prev: NIL,
            skip: None,
            skip_target: false,
            detached: false,
            seq,
        }
    }
}

/// Arena plus the two sentinel slots bounding the live range.
#[derive(Debug)]
pub(crate) struct NodeStore<T> {
    slab: Slab<Node<T>>,
    head: usize,
    tail: usize,
    len: usize,
    next_seq: u64,
}

impl<T> NodeStore<T> {
    #[cfg(test)]
    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a store with room for `capacity` elements before the arena
    /// reallocates.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut store = Self {
            slab: Slab::with_capacity(capacity + 2),
            head: NIL,
            tail: NIL,
            len: 0,
            next_seq: 0,
        };
        store.install_sentinels();
        store
    }

    fn install_sentinels(&mut self) {
        let head_seq = self.bump_seq();
        let tail_seq = self.bump_seq();
        let head = self.slab.insert(Node::new(None, head_seq));
        let tail = self.slab.insert(Node::new(None, tail_seq));
        self.slab[head].next = tail;
        self.slab[tail].prev = head;
        self.head = head;
        self.tail = tail;
        self.len = 0;
    }

    #[inline]
    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) const fn head(&self) -> usize {
        self.head
    }

    #[inline]
    pub(crate) const fn tail(&self) -> usize {
        self.tail
    }

    /// Slot of the first live node, or the tail sentinel when empty.
    #[inline]
    pub(crate) fn first(&self) -> usize {
        self.slab[self.head].next
    }

    /// Slot of the last live node, or the head sentinel when empty.
    #[inline]
    pub(crate) fn last(&self) -> usize {
        self.slab[self.tail].prev
    }

    #[inline]
    pub(crate) fn is_sentinel(&self, slot: usize) -> bool {
        slot == self.head || slot == self.tail
    }

    #[inline]
    pub(crate) fn node(&self, slot: usize) -> &Node<T> {
        &self.slab[slot]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, slot: usize) -> &mut Node<T> {
        &mut self.slab[slot]
    }

    #[inline]
    pub(crate) fn value(&self, slot: usize) -> Option<&T> {
        self.slab.get(slot).and_then(|node| node.value.as_ref())
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.slab.get_mut(slot).and_then(|node| node.value.as_mut())
    }

    #[inline]
    pub(crate) fn handle(&self, slot: usize) -> Handle {
        Handle::new(slot, self.slab[slot].seq)
    }

    /// Resolves a handle to a slot that is linked into the chain.
    ///
    /// Sentinel handles resolve as well; callers that need a live element
    /// check [`is_sentinel`](Self::is_sentinel).
    #[inline]
    pub(crate) fn resolve(&self, handle: Handle) -> Option<usize> {
        self.slab
            .get(handle.slot)
            .filter(|node| node.seq == handle.seq && !node.detached)
            .map(|_| handle.slot)
    }

    /// Iterates the slots of live nodes, head to tail.
    pub(crate) fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        let first = self.first();
        let tail = self.tail;
        std::iter::successors((first != tail).then_some(first), move |&slot| {
            let next = self.slab[slot].next;
            (next != tail).then_some(next)
        })
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Allocates an unlinked node and returns its slot.
    pub(crate) fn alloc(&mut self, value: T) -> usize {
        let seq = self.bump_seq();
        self.slab.insert(Node::new(Some(value), seq))
    }

    /// Deallocates a node, returning its value.
    ///
    /// The node must already be out of the chain.
    pub(crate) fn free(&mut self, slot: usize) -> Option<T> {
        self.slab.try_remove(slot).and_then(|node| node.value)
    }

    // ========================================================================
    // Linking
    // ========================================================================

    /// Links an unlinked node directly after `after`.
    pub(crate) fn link_after(&mut self, after: usize, slot: usize) {
        let next = self.slab[after].next;
        let node = &mut self.slab[slot];
        node.prev = after;
        node.next = next;
        node.detached = false;

        self.slab[after].next = slot;
        self.slab[next].prev = slot;
        self.len += 1;
    }

    /// Links an unlinked node directly before `before`.
    pub(crate) fn link_before(&mut self, before: usize, slot: usize) {
        let prev = self.slab[before].prev;
        self.link_after(prev, slot);
    }

    /// Removes a live node from the chain without deallocating it.
    ///
    /// The node keeps its own `prev`/`next` so [`relink`](Self::relink) can
    /// put it back while the surrounding chain is unchanged.
    pub(crate) fn unlink(&mut self, slot: usize) {
        debug_assert!(!self.is_sentinel(slot), "sentinels are never unlinked");
        let Node { prev, next, .. } = self.slab[slot];
        self.slab[prev].next = next;
        self.slab[next].prev = prev;
        self.len -= 1;
    }

    /// Puts back a node removed by [`unlink`](Self::unlink).
    pub(crate) fn relink(&mut self, slot: usize) {
        let Node { prev, next, .. } = self.slab[slot];
        debug_assert_eq!(self.slab[prev].next, next, "chain changed around {slot}");
        self.slab[prev].next = slot;
        self.slab[next].prev = slot;
        self.slab[slot].detached = false;
        self.len += 1;
    }

    /// Detaches the whole live range, leaving the chain empty.
    ///
    /// Returns `(first, last, len)` of the detached range, or `None` when
    /// the chain was already empty. The range keeps its internal links.
    pub(crate) fn detach_range(&mut self) -> Option<(usize, usize, usize)> {
        if self.len == 0 {
            return None;
        }

        let first = self.first();
        let last = self.last();
        let len = self.len;

        let (head, tail) = (self.head, self.tail);
        self.slab[head].next = tail;
        self.slab[tail].prev = head;
        self.len = 0;

        Some((first, last, len))
    }

    /// Re-attaches a range returned by [`detach_range`](Self::detach_range)
    /// into an empty chain.
    pub(crate) fn reattach_range(&mut self, first: usize, last: usize, len: usize) {
        debug_assert_eq!(self.len, 0, "reattach requires an empty chain");
        let (head, tail) = (self.head, self.tail);
        self.slab[head].next = first;
        self.slab[first].prev = head;
        self.slab[last].next = tail;
        self.slab[tail].prev = last;
        self.len = len;
    }

    /// Reverses the chain in place.
    ///
    /// Every node, sentinels included, swaps `prev` and `next`; then the
    /// sentinels swap roles.
    pub(crate) fn reverse(&mut self) {
        let (head, tail) = (self.head, self.tail);
        let mut slot = head;
        loop {
            let node = &mut self.slab[slot];
            std::mem::swap(&mut node.prev, &mut node.next);
            if slot == tail {
                break;
            }
            // The old successor is now in `prev`.
            slot = node.prev;
        }
        self.head = tail;
        self.tail = head;
    }

    /// Restores sentinel roles and element count from a snapshot.
    pub(crate) fn restore_ends(&mut self, head: usize, tail: usize, len: usize) {
        self.head = head;
        self.tail = tail;
        self.len = len;
    }

    /// Moves every live value out in chain order and resets the store.
    pub(crate) fn take_values(&mut self) -> Vec<T> {
        let slots: Vec<usize> = self.slots().collect();
        let values = slots
            .into_iter()
            .filter_map(|slot| self.slab[slot].value.take())
            .collect();
        self.reset();
        values
    }

    /// Drops every node and installs fresh sentinels.
    ///
    /// Old handles, sentinel handles included, become stale.
    pub(crate) fn reset(&mut self) {
        self.slab.clear();
        self.install_sentinels();
    }
}
