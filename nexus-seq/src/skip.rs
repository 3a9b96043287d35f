//! Skip-link index over the node store.
//!
//! The index is not a separate structure: it annotates a subset of nodes
//! with forward hops. After a rebuild every `stride`-th node carries a hop
//! `stride` positions ahead, where `stride = ⌈√len⌉`:
//!
//! ```text
//! stride = 3
//!
//!        ┌──────────────┐  ┌──────────────┐
//! HEAD → a → b → c → d → e → f → g → h → i → TAIL
//! ```
//!
//! Each hop records its span, so hops survive insertions at either end.
//! Anything that could make a hop lie (an interior insert or remove, or
//! removing a node a hop lands on) marks the index stale. A stale index is
//! never consulted: seeks fall back to plain walks until the next rebuild.
//! Rebuilds happen at length thresholds, and also once `⌈√len⌉` edits have
//! landed on a stale index, so a length that never hits a threshold still
//! gets its hops back.

use tracing::trace;

use crate::store::{NodeStore, Skip};

/// Below this length a linear walk beats maintaining hops.
pub(crate) const MIN_INDEXED_LEN: usize = 8;

/// Returns `⌈√n⌉`.
#[inline]
pub(crate) fn ceil_sqrt(n: usize) -> usize {
    let root = n.isqrt();
    if root * root < n { root + 1 } else { root }
}

/// Rebuild bookkeeping for the hop annotations.
#[derive(Debug, Clone)]
pub(crate) struct SkipIndex {
    enabled: bool,
    fresh: bool,
    stride: usize,
    stale_edits: usize,
    rebuilds: u64,
}

impl SkipIndex {
    pub(crate) const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            fresh: false,
            stride: 0,
            stale_edits: 0,
            rebuilds: 0,
        }
    }

    /// Returns `true` if hops may be followed.
    #[inline]
    pub(crate) const fn is_fresh(&self) -> bool {
        self.enabled && self.fresh
    }

    #[inline]
    pub(crate) const fn stride(&self) -> usize {
        self.stride
    }

    #[cfg(test)]
    pub(crate) const fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Stops hops from being followed until the next rebuild.
    ///
    /// Each call counts as one edit against the stale index.
    #[inline]
    pub(crate) fn invalidate(&mut self) {
        self.fresh = false;
        self.stale_edits = self.stale_edits.saturating_add(1);
    }

    /// Returns `true` when `len` crosses a rebuild threshold.
    ///
    /// Rebuilds happen when `len` is a multiple of `⌈√len⌉`, so an O(n)
    /// rebuild is paid roughly once every `√n` mutations.
    #[inline]
    pub(crate) fn crosses_threshold(&self, len: usize) -> bool {
        self.enabled && len >= MIN_INDEXED_LEN && len % ceil_sqrt(len) == 0
    }

    /// Returns `true` when a stale index has absorbed `⌈√len⌉` edits.
    #[inline]
    pub(crate) fn too_stale(&self, len: usize) -> bool {
        self.enabled
            && !self.fresh
            && len >= MIN_INDEXED_LEN
            && self.stale_edits >= ceil_sqrt(len)
    }

    /// Rebuilds if `len` crosses a threshold or the index is too stale.
    #[inline]
    pub(crate) fn maybe_rebuild<T>(&mut self, store: &mut NodeStore<T>) {
        let len = store.len();
        if self.crosses_threshold(len) || self.too_stale(len) {
            self.rebuild(store);
        }
    }

    /// Rebuilds when enabled and long enough, otherwise drops the index.
    pub(crate) fn refresh<T>(&mut self, store: &mut NodeStore<T>) {
        if self.enabled && store.len() >= MIN_INDEXED_LEN {
            self.rebuild(store);
        } else {
            self.clear(store);
        }
    }

    /// Strips every annotation and marks the index stale.
    pub(crate) fn clear<T>(&mut self, store: &mut NodeStore<T>) {
        self.fresh = false;
        self.stale_edits = 0;
        let mut slot = store.first();
        while slot != store.tail() {
            let node = store.node_mut(slot);
            node.skip = None;
            node.skip_target = false;
            slot = node.next;
        }
    }

    /// Re-stamps hops over the whole chain.
    pub(crate) fn rebuild<T>(&mut self, store: &mut NodeStore<T>) {
        self.clear(store);

        let len = store.len();
        let stride = ceil_sqrt(len);
        self.stride = stride;

        if len < MIN_INDEXED_LEN {
            return;
        }

        let tail = store.tail();
        let mut src = store.first();
        let mut dst = src;
        for _ in 0..stride {
            dst = store.node(dst).next;
        }

        while dst != tail {
            store.node_mut(src).skip = Some(Skip {
                to: dst,
                span: stride,
            });
            store.node_mut(dst).skip_target = true;

            src = dst;
            for _ in 0..stride {
                if dst == tail {
                    break;
                }
                dst = store.node(dst).next;
            }
        }

        self.fresh = true;
        self.rebuilds += 1;
        trace!(len, stride, "rebuilt skip index");
    }

    /// Finds the slot at `index` (`index < store.len()`).
    ///
    /// With a fresh index and a target more than one stride from the end,
    /// walks forward from the head taking every hop that does not overshoot.
    /// Otherwise walks from whichever sentinel is nearer.
    pub(crate) fn seek<T>(&self, store: &NodeStore<T>, index: usize) -> usize {
        let len = store.len();
        debug_assert!(index < len, "seek past end: {index} >= {len}");

        if self.is_fresh() && len - index > self.stride() {
            return Self::seek_skipping(store, index);
        }
        Self::seek_linear(store, index)
    }

    /// Plain walk from the nearer sentinel.
    pub(crate) fn seek_linear<T>(store: &NodeStore<T>, index: usize) -> usize {
        let len = store.len();
        if index < len / 2 {
            let mut slot = store.first();
            for _ in 0..index {
                slot = store.node(slot).next;
            }
            slot
        } else {
            let mut slot = store.last();
            for _ in index + 1..len {
                slot = store.node(slot).prev;
            }
            slot
        }
    }

    fn seek_skipping<T>(store: &NodeStore<T>, index: usize) -> usize {
        let mut slot = store.first();
        let mut pos = 0;
        while pos < index {
            let node = store.node(slot);
            match node.skip {
                Some(skip) if pos + skip.span <= index => {
                    slot = skip.to;
                    pos += skip.span;
                }
                _ => {
                    slot = node.next;
                    pos += 1;
                }
            }
        }
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: u64) -> NodeStore<u64> {
        let mut store = NodeStore::new();
        for i in 0..n {
            let slot = store.alloc(i);
            store.link_before(store.tail(), slot);
        }
        store
    }

    #[test]
    fn ceil_sqrt_values() {
        assert_eq!(ceil_sqrt(0), 0);
        assert_eq!(ceil_sqrt(1), 1);
        assert_eq!(ceil_sqrt(8), 3);
        assert_eq!(ceil_sqrt(9), 3);
        assert_eq!(ceil_sqrt(10), 4);
        assert_eq!(ceil_sqrt(100), 10);
        assert_eq!(ceil_sqrt(101), 11);
    }

    #[test]
    fn threshold_requires_min_len() {
        let index = SkipIndex::new(true);
        assert!(!index.crosses_threshold(4));
        assert!(!index.crosses_threshold(6));
        assert!(index.crosses_threshold(9));
        assert!(index.crosses_threshold(12));
        assert!(!index.crosses_threshold(13));
    }

    #[test]
    fn disabled_never_rebuilds() {
        let mut store = filled(100);
        let mut index = SkipIndex::new(false);
        assert!(!index.crosses_threshold(100));

        index.refresh(&mut store);
        assert!(!index.is_fresh());
        assert_eq!(index.rebuilds(), 0);
    }

    #[test]
    fn rebuild_stamps_every_stride() {
        let mut store = filled(10);
        let mut index = SkipIndex::new(true);
        index.rebuild(&mut store);

        assert!(index.is_fresh());
        assert_eq!(index.stride(), 4);

        let hops: Vec<_> = store
            .slots()
            .map(|slot| store.node(slot).skip.map(|s| s.span))
            .collect();
        assert_eq!(
            hops,
            vec![Some(4), None, None, None, Some(4), None, None, None, None, None]
        );

        let targets: Vec<_> = store
            .slots()
            .filter(|&slot| store.node(slot).skip_target)
            .map(|slot| *store.value(slot).unwrap())
            .collect();
        assert_eq!(targets, vec![4, 8]);
    }

    #[test]
    fn stale_index_rebuilds_after_stride_edits() {
        // 13 is not a threshold length: 13 % 4 != 0.
        let mut store = filled(13);
        let mut index = SkipIndex::new(true);
        index.rebuild(&mut store);
        assert!(!index.crosses_threshold(13));

        for _ in 0..3 {
            index.invalidate();
            index.maybe_rebuild(&mut store);
            assert!(!index.is_fresh());
        }
        index.invalidate();
        index.maybe_rebuild(&mut store);
        assert!(index.is_fresh());
        assert_eq!(index.rebuilds(), 2);
    }

    #[test]
    fn short_chain_is_not_indexed() {
        let mut store = filled(5);
        let mut index = SkipIndex::new(true);
        index.refresh(&mut store);
        assert!(!index.is_fresh());
        assert!(store.slots().all(|slot| store.node(slot).skip.is_none()));
    }

    #[test]
    fn seek_agrees_with_linear() {
        for n in [8u64, 9, 17, 50, 101] {
            let mut store = filled(n);
            let mut index = SkipIndex::new(true);
            index.rebuild(&mut store);

            for i in 0..n as usize {
                let skipped = index.seek(&store, i);
                let linear = SkipIndex::seek_linear(&store, i);
                assert_eq!(skipped, linear, "n={n} i={i}");
                assert_eq!(store.value(skipped), Some(&(i as u64)));
            }
        }
    }

    #[test]
    fn hops_survive_front_insertion() {
        let mut store = filled(20);
        let mut index = SkipIndex::new(true);
        index.rebuild(&mut store);

        for v in 100..103 {
            let slot = store.alloc(v);
            store.link_after(store.head(), slot);
        }

        for i in 0..store.len() {
            assert_eq!(index.seek(&store, i), SkipIndex::seek_linear(&store, i));
        }
    }

    #[test]
    fn clear_strips_annotations() {
        let mut store = filled(30);
        let mut index = SkipIndex::new(true);
        index.rebuild(&mut store);
        index.clear(&mut store);

        assert!(!index.is_fresh());
        assert!(
            store
                .slots()
                .all(|slot| store.node(slot).skip.is_none() && !store.node(slot).skip_target)
        );
    }
}
