//! Arena-backed doubly-linked sequence.
//!
//! [`Sequence`] is a linked list with array-like operations: positional
//! reads and writes, slicing, searching, sorting and folding. It keeps the
//! O(1) end operations and stable node identity of a linked list while
//! making random access cheap and every batch of edits reversible.
//!
//! # Design
//!
//! All nodes live in one `slab::Slab` owned by the sequence. Links are slab
//! keys, never pointers, and two sentinel nodes bound the live range:
//!
//! ```text
//! HEAD ⇄ a ⇄ b ⇄ c ⇄ TAIL
//! ```
//!
//! Layered on top of the chain:
//!
//! - a **skip-link index**: every `⌈√n⌉`-th node carries a forward hop, so
//!   positional seeks take O(√n) steps instead of O(n)
//! - **handles**: `Copy` references validated on every use, so a removed
//!   node is reported as [`SequenceError::StaleHandle`] rather than read
//! - **cursors**: detached positions that step in either direction
//! - **transactions**: an undo journal with commit and rollback
//! - **listeners**: change events for observable sequences
//!
//! # Quick Start
//!
//! ```
//! use nexus_seq::{Sequence, seq};
//!
//! let mut seq = seq![3, 1, 2];
//! seq.push_back(5);
//! seq.insert_at(-1, 4).unwrap();
//! seq.sort();
//!
//! assert_eq!(seq.to_vec(), vec![1, 2, 3, 4, 5]);
//! assert_eq!(seq.get(-2), Some(&4));
//! assert_eq!(seq.to_string(), "1 -> 2 -> 3 -> 4 -> 5 -> null");
//! ```
//!
//! # Transactions
//!
//! ```
//! use nexus_seq::seq;
//!
//! let mut seq = seq![1, 2, 3];
//! {
//!     let mut tx = seq.begin_transaction();
//!     tx.clear();
//!     tx.push_back(9);
//!     // dropped without commit: rolled back
//! }
//! assert_eq!(seq.to_vec(), vec![1, 2, 3]);
//! ```
//!
//! # Change Events
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use nexus_seq::{ChangeEvent, Sequence, SequenceConfig};
//!
//! let mut seq = Sequence::with_config(SequenceConfig::default().observable(true));
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&log);
//! let sub = seq.subscribe(move |event| sink.borrow_mut().push(event.clone()));
//!
//! seq.push_back("a");
//! seq.reverse();
//! seq.unsubscribe(sub);
//! seq.push_back("b");
//!
//! assert_eq!(*log.borrow(), vec![ChangeEvent::Add("a"), ChangeEvent::Reverse]);
//! ```
//!
//! # Complexity
//!
//! | Operation | Cost |
//! |-----------|------|
//! | `push_back` / `push_front` / `pop_*` | O(1) amortized |
//! | handle ops (`insert_after`, `remove_handle`, ...) | O(1) amortized |
//! | `get` / `set` / `insert_at` / `remove_at` | O(√n) with a fresh index, O(n) otherwise |
//! | `reverse` / `clear` | O(n) |
//! | `a.concat(&mut b)` | O(m), m = `b.len()`; `a`'s handles stay valid |
//! | `sort` | O(n log n) |
//!
//! The index is rebuilt in O(n) whenever the length is a multiple of
//! `⌈√len⌉`, after reverse and rollback, and once `⌈√len⌉` interior edits
//! have piled up on a stale index. A stale index is never followed.
//!
//! # Feature Flags
//!
//! - `serde` - `Serialize`/`Deserialize` for [`Sequence`] (as a plain list)
//!   and [`SequenceConfig`]

#![warn(missing_docs)]

pub mod config;
pub mod cursor;
pub mod error;
pub mod event;
pub mod handle;
pub mod iter;
pub mod observer;
pub mod sequence;
mod skip;
mod store;
pub mod transaction;
pub mod view;

pub use config::SequenceConfig;
pub use cursor::{Cursor, CursorValues, Direction};
pub use error::SequenceError;
pub use event::ChangeEvent;
pub use handle::Handle;
pub use iter::{IntoIter, Iter, Traversal};
pub use observer::{ListenerError, Subscription};
pub use sequence::Sequence;
pub use transaction::Transaction;
pub use view::ImmutableSequence;

/// Builds a [`Sequence`] from a list of values.
///
/// ```
/// use nexus_seq::{Sequence, seq};
///
/// let seq = seq![1, 2, 3];
/// assert_eq!(seq.to_vec(), vec![1, 2, 3]);
///
/// let empty: Sequence<u8> = seq![];
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! seq {
    () => {
        $crate::Sequence::new()
    };
    ($($value:expr),+ $(,)?) => {
        <$crate::Sequence<_> as ::core::iter::FromIterator<_>>::from_iter([$($value),+])
    };
}
