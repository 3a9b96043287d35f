//! Read-only view of a sequence.

use std::fmt;

use crate::iter::Iter;
use crate::sequence::Sequence;

/// A sequence with every mutating operation removed.
///
/// Built with [`Sequence::freeze`] or `From<Sequence<T>>`. Use
/// [`to_mutable`](Self::to_mutable) for an independent, editable copy.
///
/// ```
/// use nexus_seq::{ImmutableSequence, seq};
///
/// let frozen: ImmutableSequence<_> = seq![1, 2, 3].freeze();
/// assert_eq!(frozen.get(-1), Some(&3));
///
/// let mut copy = frozen.to_mutable();
/// copy.push_back(4);
/// assert_eq!(frozen.len(), 3);
/// assert_eq!(copy.len(), 4);
/// ```
pub struct ImmutableSequence<T> {
    inner: Sequence<T>,
}

impl<T> Sequence<T> {
    /// Converts into a read-only view. Listeners are dropped.
    pub fn freeze(self) -> ImmutableSequence<T> {
        ImmutableSequence::from(self)
    }
}

impl<T> From<Sequence<T>> for ImmutableSequence<T> {
    fn from(seq: Sequence<T>) -> Self {
        let Sequence { store, config, .. } = seq;
        let mut inner = Sequence::with_config(config);
        inner.store = store;
        inner.index.refresh(&mut inner.store);
        Self { inner }
    }
}

impl<T> ImmutableSequence<T> {
    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the first element.
    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.inner.first()
    }

    /// Returns the last element.
    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.inner.last()
    }

    /// Returns the element at `index`; negative indices count from the end.
    #[inline]
    pub fn get(&self, index: isize) -> Option<&T> {
        self.inner.get(index)
    }

    /// Alias of [`get`](Self::get).
    #[inline]
    pub fn at(&self, index: isize) -> Option<&T> {
        self.inner.at(index)
    }

    /// Returns an iterator over the elements, front to back.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        self.inner.iter()
    }

    /// Copies the elements into a `Vec`.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.inner.to_vec()
    }

    /// Returns an independent mutable copy with the same configuration.
    pub fn to_mutable(&self) -> Sequence<T>
    where
        T: Clone,
    {
        self.inner.clone()
    }
}

impl<'a, T> IntoIterator for &'a ImmutableSequence<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for ImmutableSequence<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Eq> Eq for ImmutableSequence<T> {}

impl<T: fmt::Debug> fmt::Debug for ImmutableSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl<T: fmt::Display> fmt::Display for ImmutableSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for ImmutableSequence<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.inner, serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for ImmutableSequence<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let seq: Sequence<T> = serde::Deserialize::deserialize(deserializer)?;
        Ok(seq.freeze())
    }
}
