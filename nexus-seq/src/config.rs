//! Sequence configuration.

/// Construction options for a [`Sequence`](crate::Sequence).
///
/// # Example
///
/// ```
/// use nexus_seq::{Sequence, SequenceConfig};
///
/// let config = SequenceConfig::default().observable(true);
/// let seq: Sequence<u64> = Sequence::with_config(config);
///
/// assert!(seq.config().is_observable());
/// assert!(seq.config().has_skip_links());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct SequenceConfig {
    skip_links: bool,
    observable: bool,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            skip_links: true,
            observable: false,
        }
    }
}

impl SequenceConfig {
    /// Enables or disables the skip-link index (default: enabled).
    #[must_use]
    pub const fn skip_links(mut self, enabled: bool) -> Self {
        self.skip_links = enabled;
        self
    }

    /// Enables or disables change events (default: disabled).
    ///
    /// When disabled, listeners may still be registered but nothing is
    /// delivered and no event values are cloned.
    #[must_use]
    pub const fn observable(mut self, enabled: bool) -> Self {
        self.observable = enabled;
        self
    }

    /// Returns `true` if the skip-link index is enabled.
    #[inline]
    pub const fn has_skip_links(&self) -> bool {
        self.skip_links
    }

    /// Returns `true` if change events are produced.
    #[inline]
    pub const fn is_observable(&self) -> bool {
        self.observable
    }
}
