// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute metadata definitions.
//!
//! This module provides [`AttrMeta`] for storing the declaration of one
//! attribute and [`AttrMetaBuilder`] for ergonomic construction.

use crate::relative::Axis;
use crate::value::AttrValue;

bitflags::bitflags! {
    /// Side-effect flags of an attribute declaration.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AttrFlags: u8 {
        /// Writes keep the node's render cache.
        const CACHE    = 0b0000_0001;
        /// Writes schedule a reflow pass.
        const REFLOW   = 0b0000_0010;
        /// Writes always invalidate layout, even if the box size is unchanged.
        const RELAYOUT = 0b0000_0100;
        /// Writes only store the value and trigger no side effects.
        const QUIET    = 0b0000_1000;
        /// The storage slot is shared across a kind hierarchy.
        const SHARE    = 0b0001_0000;
    }
}

/// The declaration of a single attribute.
///
/// # Example
///
/// ```rust
/// use arbor_attr::{AttrFlags, AttrMetaBuilder, AttrValue, Axis};
///
/// let meta = AttrMetaBuilder::new(AttrValue::from(""))
///     .relative(Axis::Width)
///     .relayout()
///     .build();
///
/// assert_eq!(meta.relative(), Some(Axis::Width));
/// assert!(meta.flags().contains(AttrFlags::RELAYOUT));
/// assert!(meta.inherit_default().is_none());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AttrMeta {
    default_value: AttrValue,
    flags: AttrFlags,
    relative: Option<Axis>,
    inherit: Option<AttrValue>,
}

impl AttrMeta {
    /// Creates metadata with the given default and no flags.
    #[must_use]
    pub fn new(default_value: AttrValue) -> Self {
        Self {
            default_value,
            flags: AttrFlags::empty(),
            relative: None,
            inherit: None,
        }
    }

    /// Returns the class-level default value.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> &AttrValue {
        &self.default_value
    }

    /// Returns the side-effect flags.
    #[must_use]
    #[inline]
    pub fn flags(&self) -> AttrFlags {
        self.flags
    }

    /// Returns the axis this attribute resolves relative units on, if any.
    #[must_use]
    #[inline]
    pub fn relative(&self) -> Option<Axis> {
        self.relative
    }

    /// Returns the inherited fallback, if the attribute is inheritable.
    #[must_use]
    #[inline]
    pub fn inherit_default(&self) -> Option<&AttrValue> {
        self.inherit.as_ref()
    }

    /// Returns `true` if writes are value-only.
    #[must_use]
    #[inline]
    pub fn is_quiet(&self) -> bool {
        self.flags.contains(AttrFlags::QUIET)
    }

    /// Returns `true` if the attribute shares one storage slot across kinds.
    #[must_use]
    #[inline]
    pub fn is_shared(&self) -> bool {
        self.flags.contains(AttrFlags::SHARE)
    }
}

/// Builder for [`AttrMeta`].
#[derive(Clone, Debug)]
pub struct AttrMetaBuilder {
    meta: AttrMeta,
}

impl AttrMetaBuilder {
    /// Creates a builder with the given default value.
    #[must_use]
    pub fn new(default_value: impl Into<AttrValue>) -> Self {
        Self {
            meta: AttrMeta::new(default_value.into()),
        }
    }

    /// Keeps the render cache on writes.
    #[must_use]
    pub fn cache(mut self) -> Self {
        self.meta.flags |= AttrFlags::CACHE;
        self
    }

    /// Schedules a reflow on writes.
    #[must_use]
    pub fn reflow(mut self) -> Self {
        self.meta.flags |= AttrFlags::REFLOW;
        self
    }

    /// Always invalidates layout on writes.
    #[must_use]
    pub fn relayout(mut self) -> Self {
        self.meta.flags |= AttrFlags::RELAYOUT;
        self
    }

    /// Makes writes value-only.
    ///
    /// Combining this with `cache`, `reflow` or `relayout` is rejected when the
    /// table is built.
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.meta.flags |= AttrFlags::QUIET;
        self
    }

    /// Shares the storage slot across a kind hierarchy.
    #[must_use]
    pub fn share(mut self) -> Self {
        self.meta.flags |= AttrFlags::SHARE;
        self
    }

    /// Resolves `%`, `rw` and `rh` strings, with `%` measured on `axis`.
    #[must_use]
    pub fn relative(mut self, axis: Axis) -> Self {
        self.meta.relative = Some(axis);
        self
    }

    /// Resolves the `"inherit"` sentinel from ancestors, falling back to `default`.
    #[must_use]
    pub fn inherit(mut self, default: impl Into<AttrValue>) -> Self {
        self.meta.inherit = Some(default.into());
        self
    }

    /// Builds the [`AttrMeta`].
    #[must_use]
    pub fn build(self) -> AttrMeta {
        self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_defaults() {
        let meta = AttrMeta::new(AttrValue::from(1));
        assert_eq!(meta.default_value(), &AttrValue::from(1));
        assert!(meta.flags().is_empty());
        assert!(meta.relative().is_none());
        assert!(meta.inherit_default().is_none());
    }

    #[test]
    fn builder_accumulates_flags() {
        let meta = AttrMetaBuilder::new(AttrValue::Null)
            .cache()
            .reflow()
            .share()
            .inherit("16px")
            .build();
        assert!(meta.flags().contains(AttrFlags::CACHE | AttrFlags::REFLOW));
        assert!(meta.is_shared());
        assert!(!meta.is_quiet());
        assert_eq!(meta.inherit_default(), Some(&AttrValue::from("16px")));
    }
}
