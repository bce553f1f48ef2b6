// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node sparse attribute storage.
//!
//! This module provides [`AttrStore`] for storing raw attribute values on a
//! node, using sparse storage so nodes only pay for what they set.
//!
//! # Implementation
//!
//! Entries live in a sorted vector searched with binary search rather than a
//! hash map:
//!
//! - contiguous memory and no hash buckets
//! - O(log n) lookup, which is fast for typical attribute counts (5-20)
//! - inline storage for small attribute sets via `SmallVec`
//!
//! # Scope
//!
//! `AttrStore` only stores. Defaults, relative re-resolution, inheritance and
//! side effects are applied by the owner of the tree, which can see ancestors.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use smallvec::SmallVec;

use crate::relative::RelativeValue;
use crate::value::AttrValue;

/// Most nodes set fewer than 8 attributes, so this avoids heap allocation in the common case.
const INLINE_CAPACITY: usize = 8;

/// A value as held by an [`AttrStore`].
#[derive(Clone, Debug, PartialEq)]
pub enum StoredValue {
    /// A plain value.
    Value(AttrValue),
    /// A relative value with its cached reference.
    Relative(RelativeValue),
}

impl StoredValue {
    /// Returns the value as it should appear in a serialized snapshot.
    ///
    /// Relative values serialize as their original string.
    #[must_use]
    pub fn to_raw(&self) -> AttrValue {
        match self {
            Self::Value(v) => v.clone(),
            Self::Relative(r) => AttrValue::String(r.raw.clone()),
        }
    }

    /// Returns the plain value, if this is not relative.
    #[must_use]
    pub fn as_value(&self) -> Option<&AttrValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::Relative(_) => None,
        }
    }

    /// Returns `true` for the `"inherit"` sentinel.
    #[must_use]
    pub fn is_inherit(&self) -> bool {
        self.as_value().is_some_and(AttrValue::is_inherit)
    }
}

#[derive(Clone, Debug)]
struct Entry {
    name: String,
    value: StoredValue,
    explicit: bool,
}

/// Per-node sparse storage for raw attribute values.
///
/// Besides the values, the store remembers which attributes were set
/// explicitly by callers, as opposed to being derived by coupled-attribute
/// rules. Derived writes leave an attribute non-explicit so it keeps following
/// the attribute it is derived from.
///
/// # Example
///
/// ```rust
/// use arbor_attr::{AttrStore, AttrValue, StoredValue};
///
/// let mut store = AttrStore::new();
/// assert!(store.set("width", StoredValue::Value(AttrValue::from(10.0)), true));
///
/// // Writing the same value again is not a change.
/// assert!(!store.set("width", StoredValue::Value(AttrValue::from(10.0)), true));
///
/// assert_eq!(store.value("width"), Some(&AttrValue::from(10.0)));
/// assert!(store.is_explicit("width"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct AttrStore {
    /// Entries sorted by name for binary search lookup.
    entries: SmallVec<[Entry; INLINE_CAPACITY]>,
}

impl AttrStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no attributes are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of stored attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn find(&self, name: &str) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|entry| entry.name.as_str().cmp(name))
    }

    /// Returns the stored value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StoredValue> {
        self.find(name).ok().map(|idx| &self.entries[idx].value)
    }

    /// Returns the stored value of `name` if it is a plain value.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&AttrValue> {
        self.get(name).and_then(StoredValue::as_value)
    }

    /// Returns `true` if `name` has a stored value.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_ok()
    }

    /// Returns `true` if `name` holds a value that a caller set explicitly.
    #[must_use]
    pub fn is_explicit(&self, name: &str) -> bool {
        self.find(name)
            .ok()
            .is_some_and(|idx| self.entries[idx].explicit)
    }

    /// Stores `value` under `name`.
    ///
    /// Writing [`AttrValue::Null`] removes the attribute. `explicit` records
    /// whether a caller chose this value; derived writes pass `false` and
    /// keep an existing explicit mark.
    ///
    /// Returns `true` if the stored value changed.
    pub fn set(&mut self, name: &str, value: StoredValue, explicit: bool) -> bool {
        if matches!(value, StoredValue::Value(AttrValue::Null)) {
            return self.remove(name).is_some();
        }
        match self.find(name) {
            Ok(idx) => {
                let entry = &mut self.entries[idx];
                entry.explicit |= explicit;
                if entry.value == value {
                    false
                } else {
                    entry.value = value;
                    true
                }
            }
            Err(idx) => {
                self.entries.insert(
                    idx,
                    Entry {
                        name: name.to_string(),
                        value,
                        explicit,
                    },
                );
                true
            }
        }
    }

    /// Removes `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<StoredValue> {
        self.find(name)
            .ok()
            .map(|idx| self.entries.remove(idx).value)
    }

    /// Iterates `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoredValue)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), &entry.value))
    }

    /// Returns a flat snapshot of the raw values.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, AttrValue> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.to_raw()))
            .collect()
    }
}

/// A lookup for walking ancestor chains during inheritance.
///
/// Given a node key, returns its [`AttrStore`] and its parent's key.
pub trait StoreLookup<'a, K: Copy + Eq + 'a> {
    /// Looks up the store and parent key for `key`.
    fn lookup(&self, key: K) -> Option<(&'a AttrStore, Option<K>)>;
}

impl<'a, K, F> StoreLookup<'a, K> for F
where
    K: Copy + Eq + 'a,
    F: Fn(K) -> Option<(&'a AttrStore, Option<K>)>,
{
    #[inline]
    fn lookup(&self, key: K) -> Option<(&'a AttrStore, Option<K>)> {
        self(key)
    }
}

/// Walks the ancestor chain looking for an inherited value.
///
/// Starting at `current_key` (typically the parent of the node being read),
/// returns the first ancestor that has its own value for `name`, together with
/// that ancestor's key. Ancestors whose value is itself the `"inherit"`
/// sentinel are skipped.
///
/// ```rust
/// use arbor_attr::{AttrStore, AttrValue, StoredValue, walk_inherited};
///
/// let mut root = AttrStore::new();
/// root.set("font", StoredValue::Value(AttrValue::from("20px serif")), true);
/// let mut middle = AttrStore::new();
/// middle.set("font", StoredValue::Value(AttrValue::from("inherit")), true);
///
/// let chain = |key: u32| match key {
///     1 => Some((&root, None)),
///     2 => Some((&middle, Some(1))),
///     _ => None,
/// };
///
/// let (owner, value) = walk_inherited(Some(2), "font", &chain).unwrap();
/// assert_eq!(owner, 1);
/// assert_eq!(value.as_value(), Some(&AttrValue::from("20px serif")));
/// ```
pub fn walk_inherited<'a, K, F>(
    mut current_key: Option<K>,
    name: &str,
    store_lookup: &F,
) -> Option<(K, &'a StoredValue)>
where
    K: Copy + Eq + 'a,
    F: StoreLookup<'a, K> + ?Sized,
{
    while let Some(key) = current_key {
        let (store, parent) = store_lookup.lookup(key)?;
        if let Some(value) = store.get(name)
            && !value.is_inherit()
        {
            return Some((key, value));
        }
        current_key = parent;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relative::{Axis, RelativeUnit};

    fn plain(v: impl Into<AttrValue>) -> StoredValue {
        StoredValue::Value(v.into())
    }

    #[test]
    fn entries_stay_sorted() {
        let mut store = AttrStore::new();
        store.set("z", plain(1), true);
        store.set("a", plain(2), true);
        store.set("m", plain(3), true);
        let names: alloc::vec::Vec<_> = store.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "m", "z"]);
    }

    #[test]
    fn null_removes() {
        let mut store = AttrStore::new();
        store.set("color", plain("red"), true);
        assert!(store.set("color", plain(AttrValue::Null), true));
        assert!(!store.contains("color"));
        assert!(!store.is_explicit("color"));
        // Removing something absent is not a change.
        assert!(!store.set("color", plain(AttrValue::Null), true));
    }

    #[test]
    fn derived_writes_keep_explicit_marks() {
        let mut store = AttrStore::new();
        store.set("fillColor", plain("blue"), false);
        assert!(!store.is_explicit("fillColor"));
        store.set("fillColor", plain("green"), true);
        assert!(store.is_explicit("fillColor"));
        store.set("fillColor", plain("red"), false);
        assert!(store.is_explicit("fillColor"));
    }

    #[test]
    fn snapshot_uses_raw_relative_strings() {
        let mut store = AttrStore::new();
        store.set(
            "width",
            StoredValue::Relative(RelativeValue {
                unit: RelativeUnit::Parent(Axis::Width),
                reference: Some(200.0),
                ratio: 0.5,
                raw: "50%".to_string(),
            }),
            true,
        );
        store.set("opacity", plain(0.5), true);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.get("width"), Some(&AttrValue::from("50%")));
        assert_eq!(snapshot.get("opacity"), Some(&AttrValue::from(0.5)));
    }

    #[test]
    fn walk_stops_at_missing_store() {
        let store = AttrStore::new();
        let chain = |key: u32| (key == 1).then_some((&store, Some(99)));
        assert!(walk_inherited(Some(1), "font", &chain).is_none());
    }
}
