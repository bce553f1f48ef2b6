// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Class-level attribute tables.
//!
//! Every node kind owns one [`AttrTable`], built once when the kind is defined
//! and shared by all of its instances. A table maps attribute names to their
//! [`AttrMeta`]. Tables can extend the table of a parent kind.

use alloc::string::ToString;
use alloc::vec::Vec;
use hashbrown::HashMap;

use crate::error::ConfigError;
use crate::metadata::AttrMeta;
use crate::value::AttrValue;

/// The attribute declarations of one node kind.
///
/// # Example
///
/// ```rust
/// use arbor_attr::{AttrMetaBuilder, AttrTable, AttrValue};
///
/// let base = AttrTable::builder()
///     .define("opacity", AttrMetaBuilder::new(1.0).build())
///     .build()
///     .unwrap();
///
/// let derived = AttrTable::extend(&base)
///     .define("opacity", AttrMetaBuilder::new(0.5).build())
///     .define("text", AttrMetaBuilder::new("").build())
///     .build()
///     .unwrap();
///
/// assert_eq!(base.default_value("opacity"), Some(&AttrValue::from(1.0)));
/// assert_eq!(derived.default_value("opacity"), Some(&AttrValue::from(0.5)));
/// assert!(derived.contains("text"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct AttrTable {
    entries: HashMap<&'static str, AttrMeta>,
    order: Vec<&'static str>,
}

impl AttrTable {
    /// Starts an empty table.
    #[must_use]
    pub fn builder() -> AttrTableBuilder {
        AttrTableBuilder {
            table: Self::default(),
            error: None,
        }
    }

    /// Starts a table that inherits every declaration of `parent`.
    #[must_use]
    pub fn extend(parent: &Self) -> AttrTableBuilder {
        AttrTableBuilder {
            table: parent.clone(),
            error: None,
        }
    }

    /// Returns the declaration of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttrMeta> {
        self.entries.get(name)
    }

    /// Returns `true` if `name` is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the class-level default of `name`.
    #[must_use]
    pub fn default_value(&self, name: &str) -> Option<&AttrValue> {
        self.get(name).map(AttrMeta::default_value)
    }

    /// Returns the inherited fallback of `name`, if it is inheritable.
    #[must_use]
    pub fn inherit_default(&self, name: &str) -> Option<&AttrValue> {
        self.get(name).and_then(AttrMeta::inherit_default)
    }

    /// Returns the declared names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }

    /// Returns the number of declared attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Builder for [`AttrTable`].
///
/// Declaration errors are remembered and reported by [`AttrTableBuilder::build`],
/// so declarations can be chained.
#[derive(Debug)]
pub struct AttrTableBuilder {
    table: AttrTable,
    error: Option<ConfigError>,
}

impl AttrTableBuilder {
    /// Declares `name`.
    ///
    /// Redeclaring an attribute replaces its metadata, unless the existing
    /// declaration is shared.
    #[must_use]
    pub fn define(mut self, name: &'static str, meta: AttrMeta) -> Self {
        if self.error.is_some() {
            return self;
        }
        if let Err(err) = self.check(name, &meta) {
            tracing::warn!(attr = name, %err, "rejected attribute declaration");
            self.error = Some(err);
            return self;
        }
        if self.table.entries.insert(name, meta).is_none() {
            self.table.order.push(name);
        }
        self
    }

    fn check(&self, name: &'static str, meta: &AttrMeta) -> Result<(), ConfigError> {
        use crate::metadata::AttrFlags;

        let effects = AttrFlags::CACHE | AttrFlags::REFLOW | AttrFlags::RELAYOUT;
        if meta.is_quiet() && meta.flags().intersects(effects) {
            return Err(ConfigError::QuietConflict {
                name: name.to_string(),
            });
        }
        if self.table.get(name).is_some_and(AttrMeta::is_shared) {
            return Err(ConfigError::SharedDefault {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Builds the table, or returns the first declaration error.
    pub fn build(self) -> Result<AttrTable, ConfigError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.table),
        }
    }
}
