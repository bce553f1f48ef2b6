// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbor Attr: per-node attribute storage for retained scene graphs.
//!
//! This crate provides the tree-agnostic half of an attribute system: the
//! class-level declarations of attributes and the per-node storage of their
//! raw values. Resolving values against a tree (defaults, relative units,
//! inheritance) and running the side effects of a write are done by the tree
//! owner, e.g. `arbor_scene`.
//!
//! ## Core Concepts
//!
//! ### Declarations
//!
//! An [`AttrTable`] belongs to a node kind and maps attribute names to
//! [`AttrMeta`]: a default value plus [`AttrFlags`] describing what a write
//! invalidates, an optional relative [`Axis`] and an optional inherited
//! fallback.
//!
//! - **cache** - writes keep the render cache
//! - **reflow** - writes schedule a reflow
//! - **relayout** - writes always clear the parent's layout
//! - **quiet** - writes only store the value
//! - **share** - one slot across a kind hierarchy, cannot be redeclared
//!
//! ### Storage
//!
//! [`AttrStore`] holds the values a node set itself, sparse and sorted by
//! name. It also records which values were set explicitly, as opposed to
//! derived by a coupled-attribute rule.
//!
//! ### Relative units
//!
//! Strings ending in `%`, `rw` or `rh` written to a relative attribute become
//! a [`RelativeValue`] that caches the reference it was resolved against. See
//! [`normalize_relative`].
//!
//! ## Quick Start
//!
//! ```rust
//! use arbor_attr::{
//!     AttrMetaBuilder, AttrStore, AttrTable, AttrValue, Axis, RelativeInput, StoredValue,
//!     normalize_relative,
//! };
//!
//! let table = AttrTable::builder()
//!     .define("width", AttrMetaBuilder::new("").relative(Axis::Width).relayout().build())
//!     .define("opacity", AttrMetaBuilder::new(1.0).cache().build())
//!     .build()
//!     .unwrap();
//!
//! let mut store = AttrStore::new();
//! let axis = table.get("width").and_then(|meta| meta.relative()).unwrap();
//! let input = normalize_relative(AttrValue::from("50%"), axis, |_| Some(300.0));
//! let RelativeInput::Relative(rel) = input else { unreachable!() };
//! assert_eq!(rel.resolved(), Some(150.0));
//! store.set("width", StoredValue::Relative(rel), true);
//!
//! // Unset attributes read as the class default.
//! let opacity = store.value("opacity").or(table.default_value("opacity"));
//! assert_eq!(opacity, Some(&AttrValue::from(1.0)));
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod error;
mod font;
mod metadata;
mod relative;
mod store;
mod table;
mod value;

pub use error::{ConfigError, FontError};
pub use font::{DEFAULT_FONT, FontField, FontSpec};
pub use metadata::{AttrFlags, AttrMeta, AttrMetaBuilder};
pub use relative::{Axis, RelativeInput, RelativeUnit, RelativeValue, normalize_relative, parse_relative};
pub use store::{AttrStore, StoreLookup, StoredValue, walk_inherited};
pub use table::{AttrTable, AttrTableBuilder};
pub use value::{AttrValue, INHERIT};
