// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamically typed attribute values.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

/// The sentinel string that asks an inheritable attribute to resolve from its ancestors.
pub const INHERIT: &str = "inherit";

/// A raw attribute value.
///
/// Attribute names are open-ended, so values are dynamically typed. The shape
/// mirrors what a flat serialization can carry; [`AttrValue::Null`] means
/// "no value" and removes an attribute when written.
///
/// ```rust
/// use arbor_attr::AttrValue;
///
/// assert_eq!(AttrValue::from(12.5).as_f64(), Some(12.5));
/// assert_eq!(AttrValue::from("12.5").as_f64(), Some(12.5));
/// assert!(AttrValue::from("inherit").is_inherit());
/// assert!(AttrValue::Null.is_null());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// No value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string, possibly carrying a unit suffix such as `50%` or `20rw`.
    String(String),
    /// An ordered list of values.
    List(Vec<AttrValue>),
    /// A nested map of values, used for bulk assignment.
    Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    /// Returns `true` for [`AttrValue::Null`].
    #[must_use]
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for the `"inherit"` sentinel.
    #[must_use]
    pub fn is_inherit(&self) -> bool {
        matches!(self, Self::String(s) if s.trim() == INHERIT)
    }

    /// Returns the value as a number.
    ///
    /// Numeric strings are parsed; strings with a trailing unit are not.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the value as a string slice, if it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a boolean, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the nested map, if this is a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Flattens a map, or a list of maps, into a single map.
    ///
    /// Later maps win over earlier ones. Anything that is not a map is skipped.
    #[must_use]
    pub fn flatten_maps(self) -> BTreeMap<String, Self> {
        match self {
            Self::Map(m) => m,
            Self::List(items) => {
                let mut out = BTreeMap::new();
                for item in items {
                    if let Self::Map(m) = item {
                        out.extend(m);
                    }
                }
                out
            }
            _ => BTreeMap::new(),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Map(_) => f.write_str("[map]"),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for AttrValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}
