// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Relative units: percentages of an ancestor's content size and fractions of
//! the layer's output resolution.
//!
//! A relative attribute stores a [`RelativeValue`] instead of a plain number.
//! It remembers the reference it was resolved against; readers compare that
//! reference with the current one and re-apply [`RelativeValue::raw`] when they
//! differ. That comparison is the only invalidation mechanism.

use alloc::string::{String, ToString};

use crate::value::AttrValue;

/// The axis a relative attribute measures along.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal.
    Width,
    /// Vertical.
    Height,
}

/// What a relative value is measured against.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RelativeUnit {
    /// `%`: the nearest sized ancestor's content size on the axis.
    Parent(Axis),
    /// `rw` / `rh`: the owning layer's output resolution on the axis.
    Resolution(Axis),
}

/// A resolved relative value together with the data needed to re-resolve it.
#[derive(Clone, Debug, PartialEq)]
pub struct RelativeValue {
    /// What the value is measured against.
    pub unit: RelativeUnit,
    /// The reference size this value was last resolved against, if one was found.
    pub reference: Option<f64>,
    /// The fraction of the reference, e.g. `0.5` for `50%`.
    pub ratio: f64,
    /// The original string, e.g. `"50%"`.
    pub raw: String,
}

impl RelativeValue {
    /// Returns the absolute value, or `None` if no reference was available.
    #[must_use]
    pub fn resolved(&self) -> Option<f64> {
        self.reference.map(|r| r * self.ratio)
    }

    /// Returns `true` when `current` differs from the cached reference.
    #[must_use]
    pub fn is_stale(&self, current: Option<f64>) -> bool {
        self.reference != current
    }
}

/// Classifies a string as a relative value for an attribute declared on `axis`.
///
/// Returns the unit and the ratio, or `None` if the string carries no
/// relative suffix.
///
/// ```rust
/// use arbor_attr::{Axis, RelativeUnit, parse_relative};
///
/// assert_eq!(
///     parse_relative("50%", Axis::Width),
///     Some((RelativeUnit::Parent(Axis::Width), 0.5)),
/// );
/// assert_eq!(
///     parse_relative("25rh", Axis::Width),
///     Some((RelativeUnit::Resolution(Axis::Height), 0.25)),
/// );
/// assert_eq!(parse_relative("12", Axis::Width), None);
/// ```
#[must_use]
pub fn parse_relative(raw: &str, axis: Axis) -> Option<(RelativeUnit, f64)> {
    let raw = raw.trim();
    let unit = if raw.ends_with('%') {
        RelativeUnit::Parent(axis)
    } else if raw.ends_with("rw") {
        RelativeUnit::Resolution(Axis::Width)
    } else if raw.ends_with("rh") {
        RelativeUnit::Resolution(Axis::Height)
    } else {
        return None;
    };
    let number = leading_number(raw)?;
    Some((unit, number / 100.0))
}

/// The stored form of a value written to a relative attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum RelativeInput {
    /// A relative string, already resolved against `reference`.
    Relative(RelativeValue),
    /// Anything else, with numeric strings converted to numbers.
    Plain(AttrValue),
}

/// Normalizes a value written to a relative attribute.
///
/// `reference` is asked for the current reference size of a unit and may
/// return `None` when the node is not attached anywhere it could be measured.
pub fn normalize_relative(
    value: AttrValue,
    axis: Axis,
    reference: impl FnOnce(RelativeUnit) -> Option<f64>,
) -> RelativeInput {
    let AttrValue::String(s) = value else {
        return RelativeInput::Plain(value);
    };
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == crate::value::INHERIT {
        return RelativeInput::Plain(AttrValue::String(trimmed.to_string()));
    }
    if let Some((unit, ratio)) = parse_relative(trimmed, axis) {
        return RelativeInput::Relative(RelativeValue {
            unit,
            reference: reference(unit),
            ratio,
            raw: trimmed.to_string(),
        });
    }
    match leading_number(trimmed) {
        Some(n) => RelativeInput::Plain(AttrValue::Number(n)),
        None => RelativeInput::Plain(AttrValue::String(trimmed.to_string())),
    }
}

/// Parses the longest numeric prefix of `s`, ignoring any trailing unit.
pub(crate) fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .find(|&(i, c)| {
            !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+')))
        })
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().ok()
}
