// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `font` shorthand and its sub-properties.
//!
//! Setting a font sub-property such as `fontSize` re-derives the composite
//! `font` attribute: the current shorthand is parsed, the field is replaced and
//! the result is composed again as `style variant weight size family`.
//!
//! Only the shorthand grammar the attribute system needs is understood:
//! optional style, variant and weight keywords, a mandatory `<number><unit>`
//! size (an optional `/line-height` is dropped) and the remaining text as the
//! family list.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::error::FontError;
use crate::relative::leading_number;
use crate::value::AttrValue;

/// The shorthand used when a node has no font yet.
pub const DEFAULT_FONT: &str = "normal normal normal 16px Arial";

const STYLES: &[&str] = &["normal", "italic", "oblique"];
const VARIANTS: &[&str] = &["normal", "small-caps"];
const WEIGHTS: &[&str] = &[
    "normal", "bold", "bolder", "lighter", "100", "200", "300", "400", "500", "600", "700",
    "800", "900",
];

/// A font sub-property that has its own attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FontField {
    /// `fontStyle`.
    Style,
    /// `fontVariant`.
    Variant,
    /// `fontWeight`.
    Weight,
    /// `fontSize`.
    Size,
    /// `fontFamily`.
    Family,
}

impl FontField {
    /// Maps an attribute name to the field it controls.
    #[must_use]
    pub fn from_attr(name: &str) -> Option<Self> {
        Some(match name {
            "fontStyle" => Self::Style,
            "fontVariant" => Self::Variant,
            "fontWeight" => Self::Weight,
            "fontSize" => Self::Size,
            "fontFamily" => Self::Family,
            _ => return None,
        })
    }

    /// Returns the attribute name of the field.
    #[must_use]
    pub fn attr_name(self) -> &'static str {
        match self {
            Self::Style => "fontStyle",
            Self::Variant => "fontVariant",
            Self::Weight => "fontWeight",
            Self::Size => "fontSize",
            Self::Family => "fontFamily",
        }
    }
}

/// A parsed font shorthand.
///
/// ```rust
/// use arbor_attr::{AttrValue, FontField, FontSpec};
///
/// let mut font = FontSpec::parse("bold 12px Helvetica, sans-serif").unwrap();
/// assert_eq!(font.weight, "bold");
/// assert_eq!(font.size, 12.0);
///
/// font.apply(FontField::Size, &AttrValue::from(20)).unwrap();
/// assert_eq!(font.to_string(), "normal normal bold 20px Helvetica, sans-serif");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    /// `normal`, `italic` or `oblique`.
    pub style: String,
    /// `normal` or `small-caps`.
    pub variant: String,
    /// A weight keyword or number.
    pub weight: String,
    /// The numeric size.
    pub size: f64,
    /// The size unit, e.g. `px`.
    pub unit: String,
    /// The family list, verbatim.
    pub family: String,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            style: "normal".to_string(),
            variant: "normal".to_string(),
            weight: "normal".to_string(),
            size: 16.0,
            unit: "px".to_string(),
            family: "Arial".to_string(),
        }
    }
}

impl FontSpec {
    /// Parses a shorthand such as `italic bold 14px "Open Sans", serif`.
    pub fn parse(font: &str) -> Result<Self, FontError> {
        let mut spec = Self::default();
        let tokens: Vec<&str> = font.split_whitespace().collect();
        let numeric = |t: &str| t.starts_with(|c: char| c.is_ascii_digit() || c == '.');
        // A numeric weight is only a weight when a size still follows it.
        let size_at = (0..tokens.len())
            .find(|&i| {
                numeric(tokens[i])
                    && !(WEIGHTS.contains(&tokens[i])
                        && tokens.get(i + 1).is_some_and(|next| numeric(*next)))
            })
            .ok_or_else(|| FontError::MissingSize(font.to_string()))?;

        for keyword in &tokens[..size_at] {
            if *keyword == "normal" {
                continue;
            }
            if STYLES.contains(keyword) {
                spec.style = keyword.to_string();
            } else if VARIANTS.contains(keyword) {
                spec.variant = keyword.to_string();
            } else if WEIGHTS.contains(keyword) {
                spec.weight = keyword.to_string();
            }
        }

        let size_token = tokens[size_at].split('/').next().unwrap_or_default();
        let (size, unit) = split_size(size_token)
            .ok_or_else(|| FontError::MissingSize(font.to_string()))?;
        spec.size = size;
        spec.unit = unit.to_string();

        let family = tokens[size_at + 1..].join(" ");
        if family.is_empty() {
            return Err(FontError::MissingFamily(font.to_string()));
        }
        spec.family = family;
        Ok(spec)
    }

    /// Replaces one field with an attribute value.
    ///
    /// Unit-less sizes are taken as pixels.
    pub fn apply(&mut self, field: FontField, value: &AttrValue) -> Result<(), FontError> {
        let invalid = || FontError::InvalidField {
            field: field.attr_name(),
            value: value.to_string(),
        };
        let text = value.to_string();
        let text = text.trim();
        if value.is_null() || text.is_empty() {
            return Err(invalid());
        }
        match field {
            FontField::Style => self.style = text.to_string(),
            FontField::Variant => self.variant = text.to_string(),
            FontField::Weight => self.weight = text.to_string(),
            FontField::Family => self.family = text.to_string(),
            FontField::Size => {
                let (size, unit) = split_size(text).ok_or_else(invalid)?;
                self.size = size;
                self.unit = if unit.is_empty() { "px" } else { unit }.to_string();
            }
        }
        Ok(())
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}{} {}",
            self.style, self.variant, self.weight, self.size, self.unit, self.family
        )
    }
}

fn split_size(token: &str) -> Option<(f64, &str)> {
    let size = leading_number(token)?;
    let unit_at = token
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(token.len());
    Some((size, &token[unit_at..]))
}
