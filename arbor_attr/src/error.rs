// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while declaring attribute tables or parsing font shorthands.

use alloc::string::String;

/// An attribute declaration that cannot be accepted into an [`AttrTable`](crate::AttrTable).
///
/// These are raised when a table is built, which happens once per node kind.
/// They indicate a programming error in the kind's declaration and are not
/// expected to be recovered from at runtime.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A shared attribute was declared again after it was first registered.
    #[error("cannot reset the default value of shared attribute `{name}`")]
    SharedDefault {
        /// The attribute name.
        name: String,
    },
    /// An attribute was declared quiet together with a side-effect flag.
    #[error("`{name}`: a quiet attribute cannot enable cache, reflow or relayout")]
    QuietConflict {
        /// The attribute name.
        name: String,
    },
}

/// A font shorthand that could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FontError {
    /// No `<number><unit>` size token was found.
    #[error("font `{0}` has no size")]
    MissingSize(String),
    /// Nothing followed the size token.
    #[error("font `{0}` has no family")]
    MissingFamily(String),
    /// The value given for a font field has the wrong shape.
    #[error("invalid value `{value}` for font field `{field}`")]
    InvalidField {
        /// The attribute name of the field, e.g. `fontSize`.
        field: &'static str,
        /// The rejected value, rendered as text.
        value: String,
    },
}
