// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene-wide settings.

use alloc::string::{String, ToString};

use arbor_attr::DEFAULT_FONT;
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Settings shared by every node of a [`Scene`](crate::Scene).
///
/// The configuration can be built in code with [`SceneConfig::builder`] or
/// deserialized; missing fields take their defaults.
///
/// ```rust
/// use arbor_scene::SceneConfig;
/// use kurbo::Size;
///
/// let config = SceneConfig::builder()
///     .default_font("normal normal normal 12px Menlo")
///     .default_resolution(Size::new(800.0, 600.0))
///     .build();
/// assert_eq!(config.resolution(), Size::new(800.0, 600.0));
/// assert!(config.clear_touches);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneConfig {
    /// The font shorthand used when a font sub-property is set on a node
    /// that has no font of its own.
    pub default_font: String,
    /// The output resolution of new layers, `[width, height]`.
    pub default_resolution: [f64; 2],
    /// Whether layers forget a touch identifier after `touchend` or
    /// `touchcancel` has been delivered.
    #[serde(skip_serializing_if = "is_true")]
    pub clear_touches: bool,
}

const fn is_true(b: &bool) -> bool {
    *b
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            default_font: DEFAULT_FONT.to_string(),
            default_resolution: [300.0, 150.0],
            clear_touches: true,
        }
    }
}

impl SceneConfig {
    /// Starts a builder from the defaults.
    #[must_use]
    pub fn builder() -> SceneConfigBuilder {
        SceneConfigBuilder {
            config: Self::default(),
        }
    }

    /// Returns the default layer resolution as a size.
    #[must_use]
    pub fn resolution(&self) -> Size {
        Size::new(self.default_resolution[0], self.default_resolution[1])
    }
}

/// Builder for [`SceneConfig`].
#[derive(Clone, Debug)]
pub struct SceneConfigBuilder {
    config: SceneConfig,
}

impl SceneConfigBuilder {
    /// Sets the fallback font shorthand.
    #[must_use]
    pub fn default_font(mut self, font: impl Into<String>) -> Self {
        self.config.default_font = font.into();
        self
    }

    /// Sets the resolution of new layers.
    #[must_use]
    pub fn default_resolution(mut self, size: Size) -> Self {
        self.config.default_resolution = [size.width, size.height];
        self
    }

    /// Sets whether finished touches are forgotten by layers.
    #[must_use]
    pub fn clear_touches(mut self, clear: bool) -> Self {
        self.config.clear_touches = clear;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> SceneConfig {
        self.config
    }
}
