// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in node kinds.
//!
//! | Type    | Container | Hit test                     |
//! |---------|-----------|------------------------------|
//! | `node`  | no        | not implemented              |
//! | `block` | no        | its box                      |
//! | `label` | no        | its box; retypesets on text attribute changes |
//! | `group` | yes       | its box, or any child when unsized |
//! | `layer` | yes       | its resolution               |

use arbor_attr::{AttrMetaBuilder, AttrTable, AttrValue, Axis, ConfigError, DEFAULT_FONT};
use kurbo::{Point, Rect, Size, Vec2};

use crate::error::SceneError;
use crate::event::Event;
use crate::id::NodeId;
use crate::kind::NodeKind;
use crate::node::Dirty;
use crate::scene::Scene;

/// Attribute backing the hover visual state.
pub const HOVER_ATTR: &str = "__internal_state_hover_";
/// Attribute backing the active visual state.
pub const ACTIVE_ATTR: &str = "__internal_state_active_";

/// Declarations every node has.
pub fn base_table() -> Result<AttrTable, ConfigError> {
    AttrTable::builder()
        .define("id", AttrMetaBuilder::new(AttrValue::Null).share().build())
        .define("name", AttrMetaBuilder::new(AttrValue::Null).share().build())
        .define("class", AttrMetaBuilder::new(AttrValue::Null).share().build())
        .define(HOVER_ATTR, AttrMetaBuilder::new(AttrValue::Null).build())
        .define(ACTIVE_ATTR, AttrMetaBuilder::new(AttrValue::Null).build())
        .build()
}

/// Declarations of boxed nodes: position, size, insets, paint and the
/// inherited text attributes.
pub fn block_table() -> Result<AttrTable, ConfigError> {
    AttrTable::extend(&base_table()?)
        .define("x", AttrMetaBuilder::new(0).relative(Axis::Width).build())
        .define("y", AttrMetaBuilder::new(0).relative(Axis::Height).build())
        .define(
            "width",
            AttrMetaBuilder::new("").relative(Axis::Width).relayout().build(),
        )
        .define(
            "height",
            AttrMetaBuilder::new("").relative(Axis::Height).relayout().build(),
        )
        .define("padding", AttrMetaBuilder::new(0).relayout().build())
        .define("borderWidth", AttrMetaBuilder::new(0).relayout().build())
        .define("display", AttrMetaBuilder::new("").relayout().build())
        .define("opacity", AttrMetaBuilder::new(1).cache().build())
        .define("fillColor", AttrMetaBuilder::new(AttrValue::Null).build())
        .define(
            "color",
            AttrMetaBuilder::new("inherit").inherit("rgba(0,0,0,1)").build(),
        )
        .define(
            "font",
            AttrMetaBuilder::new("inherit").inherit(DEFAULT_FONT).build(),
        )
        .define("fontStyle", AttrMetaBuilder::new(AttrValue::Null).build())
        .define("fontVariant", AttrMetaBuilder::new(AttrValue::Null).build())
        .define("fontWeight", AttrMetaBuilder::new(AttrValue::Null).build())
        .define("fontSize", AttrMetaBuilder::new(AttrValue::Null).build())
        .define("fontFamily", AttrMetaBuilder::new(AttrValue::Null).build())
        .define("lineHeight", AttrMetaBuilder::new("inherit").inherit("").build())
        .define("letterSpacing", AttrMetaBuilder::new("inherit").inherit(0).build())
        .define("textIndent", AttrMetaBuilder::new(0).reflow().build())
        .define("wordBreak", AttrMetaBuilder::new("normal").reflow().build())
        .define("lineBreak", AttrMetaBuilder::new("").reflow().build())
        .build()
}

fn number(scene: &Scene, node: NodeId, name: &str) -> f64 {
    scene
        .peek_attr(node, name)
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

/// A size attribute; empty or non-numeric values are flexible.
fn extent(scene: &Scene, node: NodeId, name: &str) -> Option<f64> {
    scene.peek_attr(node, name).ok().and_then(|v| v.as_f64())
}

fn insets(scene: &Scene, node: NodeId) -> f64 {
    number(scene, node, "padding") + number(scene, node, "borderWidth")
}

fn block_extent(scene: &Scene, node: NodeId, axis: Axis) -> Option<f64> {
    let name = match axis {
        Axis::Width => "width",
        Axis::Height => "height",
    };
    extent(scene, node, name).map(|size| (size - 2.0 * insets(scene, node)).max(0.0))
}

fn block_size(scene: &Scene, node: NodeId) -> Size {
    Size::new(
        extent(scene, node, "width").unwrap_or(0.0),
        extent(scene, node, "height").unwrap_or(0.0),
    )
}

fn block_offset(scene: &Scene, node: NodeId) -> Vec2 {
    let inset = insets(scene, node);
    Vec2::new(
        number(scene, node, "x") + inset,
        number(scene, node, "y") + inset,
    )
}

fn block_visible(scene: &Scene, node: NodeId) -> bool {
    let hidden = scene
        .peek_attr(node, "display")
        .is_ok_and(|d| d.as_str() == Some("none"));
    !hidden && number(scene, node, "opacity") > 0.0
}

/// The box of a block-like node in layer coordinates.
#[must_use]
pub fn block_bounds(scene: &Scene, node: NodeId) -> Rect {
    let origin = Point::ZERO
        + scene.origin_of(node)
        + Vec2::new(number(scene, node, "x"), number(scene, node, "y"));
    Rect::from_origin_size(origin, block_size(scene, node))
}

/// Hit test against [`block_bounds`].
pub fn rect_collision(scene: &Scene, node: NodeId, event: &Event) -> Result<bool, SceneError> {
    if !scene.is_alive(node) {
        return Err(SceneError::StaleNode(node));
    }
    Ok(event
        .position
        .is_some_and(|p| block_bounds(scene, node).contains(p)))
}

macro_rules! kind_with_table {
    ($(#[$meta:meta])* $name:ident, $node_type:literal, $table:expr) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            attrs: AttrTable,
        }

        impl $name {
            /// Builds the kind and its attribute table.
            pub fn new() -> Result<Self, ConfigError> {
                Ok(Self { attrs: $table? })
            }

            /// The type name of this kind.
            pub const NODE_TYPE: &'static str = $node_type;
        }
    };
}

kind_with_table!(
    /// The plain node: attributes, data and listeners, but no geometry.
    BaseKind,
    "node",
    base_table()
);

kind_with_table!(
    /// A rectangular element.
    Block,
    "block",
    block_table()
);

kind_with_table!(
    /// A block holding text; text attribute changes mark it for reflow.
    Label,
    "label",
    AttrTable::extend(&block_table()?)
        .define("text", AttrMetaBuilder::new("").reflow().build())
        .build()
);

kind_with_table!(
    /// A block-like container.
    Group,
    "group",
    block_table()
);

kind_with_table!(
    /// The attachment root: owns the output resolution and the touch table.
    LayerKind,
    "layer",
    AttrTable::extend(&base_table()?)
        .define("display", AttrMetaBuilder::new("").relayout().build())
        .build()
);

impl NodeKind for BaseKind {
    fn node_type(&self) -> &str {
        Self::NODE_TYPE
    }

    fn attrs(&self) -> &AttrTable {
        &self.attrs
    }
}

impl NodeKind for Block {
    fn node_type(&self) -> &str {
        Self::NODE_TYPE
    }

    fn attrs(&self) -> &AttrTable {
        &self.attrs
    }

    fn point_collision(
        &self,
        scene: &Scene,
        node: NodeId,
        event: &Event,
    ) -> Result<bool, SceneError> {
        rect_collision(scene, node, event)
    }

    fn content_extent(&self, scene: &Scene, node: NodeId, axis: Axis) -> Option<f64> {
        block_extent(scene, node, axis)
    }

    fn box_offset_size(&self, scene: &Scene, node: NodeId) -> Size {
        block_size(scene, node)
    }

    fn content_offset(&self, scene: &Scene, node: NodeId) -> Vec2 {
        block_offset(scene, node)
    }

    fn is_visible(&self, scene: &Scene, node: NodeId) -> bool {
        block_visible(scene, node)
    }
}

impl NodeKind for Label {
    fn node_type(&self) -> &str {
        Self::NODE_TYPE
    }

    fn attrs(&self) -> &AttrTable {
        &self.attrs
    }

    fn point_collision(
        &self,
        scene: &Scene,
        node: NodeId,
        event: &Event,
    ) -> Result<bool, SceneError> {
        rect_collision(scene, node, event)
    }

    fn content_extent(&self, scene: &Scene, node: NodeId, axis: Axis) -> Option<f64> {
        block_extent(scene, node, axis)
    }

    fn box_offset_size(&self, scene: &Scene, node: NodeId) -> Size {
        block_size(scene, node)
    }

    fn content_offset(&self, scene: &Scene, node: NodeId) -> Vec2 {
        block_offset(scene, node)
    }

    fn is_visible(&self, scene: &Scene, node: NodeId) -> bool {
        block_visible(scene, node)
    }

    fn retypeset(&self, scene: &mut Scene, node: NodeId) {
        scene.mark_dirty(node, Dirty::REFLOW);
        scene.force_update(node);
    }
}

impl NodeKind for Group {
    fn node_type(&self) -> &str {
        Self::NODE_TYPE
    }

    fn attrs(&self) -> &AttrTable {
        &self.attrs
    }

    fn is_container(&self) -> bool {
        true
    }

    fn point_collision(
        &self,
        scene: &Scene,
        node: NodeId,
        event: &Event,
    ) -> Result<bool, SceneError> {
        if extent(scene, node, "width").is_some() && extent(scene, node, "height").is_some() {
            return rect_collision(scene, node, event);
        }
        // Unsized groups are as large as their children.
        for &child in scene.sorted_children(node) {
            if let Some(kind) = scene.kind(child)
                && kind.point_collision(scene, child, event)?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn content_extent(&self, scene: &Scene, node: NodeId, axis: Axis) -> Option<f64> {
        block_extent(scene, node, axis)
    }

    fn box_offset_size(&self, scene: &Scene, node: NodeId) -> Size {
        block_size(scene, node)
    }

    fn content_offset(&self, scene: &Scene, node: NodeId) -> Vec2 {
        block_offset(scene, node)
    }

    fn is_visible(&self, scene: &Scene, node: NodeId) -> bool {
        block_visible(scene, node)
    }
}

impl NodeKind for LayerKind {
    fn node_type(&self) -> &str {
        Self::NODE_TYPE
    }

    fn attrs(&self) -> &AttrTable {
        &self.attrs
    }

    fn is_container(&self) -> bool {
        true
    }

    fn is_layer(&self) -> bool {
        true
    }

    fn point_collision(
        &self,
        scene: &Scene,
        node: NodeId,
        event: &Event,
    ) -> Result<bool, SceneError> {
        let resolution = scene.resolution(node).ok_or(SceneError::NotALayer(node))?;
        Ok(event
            .position
            .is_none_or(|p| resolution.to_rect().contains(p)))
    }

    fn content_extent(&self, scene: &Scene, node: NodeId, axis: Axis) -> Option<f64> {
        let resolution = scene.resolution(node)?;
        Some(match axis {
            Axis::Width => resolution.width,
            Axis::Height => resolution.height,
        })
    }

    fn has_layout(&self, _scene: &Scene, _node: NodeId) -> bool {
        false
    }
}
