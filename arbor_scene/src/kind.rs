// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node kinds: the class-level behavior shared by all nodes of one type.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use core::fmt;

use arbor_attr::{AttrTable, Axis};
use hashbrown::HashMap;
use kurbo::{Size, Vec2};

use crate::error::SceneError;
use crate::event::Event;
use crate::id::NodeId;
use crate::scene::Scene;
use crate::transition::{Transition, TransitionCx};

/// Behavior shared by every node of one type.
///
/// A kind is stateless: per-node state lives in the scene and is reached
/// through the `scene` and `node` arguments. Kinds are shared with `Rc` and
/// are typically registered once in [`NodeTypes`].
///
/// Every method except [`NodeKind::node_type`] and [`NodeKind::attrs`] has a
/// default suitable for a plain, unsized element.
pub trait NodeKind: fmt::Debug {
    /// The type name used in serialized nodes.
    fn node_type(&self) -> &str;

    /// The attribute declarations of this kind.
    fn attrs(&self) -> &AttrTable;

    /// Whether nodes of this kind hold children.
    fn is_container(&self) -> bool {
        false
    }

    /// Whether nodes of this kind are layers: roots that own an output
    /// resolution and a touch table.
    fn is_layer(&self) -> bool {
        false
    }

    /// Whether nodes of this kind count as elements for element-sibling
    /// queries.
    fn is_element(&self) -> bool {
        true
    }

    /// Tests whether the event's position lies within the node.
    ///
    /// Kinds that can be hit must override this; the default fails with
    /// [`SceneError::NotImplemented`].
    fn point_collision(
        &self,
        scene: &Scene,
        node: NodeId,
        event: &Event,
    ) -> Result<bool, SceneError> {
        let _ = (scene, node, event);
        Err(SceneError::NotImplemented {
            node_type: self.node_type().to_string(),
            operation: "point_collision",
        })
    }

    /// The node's content size along `axis`, or `None` when the node has no
    /// fixed size on that axis.
    ///
    /// Percentages of descendants resolve against the nearest ancestor that
    /// returns a size here.
    fn content_extent(&self, scene: &Scene, node: NodeId, axis: Axis) -> Option<f64> {
        let _ = (scene, node, axis);
        None
    }

    /// The node's outer box size, compared against the last layout size to
    /// decide whether a write invalidates layout.
    fn box_offset_size(&self, scene: &Scene, node: NodeId) -> Size {
        let _ = (scene, node);
        Size::ZERO
    }

    /// Offset from the node's parent space to the space of its children.
    fn content_offset(&self, scene: &Scene, node: NodeId) -> Vec2 {
        let _ = (scene, node);
        Vec2::ZERO
    }

    /// Whether the node currently paints anything.
    fn is_visible(&self, scene: &Scene, node: NodeId) -> bool {
        let _ = (scene, node);
        true
    }

    /// Whether the node takes part in its parent's layout.
    ///
    /// The default is `true` when the parent's `display` is `flex`.
    fn has_layout(&self, scene: &Scene, node: NodeId) -> bool {
        scene
            .parent(node)
            .and_then(|parent| scene.peek_attr(parent, "display").ok())
            .is_some_and(|display| display.as_str() == Some("flex"))
    }

    /// Re-runs text shaping after an inherited text attribute changed.
    ///
    /// The default does nothing.
    fn retypeset(&self, scene: &mut Scene, node: NodeId) {
        let _ = (scene, node);
    }

    /// Runs when the node is attached under a live layer.
    ///
    /// Return [`TransitionCx::defer`] to finish the attach later.
    fn enter(&self, cx: &mut TransitionCx<'_>) -> Transition {
        let _ = cx;
        Transition::Done
    }

    /// Runs before the node is detached.
    ///
    /// Return [`TransitionCx::defer`] to keep the node in place until the
    /// transition completes.
    fn exit(&self, cx: &mut TransitionCx<'_>) -> Transition {
        let _ = cx;
        Transition::Done
    }
}

/// Registry of node kinds by type name.
///
/// Used to create nodes by name and to rebuild them from a
/// [`SerializedNode`](crate::SerializedNode).
#[derive(Clone, Debug, Default)]
pub struct NodeTypes {
    kinds: HashMap<String, Rc<dyn NodeKind>>,
}

impl NodeTypes {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in kinds: `node`, `block`,
    /// `group`, `label` and `layer`.
    pub fn with_builtins() -> Result<Self, SceneError> {
        use crate::kinds::{BaseKind, Block, Group, Label, LayerKind};

        let mut types = Self::new();
        types.register(Rc::new(BaseKind::new()?));
        types.register(Rc::new(Block::new()?));
        types.register(Rc::new(Group::new()?));
        types.register(Rc::new(Label::new()?));
        types.register(Rc::new(LayerKind::new()?));
        Ok(types)
    }

    /// Registers `kind` under its type name, returning the kind it replaced.
    pub fn register(&mut self, kind: Rc<dyn NodeKind>) -> Option<Rc<dyn NodeKind>> {
        tracing::trace!(node_type = kind.node_type(), "registered node type");
        self.kinds.insert(kind.node_type().to_string(), kind)
    }

    /// Returns the kind registered under `node_type`.
    #[must_use]
    pub fn get(&self, node_type: &str) -> Option<&Rc<dyn NodeKind>> {
        self.kinds.get(node_type)
    }

    /// Returns `true` if `node_type` is registered.
    #[must_use]
    pub fn contains(&self, node_type: &str) -> bool {
        self.kinds.contains_key(node_type)
    }
}
