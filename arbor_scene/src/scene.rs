// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The node arena and structural queries.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use arbor_attr::Axis;
use hashbrown::HashMap;
use kurbo::{Size, Vec2};

use crate::attrs::DeferredTarget;
use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::id::{DeferredId, ListenerId, NodeId, TransitionId};
use crate::kind::{NodeKind, NodeTypes};
use crate::node::{LayerState, Node};
use crate::style::{NoStyle, StyleEngine};
use crate::transition::PendingTransition;

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// A retained scene: an arena of nodes plus the scene-wide services they use.
///
/// All operations run to completion synchronously. The only suspension points
/// are node kinds' enter and exit hooks, see [`crate::transition`].
///
/// ```rust
/// use arbor_scene::Scene;
///
/// let mut scene = Scene::with_builtins().unwrap();
/// let layer = scene.create_layer().unwrap();
/// let a = scene.create_node("block").unwrap();
/// let b = scene.create_node("block").unwrap();
/// scene.append(layer, &[a, b]).unwrap();
///
/// assert_eq!(scene.children(layer), &[a, b]);
/// assert_eq!(scene.z_order(b), Some(1));
/// assert_eq!(scene.layer_of(b), Some(layer));
/// assert_eq!(scene.next_sibling(a), Some(b));
/// ```
pub struct Scene {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    types: NodeTypes,
    pub(crate) config: SceneConfig,
    pub(crate) style_engine: Rc<dyn StyleEngine>,
    pub(crate) transitions: HashMap<TransitionId, PendingTransition>,
    pub(crate) next_transition: u32,
    pub(crate) deferred: HashMap<DeferredId, DeferredTarget>,
    pub(crate) next_deferred: u32,
    next_listener: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(NodeTypes::new(), SceneConfig::default())
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.slots.iter().filter(|s| s.node.is_some()).count())
            .field("transitions", &self.transitions.len())
            .field("config", &self.config)
            .field("style_engine", &self.style_engine)
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Creates a scene creating nodes from `types`.
    #[must_use]
    pub fn new(types: NodeTypes, config: SceneConfig) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            types,
            config,
            style_engine: Rc::new(NoStyle),
            transitions: HashMap::new(),
            next_transition: 0,
            deferred: HashMap::new(),
            next_deferred: 0,
            next_listener: 0,
        }
    }

    /// Creates a scene with the built-in node types and default settings.
    pub fn with_builtins() -> Result<Self, SceneError> {
        Ok(Self::new(NodeTypes::with_builtins()?, SceneConfig::default()))
    }

    /// Returns the scene settings.
    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Returns the node type registry.
    #[must_use]
    pub fn types(&self) -> &NodeTypes {
        &self.types
    }

    /// Returns the node type registry for registering kinds.
    pub fn types_mut(&mut self) -> &mut NodeTypes {
        &mut self.types
    }

    /// Replaces the style engine.
    pub fn set_style_engine(&mut self, engine: Rc<dyn StyleEngine>) {
        self.style_engine = engine;
    }

    /// Returns the style engine.
    #[must_use]
    pub fn style_engine(&self) -> &Rc<dyn StyleEngine> {
        &self.style_engine
    }

    /// Creates a detached node of `kind`.
    ///
    /// Layer kinds start with the configured default resolution.
    pub fn create(&mut self, kind: Rc<dyn NodeKind>) -> NodeId {
        let mut node = Node::new(kind);
        if node.kind.is_layer() {
            node.layer = Some(LayerState::new(self.config.resolution()));
        }
        let id = if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(node);
            NodeId::new(idx, slot.generation)
        } else {
            let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 1,
                node: Some(node),
            });
            NodeId::new(idx, 1)
        };
        tracing::trace!(?id, "created node");
        id
    }

    /// Creates a detached node of the kind registered as `node_type`.
    pub fn create_node(&mut self, node_type: &str) -> Result<NodeId, SceneError> {
        let kind = self
            .types
            .get(node_type)
            .cloned()
            .ok_or_else(|| SceneError::UnknownNodeType(node_type.into()))?;
        Ok(self.create(kind))
    }

    /// Creates a layer with the configured default resolution.
    pub fn create_layer(&mut self) -> Result<NodeId, SceneError> {
        let resolution = self.config.resolution();
        self.create_layer_with(resolution)
    }

    /// Creates a layer with the given output resolution.
    pub fn create_layer_with(&mut self, resolution: Size) -> Result<NodeId, SceneError> {
        let id = self.create_node("layer")?;
        self.node_mut(id)?.layer = Some(LayerState::new(resolution));
        Ok(id)
    }

    /// Detaches `node` and frees it together with its subtree.
    ///
    /// Pending transitions of the freed nodes are dropped without running
    /// their continuations, together with their touch claims and deferred
    /// writes.
    pub fn destroy(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.node(node)?;
        if let Some(parent) = self.parent(node) {
            let removed = self.remove_child(parent, node)?;
            if let Some(id) = removed.transition()
                && self.is_pending(id)
            {
                self.resolve_transition(id)?;
            }
            if self.parent(node) == Some(parent) {
                self.disconnect(node, parent)?;
            }
        }
        let mut doomed = self.descendants(node);
        doomed.push(node);
        for &id in &doomed {
            let slot = &mut self.slots[id.idx()];
            slot.node = None;
            self.free_list.push(id.0);
        }
        for layer in self.slots.iter_mut().filter_map(|s| s.node.as_mut()?.layer.as_mut()) {
            layer.touches.retain(|_, claims| {
                claims.retain(|claim| !doomed.contains(&*claim));
                !claims.is_empty()
            });
        }
        self.deferred.retain(|_, target| !doomed.contains(&target.node()));
        let slots = &self.slots;
        self.transitions.retain(|_, t| {
            slots
                .get(t.node.idx())
                .is_some_and(|s| s.generation == t.node.generation() && s.node.is_some())
        });
        tracing::debug!(?node, "destroyed node");
        Ok(())
    }

    /// Returns `true` if `node` refers to a live node.
    #[must_use]
    pub fn is_alive(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    /// Returns the node behind `id`.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.get(id).ok_or(SceneError::StaleNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.get_mut(id).ok_or(SceneError::StaleNode(id))
    }

    pub(crate) fn kind_rc(&self, id: NodeId) -> Result<Rc<dyn NodeKind>, SceneError> {
        self.node(id).map(|n| Rc::clone(&n.kind))
    }

    pub(crate) fn next_listener_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        id
    }

    /// Returns the kind of `node`.
    #[must_use]
    pub fn kind(&self, node: NodeId) -> Option<&Rc<dyn NodeKind>> {
        self.get(node).map(|n| &n.kind)
    }

    /// Returns the type name of `node`.
    #[must_use]
    pub fn node_type(&self, node: NodeId) -> Option<&str> {
        self.get(node).map(|n| n.kind.node_type())
    }

    /// Returns the parent of `node`.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|n| n.parent)
    }

    /// Returns the z-order of `node`'s current attachment.
    #[must_use]
    pub fn z_order(&self, node: NodeId) -> Option<i64> {
        self.get(node).and_then(|n| n.z_order)
    }

    /// Returns the children of `node` in insertion order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Returns the children of `node` in painting order.
    #[must_use]
    pub fn sorted_children(&self, node: NodeId) -> &[NodeId] {
        self.get(node)
            .map(|n| n.sorted.as_slice())
            .unwrap_or_default()
    }

    /// Returns the children of `node` whose kind counts as an element.
    #[must_use]
    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|&c| self.kind(c).is_some_and(|k| k.is_element()))
            .collect()
    }

    fn near_by(&self, node: NodeId, distance: isize, element: bool) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = if element {
            self.element_children(parent)
        } else {
            self.children(parent).to_vec()
        };
        let idx = siblings.iter().position(|&s| s == node)?;
        let target = idx.checked_add_signed(distance)?;
        siblings.get(target).copied()
    }

    /// The next child of `node`'s parent.
    #[must_use]
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.near_by(node, 1, false)
    }

    /// The previous child of `node`'s parent.
    #[must_use]
    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.near_by(node, -1, false)
    }

    /// The next element child of `node`'s parent.
    #[must_use]
    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.near_by(node, 1, true)
    }

    /// The previous element child of `node`'s parent.
    #[must_use]
    pub fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.near_by(node, -1, true)
    }

    /// Iterates the ancestors of `node`, nearest first.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        core::iter::successors(self.parent(node), |&n| self.parent(n))
    }

    /// Returns `true` if `node` is `ancestor` or one of its descendants.
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.is_alive(node) && (node == ancestor || self.ancestors(node).any(|a| a == ancestor))
    }

    /// Returns every descendant of `node` in pre-order.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Returns the layer `node` is attached under; a layer is its own layer.
    #[must_use]
    pub fn layer_of(&self, node: NodeId) -> Option<NodeId> {
        core::iter::once(node)
            .chain(self.ancestors(node))
            .find(|&n| self.get(n).is_some_and(Node::is_layer))
    }

    /// Returns `true` if `node` is reachable from a layer.
    #[must_use]
    pub fn is_live(&self, node: NodeId) -> bool {
        self.layer_of(node).is_some()
    }

    /// Returns the output resolution of a layer.
    #[must_use]
    pub fn resolution(&self, layer: NodeId) -> Option<Size> {
        self.get(layer)?.layer.as_ref().map(|l| l.resolution)
    }

    /// Changes the output resolution of a layer.
    ///
    /// Resolution-relative attributes below the layer re-resolve on their
    /// next read.
    pub fn set_resolution(&mut self, layer: NodeId, resolution: Size) -> Result<(), SceneError> {
        let state = self
            .node_mut(layer)?
            .layer
            .as_mut()
            .ok_or(SceneError::NotALayer(layer))?;
        state.resolution = resolution;
        self.force_update(layer);
        Ok(())
    }

    /// Returns the nodes that claimed touch `identifier` on the layer.
    #[must_use]
    pub fn touch_claims(&self, layer: NodeId, identifier: i64) -> &[NodeId] {
        self.get(layer)
            .and_then(|n| n.layer.as_ref())
            .and_then(|l| l.touches.get(&identifier))
            .map(|claims| claims.as_slice())
            .unwrap_or_default()
    }

    /// Sum of the content offsets of `node`'s ancestors: the translation
    /// from `node`'s parent space to layer coordinates.
    #[must_use]
    pub fn origin_of(&self, node: NodeId) -> Vec2 {
        self.ancestors(node)
            .filter_map(|a| self.kind(a).map(|k| k.content_offset(self, a)))
            .fold(Vec2::ZERO, |acc, offset| acc + offset)
    }

    /// The reference size a `%` value on `axis` resolves against: the
    /// content size of the nearest sized ancestor, or the layer resolution.
    pub(crate) fn parent_extent(&self, node: NodeId, axis: Axis) -> Option<f64> {
        for ancestor in self.ancestors(node) {
            let slot = self.get(ancestor)?;
            if let Some(layer) = &slot.layer {
                return Some(match axis {
                    Axis::Width => layer.resolution.width,
                    Axis::Height => layer.resolution.height,
                });
            }
            if let Some(extent) = slot.kind.content_extent(self, ancestor, axis) {
                return Some(extent);
            }
        }
        None
    }

    /// Stably re-sorts `parent`'s children by z-order.
    pub(crate) fn resort(&mut self, parent: NodeId) {
        let Some(children) = self.get(parent).map(|n| n.children.clone()) else {
            return;
        };
        let mut sorted = children;
        sorted.sort_by_key(|&c| self.z_order(c).unwrap_or(i64::MAX));
        if let Some(node) = self.get_mut(parent) {
            node.sorted = sorted;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::Point;

    use super::*;
    use crate::event::{Event, Touch};

    #[test]
    fn slots_are_reused_with_new_generation() {
        let mut scene = Scene::with_builtins().unwrap();
        let a = scene.create_node("block").unwrap();
        scene.destroy(a).unwrap();
        assert!(!scene.is_alive(a));
        let b = scene.create_node("block").unwrap();
        assert_eq!(a.idx(), b.idx());
        assert_ne!(a, b);
        assert!(scene.is_alive(b));
    }

    #[test]
    fn unknown_types_are_errors() {
        let mut scene = Scene::with_builtins().unwrap();
        assert!(matches!(
            scene.create_node("sprite"),
            Err(SceneError::UnknownNodeType(name)) if name == "sprite"
        ));
    }

    #[test]
    fn destroy_frees_subtree_and_detaches() {
        let mut scene = Scene::with_builtins().unwrap();
        let layer = scene.create_layer().unwrap();
        let group = scene.create_node("group").unwrap();
        let leaf = scene.create_node("block").unwrap();
        scene.append(layer, &[group]).unwrap();
        scene.append(group, &[leaf]).unwrap();

        scene.destroy(group).unwrap();
        assert!(scene.children(layer).is_empty());
        assert!(!scene.is_alive(leaf));
    }

    #[test]
    fn destroy_forgets_touch_claims_and_deferred_writes() {
        let mut scene = Scene::with_builtins().unwrap();
        let layer = scene.create_layer().unwrap();
        let node = scene.create_node("block").unwrap();
        scene.set_attrs(node, [("width", 10), ("height", 10)]).unwrap();
        scene.append(layer, &[node]).unwrap();
        let touch = Touch {
            identifier: 4,
            position: Point::new(1.0, 1.0),
        };
        let mut start = Event::new("touchstart").with_touches(vec![touch], vec![touch]);
        let _ = scene.dispatch_to_layer(layer, "touchstart", &mut start).unwrap();
        assert_eq!(scene.touch_claims(layer, 4), [node, layer]);
        let pending = scene.defer_attr(node, "class").unwrap();

        scene.destroy(node).unwrap();
        assert_eq!(scene.touch_claims(layer, 4), [layer]);
        assert!(matches!(
            scene.fulfill_deferred(pending, "late"),
            Err(SceneError::UnknownDeferred(_))
        ));
    }

    #[test]
    fn layers_created_by_name_have_a_resolution() {
        let mut scene = Scene::with_builtins().unwrap();
        let layer = scene.create_node("layer").unwrap();
        assert_eq!(scene.resolution(layer), Some(scene.config().resolution()));

        let node = scene.create_node("block").unwrap();
        scene.set_attr(node, "width", "10rw").unwrap();
        scene.append(layer, &[node]).unwrap();
        assert_eq!(scene.attr(node, "width").unwrap().as_f64(), Some(30.0));

        let copy = scene.clone_node(layer).unwrap();
        assert!(scene.get(copy).is_some_and(Node::is_layer));
        let mut click = Event::new("click").at(Point::new(1.0, 1.0));
        assert!(scene.dispatch_to_layer(copy, "click", &mut click).unwrap());
    }

    #[test]
    fn siblings_at_boundaries() {
        let mut scene = Scene::with_builtins().unwrap();
        let layer = scene.create_layer().unwrap();
        let a = scene.create_node("block").unwrap();
        let b = scene.create_node("block").unwrap();
        assert_eq!(scene.next_sibling(a), None);
        scene.append(layer, &[a, b]).unwrap();
        assert_eq!(scene.previous_sibling(a), None);
        assert_eq!(scene.previous_element_sibling(b), Some(a));
        assert_eq!(scene.next_element_sibling(b), None);
        assert!(scene.contains(layer, b));
        assert!(!scene.contains(a, b));
        assert_eq!(scene.descendants(layer), [a, b]);
    }

    #[test]
    fn percent_reference_skips_unsized_ancestors() {
        let mut scene = Scene::with_builtins().unwrap();
        let layer = scene.create_layer_with(Size::new(640.0, 480.0)).unwrap();
        let sized = scene.create_node("group").unwrap();
        let flexible = scene.create_node("group").unwrap();
        let leaf = scene.create_node("block").unwrap();
        scene.append(layer, &[sized]).unwrap();
        scene.append(sized, &[flexible]).unwrap();
        scene.append(flexible, &[leaf]).unwrap();

        assert_eq!(scene.parent_extent(leaf, Axis::Width), Some(640.0));
        scene.set_attr(sized, "width", 200).unwrap();
        assert_eq!(scene.parent_extent(leaf, Axis::Width), Some(200.0));
        assert_eq!(scene.parent_extent(leaf, Axis::Height), Some(480.0));
    }
}
