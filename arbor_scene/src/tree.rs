// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree mutation: appending, inserting, removing and replacing children.
//!
//! Every container keeps its children in insertion order plus a copy stably
//! sorted by z-order. A child's z-order is assigned when it is attached and
//! stays fixed until it is detached again:
//!
//! - appending takes the container's running counter (post-increment);
//! - inserting takes the reference child's z-order and shifts every child at
//!   or above it up by one.
//!
//! Attaching under a live layer runs the child's enter hook, and removing
//! runs its exit hook. Either hook may defer, in which case the operation
//! returns [`Mutation::Pending`] and the structural part finishes when the
//! transition completes.

use crate::error::SceneError;
use crate::id::{NodeId, TransitionId};
use crate::scene::Scene;
use crate::transition::{Continuation, Direction, Transition};

/// The outcome of a tree mutation.
#[must_use = "a pending mutation finishes only when its transition completes"]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// The mutation finished; carries the node that moved.
    Done(NodeId),
    /// The mutation finishes when the transition completes.
    Pending(TransitionId),
    /// Nothing happened: the node or the reference was not a child.
    Skipped,
}

impl Mutation {
    /// The node that moved, if the mutation finished.
    #[must_use]
    pub fn node(self) -> Option<NodeId> {
        match self {
            Self::Done(node) => Some(node),
            _ => None,
        }
    }

    /// The transition the mutation waits for.
    #[must_use]
    pub fn transition(self) -> Option<TransitionId> {
        match self {
            Self::Pending(id) => Some(id),
            _ => None,
        }
    }

    /// Returns `true` if nothing happened.
    #[must_use]
    pub fn is_skipped(self) -> bool {
        self == Self::Skipped
    }
}

impl Scene {
    /// Appends `child` to `parent`, detaching it from its current parent
    /// first.
    ///
    /// If `child` is still leaving a parent, that detach is resolved now and
    /// the append runs right after it; the detach's handle is returned. With
    /// `update` set, a redraw of `child` is requested.
    pub fn append_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        update: bool,
    ) -> Result<Mutation, SceneError> {
        self.check_insertable(parent, child)?;
        match self.detach_for_reinsert(child)? {
            Some(handle) => {
                self.queue_continuation(
                    handle,
                    Continuation::Append {
                        parent,
                        child,
                        update,
                    },
                )?;
                self.resolve_transition(handle)?;
                Ok(Mutation::Pending(handle))
            }
            None => self.finish_append(parent, child, update),
        }
    }

    /// Appends each of `children` in order.
    pub fn append(&mut self, parent: NodeId, children: &[NodeId]) -> Result<(), SceneError> {
        for &child in children {
            let _ = self.append_child(parent, child, true)?;
        }
        Ok(())
    }

    /// Inserts `child` before `reference`, or appends it when `reference` is
    /// `None`.
    ///
    /// Returns [`Mutation::Skipped`] if `reference` is not a child of
    /// `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<Mutation, SceneError> {
        let Some(reference) = reference else {
            return self.append_child(parent, child, true);
        };
        self.check_insertable(parent, child)?;
        if !self.children(parent).contains(&reference) {
            return Ok(Mutation::Skipped);
        }
        if child == reference {
            return Ok(Mutation::Done(child));
        }
        match self.detach_for_reinsert(child)? {
            Some(handle) => {
                self.queue_continuation(
                    handle,
                    Continuation::InsertBefore {
                        parent,
                        child,
                        reference,
                    },
                )?;
                self.resolve_transition(handle)?;
                Ok(Mutation::Pending(handle))
            }
            None => self.finish_insert(parent, child, reference),
        }
    }

    /// Removes `child` from `parent`.
    ///
    /// While a removal of `child` is pending, every call returns that same
    /// handle. Returns [`Mutation::Skipped`] if `child` is not a child of
    /// `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<Mutation, SceneError> {
        if let Some(handle) = self.pending_exit(child) {
            return Ok(Mutation::Pending(handle));
        }
        if !self.node(parent)?.children.contains(&child) {
            return Ok(Mutation::Skipped);
        }
        match self.run_hook(child, Direction::Exit)? {
            Transition::Pending(handle) => {
                self.queue_continuation(handle, Continuation::FinishRemove { parent, child })?;
                Ok(Mutation::Pending(handle))
            }
            Transition::Done => self.finish_remove(parent, child),
        }
    }

    /// Removes `node` from its parent; a rootless node is skipped.
    pub fn remove(&mut self, node: NodeId) -> Result<Mutation, SceneError> {
        match self.parent(node) {
            Some(parent) => self.remove_child(parent, node),
            None => Ok(Mutation::Skipped),
        }
    }

    /// Removes each of `children` from `parent`.
    pub fn remove_children(&mut self, parent: NodeId, children: &[NodeId]) -> Result<(), SceneError> {
        for &child in children {
            let _ = self.remove_child(parent, child)?;
        }
        Ok(())
    }

    /// Removes every child of `parent`.
    pub fn clear(&mut self, parent: NodeId) -> Result<(), SceneError> {
        let children = self.node(parent)?.children.clone();
        self.remove_children(parent, &children)
    }

    /// Puts `new` in the place of `old`.
    ///
    /// `old` is removed only once `new` finished entering, so the container
    /// never shows a gap. Returns the removal of `old`, or its pending handle
    /// when `new` is still entering.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new: NodeId,
        old: NodeId,
    ) -> Result<Mutation, SceneError> {
        if new == old {
            return Ok(Mutation::Skipped);
        }
        if self.insert_before(parent, new, Some(old))?.is_skipped() {
            return Ok(Mutation::Skipped);
        }
        if let Some(entering) = self.pending_enter(new) {
            self.queue_continuation(entering, Continuation::RemoveChild { parent, child: old })?;
            return Ok(Mutation::Pending(entering));
        }
        self.remove_child(parent, old)
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.node(child)?;
        self.node(parent)?;
        if self.contains(child, parent) {
            tracing::warn!(?parent, ?child, "refused to insert a node into itself");
            return Err(SceneError::Protocol {
                node: child,
                parent,
                reason: "a node cannot contain its ancestor",
            });
        }
        Ok(())
    }

    /// Starts detaching `child` ahead of re-inserting it, returning the
    /// handle of a detach that is still pending.
    fn detach_for_reinsert(&mut self, child: NodeId) -> Result<Option<TransitionId>, SceneError> {
        Ok(self
            .remove(child)?
            .transition()
            .filter(|&handle| self.is_pending(handle)))
    }

    pub(crate) fn finish_append(
        &mut self,
        parent: NodeId,
        child: NodeId,
        update: bool,
    ) -> Result<Mutation, SceneError> {
        let container = self.node_mut(parent)?;
        container.children.push(child);
        let z_order = container.z_counter;
        container.z_counter += 1;
        self.attach(child, parent, z_order)?;
        self.resort(parent);
        if update {
            self.force_update(child);
        }
        tracing::trace!(?parent, ?child, z_order, "appended");
        self.enter_if_live(child)
    }

    pub(crate) fn finish_insert(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<Mutation, SceneError> {
        let Some(idx) = self.children(parent).iter().position(|&c| c == reference) else {
            return Ok(Mutation::Skipped);
        };
        let Some(z_order) = self.z_order(reference) else {
            return Ok(Mutation::Skipped);
        };
        for sibling in self.children(parent).to_vec() {
            if let Some(node) = self.get_mut(sibling)
                && let Some(z) = node.z_order.as_mut()
                && *z >= z_order
            {
                *z += 1;
            }
        }
        let container = self.node_mut(parent)?;
        container.children.insert(idx, child);
        container.z_counter += 1;
        self.attach(child, parent, z_order)?;
        self.resort(parent);
        self.force_update(child);
        tracing::trace!(?parent, ?child, ?reference, z_order, "inserted");
        self.enter_if_live(child)
    }

    fn enter_if_live(&mut self, child: NodeId) -> Result<Mutation, SceneError> {
        if !self.is_live(child) {
            return Ok(Mutation::Done(child));
        }
        Ok(match self.run_hook(child, Direction::Enter)? {
            Transition::Pending(handle) => Mutation::Pending(handle),
            Transition::Done => Mutation::Done(child),
        })
    }

    pub(crate) fn finish_remove(&mut self, parent: NodeId, child: NodeId) -> Result<Mutation, SceneError> {
        let Some(idx) = self.children(parent).iter().position(|&c| c == child) else {
            return Ok(Mutation::Skipped);
        };
        let next = self.next_element_sibling(child);
        self.node_mut(parent)?.children.remove(idx);
        self.resort(parent);
        let rendered = self.get(child).is_some_and(|n| n.render_box.is_some());
        if rendered || self.is_visible(child) {
            self.force_update(child);
        }
        self.disconnect_from(child, parent, next)?;
        tracing::trace!(?parent, ?child, "removed");
        Ok(Mutation::Done(child))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    fn fixture(count: usize) -> (Scene, NodeId, Vec<NodeId>) {
        let mut scene = Scene::with_builtins().unwrap();
        let layer = scene.create_layer().unwrap();
        let nodes = (0..count)
            .map(|_| scene.create_node("block").unwrap())
            .collect();
        (scene, layer, nodes)
    }

    fn z_orders(scene: &Scene, nodes: &[NodeId]) -> Vec<Option<i64>> {
        nodes.iter().map(|&n| scene.z_order(n)).collect()
    }

    #[test]
    fn append_assigns_increasing_z_orders() {
        let (mut scene, layer, nodes) = fixture(3);
        scene.append(layer, &nodes).unwrap();
        assert_eq!(z_orders(&scene, &nodes), [Some(0), Some(1), Some(2)]);
        assert_eq!(scene.children(layer), nodes.as_slice());
        assert_eq!(scene.sorted_children(layer), nodes.as_slice());
    }

    #[test]
    fn insert_shifts_later_z_orders() {
        let (mut scene, layer, nodes) = fixture(4);
        let [a, b, c, d] = nodes[..] else { unreachable!() };
        scene.append(layer, &[a, b, c]).unwrap();
        assert_eq!(scene.insert_before(layer, d, Some(b)).unwrap(), Mutation::Done(d));
        assert_eq!(z_orders(&scene, &[a, d, b, c]), [Some(0), Some(1), Some(2), Some(3)]);
        assert_eq!(scene.children(layer), [a, d, b, c]);
        assert_eq!(scene.sorted_children(layer), [a, d, b, c]);

        // The counter moved past the shifted orders.
        let e = scene.create_node("block").unwrap();
        let _ = scene.append_child(layer, e, true).unwrap();
        assert_eq!(scene.z_order(e), Some(4));
    }

    #[test]
    fn unknown_reference_is_skipped() {
        let (mut scene, layer, nodes) = fixture(2);
        let stranger = scene.create_node("block").unwrap();
        let _ = scene.append_child(layer, nodes[0], true).unwrap();
        assert!(scene.insert_before(layer, nodes[1], Some(stranger)).unwrap().is_skipped());
        assert_eq!(scene.parent(nodes[1]), None);
        assert_eq!(
            scene.insert_before(layer, nodes[1], None).unwrap(),
            Mutation::Done(nodes[1])
        );
    }

    #[test]
    fn reinserting_within_the_same_parent() {
        let (mut scene, layer, nodes) = fixture(3);
        let [a, b, c] = nodes[..] else { unreachable!() };
        scene.append(layer, &[a, b, c]).unwrap();
        let _ = scene.insert_before(layer, c, Some(a)).unwrap();
        assert_eq!(scene.children(layer), [c, a, b]);
        assert_eq!(scene.sorted_children(layer), [c, a, b]);
        assert_eq!(z_orders(&scene, &[c, a, b]), [Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn remove_and_clear() {
        let (mut scene, layer, nodes) = fixture(3);
        scene.append(layer, &nodes).unwrap();
        assert_eq!(scene.remove(nodes[1]).unwrap(), Mutation::Done(nodes[1]));
        assert_eq!(scene.parent(nodes[1]), None);
        assert_eq!(scene.z_order(nodes[1]), None);
        assert!(scene.remove(nodes[1]).unwrap().is_skipped());
        assert!(scene.remove_child(layer, nodes[1]).unwrap().is_skipped());

        scene.clear(layer).unwrap();
        assert!(scene.children(layer).is_empty());
        assert!(scene.sorted_children(layer).is_empty());
    }

    #[test]
    fn moving_between_parents() {
        let (mut scene, layer, nodes) = fixture(1);
        let other = scene.create_node("group").unwrap();
        let _ = scene.append_child(layer, other, true).unwrap();
        let _ = scene.append_child(layer, nodes[0], true).unwrap();
        let _ = scene.append_child(other, nodes[0], true).unwrap();
        assert_eq!(scene.parent(nodes[0]), Some(other));
        assert_eq!(scene.children(layer), [other]);
        assert_eq!(scene.z_order(nodes[0]), Some(0));
    }

    #[test]
    fn cycles_are_refused() {
        let (mut scene, layer, _) = fixture(0);
        let outer = scene.create_node("group").unwrap();
        let inner = scene.create_node("group").unwrap();
        scene.append(layer, &[outer]).unwrap();
        scene.append(outer, &[inner]).unwrap();
        assert!(matches!(
            scene.append_child(inner, outer, true),
            Err(SceneError::Protocol { .. })
        ));
        assert!(scene.append_child(outer, outer, true).is_err());
        assert_eq!(scene.parent(outer), Some(layer));
    }

    #[test]
    fn replace_keeps_the_slot() {
        let (mut scene, layer, nodes) = fixture(3);
        let [a, b, c] = nodes[..] else { unreachable!() };
        scene.append(layer, &[a, b]).unwrap();
        assert_eq!(scene.replace_child(layer, c, a).unwrap(), Mutation::Done(a));
        assert_eq!(scene.children(layer), [c, b]);
        assert_eq!(scene.parent(a), None);
        assert!(scene.replace_child(layer, a, a).unwrap().is_skipped());
    }
}
