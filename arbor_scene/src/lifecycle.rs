// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding and severing the parent link of a node.
//!
//! A node moves between two states, detached and attached, only through
//! [`Scene::connect`] and [`Scene::disconnect`]. Both fire lifecycle events
//! (`append`/`appendChild` and `remove`/`removeChild`) that are delivered
//! without hit testing. The tree operations in [`crate::tree`] call them
//! after updating the child lists.

use crate::error::SceneError;
use crate::event::{Event, EventDetail};
use crate::id::NodeId;
use crate::node::Dirty;
use crate::scene::Scene;

impl Scene {
    /// Binds `node` to `parent` with `z_order`, detaching it from its
    /// current parent first.
    ///
    /// A pending detach of `node` is resolved before the new link is made.
    /// This only sets the parent link; it does not add `node` to `parent`'s
    /// children, which is what [`Scene::append_child`] is for.
    pub fn connect(&mut self, node: NodeId, parent: NodeId, z_order: i64) -> Result<(), SceneError> {
        self.node(parent)?;
        if self.parent(node).is_some()
            && let Some(handle) = self.remove(node)?.transition()
            && self.is_pending(handle)
        {
            self.resolve_transition(handle)?;
        }
        self.attach(node, parent, z_order)
    }

    /// Severs the link between `node` and `parent`.
    ///
    /// Fails with [`SceneError::Protocol`] and changes nothing when `node`
    /// is rootless or attached elsewhere.
    pub fn disconnect(&mut self, node: NodeId, parent: NodeId) -> Result<(), SceneError> {
        let next = self.next_element_sibling(node);
        self.disconnect_from(node, parent, next)
    }

    /// Sets the parent link and fires the attach events.
    pub(crate) fn attach(&mut self, node: NodeId, parent: NodeId, z_order: i64) -> Result<(), SceneError> {
        if let Some(previous) = self.parent(node) {
            self.disconnect(node, previous)?;
        }
        let slot = self.node_mut(node)?;
        slot.parent = Some(parent);
        slot.z_order = Some(z_order);
        tracing::debug!(?node, ?parent, z_order, "connected");

        let mut event = Event::new("append").with_detail(EventDetail::Append { parent, z_order });
        self.dispatch_event(node, "append", &mut event, true, true)?;
        let mut event = Event::new("appendChild").with_detail(EventDetail::AppendChild {
            child: node,
            z_order,
        });
        self.dispatch_event(parent, "appendChild", &mut event, true, true)?;

        if self.is_live(node) {
            self.update_styles(node, true);
        }
        Ok(())
    }

    /// Severs the parent link; `next` is the element sibling that followed
    /// `node` before it left the child list.
    pub(crate) fn disconnect_from(
        &mut self,
        node: NodeId,
        parent: NodeId,
        next: Option<NodeId>,
    ) -> Result<(), SceneError> {
        let current = self.node(node)?.parent;
        if current != Some(parent) {
            tracing::warn!(?node, ?parent, ?current, "disconnect from a parent the node is not attached to");
            return Err(SceneError::Protocol {
                node,
                parent,
                reason: if current.is_none() {
                    "the node has no parent"
                } else {
                    "the node is attached to another parent"
                },
            });
        }
        if self.is_live(node)
            && let Some(next) = next
        {
            self.update_styles(next, true);
        }
        let slot = self.node_mut(node)?;
        let z_order = slot.z_order.take();
        slot.parent = None;
        slot.dirty = Dirty::empty();
        tracing::debug!(?node, ?parent, "disconnected");

        let mut event = Event::new("remove").with_detail(EventDetail::Remove { parent, z_order });
        self.dispatch_event(node, "remove", &mut event, true, true)?;
        let mut event = Event::new("removeChild").with_detail(EventDetail::RemoveChild {
            child: node,
            z_order,
        });
        self.dispatch_event(parent, "removeChild", &mut event, true, true)?;
        Ok(())
    }
}
