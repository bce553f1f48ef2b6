// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invalidation requests: redraw, layout and reflow.
//!
//! Requests only leave [`Dirty`] marks; rendering and layout collaborators
//! read them with [`Scene::dirty`] and clear them with [`Scene::take_dirty`].
//! Requests against stale nodes are ignored.

use kurbo::Rect;

use crate::id::NodeId;
use crate::node::Dirty;
use crate::scene::Scene;

impl Scene {
    /// Returns the invalidation marks of `node`.
    #[must_use]
    pub fn dirty(&self, node: NodeId) -> Dirty {
        self.get(node).map_or(Dirty::empty(), |n| n.dirty)
    }

    /// Returns and clears the invalidation marks of `node`.
    pub fn take_dirty(&mut self, node: NodeId) -> Dirty {
        self.get_mut(node)
            .map_or(Dirty::empty(), |n| core::mem::take(&mut n.dirty))
    }

    /// Adds invalidation marks to `node` only.
    pub fn mark_dirty(&mut self, node: NodeId, marks: Dirty) {
        if let Some(n) = self.get_mut(node) {
            n.dirty |= marks;
        }
    }

    /// Requests a redraw of `node` and drops its render cache.
    pub fn force_update(&mut self, node: NodeId) {
        self.request_redraw(node, true);
    }

    /// Requests a redraw of `node`, propagated up the parent chain.
    pub(crate) fn request_redraw(&mut self, node: NodeId, clear_cache: bool) {
        let mut marks = Dirty::PAINT;
        if clear_cache {
            marks |= Dirty::CACHE;
        }
        self.mark_dirty(node, marks);
        let mut current = self.parent(node);
        while let Some(ancestor) = current {
            let Some(n) = self.get_mut(ancestor) else {
                break;
            };
            if n.dirty.contains(Dirty::PAINT | Dirty::CACHE) {
                break;
            }
            // A changed child invalidates its container's cached rendering.
            n.dirty |= Dirty::PAINT | Dirty::CACHE;
            current = n.parent;
        }
    }

    /// Invalidates the layout of `node`, and of its ancestors for as long as
    /// they take part in their parent's layout.
    pub fn clear_layout(&mut self, node: NodeId) {
        let mut current = Some(node);
        while let Some(id) = current {
            self.mark_dirty(id, Dirty::LAYOUT);
            let participates = self
                .kind(id)
                .is_some_and(|kind| kind.has_layout(self, id));
            current = if participates { self.parent(id) } else { None };
        }
        tracing::trace!(?node, "layout invalidated");
    }

    /// Schedules a reflow of `node`.
    pub fn reflow(&mut self, node: NodeId) {
        self.mark_dirty(node, Dirty::REFLOW);
    }

    /// Records the box `node` was last rendered into.
    pub fn set_render_box(&mut self, node: NodeId, render_box: Option<Rect>) {
        if let Some(n) = self.get_mut(node) {
            n.render_box = render_box;
        }
    }

    /// Returns `true` if `node` paints anything.
    #[must_use]
    pub fn is_visible(&self, node: NodeId) -> bool {
        self.kind(node)
            .is_some_and(|kind| kind.is_visible(self, node))
    }
}
