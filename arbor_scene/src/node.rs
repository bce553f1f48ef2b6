// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node state held by the scene arena.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use arbor_attr::{AttrStore, AttrValue};
use hashbrown::HashMap;
use kurbo::{Rect, Size};
use smallvec::SmallVec;

use crate::event::Listener;
use crate::id::{NodeId, TransitionId};
use crate::kind::NodeKind;
use crate::style::StyleScope;

bitflags::bitflags! {
    /// Transient visual state driven by event dispatch.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct VisualState: u8 {
        /// The pointer is over the node.
        const HOVERING       = 0b0000_0001;
        /// A press started on the node and has not been released.
        const ACTIVE         = 0b0000_0010;
        /// The node receives pointer move/down/up regardless of hit testing.
        const MOUSE_CAPTURED = 0b0000_0100;
    }
}

bitflags::bitflags! {
    /// Invalidation marks left for the renderer and layout collaborators.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Dirty: u8 {
        /// The node or a descendant needs repainting.
        const PAINT  = 0b0000_0001;
        /// The node's render cache is invalid.
        const CACHE  = 0b0000_0010;
        /// The node's layout must be recomputed.
        const LAYOUT = 0b0000_0100;
        /// The node's content must be reflowed.
        const REFLOW = 0b0000_1000;
    }
}

/// State only a layer carries.
#[derive(Clone, Debug)]
pub(crate) struct LayerState {
    pub(crate) resolution: Size,
    /// Touch identifier to the nodes that claimed it on `touchstart`.
    pub(crate) touches: HashMap<i64, SmallVec<[NodeId; 2]>>,
}

impl LayerState {
    pub(crate) fn new(resolution: Size) -> Self {
        Self {
            resolution,
            touches: HashMap::new(),
        }
    }
}

/// A node of the scene.
///
/// Nodes are owned by the [`Scene`](crate::Scene) arena and addressed by
/// [`NodeId`]. Everything here is read-only from outside the crate; writes go
/// through the scene so that side effects run.
pub struct Node {
    pub(crate) kind: Rc<dyn NodeKind>,
    pub(crate) attrs: AttrStore,
    pub(crate) data: BTreeMap<String, serde_json::Value>,
    pub(crate) style: BTreeMap<String, AttrValue>,
    pub(crate) listeners: HashMap<String, SmallVec<[Listener; 2]>>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) z_order: Option<i64>,
    /// Insertion order.
    pub(crate) children: Vec<NodeId>,
    /// `children` stably sorted by z-order.
    pub(crate) sorted: Vec<NodeId>,
    pub(crate) z_counter: i64,
    pub(crate) state: VisualState,
    pub(crate) dirty: Dirty,
    pub(crate) last_layout: Option<Size>,
    pub(crate) render_box: Option<Rect>,
    pub(crate) enter_pending: Option<TransitionId>,
    pub(crate) exit_pending: Option<TransitionId>,
    pub(crate) style_scope: Option<StyleScope>,
    pub(crate) layer: Option<LayerState>,
}

impl Node {
    pub(crate) fn new(kind: Rc<dyn NodeKind>) -> Self {
        Self {
            kind,
            attrs: AttrStore::new(),
            data: BTreeMap::new(),
            style: BTreeMap::new(),
            listeners: HashMap::new(),
            parent: None,
            z_order: None,
            children: Vec::new(),
            sorted: Vec::new(),
            z_counter: 0,
            state: VisualState::empty(),
            dirty: Dirty::empty(),
            last_layout: None,
            render_box: None,
            enter_pending: None,
            exit_pending: None,
            style_scope: None,
            layer: None,
        }
    }

    /// Returns the node's kind.
    #[must_use]
    pub fn kind(&self) -> &Rc<dyn NodeKind> {
        &self.kind
    }

    /// Returns the raw attribute store.
    #[must_use]
    pub fn attrs(&self) -> &AttrStore {
        &self.attrs
    }

    /// Returns the current parent.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the z-order of the current attachment.
    #[must_use]
    pub fn z_order(&self) -> Option<i64> {
        self.z_order
    }

    /// Returns the children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the children in painting order.
    #[must_use]
    pub fn sorted_children(&self) -> &[NodeId] {
        &self.sorted
    }

    /// Returns the visual state flags.
    #[must_use]
    pub fn state(&self) -> VisualState {
        self.state
    }

    /// Returns the pending invalidation marks.
    #[must_use]
    pub fn dirty(&self) -> Dirty {
        self.dirty
    }

    /// Returns the box size recorded by the last layout-affecting write.
    #[must_use]
    pub fn last_layout(&self) -> Option<Size> {
        self.last_layout
    }

    /// Returns the box the node was last rendered into.
    #[must_use]
    pub fn render_box(&self) -> Option<Rect> {
        self.render_box
    }

    /// Returns `true` for layers.
    #[must_use]
    pub fn is_layer(&self) -> bool {
        self.layer.is_some()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("node_type", &self.kind.node_type())
            .field("parent", &self.parent)
            .field("z_order", &self.z_order)
            .field("children", &self.children)
            .field("state", &self.state)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}
