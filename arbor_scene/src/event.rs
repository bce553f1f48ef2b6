// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event records and listener registration.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;
use smallvec::SmallVec;

use crate::error::SceneError;
use crate::id::{ListenerId, NodeId};
use crate::scene::Scene;

/// One touch point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Touch {
    /// Platform identifier, stable for the lifetime of the touch.
    pub identifier: i64,
    /// Position in layer coordinates.
    pub position: Point,
}

/// Payload of lifecycle events.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum EventDetail {
    /// No payload.
    #[default]
    None,
    /// `append`: the node was attached.
    Append {
        /// The new parent.
        parent: NodeId,
        /// The z-order of the attachment.
        z_order: i64,
    },
    /// `appendChild`: a child was attached to the node.
    AppendChild {
        /// The new child.
        child: NodeId,
        /// The child's z-order.
        z_order: i64,
    },
    /// `remove`: the node was detached.
    Remove {
        /// The former parent.
        parent: NodeId,
        /// The z-order the node had.
        z_order: Option<i64>,
    },
    /// `removeChild`: a child was detached from the node.
    RemoveChild {
        /// The former child.
        child: NodeId,
        /// The z-order the child had.
        z_order: Option<i64>,
    },
}

/// An event record, created per dispatch and mutated in place by listeners.
///
/// ```rust
/// use arbor_scene::Event;
/// use kurbo::Point;
///
/// let mut event = Event::new("mousemove").at(Point::new(4.0, 8.0));
/// event.prevent_default();
/// assert!(event.default_prevented);
/// assert!(!event.return_value());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Event {
    /// The type currently being delivered.
    pub event_type: String,
    /// The type the record was created with, when it was re-dispatched
    /// under another type.
    pub original_type: Option<String>,
    /// The first node that accepted the event.
    pub target: Option<NodeId>,
    /// Pointer position in layer coordinates.
    pub position: Option<Point>,
    /// Set by [`Event::stop_dispatch`]; stops delivery to further nodes.
    pub terminated: bool,
    /// Set by [`Event::stop_propagation`]; containers skip their own listeners.
    pub cancel_bubble: bool,
    /// Set by [`Event::prevent_default`].
    pub default_prevented: bool,
    /// All current touches.
    pub touches: Vec<Touch>,
    /// Touches that changed with this event.
    pub changed_touches: Vec<Touch>,
    /// Current touches that started on the receiving node.
    pub target_touches: Vec<Touch>,
    /// Lifecycle payload.
    pub detail: EventDetail,
}

impl Event {
    /// Creates an event of the given type.
    #[must_use]
    pub fn new(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            ..Self::default()
        }
    }

    /// Sets the pointer position.
    #[must_use]
    pub fn at(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    /// Sets the touch lists; `changed` must be a subset of `touches`.
    #[must_use]
    pub fn with_touches(mut self, touches: Vec<Touch>, changed: Vec<Touch>) -> Self {
        if self.position.is_none() {
            self.position = changed.first().map(|t| t.position);
        }
        self.touches = touches;
        self.changed_touches = changed;
        self
    }

    /// Sets the lifecycle payload.
    #[must_use]
    pub fn with_detail(mut self, detail: EventDetail) -> Self {
        self.detail = detail;
        self
    }

    /// Stops delivery to further nodes.
    pub fn stop_dispatch(&mut self) {
        self.terminated = true;
    }

    /// Stops containers from running their own listeners for this event.
    pub fn stop_propagation(&mut self) {
        self.cancel_bubble = true;
    }

    /// Marks the default action as prevented.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Returns `false` once the default action was prevented.
    #[must_use]
    pub fn return_value(&self) -> bool {
        !self.default_prevented
    }

    /// Re-targets the record for `event_type`, keeping the previous type.
    pub(crate) fn rename(&mut self, event_type: &str) {
        if self.event_type != event_type {
            if !self.event_type.is_empty() {
                self.original_type = Some(core::mem::take(&mut self.event_type));
            }
            self.event_type = event_type.to_string();
        }
    }

    /// A fresh record for a synthesized event derived from this one.
    pub(crate) fn synthesize(&self, event_type: &str) -> Self {
        let mut event = self.clone();
        event.event_type = event_type.to_string();
        event.original_type = None;
        event.target = None;
        event.terminated = false;
        event
    }
}

/// A listener callback.
pub type ListenerFn = dyn Fn(&mut Scene, NodeId, &mut Event);

#[derive(Clone)]
pub(crate) struct Listener {
    pub(crate) id: ListenerId,
    pub(crate) once: bool,
    pub(crate) callback: Rc<ListenerFn>,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("once", &self.once)
            .finish_non_exhaustive()
    }
}

/// One or several event type names.
///
/// ```rust
/// use arbor_scene::EventTypes;
///
/// assert_eq!(EventTypes::from("click").len(), 1);
/// assert_eq!(EventTypes::from(["mousedown", "touchstart"]).len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventTypes<'a>(SmallVec<[&'a str; 2]>);

impl<'a> EventTypes<'a> {
    /// Returns the number of names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no names.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.0.iter().copied()
    }
}

impl<'a> From<&'a str> for EventTypes<'a> {
    fn from(name: &'a str) -> Self {
        Self(smallvec::smallvec![name])
    }
}

impl<'a, const N: usize> From<[&'a str; N]> for EventTypes<'a> {
    fn from(names: [&'a str; N]) -> Self {
        Self(names.into_iter().collect())
    }
}

impl<'a> From<&'a [&'a str]> for EventTypes<'a> {
    fn from(names: &'a [&'a str]) -> Self {
        Self(names.iter().copied().collect())
    }
}

impl Scene {
    /// Registers `listener` for each of `types`.
    ///
    /// Listeners run in registration order. The returned handle removes the
    /// listener from any of the types with [`Scene::off`].
    pub fn on<'a>(
        &mut self,
        node: NodeId,
        types: impl Into<EventTypes<'a>>,
        listener: impl Fn(&mut Self, NodeId, &mut Event) + 'static,
    ) -> Result<ListenerId, SceneError> {
        self.register(node, types.into(), Rc::new(listener), false)
    }

    /// Registers `listener` to run at most once per type.
    pub fn once<'a>(
        &mut self,
        node: NodeId,
        types: impl Into<EventTypes<'a>>,
        listener: impl Fn(&mut Self, NodeId, &mut Event) + 'static,
    ) -> Result<ListenerId, SceneError> {
        self.register(node, types.into(), Rc::new(listener), true)
    }

    /// Alias of [`Scene::on`].
    pub fn add_event_listener<'a>(
        &mut self,
        node: NodeId,
        types: impl Into<EventTypes<'a>>,
        listener: impl Fn(&mut Self, NodeId, &mut Event) + 'static,
    ) -> Result<ListenerId, SceneError> {
        self.on(node, types, listener)
    }

    /// Removes one listener from each of `types`.
    ///
    /// Returns `true` if anything was removed.
    pub fn off<'a>(
        &mut self,
        node: NodeId,
        types: impl Into<EventTypes<'a>>,
        listener: ListenerId,
    ) -> Result<bool, SceneError> {
        let types = types.into();
        let node = self.node_mut(node)?;
        let mut removed = false;
        for name in types.iter() {
            if let Some(list) = node.listeners.get_mut(name) {
                let before = list.len();
                list.retain(|l| l.id != listener);
                removed |= list.len() != before;
                if list.is_empty() {
                    node.listeners.remove(name);
                }
            }
        }
        Ok(removed)
    }

    /// Alias of [`Scene::off`].
    pub fn remove_event_listener<'a>(
        &mut self,
        node: NodeId,
        types: impl Into<EventTypes<'a>>,
        listener: ListenerId,
    ) -> Result<bool, SceneError> {
        self.off(node, types, listener)
    }

    /// Removes every listener of each of `types`.
    pub fn off_all<'a>(
        &mut self,
        node: NodeId,
        types: impl Into<EventTypes<'a>>,
    ) -> Result<(), SceneError> {
        let types = types.into();
        let node = self.node_mut(node)?;
        for name in types.iter() {
            node.listeners.remove(name);
        }
        Ok(())
    }

    /// Returns the number of listeners registered for `event_type`.
    #[must_use]
    pub fn listeners(&self, node: NodeId, event_type: &str) -> usize {
        self.get(node)
            .and_then(|n| n.listeners.get(event_type))
            .map_or(0, SmallVec::len)
    }

    fn register(
        &mut self,
        node: NodeId,
        types: EventTypes<'_>,
        callback: Rc<ListenerFn>,
        once: bool,
    ) -> Result<ListenerId, SceneError> {
        let id = self.next_listener_id();
        let node = self.node_mut(node)?;
        for name in types.iter() {
            node.listeners
                .entry(name.to_string())
                .or_default()
                .push(Listener {
                    id,
                    once,
                    callback: Rc::clone(&callback),
                });
        }
        Ok(id)
    }

    /// Snapshot of the listeners for `event_type`, with `once` listeners
    /// already unregistered.
    pub(crate) fn take_listeners(
        &mut self,
        node: NodeId,
        event_type: &str,
    ) -> SmallVec<[Listener; 4]> {
        let Some(node) = self.get_mut(node) else {
            return SmallVec::new();
        };
        let Some(list) = node.listeners.get_mut(event_type) else {
            return SmallVec::new();
        };
        let snapshot: SmallVec<[Listener; 4]> = list.iter().cloned().collect();
        if snapshot.iter().any(|l| l.once) {
            list.retain(|l| !l.once);
            if list.is_empty() {
                node.listeners.remove(event_type);
            }
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_keeps_original_type() {
        let mut event = Event::new("touchstart");
        event.rename("mousedown");
        assert_eq!(event.event_type, "mousedown");
        assert_eq!(event.original_type.as_deref(), Some("touchstart"));

        // Same type: nothing changes.
        event.rename("mousedown");
        assert_eq!(event.original_type.as_deref(), Some("touchstart"));
    }

    #[test]
    fn synthesized_events_are_fresh() {
        let mut event = Event::new("mousemove").at(Point::new(1.0, 2.0));
        event.stop_dispatch();
        event.target = Some(NodeId::new(3, 1));
        let enter = event.synthesize("mouseenter");
        assert_eq!(enter.event_type, "mouseenter");
        assert_eq!(enter.position, Some(Point::new(1.0, 2.0)));
        assert!(enter.target.is_none());
        assert!(!enter.terminated);
    }

    #[test]
    fn touches_default_position() {
        let touch = Touch {
            identifier: 7,
            position: Point::new(5.0, 5.0),
        };
        let event = Event::new("touchstart").with_touches(alloc::vec![touch], alloc::vec![touch]);
        assert_eq!(event.position, Some(Point::new(5.0, 5.0)));
    }
}
