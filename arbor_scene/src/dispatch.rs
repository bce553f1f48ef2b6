// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event dispatch: hit testing, enter/leave synthesis, capture and touches.

use alloc::vec::Vec;

use arbor_attr::AttrValue;

use crate::error::SceneError;
use crate::event::Event;
use crate::id::NodeId;
use crate::kinds::{ACTIVE_ATTR, HOVER_ATTR};
use crate::node::VisualState;
use crate::scene::Scene;

const CAPTURED_TYPES: &[&str] = &["mousemove", "mousedown", "mouseup"];

impl Scene {
    /// Makes `node` receive `mousemove`, `mousedown` and `mouseup` whether or
    /// not they hit it.
    pub fn set_mouse_capture(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.node_mut(node)?.state.insert(VisualState::MOUSE_CAPTURED);
        Ok(())
    }

    /// Ends a capture started with [`Scene::set_mouse_capture`].
    pub fn release_mouse_capture(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.node_mut(node)?.state.remove(VisualState::MOUSE_CAPTURED);
        Ok(())
    }

    /// Returns `true` while `node` holds the mouse capture.
    #[must_use]
    pub fn has_mouse_capture(&self, node: NodeId) -> bool {
        self.has_state(node, VisualState::MOUSE_CAPTURED)
    }

    /// Returns `true` while the pointer is over `node`.
    #[must_use]
    pub fn is_hovering(&self, node: NodeId) -> bool {
        self.has_state(node, VisualState::HOVERING)
    }

    /// Returns `true` if `node` or one of its descendants holds the capture.
    fn captures_within(&self, node: NodeId) -> bool {
        self.has_mouse_capture(node)
            || self
                .descendants(node)
                .into_iter()
                .any(|n| self.has_mouse_capture(n))
    }

    fn has_state(&self, node: NodeId, state: VisualState) -> bool {
        self.get(node).is_some_and(|n| n.state.contains(state))
    }

    fn set_state(&mut self, node: NodeId, state: VisualState, on: bool) {
        if let Some(n) = self.get_mut(node) {
            n.state.set(state, on);
        }
    }

    /// Delivers `event` to `node` as `event_type` and returns whether the
    /// event hit the node.
    ///
    /// With `collision_override` the hit test is skipped and the event counts
    /// as a hit. With `swallow` the call returns `false` right away when
    /// `node` has no listener for `event_type`.
    ///
    /// Besides running listeners this keeps the node's pointer state:
    ///
    /// - the first hitting `mousemove` synthesizes `mouseenter`, and a
    ///   missing `mousemove` after that synthesizes `mouseleave`;
    /// - `mousedown`/`touchstart` set the active state, `mouseup`/`touchend`
    ///   clear it;
    /// - `touchstart` claims its touch in the layer's touch table, and touch
    ///   events report the claimed touches in [`Event::target_touches`].
    pub fn dispatch_event(
        &mut self,
        node: NodeId,
        event_type: &str,
        event: &mut Event,
        collision_override: bool,
        swallow: bool,
    ) -> Result<bool, SceneError> {
        let kind = self.kind_rc(node)?;
        if swallow && self.listeners(node, event_type) == 0 {
            return Ok(false);
        }
        event.rename(event_type);

        let mut collision = collision_override || kind.point_collision(self, node, event)?;
        let captured = CAPTURED_TYPES.contains(&event_type) && self.has_mouse_capture(node);

        if event_type == "mouseleave" && self.is_hovering(node) {
            event.target = Some(node);
            self.set_state(node, VisualState::HOVERING, false);
            collision = true;
            self.set_attr(node, HOVER_ATTR, AttrValue::Null)?;
        }

        if !event.terminated && (collision || captured) {
            event.target.get_or_insert(node);
            if event_type.starts_with("touch") && !event.changed_touches.is_empty() {
                self.track_touches(node, event_type, event);
            }
            match event_type {
                "mousedown" | "touchstart" => {
                    self.set_state(node, VisualState::ACTIVE, true);
                    self.set_attr(node, ACTIVE_ATTR, "active")?;
                }
                "mouseup" | "touchend" => {
                    self.set_state(node, VisualState::ACTIVE, false);
                    self.set_attr(node, ACTIVE_ATTR, AttrValue::Null)?;
                }
                _ => {}
            }

            for listener in self.take_listeners(node, event_type) {
                (listener.callback)(self, node, event);
            }
            if !self.is_alive(node) {
                return Ok(collision);
            }

            if collision && event_type == "mousemove" && !self.is_hovering(node) {
                let mut enter = event.synthesize("mouseenter");
                self.dispatch_event(node, "mouseenter", &mut enter, true, true)?;
                self.set_attr(node, HOVER_ATTR, "hover")?;
                self.set_state(node, VisualState::HOVERING, true);
                tracing::trace!(?node, "pointer entered");
            }
        }

        if !collision && event_type == "mousemove" && self.is_hovering(node) {
            let mut leave = event.synthesize("mouseleave");
            self.dispatch_event(node, "mouseleave", &mut leave, false, false)?;
            self.set_attr(node, HOVER_ATTR, AttrValue::Null)?;
            tracing::trace!(?node, "pointer left");
        }

        Ok(collision)
    }

    fn track_touches(&mut self, node: NodeId, event_type: &str, event: &mut Event) {
        let Some(layer) = self
            .layer_of(node)
            .and_then(|l| self.get_mut(l))
            .and_then(|l| l.layer.as_mut())
        else {
            return;
        };
        if event_type == "touchstart"
            && let Some(touch) = event.changed_touches.first()
        {
            let claims = layer.touches.entry(touch.identifier).or_default();
            if !claims.contains(&node) {
                claims.push(node);
            }
        }
        event.target_touches = event
            .touches
            .iter()
            .filter(|t| {
                layer
                    .touches
                    .get(&t.identifier)
                    .is_some_and(|claims| claims.contains(&node))
            })
            .copied()
            .collect();
    }

    /// Delivers `event` into the subtree of `node`, returning whether it hit
    /// `node`.
    ///
    /// A container that is hit forwards the event to its children from the
    /// top of the z-order down and stops at the first child that is hit.
    /// Children that were hovering but are no longer reached receive
    /// `mouseleave`. Subtrees holding the mouse capture receive
    /// `mousemove`, `mousedown` and `mouseup` whether or not they, or the
    /// container, were hit. The container then runs its own listeners unless
    /// a child stopped propagation.
    pub fn dispatch(
        &mut self,
        node: NodeId,
        event_type: &str,
        event: &mut Event,
    ) -> Result<bool, SceneError> {
        let kind = self.kind_rc(node)?;
        if !kind.is_container() {
            return self.dispatch_event(node, event_type, event, false, false);
        }
        event.rename(event_type);
        let hit = kind.point_collision(self, node, event)?;
        let children: Vec<NodeId> = self.sorted_children(node).iter().rev().copied().collect();
        let capture = CAPTURED_TYPES.contains(&event_type);

        if event_type == "mouseleave" {
            for child in children {
                if self.is_hovering(child) {
                    let mut leave = event.synthesize("mouseleave");
                    self.dispatch(child, "mouseleave", &mut leave)?;
                }
            }
        } else {
            let mut reached = !hit;
            for child in children {
                if !reached {
                    reached = self.dispatch(child, event_type, event)?;
                } else if capture && self.captures_within(child) {
                    self.dispatch(child, event_type, event)?;
                } else if event_type == "mousemove" && self.is_hovering(child) {
                    let mut leave = event.synthesize("mouseleave");
                    self.dispatch(child, "mouseleave", &mut leave)?;
                }
            }
        }

        if event.cancel_bubble {
            return Ok(hit);
        }
        self.dispatch_event(node, event_type, event, false, false)
    }

    /// Delivers `event` to a layer and its subtree.
    ///
    /// After `touchend` and `touchcancel` the changed touches are forgotten
    /// unless the scene is configured to keep them.
    pub fn dispatch_to_layer(
        &mut self,
        layer: NodeId,
        event_type: &str,
        event: &mut Event,
    ) -> Result<bool, SceneError> {
        if !self.node(layer)?.is_layer() {
            return Err(SceneError::NotALayer(layer));
        }
        let hit = self.dispatch(layer, event_type, event)?;
        if self.config.clear_touches
            && matches!(event_type, "touchend" | "touchcancel")
            && let Some(state) = self.get_mut(layer).and_then(|l| l.layer.as_mut())
        {
            for touch in &event.changed_touches {
                state.touches.remove(&touch.identifier);
            }
        }
        Ok(hit)
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::{String, ToString};
    use alloc::vec;
    use core::cell::RefCell;

    use kurbo::Point;

    use super::*;
    use crate::event::Touch;

    fn boxed(scene: &mut Scene, x: f64, y: f64, size: f64) -> NodeId {
        let node = scene.create_node("block").unwrap();
        scene.set_attr(node, "x", x).unwrap();
        scene.set_attr(node, "y", y).unwrap();
        scene.set_attr(node, "width", size).unwrap();
        scene.set_attr(node, "height", size).unwrap();
        node
    }

    fn record(scene: &mut Scene, node: NodeId, types: &[&str]) -> Rc<RefCell<Vec<String>>> {
        let log: Rc<RefCell<Vec<String>>> = Rc::default();
        let sink = Rc::clone(&log);
        scene
            .on(node, types, move |_, _, event| {
                sink.borrow_mut().push(event.event_type.to_string());
            })
            .unwrap();
        log
    }

    fn mousemove(x: f64, y: f64) -> Event {
        Event::new("mousemove").at(Point::new(x, y))
    }

    #[test]
    fn enter_and_leave_fire_once() {
        let mut scene = Scene::with_builtins().unwrap();
        let layer = scene.create_layer().unwrap();
        let node = boxed(&mut scene, 0.0, 0.0, 10.0);
        scene.append(layer, &[node]).unwrap();
        let log = record(&mut scene, node, &["mouseenter", "mouseleave"]);

        for (x, expected) in [(50.0, false), (5.0, true), (6.0, true), (50.0, false)] {
            let hit = scene
                .dispatch_event(node, "mousemove", &mut mousemove(x, x), false, false)
                .unwrap();
            assert_eq!(hit, expected);
        }
        assert_eq!(*log.borrow(), ["mouseenter", "mouseleave"]);
        assert!(!scene.is_hovering(node));
        assert_eq!(scene.attr(node, HOVER_ATTR).unwrap(), AttrValue::Null);
    }

    #[test]
    fn capture_overrides_hit_testing() {
        let mut scene = Scene::with_builtins().unwrap();
        let layer = scene.create_layer().unwrap();
        let node = boxed(&mut scene, 0.0, 0.0, 10.0);
        scene.append(layer, &[node]).unwrap();
        let log = record(&mut scene, node, &["mousemove", "click"]);

        scene.set_mouse_capture(node).unwrap();
        let mut event = mousemove(90.0, 90.0);
        let hit = scene.dispatch_event(node, "mousemove", &mut event, false, false).unwrap();
        assert!(!hit);
        assert_eq!(event.target, Some(node));
        let mut click = Event::new("click").at(Point::new(90.0, 90.0));
        let _ = scene.dispatch_event(node, "click", &mut click, false, false).unwrap();
        assert_eq!(*log.borrow(), ["mousemove"]);

        scene.release_mouse_capture(node).unwrap();
        let _ = scene
            .dispatch_event(node, "mousemove", &mut mousemove(90.0, 90.0), false, false)
            .unwrap();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn swallowed_without_listeners() {
        let mut scene = Scene::with_builtins().unwrap();
        let node = scene.create_node("node").unwrap();
        // The plain kind cannot be hit tested, but swallowing returns first.
        let mut event = Event::new("custom");
        assert!(!scene.dispatch_event(node, "custom", &mut event, false, true).unwrap());
        assert!(scene.dispatch_event(node, "custom", &mut event, false, false).is_err());
        assert!(scene.dispatch_event(node, "custom", &mut event, true, false).unwrap());
    }

    #[test]
    fn listeners_see_a_snapshot() {
        let mut scene = Scene::with_builtins().unwrap();
        let node = scene.create_node("node").unwrap();
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let first = scene
            .on(node, "ping", move |scene, id, _| {
                *counter.borrow_mut() += 1;
                scene.off_all(id, "ping").unwrap();
            })
            .unwrap();
        let counter = Rc::clone(&count);
        scene
            .once(node, "ping", move |_, _, event| {
                *counter.borrow_mut() += 10;
                event.prevent_default();
            })
            .unwrap();

        let mut event = Event::new("ping");
        let _ = scene.dispatch_event(node, "ping", &mut event, true, false).unwrap();
        assert_eq!(*count.borrow(), 11);
        assert!(!event.return_value());
        assert_eq!(scene.listeners(node, "ping"), 0);
        assert!(!scene.off(node, "ping", first).unwrap());
    }

    #[test]
    fn active_state_follows_presses() {
        let mut scene = Scene::with_builtins().unwrap();
        let layer = scene.create_layer().unwrap();
        let node = boxed(&mut scene, 0.0, 0.0, 10.0);
        scene.append(layer, &[node]).unwrap();

        let mut down = Event::new("mousedown").at(Point::new(1.0, 1.0));
        assert!(scene.dispatch_to_layer(layer, "mousedown", &mut down).unwrap());
        assert_eq!(down.target, Some(node));
        assert_eq!(scene.attr(node, ACTIVE_ATTR).unwrap(), AttrValue::from("active"));
        let mut up = Event::new("mouseup").at(Point::new(1.0, 1.0));
        let _ = scene.dispatch_to_layer(layer, "mouseup", &mut up).unwrap();
        assert_eq!(scene.attr(node, ACTIVE_ATTR).unwrap(), AttrValue::Null);
    }

    #[test]
    fn containers_stop_at_the_topmost_hit() {
        let mut scene = Scene::with_builtins().unwrap();
        let layer = scene.create_layer().unwrap();
        let below = boxed(&mut scene, 0.0, 0.0, 20.0);
        let above = boxed(&mut scene, 10.0, 10.0, 20.0);
        scene.append(layer, &[below, above]).unwrap();
        let below_log = record(&mut scene, below, &["mousemove", "mouseenter", "mouseleave"]);
        let above_log = record(&mut scene, above, &["mousemove", "mouseenter", "mouseleave"]);

        let mut event = mousemove(5.0, 5.0);
        let _ = scene.dispatch_to_layer(layer, "mousemove", &mut event).unwrap();
        assert_eq!(event.target, Some(below));

        // The overlap belongs to the node painted last.
        let mut event = mousemove(15.0, 15.0);
        let _ = scene.dispatch_to_layer(layer, "mousemove", &mut event).unwrap();
        assert_eq!(event.target, Some(above));
        assert_eq!(*below_log.borrow(), ["mousemove", "mouseenter", "mouseleave"]);
        assert_eq!(*above_log.borrow(), ["mousemove", "mouseenter"]);

        // Leaving the layer entirely reaches the hovering child.
        let mut event = mousemove(500.0, 500.0);
        let _ = scene.dispatch_to_layer(layer, "mousemove", &mut event).unwrap();
        assert_eq!(*above_log.borrow(), ["mousemove", "mouseenter", "mouseleave"]);
        assert!(!scene.is_hovering(above));
    }

    #[test]
    fn capture_reaches_into_groups_that_miss() {
        let mut scene = Scene::with_builtins().unwrap();
        let layer = scene.create_layer().unwrap();
        let group = scene.create_node("group").unwrap();
        scene
            .set_attrs(group, [("width", 20), ("height", 20)])
            .unwrap();
        let node = boxed(&mut scene, 0.0, 0.0, 10.0);
        scene.append(layer, &[group]).unwrap();
        scene.append(group, &[node]).unwrap();
        let log = record(&mut scene, node, &["mousedown", "mouseup"]);
        scene.set_mouse_capture(node).unwrap();

        for event_type in ["mousedown", "mouseup"] {
            let mut event = Event::new(event_type).at(Point::new(100.0, 100.0));
            let _ = scene.dispatch_to_layer(layer, event_type, &mut event).unwrap();
            assert_eq!(event.target, Some(node));
        }
        assert_eq!(*log.borrow(), ["mousedown", "mouseup"]);
    }

    #[test]
    fn stop_propagation_skips_container_listeners() {
        let mut scene = Scene::with_builtins().unwrap();
        let layer = scene.create_layer().unwrap();
        let node = boxed(&mut scene, 0.0, 0.0, 10.0);
        scene.append(layer, &[node]).unwrap();
        let layer_log = record(&mut scene, layer, &["click"]);
        scene
            .on(node, "click", |_, _, event| event.stop_propagation())
            .unwrap();

        let mut click = Event::new("click").at(Point::new(1.0, 1.0));
        let _ = scene.dispatch_to_layer(layer, "click", &mut click).unwrap();
        assert!(layer_log.borrow().is_empty());

        let mut click = Event::new("click").at(Point::new(50.0, 50.0));
        let _ = scene.dispatch_to_layer(layer, "click", &mut click).unwrap();
        assert_eq!(*layer_log.borrow(), ["click"]);
    }

    #[test]
    fn touches_are_claimed_and_released() {
        let mut scene = Scene::with_builtins().unwrap();
        let layer = scene.create_layer().unwrap();
        let node = boxed(&mut scene, 0.0, 0.0, 10.0);
        scene.append(layer, &[node]).unwrap();
        let inside = Touch {
            identifier: 1,
            position: Point::new(2.0, 2.0),
        };
        let outside = Touch {
            identifier: 2,
            position: Point::new(80.0, 80.0),
        };

        let mut start = Event::new("touchstart").with_touches(vec![inside], vec![inside]);
        let _ = scene.dispatch_to_layer(layer, "touchstart", &mut start).unwrap();
        assert_eq!(scene.touch_claims(layer, 1), [node, layer]);
        assert_eq!(start.target_touches, [inside]);

        let mut other = Event::new("touchstart").with_touches(vec![inside, outside], vec![outside]);
        let _ = scene.dispatch_to_layer(layer, "touchstart", &mut other).unwrap();
        assert_eq!(scene.touch_claims(layer, 2), [layer]);

        let mut moved = Event::new("touchmove")
            .at(Point::new(3.0, 3.0))
            .with_touches(vec![inside, outside], vec![inside]);
        scene.dispatch_event(node, "touchmove", &mut moved, false, false).unwrap();
        assert_eq!(moved.target_touches, [inside]);

        let mut end = Event::new("touchend").with_touches(vec![outside], vec![inside]);
        let _ = scene.dispatch_to_layer(layer, "touchend", &mut end).unwrap();
        assert!(scene.touch_claims(layer, 1).is_empty());
        assert_eq!(scene.touch_claims(layer, 2), [layer]);
    }
}
