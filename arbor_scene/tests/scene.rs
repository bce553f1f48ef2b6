// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene-level behavior across attributes, tree mutation and dispatch.

use std::cell::RefCell;
use std::rc::Rc;

use arbor_attr::{AttrTable, AttrValue};
use arbor_scene::kinds::{block_table, rect_collision};
use arbor_scene::{
    Event, Mutation, NodeId, NodeKind, Scene, SceneError, Transition, TransitionCx,
};
use kurbo::{Point, Size};

/// A block whose exit, enter, or both, finish only when completed.
#[derive(Debug)]
struct Animated {
    node_type: &'static str,
    attrs: AttrTable,
    defer_enter: bool,
    defer_exit: bool,
}

impl Animated {
    fn new(node_type: &'static str, defer_enter: bool, defer_exit: bool) -> Rc<Self> {
        Rc::new(Self {
            node_type,
            attrs: block_table().unwrap(),
            defer_enter,
            defer_exit,
        })
    }
}

impl NodeKind for Animated {
    fn node_type(&self) -> &str {
        self.node_type
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

    fn enter(&self, cx: &mut TransitionCx<'_>) -> Transition {
        if self.defer_enter {
            cx.defer()
        } else {
            Transition::Done
        }
    }

    fn exit(&self, cx: &mut TransitionCx<'_>) -> Transition {
        if !self.defer_exit {
            return Transition::Done;
        }
        let node = cx.node();
        // Start fading; the caller completes the transition when it is done.
        let _ = cx.scene().set_attr(node, "opacity", 0);
        cx.defer()
    }
}

fn scene() -> Scene {
    let mut scene = Scene::with_builtins().unwrap();
    scene.types_mut().register(Animated::new("fading", false, true));
    scene.types_mut().register(Animated::new("sliding", true, false));
    scene
}

fn z_orders(scene: &Scene, nodes: &[NodeId]) -> Vec<Option<i64>> {
    nodes.iter().map(|&n| scene.z_order(n)).collect()
}

fn assert_sorted_consistent(scene: &Scene, parent: NodeId) {
    let mut expected = scene.children(parent).to_vec();
    expected.sort_by_key(|&c| scene.z_order(c));
    assert_eq!(scene.sorted_children(parent), expected.as_slice());
    let mut orders = z_orders(scene, scene.children(parent));
    orders.sort();
    orders.dedup();
    assert_eq!(orders.len(), scene.children(parent).len(), "duplicate z-orders");
}

#[test]
fn append_then_insert_before() {
    let mut scene = scene();
    let container = scene.create_node("group").unwrap();
    let [a, b, c, d] = ["block"; 4].map(|t| scene.create_node(t).unwrap());

    scene.append(container, &[a, b, c]).unwrap();
    assert_eq!(z_orders(&scene, &[a, b, c]), [Some(0), Some(1), Some(2)]);
    assert_eq!(scene.children(container), [a, b, c]);
    assert_eq!(scene.sorted_children(container), [a, b, c]);

    let _ = scene.insert_before(container, d, Some(b)).unwrap();
    assert_eq!(z_orders(&scene, &[d, b, c]), [Some(1), Some(2), Some(3)]);
    assert_eq!(scene.children(container), [a, d, b, c]);
    assert_eq!(scene.sorted_children(container), [a, d, b, c]);
}

#[test]
fn sorted_children_track_mutations() {
    let mut scene = scene();
    let layer = scene.create_layer().unwrap();
    let nodes: Vec<NodeId> = (0..6).map(|_| scene.create_node("block").unwrap()).collect();

    // A fixed pseudo-random sequence of operations.
    let mut seed = 17_u32;
    for _ in 0..60 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let node = nodes[(seed >> 8) as usize % nodes.len()];
        let other = nodes[(seed >> 16) as usize % nodes.len()];
        let result = match (seed >> 4) % 3 {
            0 => scene.append_child(layer, node, true),
            1 => scene.insert_before(layer, node, Some(other)),
            _ => scene.remove_child(layer, node),
        };
        assert!(result.is_ok());
        assert_sorted_consistent(&scene, layer);
    }
}

#[test]
fn pending_removal_returns_the_same_handle() {
    let mut scene = scene();
    let layer = scene.create_layer().unwrap();
    let node = scene.create_node("fading").unwrap();
    scene.append(layer, &[node]).unwrap();

    let first = scene.remove_child(layer, node).unwrap();
    let Mutation::Pending(handle) = first else {
        panic!("expected a pending removal, got {first:?}");
    };
    assert_eq!(scene.remove_child(layer, node).unwrap(), first);
    assert_eq!(scene.remove(node).unwrap(), first);

    // The node stays in place, fading, until the transition completes.
    assert_eq!(scene.children(layer), [node]);
    assert_eq!(scene.attr(node, "opacity").unwrap(), AttrValue::from(0));
    assert!(scene.is_pending(handle));

    scene.complete_transition(handle).unwrap();
    assert!(!scene.is_pending(handle));
    assert!(scene.children(layer).is_empty());
    assert_eq!(scene.parent(node), None);
    assert!(matches!(
        scene.complete_transition(handle),
        Err(SceneError::UnknownTransition(_))
    ));
}

#[test]
fn reinserting_resolves_a_pending_removal() {
    let mut scene = scene();
    let layer = scene.create_layer().unwrap();
    let target = scene.create_node("group").unwrap();
    let node = scene.create_node("fading").unwrap();
    scene.append(layer, &[node, target]).unwrap();

    let Mutation::Pending(handle) = scene.remove_child(layer, node).unwrap() else {
        panic!("expected a pending removal");
    };
    assert_eq!(
        scene.append_child(target, node, true).unwrap(),
        Mutation::Pending(handle)
    );
    assert!(!scene.is_pending(handle));
    assert_eq!(scene.parent(node), Some(target));
    assert_eq!(scene.children(layer), [target]);
    assert_eq!(scene.children(target), [node]);
}

#[test]
fn replace_waits_for_the_new_node_to_enter() {
    let mut scene = scene();
    let layer = scene.create_layer().unwrap();
    let old = scene.create_node("block").unwrap();
    let new = scene.create_node("sliding").unwrap();
    scene.append(layer, &[old]).unwrap();

    let Mutation::Pending(entering) = scene.replace_child(layer, new, old).unwrap() else {
        panic!("expected the replacement to wait");
    };
    assert_eq!(scene.pending_enter(new), Some(entering));
    assert_eq!(scene.children(layer), [new, old]);

    scene.complete_transition(entering).unwrap();
    assert_eq!(scene.children(layer), [new]);
    assert_eq!(scene.parent(old), None);
    assert_eq!(scene.z_order(new), Some(0));
}

#[test]
fn detached_nodes_skip_hooks() {
    let mut scene = scene();
    let container = scene.create_node("group").unwrap();
    let node = scene.create_node("sliding").unwrap();
    // Not under a layer, so the enter hook does not run.
    assert_eq!(
        scene.append_child(container, node, true).unwrap(),
        Mutation::Done(node)
    );
}

#[test]
fn destroy_drops_pending_transitions() {
    let mut scene = scene();
    let layer = scene.create_layer().unwrap();
    let node = scene.create_node("fading").unwrap();
    scene.append(layer, &[node]).unwrap();
    let handle = scene.remove(node).unwrap().transition().unwrap();

    scene.destroy(node).unwrap();
    assert!(!scene.is_alive(node));
    assert!(!scene.is_pending(handle));
    assert!(scene.children(layer).is_empty());
}

#[test]
fn connect_to_a_second_parent() {
    let mut scene = scene();
    let first = scene.create_node("group").unwrap();
    let second = scene.create_node("group").unwrap();
    let node = scene.create_node("block").unwrap();

    let _ = scene.append_child(first, node, true).unwrap();
    scene.connect(node, second, 0).unwrap();
    assert_eq!(scene.parent(node), Some(second));
    assert!(!scene.children(first).contains(&node));
}

#[test]
fn connect_twice_moves_the_parent_link() {
    let mut scene = scene();
    let first = scene.create_node("group").unwrap();
    let second = scene.create_node("group").unwrap();
    let node = scene.create_node("block").unwrap();

    scene.connect(node, first, 0).unwrap();
    assert_eq!(scene.parent(node), Some(first));
    scene.connect(node, second, 3).unwrap();
    assert_eq!(scene.parent(node), Some(second));
    assert_eq!(scene.z_order(node), Some(3));
    assert!(!scene.children(first).contains(&node));
}

#[test]
fn mismatched_disconnect_is_a_protocol_error() {
    let mut scene = scene();
    let first = scene.create_node("group").unwrap();
    let second = scene.create_node("group").unwrap();
    let node = scene.create_node("block").unwrap();
    let _ = scene.append_child(first, node, true).unwrap();

    let err = scene.disconnect(node, second).unwrap_err();
    assert!(matches!(err, SceneError::Protocol { parent, .. } if parent == second));
    assert_eq!(scene.parent(node), Some(first));
    assert_eq!(scene.z_order(node), Some(0));
    assert_eq!(scene.children(first), [node]);
}

#[test]
fn percent_width_follows_the_parent() {
    let mut scene = scene();
    let layer = scene.create_layer_with(Size::new(800.0, 600.0)).unwrap();
    let parent = scene.create_node("group").unwrap();
    let child = scene.create_node("block").unwrap();
    scene.set_attr(parent, "width", 200).unwrap();
    scene.append(layer, &[parent]).unwrap();
    scene.append(parent, &[child]).unwrap();

    scene.set_attr(child, "width", "50%").unwrap();
    assert_eq!(scene.attr(child, "width").unwrap(), AttrValue::from(100));

    scene.set_attr(parent, "width", 300).unwrap();
    assert_eq!(scene.attr(child, "width").unwrap(), AttrValue::from(150));
    assert_eq!(
        scene.serialize(child).unwrap().attrs.get("width"),
        Some(&AttrValue::from("50%"))
    );
}

#[test]
fn hover_enters_and_leaves_once() {
    let mut scene = scene();
    let layer = scene.create_layer().unwrap();
    let node = scene.create_node("block").unwrap();
    scene
        .set_attrs(node, [("x", 10), ("y", 10), ("width", 20), ("height", 20)])
        .unwrap();
    scene.append(layer, &[node]).unwrap();

    let log: Rc<RefCell<Vec<String>>> = Rc::default();
    let sink = Rc::clone(&log);
    scene
        .on(node, ["mouseenter", "mouseleave"], move |_, _, event| {
            sink.borrow_mut().push(event.event_type.clone());
        })
        .unwrap();

    for point in [(0.0, 0.0), (15.0, 15.0), (20.0, 20.0), (0.0, 0.0)] {
        let mut event = Event::new("mousemove").at(Point::new(point.0, point.1));
        scene.dispatch_to_layer(layer, "mousemove", &mut event).unwrap();
    }
    assert_eq!(*log.borrow(), ["mouseenter", "mouseleave"]);
    assert!(!scene.is_hovering(node));
}

#[test]
fn captured_node_receives_moves_from_the_layer() {
    let mut scene = scene();
    let layer = scene.create_layer().unwrap();
    let below = scene.create_node("block").unwrap();
    let above = scene.create_node("block").unwrap();
    scene
        .set_attrs(below, [("x", 0), ("y", 0), ("width", 10), ("height", 10)])
        .unwrap();
    scene
        .set_attrs(above, [("x", 50), ("y", 50), ("width", 50), ("height", 50)])
        .unwrap();
    scene.append(layer, &[below, above]).unwrap();

    let moves = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&moves);
    scene
        .on(below, "mousemove", move |_, _, _| *counter.borrow_mut() += 1)
        .unwrap();
    scene.set_mouse_capture(below).unwrap();

    // Once over a sibling painted on top, once outside the layer.
    for point in [(60.0, 60.0), (1000.0, 1000.0)] {
        let mut event = Event::new("mousemove").at(Point::new(point.0, point.1));
        scene.dispatch_to_layer(layer, "mousemove", &mut event).unwrap();
    }
    assert_eq!(*moves.borrow(), 2);

    scene.release_mouse_capture(below).unwrap();
    let mut event = Event::new("mousemove").at(Point::new(60.0, 60.0));
    scene.dispatch_to_layer(layer, "mousemove", &mut event).unwrap();
    assert_eq!(*moves.borrow(), 2);
}

#[test]
fn lifecycle_events_reach_listeners() {
    let mut scene = scene();
    let layer = scene.create_layer().unwrap();
    let node = scene.create_node("block").unwrap();
    let count = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&count);
    scene
        .on(layer, ["appendChild", "removeChild"], move |_, _, _| {
            *counter.borrow_mut() += 1;
        })
        .unwrap();

    scene.append(layer, &[node]).unwrap();
    let _ = scene.remove(node).unwrap();
    assert_eq!(*count.borrow(), 2);
}
