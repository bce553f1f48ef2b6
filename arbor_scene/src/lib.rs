// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbor Scene: a retained-mode scene graph.
//!
//! A [`Scene`] is an arena of nodes addressed by generational [`NodeId`]s.
//! Each node has a [`NodeKind`] describing its attributes and behavior, an
//! attribute store, a data bag, event listeners and a place in the tree.
//!
//! ## Attributes
//!
//! [`Scene::attr`] and [`Scene::set_attr`] read and write attributes declared
//! in the kind's [`AttrTable`](arbor_attr::AttrTable). Reads fall back to the
//! declared default, walk the ancestors for `inherit`, and resolve relative
//! units (`%` of the parent's content size, `rw`/`rh` of the layer
//! resolution). Writes invalidate layout, paint and reflow as declared and
//! apply the coupled rules (`color` drives `fillColor`, font fields drive
//! `font`). Invalidation only leaves [`Dirty`] marks for the renderer.
//!
//! ## Tree
//!
//! Children are kept in insertion order and in z-order. Attaching under a
//! [layer](Scene::create_layer) runs the kind's enter hook and removing runs
//! its exit hook; either may defer the structural change through a
//! [`TransitionId`] that finishes with [`Scene::complete_transition`].
//!
//! ## Events
//!
//! [`Scene::dispatch_to_layer`] hit-tests from the top of the z-order down,
//! keeps hover and active state, synthesizes `mouseenter`/`mouseleave` and
//! tracks touches per layer.
//!
//! ```rust
//! use arbor_scene::{Event, Scene};
//! use kurbo::Point;
//!
//! let mut scene = Scene::with_builtins().unwrap();
//! let layer = scene.create_layer().unwrap();
//! let panel = scene.create_node("group").unwrap();
//! let button = scene.create_node("block").unwrap();
//! scene.set_attrs(panel, [("width", "50%"), ("height", "100")]).unwrap();
//! scene.set_attrs(button, [("width", "50%"), ("height", "20")]).unwrap();
//! scene.append(layer, &[panel]).unwrap();
//! scene.append(panel, &[button]).unwrap();
//!
//! // The default layer is 300 wide.
//! assert_eq!(scene.attr(panel, "width").unwrap().as_f64(), Some(150.0));
//! assert_eq!(scene.attr(button, "width").unwrap().as_f64(), Some(75.0));
//!
//! let mut click = Event::new("click").at(Point::new(10.0, 10.0));
//! scene.dispatch_to_layer(layer, "click", &mut click).unwrap();
//! assert_eq!(click.target, Some(button));
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. The `std` feature (on by default)
//! enables `std` in the dependencies; without it, enable `libm` for kurbo.

#![no_std]

extern crate alloc;

mod attrs;
mod config;
mod dispatch;
mod error;
mod event;
mod id;
mod invalidate;
mod kind;
pub mod kinds;
mod lifecycle;
mod node;
mod scene;
mod serialize;
mod style;
pub mod transition;
mod tree;

pub use config::{SceneConfig, SceneConfigBuilder};
pub use error::SceneError;
pub use event::{Event, EventDetail, EventTypes, ListenerFn, Touch};
pub use id::{DeferredId, ListenerId, NodeId, TransitionId};
pub use kind::{NodeKind, NodeTypes};
pub use node::{Dirty, Node, VisualState};
pub use scene::Scene;
pub use serialize::SerializedNode;
pub use style::{NoStyle, StyleEngine, StyleScope};
pub use transition::{Direction, Transition, TransitionCx};
pub use tree::Mutation;

pub use arbor_attr;
