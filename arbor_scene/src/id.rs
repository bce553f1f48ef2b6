// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handles into a [`Scene`](crate::Scene).

/// Identifier for a node in a scene.
///
/// This is a small, copyable handle that stays stable while the node lives but
/// becomes invalid when the underlying slot is reused.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On creation, a fresh slot is allocated with generation `1`.
/// - On [`Scene::destroy`](crate::Scene::destroy), the slot is freed; any
///   existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new,
///   distinct `NodeId`.
///
/// Use [`Scene::is_alive`](crate::Scene::is_alive) to check whether a `NodeId`
/// still refers to a live node. Stale `NodeId`s never alias a different live
/// node because the generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

/// Handle of an in-flight asynchronous attach or detach.
///
/// Handles are never reused within a scene, so a finished handle stays
/// finished.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub(crate) u32);

/// Handle of a registered event listener.
///
/// One handle covers every event type the listener was registered for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Handle of a value that will be supplied later, see
/// [`Scene::defer_attr`](crate::Scene::defer_attr).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct DeferredId(pub(crate) u32);
