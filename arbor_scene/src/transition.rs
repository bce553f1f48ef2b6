// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pending attach/detach transitions.
//!
//! A node kind's [`enter`](crate::NodeKind::enter) or
//! [`exit`](crate::NodeKind::exit) hook may defer the structural part of an
//! attach or detach by returning [`TransitionCx::defer`]. The scene keeps the
//! resulting [`TransitionId`] together with a queue of continuations: the
//! finalization itself and any structural request made against the node while
//! the transition is in flight.
//!
//! A transition ends in one of two ways, both running the queue in
//! registration order:
//!
//! - [`Scene::complete_transition`]: the external completion signal, e.g. the
//!   end of an animation.
//! - [`Scene::resolve_transition`]: the "resolve now" escape, used when a node
//!   being removed is immediately inserted again.

use smallvec::SmallVec;

use crate::error::SceneError;
use crate::id::{NodeId, TransitionId};
use crate::scene::Scene;

/// The result of an enter or exit hook.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The hook finished synchronously.
    Done,
    /// The hook finishes when the transition completes.
    Pending(TransitionId),
}

/// Which way a node is moving.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Attaching.
    Enter,
    /// Detaching.
    Exit,
}

/// Context handed to enter and exit hooks.
#[derive(Debug)]
pub struct TransitionCx<'a> {
    scene: &'a mut Scene,
    node: NodeId,
    direction: Direction,
}

impl<'a> TransitionCx<'a> {
    pub(crate) fn new(scene: &'a mut Scene, node: NodeId, direction: Direction) -> Self {
        Self {
            scene,
            node,
            direction,
        }
    }

    /// The node being attached or detached.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Which way the node is moving.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The scene, e.g. to start an animation by writing attributes.
    pub fn scene(&mut self) -> &mut Scene {
        self.scene
    }

    /// Opens a pending transition for this node and direction.
    ///
    /// Return the result from the hook; the transition ends with
    /// [`Scene::complete_transition`] or [`Scene::resolve_transition`].
    pub fn defer(&mut self) -> Transition {
        Transition::Pending(self.scene.open_transition(self.node, self.direction))
    }
}

/// Deferred structural work queued on a transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Continuation {
    /// Finish a detach: drop `child` from `parent` and disconnect it.
    FinishRemove { parent: NodeId, child: NodeId },
    /// Append `child` once its previous detach is done.
    Append {
        parent: NodeId,
        child: NodeId,
        update: bool,
    },
    /// Insert `child` before `reference` once its previous detach is done.
    InsertBefore {
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    },
    /// Remove `child` once a replacement finished entering.
    RemoveChild { parent: NodeId, child: NodeId },
}

#[derive(Debug)]
pub(crate) struct PendingTransition {
    pub(crate) node: NodeId,
    pub(crate) direction: Direction,
    pub(crate) continuations: SmallVec<[Continuation; 2]>,
}

impl Scene {
    pub(crate) fn open_transition(&mut self, node: NodeId, direction: Direction) -> TransitionId {
        let id = TransitionId(self.next_transition);
        self.next_transition += 1;
        self.transitions.insert(
            id,
            PendingTransition {
                node,
                direction,
                continuations: SmallVec::new(),
            },
        );
        tracing::debug!(?node, ?direction, transition = ?id, "transition deferred");
        id
    }

    /// Runs a node's enter or exit hook and records a deferred result.
    pub(crate) fn run_hook(
        &mut self,
        node: NodeId,
        direction: Direction,
    ) -> Result<Transition, SceneError> {
        let kind = self.kind_rc(node)?;
        let mut cx = TransitionCx::new(self, node, direction);
        let result = match direction {
            Direction::Enter => kind.enter(&mut cx),
            Direction::Exit => kind.exit(&mut cx),
        };
        if let Transition::Pending(id) = result {
            if !self.transitions.contains_key(&id) {
                return Err(SceneError::UnknownTransition(id));
            }
            let slot = self.node_mut(node)?;
            match direction {
                Direction::Enter => slot.enter_pending = Some(id),
                Direction::Exit => slot.exit_pending = Some(id),
            }
        }
        Ok(result)
    }

    pub(crate) fn queue_continuation(
        &mut self,
        id: TransitionId,
        continuation: Continuation,
    ) -> Result<(), SceneError> {
        let pending = self
            .transitions
            .get_mut(&id)
            .ok_or(SceneError::UnknownTransition(id))?;
        pending.continuations.push(continuation);
        Ok(())
    }

    /// Returns `true` while `id` has neither completed nor been resolved.
    #[must_use]
    pub fn is_pending(&self, id: TransitionId) -> bool {
        self.transitions.contains_key(&id)
    }

    /// Returns the pending detach of `node`, if any.
    #[must_use]
    pub fn pending_exit(&self, node: NodeId) -> Option<TransitionId> {
        self.get(node).and_then(|n| n.exit_pending)
    }

    /// Returns the pending attach of `node`, if any.
    #[must_use]
    pub fn pending_enter(&self, node: NodeId) -> Option<TransitionId> {
        self.get(node).and_then(|n| n.enter_pending)
    }

    /// Signals that the work behind `id` finished, running its queued
    /// continuations in registration order.
    ///
    /// The first failing continuation stops the queue and its error is
    /// returned.
    pub fn complete_transition(&mut self, id: TransitionId) -> Result<(), SceneError> {
        tracing::debug!(transition = ?id, "transition completed");
        self.finish_transition(id)
    }

    /// Forces `id` to finish now instead of waiting for its completion signal.
    pub fn resolve_transition(&mut self, id: TransitionId) -> Result<(), SceneError> {
        tracing::debug!(transition = ?id, "transition resolved early");
        self.finish_transition(id)
    }

    fn finish_transition(&mut self, id: TransitionId) -> Result<(), SceneError> {
        let pending = self
            .transitions
            .remove(&id)
            .ok_or(SceneError::UnknownTransition(id))?;
        if let Some(node) = self.get_mut(pending.node) {
            let slot = match pending.direction {
                Direction::Enter => &mut node.enter_pending,
                Direction::Exit => &mut node.exit_pending,
            };
            if *slot == Some(id) {
                *slot = None;
            }
        }
        for continuation in pending.continuations {
            tracing::trace!(transition = ?id, ?continuation, "running continuation");
            self.run_continuation(continuation)?;
        }
        Ok(())
    }

    fn run_continuation(&mut self, continuation: Continuation) -> Result<(), SceneError> {
        match continuation {
            Continuation::FinishRemove { parent, child } => {
                let _ = self.finish_remove(parent, child)?;
            }
            Continuation::Append {
                parent,
                child,
                update,
            } => {
                let _ = self.finish_append(parent, child, update)?;
            }
            Continuation::InsertBefore {
                parent,
                child,
                reference,
            } => {
                let _ = self.finish_insert(parent, child, reference)?;
            }
            Continuation::RemoveChild { parent, child } => {
                let _ = self.remove_child(parent, child)?;
            }
        }
        Ok(())
    }
}
