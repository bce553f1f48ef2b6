// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised by scene operations.

use alloc::string::String;

use arbor_attr::{ConfigError, FontError};

use crate::id::{DeferredId, NodeId, TransitionId};

/// An error returned by a [`Scene`](crate::Scene) operation.
///
/// Errors are reported to the caller immediately and never retried. A failed
/// operation leaves the scene as it was before the failing step.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// A lifecycle call that does not match the tree, e.g. disconnecting a node
    /// from a parent it is not attached to.
    #[error("protocol violation on {node:?} with parent {parent:?}: {reason}")]
    Protocol {
        /// The node being attached or detached.
        node: NodeId,
        /// The parent given by the caller.
        parent: NodeId,
        /// What was wrong.
        reason: &'static str,
    },
    /// A node kind does not provide an operation the scene needed.
    #[error("node type `{node_type}` does not implement `{operation}`")]
    NotImplemented {
        /// The kind's type name.
        node_type: String,
        /// The missing operation.
        operation: &'static str,
    },
    /// The node was destroyed.
    #[error("node {0:?} is no longer alive")]
    StaleNode(NodeId),
    /// The transition finished or never existed.
    #[error("transition {0:?} is not pending")]
    UnknownTransition(TransitionId),
    /// The deferred value was already supplied or never existed.
    #[error("deferred value {0:?} is not pending")]
    UnknownDeferred(DeferredId),
    /// No kind is registered under this type name.
    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),
    /// The node has no layer state.
    #[error("node {0:?} is not a layer")]
    NotALayer(NodeId),
    /// A dataset could not be encoded or decoded.
    #[error("invalid dataset: {0}")]
    Json(#[from] serde_json::Error),
    /// A node kind's attribute table was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A font shorthand could not be re-derived.
    #[error(transparent)]
    Font(#[from] FontError),
}
