// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The style engine seam and style cascade scheduling.

use core::fmt;

use crate::id::NodeId;
use crate::scene::Scene;

/// How far a scheduled style cascade reaches.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StyleScope {
    /// The node and its descendants.
    Children,
    /// The node, its descendants and its following element siblings with
    /// their descendants.
    Siblings,
}

impl StyleScope {
    fn widen(self, other: Self) -> Self {
        if self == Self::Siblings || other == Self::Siblings {
            Self::Siblings
        } else {
            Self::Children
        }
    }
}

/// Computes styles from selectors and reports which names styling reads.
///
/// The scene never matches selectors itself; it only asks the engine whether
/// a write needs a cascade and runs [`StyleEngine::compute_style`] over the
/// nodes a cascade covers.
pub trait StyleEngine: fmt::Debug {
    /// Applies the computed style of `node`, typically with
    /// [`Scene::set_style`].
    fn compute_style(&self, scene: &mut Scene, node: NodeId);

    /// Whether a change of `name` (an attribute, or `data-{key}` for data
    /// entries) can change which rules match.
    fn requires_recompute(&self, name: &str) -> bool {
        let _ = name;
        false
    }

    /// Whether `name` changes inherited values even when undeclared.
    fn affects_inheritance(&self, name: &str) -> bool {
        let _ = name;
        false
    }
}

/// A style engine without any rules.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoStyle;

impl StyleEngine for NoStyle {
    fn compute_style(&self, _scene: &mut Scene, _node: NodeId) {}
}

impl Scene {
    /// Schedules a style cascade over `node`, widened to its following
    /// siblings when `next_siblings` is set.
    pub fn update_styles(&mut self, node: NodeId, next_siblings: bool) {
        let scope = if next_siblings {
            StyleScope::Siblings
        } else {
            StyleScope::Children
        };
        let Some(slot) = self.get_mut(node) else {
            return;
        };
        slot.style_scope = Some(slot.style_scope.map_or(scope, |s| s.widen(scope)));
        self.force_update(node);
    }

    /// The cascade scheduled on `node`, if any.
    #[must_use]
    pub fn pending_style(&self, node: NodeId) -> Option<StyleScope> {
        self.get(node).and_then(|n| n.style_scope)
    }

    /// Runs every cascade scheduled at or below `root`, returning how many
    /// nodes had their style computed.
    pub fn flush_styles(&mut self, root: NodeId) -> usize {
        let mut scheduled = alloc::vec![root];
        scheduled.extend(self.descendants(root));
        let mut computed = 0;
        for node in scheduled {
            let Some(scope) = self.get_mut(node).and_then(|n| n.style_scope.take()) else {
                continue;
            };
            let mut covered = alloc::vec![node];
            covered.extend(self.descendants(node));
            if scope == StyleScope::Siblings {
                let mut sibling = self.next_element_sibling(node);
                while let Some(next) = sibling {
                    covered.push(next);
                    covered.extend(self.descendants(next));
                    sibling = self.next_element_sibling(next);
                }
            }
            let engine = alloc::rc::Rc::clone(&self.style_engine);
            for target in covered {
                if self.is_alive(target) {
                    engine.compute_style(self, target);
                    computed += 1;
                }
            }
        }
        tracing::trace!(?root, computed, "styles flushed");
        computed
    }
}
