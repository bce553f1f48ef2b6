// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute, style and data access on scene nodes.
//!
//! Reads resolve defaults, `inherit` and relative units. Writes through
//! [`Scene::set_attr`] store the value and, when it changed, request layout,
//! redraw, reflow and style work, then apply the coupled-attribute rules.
//! [`Scene::quiet_set`] and [`Scene::merge`] only store.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use arbor_attr::{
    AttrFlags, AttrValue, Axis, FontField, FontSpec, RelativeInput, RelativeUnit, RelativeValue,
    StoredValue, normalize_relative, walk_inherited,
};

use crate::error::SceneError;
use crate::id::{DeferredId, NodeId};
use crate::scene::Scene;

/// Attributes whose change re-runs text shaping below the node.
const TEXT_SHAPING: &[&str] = &[
    "font",
    "lineHeight",
    "lineBreak",
    "wordBreak",
    "letterSpacing",
    "textIndent",
];

/// Attributes that stay in the attribute store even though they are not
/// style properties.
const IDENTITY: &[&str] = &["id", "name", "class"];

/// What a [`DeferredId`] writes once fulfilled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DeferredTarget {
    Attr { node: NodeId, name: String },
    Data { node: NodeId, key: String },
}

impl DeferredTarget {
    pub(crate) fn node(&self) -> NodeId {
        match self {
            Self::Attr { node, .. } | Self::Data { node, .. } => *node,
        }
    }
}

impl Scene {
    /// Reads an attribute, re-applying a relative value whose reference
    /// size changed since it was written.
    ///
    /// A relative value with no reference (e.g. on a detached node) reads as
    /// its raw string.
    pub fn attr(&mut self, node: NodeId, name: &str) -> Result<AttrValue, SceneError> {
        let stale = match self.node(node)?.attrs.get(name) {
            Some(StoredValue::Relative(rel)) => {
                let current = self.relative_reference(node, rel.unit);
                rel.is_stale(current).then(|| rel.raw.clone())
            }
            _ => None,
        };
        if let Some(raw) = stale {
            tracing::trace!(?node, name, %raw, "re-applying relative attribute");
            self.apply_attr(node, name, AttrValue::String(raw), false)?;
        }
        self.peek_attr(node, name)
    }

    /// Reads an attribute without re-applying stale relative values.
    ///
    /// Relative values resolve against the current reference size.
    pub fn peek_attr(&self, node: NodeId, name: &str) -> Result<AttrValue, SceneError> {
        let slot = self.node(node)?;
        let table = slot.kind.attrs();
        let value = match slot.attrs.get(name) {
            Some(StoredValue::Relative(rel)) => return Ok(self.resolve_relative(node, rel)),
            Some(StoredValue::Value(value)) => value.clone(),
            None => table.default_value(name).cloned().unwrap_or_default(),
        };
        if value.is_inherit()
            && let Some(fallback) = table.inherit_default(name)
        {
            return Ok(self.inherited(node, name).unwrap_or_else(|| fallback.clone()));
        }
        Ok(value)
    }

    /// Writes an attribute with its full side effects.
    ///
    /// Writing [`AttrValue::Null`] removes the stored value.
    pub fn set_attr(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), SceneError> {
        self.apply_attr(node, name, value.into(), true)
    }

    /// Stores an attribute without any side effect.
    pub fn quiet_set(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), SceneError> {
        self.store_attr(node, name, value.into(), true).map(|_| ())
    }

    /// Stores several attributes without side effects.
    pub fn merge<K, V>(
        &mut self,
        node: NodeId,
        attrs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<(), SceneError>
    where
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        for (name, value) in attrs {
            self.quiet_set(node, name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Writes several attributes with full side effects.
    ///
    /// The keys `attrs` and `style` are bulk entries: their value is a map,
    /// or a list of maps merged left to right, applied with
    /// [`Scene::set_attr`] and [`Scene::set_style`] respectively.
    pub fn set_attrs<K, V>(
        &mut self,
        node: NodeId,
        attrs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<(), SceneError>
    where
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        for (name, value) in attrs {
            match name.as_ref() {
                "attrs" => {
                    for (name, value) in value.into().flatten_maps() {
                        self.set_attr(node, &name, value)?;
                    }
                }
                "style" => {
                    for (name, value) in value.into().flatten_maps() {
                        self.set_style(node, &name, value)?;
                    }
                }
                name => self.set_attr(node, name, value)?,
            }
        }
        Ok(())
    }

    /// Replaces an attribute with a value computed from its current value.
    pub fn update_attr(
        &mut self,
        node: NodeId,
        name: &str,
        update: impl FnOnce(AttrValue) -> AttrValue,
    ) -> Result<(), SceneError> {
        let current = self.attr(node, name)?;
        self.set_attr(node, name, update(current))
    }

    /// Removes a stored attribute so that it reads as its default again.
    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Result<(), SceneError> {
        self.set_attr(node, name, AttrValue::Null)
    }

    /// Returns `true` if `name` was written by the user rather than derived.
    #[must_use]
    pub fn is_explicit(&self, node: NodeId, name: &str) -> bool {
        self.get(node).is_some_and(|n| n.attrs.is_explicit(name))
    }

    /// A flat snapshot of the stored attributes; relative values appear as
    /// their raw strings.
    pub fn attrs_snapshot(&self, node: NodeId) -> Result<BTreeMap<String, AttrValue>, SceneError> {
        Ok(self.node(node)?.attrs.snapshot())
    }

    /// The `id` attribute.
    #[must_use]
    pub fn id_attr(&self, node: NodeId) -> Option<String> {
        self.string_attr(node, "id")
    }

    /// The `name` attribute.
    #[must_use]
    pub fn name_attr(&self, node: NodeId) -> Option<String> {
        self.string_attr(node, "name")
    }

    /// The whitespace-separated entries of the `class` attribute.
    #[must_use]
    pub fn class_list(&self, node: NodeId) -> Vec<String> {
        self.string_attr(node, "class")
            .map(|class| class.split_whitespace().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    fn string_attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.peek_attr(node, name)
            .ok()
            .and_then(|v| v.as_str().map(ToString::to_string))
    }

    /// Reads a style property.
    ///
    /// Declared attributes (other than `id`, `name` and `class`) and
    /// inherited attributes are read from the attribute store; anything else
    /// from the node's private style properties.
    pub fn style(&mut self, node: NodeId, name: &str) -> Result<AttrValue, SceneError> {
        if self.style_routes_to_attr(node, name)? {
            return self.attr(node, name);
        }
        Ok(self
            .node(node)?
            .style
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    /// Writes a style property, routed like [`Scene::style`].
    pub fn set_style(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), SceneError> {
        if self.style_routes_to_attr(node, name)? {
            return self.set_attr(node, name, value);
        }
        let value = value.into();
        let style = &mut self.node_mut(node)?.style;
        let changed = if value.is_null() {
            style.remove(name).is_some()
        } else {
            style.insert(name.to_string(), value.clone()) != Some(value)
        };
        if changed {
            self.force_update(node);
        }
        Ok(())
    }

    fn style_routes_to_attr(&self, node: NodeId, name: &str) -> Result<bool, SceneError> {
        let table = self.node(node)?.kind.attrs();
        Ok((table.contains(name) && !IDENTITY.contains(&name))
            || table.inherit_default(name).is_some())
    }

    /// Returns a data entry.
    #[must_use]
    pub fn data(&self, node: NodeId, key: &str) -> Option<&serde_json::Value> {
        self.get(node)?.data.get(key)
    }

    /// Returns every data entry of `node`.
    #[must_use]
    pub fn dataset(&self, node: NodeId) -> Option<&BTreeMap<String, serde_json::Value>> {
        self.get(node).map(|n| &n.data)
    }

    /// Writes a data entry; `null` removes it.
    ///
    /// Data entries are independent of attributes but may drive styling as
    /// `data-{key}`.
    pub fn set_data(
        &mut self,
        node: NodeId,
        key: &str,
        value: impl Into<serde_json::Value>,
    ) -> Result<(), SceneError> {
        let value = value.into();
        let data = &mut self.node_mut(node)?.data;
        let changed = if value.is_null() {
            data.remove(key).is_some()
        } else {
            data.insert(key.to_string(), value.clone()) != Some(value)
        };
        if changed && self.style_engine.requires_recompute(&format!("data-{key}")) {
            self.update_styles(node, false);
        }
        Ok(())
    }

    /// Replaces a data entry with a value computed from its current value.
    pub fn update_data(
        &mut self,
        node: NodeId,
        key: &str,
        update: impl FnOnce(Option<&serde_json::Value>) -> serde_json::Value,
    ) -> Result<(), SceneError> {
        let next = update(self.node(node)?.data.get(key));
        self.set_data(node, key, next)
    }

    /// Reserves an attribute write to be supplied later with
    /// [`Scene::fulfill_deferred`].
    pub fn defer_attr(&mut self, node: NodeId, name: &str) -> Result<DeferredId, SceneError> {
        self.node(node)?;
        Ok(self.open_deferred(DeferredTarget::Attr {
            node,
            name: name.to_string(),
        }))
    }

    /// Reserves a data write to be supplied later with
    /// [`Scene::fulfill_deferred`].
    pub fn defer_data(&mut self, node: NodeId, key: &str) -> Result<DeferredId, SceneError> {
        self.node(node)?;
        Ok(self.open_deferred(DeferredTarget::Data {
            node,
            key: key.to_string(),
        }))
    }

    fn open_deferred(&mut self, target: DeferredTarget) -> DeferredId {
        let id = DeferredId(self.next_deferred);
        self.next_deferred += 1;
        self.deferred.insert(id, target);
        id
    }

    /// Applies the value a deferred write was waiting for.
    pub fn fulfill_deferred(
        &mut self,
        id: DeferredId,
        value: impl Into<AttrValue>,
    ) -> Result<(), SceneError> {
        let target = self
            .deferred
            .remove(&id)
            .ok_or(SceneError::UnknownDeferred(id))?;
        match target {
            DeferredTarget::Attr { node, name } => self.set_attr(node, &name, value),
            DeferredTarget::Data { node, key } => {
                let json = serde_json::to_value(value.into())?;
                self.set_data(node, &key, json)
            }
        }
    }

    /// The reference size a relative unit resolves against right now.
    pub(crate) fn relative_reference(&self, node: NodeId, unit: RelativeUnit) -> Option<f64> {
        match unit {
            RelativeUnit::Parent(axis) => self.parent_extent(node, axis),
            RelativeUnit::Resolution(axis) => {
                let resolution = self.resolution(self.layer_of(node)?)?;
                Some(match axis {
                    Axis::Width => resolution.width,
                    Axis::Height => resolution.height,
                })
            }
        }
    }

    fn resolve_relative(&self, node: NodeId, rel: &RelativeValue) -> AttrValue {
        self.relative_reference(node, rel.unit)
            .map_or_else(|| AttrValue::String(rel.raw.clone()), |r| {
                AttrValue::Number(r * rel.ratio)
            })
    }

    /// The nearest ancestor value for an inherited attribute.
    fn inherited(&self, node: NodeId, name: &str) -> Option<AttrValue> {
        let scene: &Self = self;
        let lookup = move |key: NodeId| scene.get(key).map(|n| (&n.attrs, n.parent));
        let (owner, stored) = walk_inherited(self.parent(node), name, &lookup)?;
        Some(match stored {
            StoredValue::Value(value) => value.clone(),
            StoredValue::Relative(rel) => self.resolve_relative(owner, rel),
        })
    }

    /// Normalizes and stores a value; returns the declaration flags when the
    /// stored value changed, or `None` when nothing changed.
    ///
    /// Undeclared attributes are stored with the `QUIET` flag.
    fn store_attr(
        &mut self,
        node: NodeId,
        name: &str,
        value: AttrValue,
        explicit: bool,
    ) -> Result<Option<AttrFlags>, SceneError> {
        let kind = self.kind_rc(node)?;
        let meta = kind.attrs().get(name);
        let stored = match meta.and_then(|m| m.relative()) {
            Some(axis) => match normalize_relative(value, axis, |unit| {
                self.relative_reference(node, unit)
            }) {
                RelativeInput::Relative(rel) => StoredValue::Relative(rel),
                RelativeInput::Plain(value) => StoredValue::Value(value),
            },
            None => StoredValue::Value(value),
        };
        let changed = self.node_mut(node)?.attrs.set(name, stored, explicit);
        Ok(changed.then(|| meta.map_or(AttrFlags::QUIET, |m| m.flags())))
    }

    fn apply_attr(
        &mut self,
        node: NodeId,
        name: &str,
        value: AttrValue,
        explicit: bool,
    ) -> Result<(), SceneError> {
        let font = self.derived_font(node, name, &value)?;
        let coupled = value.clone();
        let Some(flags) = self.store_attr(node, name, value, explicit)? else {
            return Ok(());
        };
        if flags.contains(AttrFlags::QUIET) {
            if self.style_engine.affects_inheritance(name) {
                self.force_update(node);
            }
        } else {
            self.after_change(node, name, flags)?;
        }
        self.apply_coupled(node, name, &coupled, font)
    }

    fn after_change(&mut self, node: NodeId, name: &str, flags: AttrFlags) -> Result<(), SceneError> {
        let kind = self.kind_rc(node)?;
        if kind.has_layout(self, node) {
            let size = kind.box_offset_size(self, node);
            let slot = self.node_mut(node)?;
            let resized = slot.last_layout != Some(size);
            slot.last_layout = Some(size);
            if resized || flags.contains(AttrFlags::RELAYOUT) {
                self.clear_layout(node);
            }
        }
        self.request_redraw(node, !flags.contains(AttrFlags::CACHE));
        if flags.contains(AttrFlags::REFLOW) {
            self.reflow(node);
        }
        if self.style_engine.requires_recompute(name) {
            self.update_styles(node, false);
        }
        Ok(())
    }

    /// The `font` shorthand a write of a font field re-derives, computed
    /// before anything is stored so that an invalid field changes nothing.
    fn derived_font(
        &self,
        node: NodeId,
        name: &str,
        value: &AttrValue,
    ) -> Result<Option<String>, SceneError> {
        let Some(field) = FontField::from_attr(name) else {
            return Ok(None);
        };
        if value.is_null() || self.is_explicit(node, "font") || !self.declares(node, "font") {
            return Ok(None);
        }
        let current = self.peek_attr(node, "font")?;
        let mut font = match current.as_str().map(FontSpec::parse) {
            Some(Ok(font)) => font,
            _ => FontSpec::parse(&self.config.default_font)?,
        };
        font.apply(field, value)?;
        Ok(Some(font.to_string()))
    }

    fn apply_coupled(
        &mut self,
        node: NodeId,
        name: &str,
        value: &AttrValue,
        font: Option<String>,
    ) -> Result<(), SceneError> {
        if name == "color" && !self.is_explicit(node, "fillColor") && self.declares(node, "fillColor") {
            self.apply_attr(node, "fillColor", value.clone(), false)?;
        }
        if let Some(font) = font {
            self.apply_attr(node, "font", AttrValue::String(font), false)?;
        }
        if TEXT_SHAPING.contains(&name) {
            for descendant in self.descendants(node) {
                if let Ok(kind) = self.kind_rc(descendant) {
                    kind.retypeset(self, descendant);
                }
            }
        }
        Ok(())
    }

    fn declares(&self, node: NodeId, name: &str) -> bool {
        self.kind(node).is_some_and(|k| k.attrs().contains(name))
    }
}
