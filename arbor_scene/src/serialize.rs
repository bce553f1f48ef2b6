// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat node snapshots.

use alloc::collections::BTreeMap;
use alloc::string::String;

use arbor_attr::AttrValue;
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::id::NodeId;
use crate::scene::Scene;

/// A node's type, stored attributes and data, without its children.
///
/// Relative attributes keep their raw strings (`"50%"`), and `dataset` is
/// the data bag encoded as a JSON string.
///
/// ```rust
/// use arbor_scene::{Scene, SerializedNode};
///
/// let mut scene = Scene::with_builtins().unwrap();
/// let node = scene.create_node("block").unwrap();
/// scene.set_attr(node, "id", "logo").unwrap();
/// scene.set_attr(node, "width", "50%").unwrap();
///
/// let snapshot = scene.serialize(node).unwrap();
/// assert_eq!(snapshot.id.as_deref(), Some("logo"));
/// let json = serde_json::to_string(&snapshot).unwrap();
/// assert!(json.contains(r#""nodeType":"block""#));
///
/// let copy = scene.deserialize(&serde_json::from_str::<SerializedNode>(&json).unwrap()).unwrap();
/// assert_eq!(scene.serialize(copy).unwrap(), snapshot);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedNode {
    /// The registered type name.
    pub node_type: String,
    /// The stored attributes.
    pub attrs: BTreeMap<String, AttrValue>,
    /// The data bag as a JSON object string.
    pub dataset: String,
    /// The `id` attribute.
    pub id: Option<String>,
}

impl Scene {
    /// Takes a snapshot of `node`.
    pub fn serialize(&self, node: NodeId) -> Result<SerializedNode, SceneError> {
        let slot = self.node(node)?;
        Ok(SerializedNode {
            node_type: slot.kind.node_type().into(),
            attrs: slot.attrs.snapshot(),
            dataset: serde_json::to_string(&slot.data)?,
            id: self.id_attr(node),
        })
    }

    /// Creates a detached node from a snapshot.
    ///
    /// Attributes are restored without side effects. An empty `dataset` is
    /// read as no data.
    pub fn deserialize(&mut self, snapshot: &SerializedNode) -> Result<NodeId, SceneError> {
        let data: BTreeMap<String, serde_json::Value> = if snapshot.dataset.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&snapshot.dataset)?
        };
        let node = self.create_node(&snapshot.node_type)?;
        self.merge(node, snapshot.attrs.clone())?;
        if let Some(id) = &snapshot.id
            && !snapshot.attrs.contains_key("id")
        {
            self.quiet_set(node, "id", id.as_str())?;
        }
        self.node_mut(node)?.data = data;
        Ok(node)
    }

    /// Creates a detached copy of `node` without its children.
    pub fn clone_node(&mut self, node: NodeId) -> Result<NodeId, SceneError> {
        let snapshot = self.serialize(node)?;
        self.deserialize(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_round_trips_as_a_string() {
        let mut scene = Scene::with_builtins().unwrap();
        let node = scene.create_node("label").unwrap();
        scene.set_attr(node, "text", "hello").unwrap();
        scene.set_data(node, "tags", serde_json::json!(["a", "b"])).unwrap();

        let snapshot = scene.serialize(node).unwrap();
        assert_eq!(snapshot.dataset, r#"{"tags":["a","b"]}"#);
        assert_eq!(snapshot.id, None);

        let copy = scene.clone_node(node).unwrap();
        assert_ne!(copy, node);
        assert_eq!(scene.attr(copy, "text").unwrap(), AttrValue::from("hello"));
        assert_eq!(scene.data(copy, "tags"), scene.data(node, "tags"));
    }

    #[test]
    fn unknown_types_and_bad_datasets_fail() {
        let mut scene = Scene::with_builtins().unwrap();
        let mut snapshot = SerializedNode {
            node_type: "sprite".into(),
            attrs: BTreeMap::new(),
            dataset: String::new(),
            id: Some("x".into()),
        };
        assert!(matches!(
            scene.deserialize(&snapshot),
            Err(SceneError::UnknownNodeType(_))
        ));
        snapshot.node_type = "block".into();
        let node = scene.deserialize(&snapshot).unwrap();
        assert_eq!(scene.id_attr(node).as_deref(), Some("x"));

        snapshot.dataset = "{not json".into();
        assert!(matches!(scene.deserialize(&snapshot), Err(SceneError::Json(_))));
    }
}
