//! Serializable graph snapshots.
//!
//! A [`GraphSnapshot`] is the full, self-contained state of a diagram: the
//! ordered node list and the ordered edge list, each with its variant tags
//! and per-tag attribute dictionaries. History entries and saved files are
//! both snapshots.

use serde::{Deserialize, Serialize};

use railmap_core::{
    attrs::TypedAttrs,
    identifier::{EdgeId, NodeId},
};

use crate::error::RailmapError;

/// A node as stored in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub station_type: String,
    #[serde(default)]
    pub attrs: TypedAttrs,
}

/// An edge as stored in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type")]
    pub path_shape: String,
    #[serde(default)]
    pub attrs: TypedAttrs,
    pub style: String,
    #[serde(default)]
    pub style_attrs: TypedAttrs,
}

/// The full state of a diagram graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl GraphSnapshot {
    /// Parses a snapshot from JSON.
    ///
    /// Only the JSON structure is checked here; graph consistency is checked
    /// when the snapshot is imported.
    ///
    /// # Errors
    ///
    /// Returns [`RailmapError::Serialization`] for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, RailmapError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the snapshot to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, RailmapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}
