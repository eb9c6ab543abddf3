//! The authoritative diagram graph.
//!
//! [`GraphStore`] owns every node and edge of a diagram plus an adjacency
//! index for lookups by endpoint. All mutations are synchronous and local:
//! nothing here re-renders or records history. The sync controller decides
//! when a batch of mutations becomes visible and when it is persisted.

mod snapshot;

pub use snapshot::{EdgeRecord, GraphSnapshot, NodeRecord};

use std::{
    collections::{HashMap, HashSet},
    rc::Rc,
};

use indexmap::{IndexMap, IndexSet};
use log::{debug, info};

use railmap_core::{
    attrs::{AttrValue, Attrs, TypedAttrs},
    geometry::Point,
    identifier::{EdgeId, ElementId, NodeId, NodeKind},
    path::PathShape,
};

use crate::{
    error::RailmapError,
    registry::{Descriptor, TypeRegistry},
};

/// A station or miscellaneous point.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    position: Point,
    station_type: String,
    attrs: TypedAttrs,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Tag of the active station variant.
    pub fn station_type(&self) -> &str {
        &self.station_type
    }

    /// Attributes of the active variant, if any were stored.
    pub fn active_attrs(&self) -> Option<&Attrs> {
        self.attrs.active(&self.station_type)
    }

    /// All cached per-variant attributes.
    pub fn typed_attrs(&self) -> &TypedAttrs {
        &self.attrs
    }
}

/// A line connecting two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    id: EdgeId,
    source: NodeId,
    target: NodeId,
    path_shape: PathShape,
    path_attrs: TypedAttrs,
    line_style: String,
    style_attrs: TypedAttrs,
}

impl Edge {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// The lexicographically smaller endpoint.
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// The lexicographically larger endpoint.
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn path_shape(&self) -> PathShape {
        self.path_shape
    }

    /// Attributes of the active path shape, if any were stored.
    pub fn active_path_attrs(&self) -> Option<&Attrs> {
        self.path_attrs.active(self.path_shape.tag())
    }

    /// Tag of the active line style.
    pub fn line_style(&self) -> &str {
        &self.line_style
    }

    /// Attributes of the active line style, if any were stored.
    pub fn active_style_attrs(&self) -> Option<&Attrs> {
        self.style_attrs.active(&self.line_style)
    }

    /// Returns the endpoint opposite to `node`.
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if node == self.source {
            Some(self.target)
        } else if node == self.target {
            Some(self.source)
        } else {
            None
        }
    }

    /// Whether this edge joins `a` and `b`, in either direction.
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        self.other_end(a) == Some(b)
    }
}

/// The mutable diagram graph.
#[derive(Debug)]
pub struct GraphStore {
    registry: Rc<TypeRegistry>,
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    adjacency: HashMap<NodeId, IndexSet<EdgeId>>,
    id_counter: usize,
}

impl GraphStore {
    pub fn new(registry: Rc<TypeRegistry>) -> Self {
        Self {
            registry,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            adjacency: HashMap::new(),
            id_counter: 0,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, RailmapError> {
        self.nodes.get(&id).ok_or(RailmapError::NotFound(id.into()))
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge, RailmapError> {
        self.edges.get(&id).ok_or(RailmapError::NotFound(id.into()))
    }

    pub fn contains(&self, id: ElementId) -> bool {
        match id {
            ElementId::Node(id) => self.nodes.contains_key(&id),
            ElementId::Edge(id) => self.edges.contains_key(&id),
        }
    }

    /// Edges incident to `node`, in the order they were connected.
    pub fn edges_of(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        self.adjacency
            .get(&node)
            .into_iter()
            .flatten()
            .filter_map(|id| self.edges.get(id))
    }

    /// The edge connecting `a` and `b` in either direction.
    ///
    /// Node ids may contain `_`, so a derived edge id can be shared by
    /// different pairs; the stored endpoints decide.
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<&Edge> {
        self.edges
            .get(&EdgeId::between(a, b))
            .filter(|edge| edge.connects(a, b))
    }

    /// Generates a node identifier in `kind`'s namespace that is not in use.
    pub fn next_node_id(&mut self, kind: NodeKind) -> NodeId {
        loop {
            self.id_counter += 1;
            let id = NodeId::generated(kind, self.id_counter);
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    /// Adds a node of a registered station variant.
    ///
    /// `attrs` is completed from the variant defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RailmapError::AlreadyExists`] for a duplicate id and
    /// [`RailmapError::UnknownType`] for an unregistered variant.
    pub fn add_node(
        &mut self,
        id: NodeId,
        position: Point,
        station_type: &str,
        attrs: Option<&Attrs>,
    ) -> Result<(), RailmapError> {
        if self.nodes.contains_key(&id) {
            return Err(RailmapError::AlreadyExists(id.into()));
        }
        let descriptor = self.registry.stations().lookup(station_type)?;
        let attrs = TypedAttrs::single(station_type, descriptor.complete(attrs));

        self.nodes.insert(
            id,
            Node {
                id,
                position,
                station_type: station_type.to_string(),
                attrs,
            },
        );
        debug!(node_id:% = id, station_type; "Node added");
        Ok(())
    }

    /// Removes a node together with every incident edge.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, RailmapError> {
        let node = self
            .nodes
            .shift_remove(&id)
            .ok_or(RailmapError::NotFound(id.into()))?;

        let incident = self.adjacency.remove(&id).unwrap_or_default();
        for edge_id in &incident {
            if let Some(edge) = self.edges.shift_remove(edge_id)
                && let Some(other) = edge.other_end(id)
                && let Some(set) = self.adjacency.get_mut(&other)
            {
                set.shift_remove(edge_id);
            }
        }

        debug!(node_id:% = id, removed_edges = incident.len(); "Node removed");
        Ok(node)
    }

    /// Connects two existing nodes.
    ///
    /// Endpoints are stored in canonical order regardless of argument order.
    ///
    /// # Errors
    ///
    /// Returns [`RailmapError::NotFound`] for a missing endpoint,
    /// [`RailmapError::InvalidEdge`] for a self-loop,
    /// [`RailmapError::AlreadyExists`] when the pair is already connected,
    /// [`RailmapError::InvalidEdge`] when another pair holds the derived id and
    /// [`RailmapError::UnknownType`] for an unregistered style or shape.
    pub fn add_edge(
        &mut self,
        a: NodeId,
        b: NodeId,
        shape: PathShape,
        line_style: &str,
    ) -> Result<EdgeId, RailmapError> {
        let id = EdgeId::between(a, b);
        for endpoint in [a, b] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(RailmapError::NotFound(endpoint.into()));
            }
        }
        if a == b {
            return Err(RailmapError::InvalidEdge {
                id,
                reason: "an edge cannot connect a node to itself".to_string(),
            });
        }
        if let Some(existing) = self.edges.get(&id) {
            if existing.connects(a, b) {
                return Err(RailmapError::AlreadyExists(id.into()));
            }
            return Err(RailmapError::InvalidEdge {
                id,
                reason: format!(
                    "id is already taken by the edge between `{}` and `{}`",
                    existing.source, existing.target
                ),
            });
        }

        let path_defaults = self.registry.paths().lookup(shape.tag())?.complete(None);
        let style_defaults = self.registry.line_styles().lookup(line_style)?.complete(None);

        let (source, target) = NodeId::canonical_pair(a, b);
        self.insert_edge(Edge {
            id,
            source,
            target,
            path_shape: shape,
            path_attrs: TypedAttrs::single(shape.tag(), path_defaults),
            line_style: line_style.to_string(),
            style_attrs: TypedAttrs::single(line_style, style_defaults),
        });
        debug!(edge_id:% = id, shape:%, line_style; "Edge added");
        Ok(id)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, RailmapError> {
        let edge = self
            .edges
            .shift_remove(&id)
            .ok_or(RailmapError::NotFound(id.into()))?;
        for endpoint in [edge.source, edge.target] {
            if let Some(set) = self.adjacency.get_mut(&endpoint) {
                set.shift_remove(&id);
            }
        }
        debug!(edge_id:% = id; "Edge removed");
        Ok(edge)
    }

    /// Removes a node or an edge.
    pub fn remove(&mut self, id: ElementId) -> Result<(), RailmapError> {
        match id {
            ElementId::Node(id) => self.remove_node(id).map(|_| ()),
            ElementId::Edge(id) => self.remove_edge(id).map(|_| ()),
        }
    }

    /// Reads one attribute of the node's active variant.
    pub fn node_attribute(&self, id: NodeId, key: &str) -> Result<Option<&AttrValue>, RailmapError> {
        Ok(self.node(id)?.active_attrs().and_then(|attrs| attrs.get(key)))
    }

    /// Complete attributes of the node's active variant.
    pub fn node_attrs(&self, id: NodeId) -> Result<Attrs, RailmapError> {
        let node = self.node(id)?;
        let (_, descriptor) = self.registry.stations().resolve(&node.station_type);
        Ok(descriptor.complete(node.active_attrs()))
    }

    /// Complete attributes of the edge's active path shape.
    pub fn edge_path_attrs(&self, id: EdgeId) -> Result<Attrs, RailmapError> {
        let edge = self.edge(id)?;
        let (_, descriptor) = self.registry.paths().resolve(edge.path_shape.tag());
        Ok(descriptor.complete(edge.active_path_attrs()))
    }

    /// Complete attributes of the edge's active line style.
    pub fn edge_style_attrs(&self, id: EdgeId) -> Result<Attrs, RailmapError> {
        let edge = self.edge(id)?;
        let (_, descriptor) = self.registry.line_styles().resolve(&edge.line_style);
        Ok(descriptor.complete(edge.active_style_attrs()))
    }

    /// Shallow-merges `patch` into the node's active variant attributes.
    pub fn merge_node_attributes(&mut self, id: NodeId, patch: &Attrs) -> Result<(), RailmapError> {
        let registry = Rc::clone(&self.registry);
        let node = self.node_mut(id)?;
        let (_, descriptor) = registry.stations().resolve(&node.station_type);
        node.attrs.merge(&node.station_type, patch, descriptor.defaults());
        debug!(node_id:% = id, keys = patch.len(); "Node attributes merged");
        Ok(())
    }

    /// Shallow-merges `patch` into the edge's active path-shape attributes.
    pub fn merge_edge_path_attributes(
        &mut self,
        id: EdgeId,
        patch: &Attrs,
    ) -> Result<(), RailmapError> {
        let registry = Rc::clone(&self.registry);
        let edge = self.edge_mut(id)?;
        let tag = edge.path_shape.tag();
        let (_, descriptor) = registry.paths().resolve(tag);
        edge.path_attrs.merge(tag, patch, descriptor.defaults());
        debug!(edge_id:% = id, keys = patch.len(); "Edge path attributes merged");
        Ok(())
    }

    /// Shallow-merges `patch` into the edge's active line-style attributes.
    pub fn merge_edge_style_attributes(
        &mut self,
        id: EdgeId,
        patch: &Attrs,
    ) -> Result<(), RailmapError> {
        let registry = Rc::clone(&self.registry);
        let edge = self.edge_mut(id)?;
        let (_, descriptor) = registry.line_styles().resolve(&edge.line_style);
        edge.style_attrs
            .merge(&edge.line_style, patch, descriptor.defaults());
        debug!(edge_id:% = id, keys = patch.len(); "Edge style attributes merged");
        Ok(())
    }

    /// Replaces the node's active variant attributes wholesale.
    pub fn replace_node_attributes(&mut self, id: NodeId, attrs: Attrs) -> Result<(), RailmapError> {
        let node = self.node_mut(id)?;
        node.attrs.replace(&node.station_type, attrs);
        debug!(node_id:% = id; "Node attributes replaced");
        Ok(())
    }

    pub fn replace_edge_path_attributes(
        &mut self,
        id: EdgeId,
        attrs: Attrs,
    ) -> Result<(), RailmapError> {
        let edge = self.edge_mut(id)?;
        edge.path_attrs.replace(edge.path_shape.tag(), attrs);
        debug!(edge_id:% = id; "Edge path attributes replaced");
        Ok(())
    }

    pub fn replace_edge_style_attributes(
        &mut self,
        id: EdgeId,
        attrs: Attrs,
    ) -> Result<(), RailmapError> {
        let edge = self.edge_mut(id)?;
        edge.style_attrs.replace(&edge.line_style, attrs);
        debug!(edge_id:% = id; "Edge style attributes replaced");
        Ok(())
    }

    pub fn set_node_position(&mut self, id: NodeId, position: Point) -> Result<(), RailmapError> {
        self.node_mut(id)?.position = position;
        Ok(())
    }

    /// Switches a node to another station variant.
    ///
    /// Attributes of the previous variant stay cached; the new variant starts
    /// from its cached entry or its defaults.
    pub fn set_station_type(&mut self, id: NodeId, station_type: &str) -> Result<(), RailmapError> {
        let registry = Rc::clone(&self.registry);
        let descriptor = registry.stations().lookup(station_type)?;
        let node = self.node_mut(id)?;
        node.attrs
            .merge(station_type, &Attrs::new(), descriptor.defaults());
        node.station_type = station_type.to_string();
        debug!(node_id:% = id, station_type; "Station type changed");
        Ok(())
    }

    /// Switches an edge to another path shape.
    pub fn set_path_shape(&mut self, id: EdgeId, shape: PathShape) -> Result<(), RailmapError> {
        let registry = Rc::clone(&self.registry);
        let descriptor = registry.paths().lookup(shape.tag())?;
        let edge = self.edge_mut(id)?;
        edge.path_attrs
            .merge(shape.tag(), &Attrs::new(), descriptor.defaults());
        edge.path_shape = shape;
        debug!(edge_id:% = id, shape:%; "Path shape changed");
        Ok(())
    }

    /// Switches an edge to another line style.
    pub fn set_line_style(&mut self, id: EdgeId, line_style: &str) -> Result<(), RailmapError> {
        let registry = Rc::clone(&self.registry);
        let descriptor = registry.line_styles().lookup(line_style)?;
        let edge = self.edge_mut(id)?;
        edge.style_attrs
            .merge(line_style, &Attrs::new(), descriptor.defaults());
        edge.line_style = line_style.to_string();
        debug!(edge_id:% = id, line_style; "Line style changed");
        Ok(())
    }

    /// Removes every node and edge.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.adjacency.clear();
        self.id_counter = 0;
    }

    /// Captures the whole graph as a serializable snapshot.
    pub fn export(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self
                .nodes
                .values()
                .map(|node| NodeRecord {
                    id: node.id,
                    x: node.position.x(),
                    y: node.position.y(),
                    station_type: node.station_type.clone(),
                    attrs: node.attrs.clone(),
                })
                .collect(),
            edges: self
                .edges
                .values()
                .map(|edge| EdgeRecord {
                    id: edge.id,
                    source: edge.source,
                    target: edge.target,
                    path_shape: edge.path_shape.tag().to_string(),
                    attrs: edge.path_attrs.clone(),
                    style: edge.line_style.clone(),
                    style_attrs: edge.style_attrs.clone(),
                })
                .collect(),
        }
    }

    /// Replaces the whole graph with `snapshot`.
    ///
    /// The snapshot is validated first; on failure the current graph is left
    /// untouched. Unknown station and line-style tags are accepted and
    /// resolved to the defaults at render time.
    ///
    /// # Errors
    ///
    /// Returns [`RailmapError::Serialization`] when the snapshot is not a
    /// consistent graph.
    pub fn import(&mut self, snapshot: &GraphSnapshot) -> Result<(), RailmapError> {
        let mut nodes = IndexMap::with_capacity(snapshot.nodes.len());
        for record in &snapshot.nodes {
            let node = Node {
                id: record.id,
                position: Point::new(record.x, record.y),
                station_type: record.station_type.clone(),
                attrs: record.attrs.clone(),
            };
            if nodes.insert(record.id, node).is_some() {
                return Err(RailmapError::Serialization(format!(
                    "duplicate node `{}`",
                    record.id
                )));
            }
        }

        let mut edges = IndexMap::with_capacity(snapshot.edges.len());
        let mut pairs = HashSet::new();
        for record in &snapshot.edges {
            let edge = edge_from_record(record, &nodes)?;
            if !pairs.insert(edge.id) {
                return Err(RailmapError::Serialization(format!(
                    "duplicate edge `{}`",
                    record.id
                )));
            }
            edges.insert(edge.id, edge);
        }

        self.clear();
        self.nodes = nodes;
        for edge in edges.into_values() {
            self.insert_edge(edge);
        }

        info!(nodes = self.nodes.len(), edges = self.edges.len(); "Graph imported");
        Ok(())
    }

    fn insert_edge(&mut self, edge: Edge) {
        for endpoint in [edge.source, edge.target] {
            self.adjacency.entry(endpoint).or_default().insert(edge.id);
        }
        self.edges.insert(edge.id, edge);
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, RailmapError> {
        self.nodes
            .get_mut(&id)
            .ok_or(RailmapError::NotFound(id.into()))
    }

    fn edge_mut(&mut self, id: EdgeId) -> Result<&mut Edge, RailmapError> {
        self.edges
            .get_mut(&id)
            .ok_or(RailmapError::NotFound(id.into()))
    }
}

fn edge_from_record(
    record: &EdgeRecord,
    nodes: &IndexMap<NodeId, Node>,
) -> Result<Edge, RailmapError> {
    let invalid = |reason: String| RailmapError::Serialization(format!("edge `{}`: {reason}", record.id));

    for endpoint in [record.source, record.target] {
        if !nodes.contains_key(&endpoint) {
            return Err(invalid(format!("endpoint `{endpoint}` does not exist")));
        }
    }
    if record.source == record.target {
        return Err(invalid("self-loop".to_string()));
    }
    let id = EdgeId::between(record.source, record.target);
    if id != record.id {
        return Err(invalid(format!("identifier does not match endpoints, expected `{id}`")));
    }
    let path_shape: PathShape = record.path_shape.parse().map_err(invalid)?;

    let (source, target) = NodeId::canonical_pair(record.source, record.target);
    Ok(Edge {
        id,
        source,
        target,
        path_shape,
        path_attrs: record.attrs.clone(),
        line_style: record.style.clone(),
        style_attrs: record.style_attrs.clone(),
    })
}
