//! Identifier management using string interning for efficient storage and comparison
//!
//! This module provides the interned [`Id`] type and the typed identifiers
//! built on it:
//!
//! - [`NodeId`] - A station or miscellaneous point, namespaced by [`NodeKind`]
//! - [`EdgeId`] - A line, derived deterministically from its two endpoints
//! - [`ElementId`] - Either of the above, used by selection and hit testing

use std::{
    fmt,
    sync::{Mutex, OnceLock},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for efficient identifier storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn with_interner<R>(f: impl FnOnce(&mut DefaultStringInterner) -> R) -> R {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock");
    f(&mut interner)
}

/// Efficient identifier type using string interning
///
/// # Examples
///
/// ```
/// use railmap_core::identifier::Id;
///
/// let a = Id::new("stn_1");
/// let b: Id = "stn_1".into();
/// assert_eq!(a, b);
/// assert_eq!(a, "stn_1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from &str.
    pub fn new(name: &str) -> Self {
        Self(with_interner(|interner| interner.get_or_intern(name)))
    }

    /// Returns the string this identifier was created from.
    pub fn as_string(&self) -> String {
        with_interner(|interner| {
            interner
                .resolve(self.0)
                .expect("Symbol should exist in interner")
                .to_string()
        })
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        with_interner(|interner| interner.resolve(self.0) == Some(other))
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}

/// The namespace a node identifier belongs to.
///
/// Stations carry names and are the main content of a map; miscellaneous
/// nodes are helper points (bends, virtual interchanges) without labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Station,
    Misc,
}

impl NodeKind {
    /// Returns the identifier prefix for this kind of node.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Station => "stn_",
            Self::Misc => "misc_node_",
        }
    }

    /// Infers the kind from an identifier's prefix.
    pub fn from_id(id: &str) -> Option<Self> {
        [Self::Station, Self::Misc]
            .into_iter()
            .find(|kind| id.starts_with(kind.prefix()))
    }
}

/// Identifier of a node (station or miscellaneous point).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Id);

impl NodeId {
    pub fn new(name: &str) -> Self {
        Self(Id::new(name))
    }

    /// Builds the `n`-th generated identifier in the given namespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use railmap_core::identifier::{NodeId, NodeKind};
    ///
    /// assert_eq!(NodeId::generated(NodeKind::Station, 3), NodeId::new("stn_3"));
    /// assert_eq!(NodeId::generated(NodeKind::Misc, 1), NodeId::new("misc_node_1"));
    /// ```
    pub fn generated(kind: NodeKind, n: usize) -> Self {
        Self::new(&format!("{}{n}", kind.prefix()))
    }

    /// Returns the namespace of this identifier, if it carries a known prefix.
    pub fn kind(&self) -> Option<NodeKind> {
        NodeKind::from_id(&self.0.as_string())
    }

    /// Orders two endpoints the way edges store them.
    ///
    /// The order is lexicographic on the identifier strings, so it is stable
    /// across sessions and independent of the order the user connected them.
    pub fn canonical_pair(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
        if a.to_string() <= b.to_string() {
            (a, b)
        } else {
            (b, a)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<&str> for NodeId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Identifier of an edge, derived from its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(Id);

impl EdgeId {
    /// Derives the identifier of the edge connecting `a` and `b`.
    ///
    /// Undirected: `between(a, b) == between(b, a)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use railmap_core::identifier::{EdgeId, NodeId};
    ///
    /// let a = NodeId::new("stn_a");
    /// let b = NodeId::new("stn_b");
    /// assert_eq!(EdgeId::between(a, b), EdgeId::between(b, a));
    /// assert_eq!(EdgeId::between(b, a).to_string(), "line_stn_a_stn_b");
    /// ```
    pub fn between(a: NodeId, b: NodeId) -> Self {
        let (first, second) = NodeId::canonical_pair(a, b);
        Self(Id::new(&format!("line_{first}_{second}")))
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Any selectable element of the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    Node(NodeId),
    Edge(EdgeId),
}

impl ElementId {
    /// Returns the node identifier if this is a node.
    pub fn as_node(self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(id),
            Self::Edge(_) => None,
        }
    }

    /// Returns the edge identifier if this is an edge.
    pub fn as_edge(self) -> Option<EdgeId> {
        match self {
            Self::Edge(id) => Some(id),
            Self::Node(_) => None,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) => write!(f, "node `{id}`"),
            Self::Edge(id) => write!(f, "edge `{id}`"),
        }
    }
}

impl From<NodeId> for ElementId {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<EdgeId> for ElementId {
    fn from(id: EdgeId) -> Self {
        Self::Edge(id)
    }
}
