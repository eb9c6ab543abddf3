//! Attribute dictionaries attached to nodes and edges.
//!
//! Every station variant, line style and path shape keeps its own fields in
//! an [`Attrs`] dictionary. Elements store one dictionary per variant tag in
//! a [`TypedAttrs`] map so switching variants back and forth keeps the
//! earlier values cached.
//!
//! # Example
//!
//! ```
//! # use railmap_core::attrs::{Attrs, AttrValue};
//! let mut attrs = Attrs::new()
//!     .with("color", "#e3002b")
//!     .with("width", 5.0);
//!
//! assert_eq!(attrs.text("color"), Some("#e3002b"));
//! assert_eq!(attrs.number("width"), Some(5.0));
//!
//! attrs.merge(&Attrs::new().with("width", 8.0));
//! assert_eq!(attrs.number("width"), Some(8.0));
//! assert_eq!(attrs.text("color"), Some("#e3002b"));
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single attribute value.
///
/// Serialized untagged, so a dictionary reads as plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<AttrValue>),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
            Self::List(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// An ordered, string-keyed attribute dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attrs(IndexMap<String, AttrValue>);

impl Attrs {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value (builder style).
    pub fn with(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a value, replacing any previous one.
    pub fn set(&mut self, key: &str, value: impl Into<AttrValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_text)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(AttrValue::as_number)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(AttrValue::as_bool)
    }

    /// Returns the `index`-th text entry of a list attribute.
    pub fn list_text(&self, key: &str, index: usize) -> Option<&str> {
        self.get(key)
            .and_then(AttrValue::as_list)
            .and_then(|items| items.get(index))
            .and_then(AttrValue::as_text)
    }

    /// Replaces the `index`-th entry of a list attribute, padding with empty
    /// text when the list is shorter.
    pub fn set_list_text(&mut self, key: &str, index: usize, value: &str) {
        let mut items = self
            .get(key)
            .and_then(AttrValue::as_list)
            .map(<[AttrValue]>::to_vec)
            .unwrap_or_default();
        if items.len() <= index {
            items.resize(index + 1, AttrValue::Text(String::new()));
        }
        items[index] = AttrValue::Text(value.to_string());
        self.0.insert(key.to_string(), AttrValue::List(items));
    }

    /// Shallow merge: every key of `patch` overwrites the key in `self`.
    pub fn merge(&mut self, patch: &Attrs) {
        for (key, value) in &patch.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Returns `base` overlaid with `self`.
    ///
    /// Keys present only in `self` are kept, so values written by a newer
    /// variant revision survive a round-trip.
    pub fn completed_from(&self, base: &Attrs) -> Attrs {
        let mut completed = base.clone();
        completed.merge(self);
        completed
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }
}

/// Attribute dictionaries of one element, keyed by variant tag.
///
/// Only the entry matching the element's active tag is ever read; entries
/// for other tags are stale caches from previously selected variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypedAttrs(IndexMap<String, Attrs>);

impl TypedAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map holding a single entry.
    pub fn single(tag: &str, attrs: Attrs) -> Self {
        let mut typed = Self::new();
        typed.replace(tag, attrs);
        typed
    }

    /// Returns the dictionary for the given tag.
    pub fn active(&self, tag: &str) -> Option<&Attrs> {
        self.0.get(tag)
    }

    /// Replaces the dictionary for `tag` wholesale.
    pub fn replace(&mut self, tag: &str, attrs: Attrs) {
        self.0.insert(tag.to_string(), attrs);
    }

    /// Shallow-merges `patch` into the dictionary for `tag`, creating it from
    /// `defaults` first when absent.
    pub fn merge(&mut self, tag: &str, patch: &Attrs, defaults: &Attrs) {
        self.0
            .entry(tag.to_string())
            .or_insert_with(|| defaults.clone())
            .merge(patch);
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
