//! Error types for Railmap operations.
//!
//! This module provides the main error type [`RailmapError`]. Structural
//! failures (missing elements, broken snapshots, rejected field input) are
//! always surfaced through it; rendering problems such as unknown variant
//! tags are recovered locally and only logged.

use std::io;

use thiserror::Error;

use railmap_core::identifier::{EdgeId, ElementId};

/// The registry namespace a variant tag was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Station,
    LineStyle,
    LinePath,
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Station => "station",
            Self::LineStyle => "line style",
            Self::LinePath => "line path",
        })
    }
}

/// The main error type for Railmap operations.
#[derive(Debug, Error)]
pub enum RailmapError {
    #[error("unknown {namespace} type `{tag}`")]
    UnknownType { namespace: Namespace, tag: String },

    #[error("{0} not found")]
    NotFound(ElementId),

    #[error("{0} already exists")]
    AlreadyExists(ElementId),

    #[error("invalid edge `{id}`: {reason}")]
    InvalidEdge { id: EdgeId, reason: String },

    #[error("invalid snapshot: {0}")]
    Serialization(String),

    #[error("invalid value `{value}` for field `{field}`")]
    Validation { field: String, value: String },

    #[error("invalid field target: {0}")]
    InvalidField(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RailmapError {
    /// Create a new `Serialization` error from any displayable cause.
    pub fn serialization(cause: impl std::fmt::Display) -> Self {
        Self::Serialization(cause.to_string())
    }
}

impl From<serde_json::Error> for RailmapError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err)
    }
}
