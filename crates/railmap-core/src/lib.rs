//! Railmap Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Railmap editor
//! and its front-ends. It includes:
//!
//! - **Identifiers**: String-interned node and edge identifiers ([`identifier`] module)
//! - **Attributes**: Typed attribute dictionaries for variants ([`attrs`] module)
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Path**: The pure path engine turning endpoints into SVG path data ([`path`] module)
//! - **Draw**: Layered SVG output and stroke styling ([`draw`] module)

pub mod attrs;
pub mod color;
pub mod draw;
pub mod geometry;
pub mod identifier;
pub mod path;
