//! Drawing primitives shared by station and line renderers.
//!
//! Renderers never build a whole SVG document. They return a
//! [`LayeredOutput`], a bag of SVG nodes tagged with the [`RenderLayer`] they
//! belong to, and the render pipeline stacks the layers in z-order. Strokes
//! are described by [`StrokeDefinition`] and applied with
//! [`apply_stroke!`](crate::apply_stroke!).

mod layer;
mod stroke;

pub use layer::{LayeredOutput, RenderLayer, SvgNode};
pub use stroke::{StrokeCap, StrokeDefinition, StrokeJoin, StrokeStyle};
