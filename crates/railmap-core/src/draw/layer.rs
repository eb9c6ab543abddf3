//! Layer-based rendering system for SVG output.
//!
//! Station and line renderers emit nodes into named layers so that every
//! line is drawn below every station, and every label above both, no matter
//! in which order the graph is walked.
//!
//! # Example
//!
//! ```
//! # use railmap_core::draw::{RenderLayer, LayeredOutput};
//! # use svg::node::element::{Circle, Path};
//! let mut output = LayeredOutput::new();
//!
//! output.add_to_layer(RenderLayer::Station, Box::new(Circle::new().set("r", 5)));
//! output.add_to_layer(RenderLayer::Line, Box::new(Path::new().set("d", "M 0 0 L 10 0")));
//!
//! // Line group is emitted before the station group
//! let svg_nodes = output.render();
//! assert_eq!(svg_nodes.len(), 2);
//! ```

use svg::node::element as svg_element;

/// Type alias for boxed SVG nodes.
pub type SvgNode = Box<dyn svg::Node>;

/// Defines the rendering layers for SVG output.
///
/// Layers are rendered from bottom to top in the order defined by variant declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderLayer {
    /// Canvas background - renders first
    Background,
    /// Line paths between stations
    Line,
    /// Station and miscellaneous node symbols
    Station,
    /// Station names and other labels
    Text,
    /// Selection highlights - renders last
    Overlay,
}

impl RenderLayer {
    /// Returns a human-readable name for this layer.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Line => "line",
            Self::Station => "station",
            Self::Text => "text",
            Self::Overlay => "overlay",
        }
    }
}

/// Represents SVG nodes grouped by rendering layer.
///
/// When rendered, nodes are emitted in layer order (bottom to top); within a
/// layer, insertion order is kept.
#[derive(Debug, Default)]
pub struct LayeredOutput {
    items: Vec<(RenderLayer, SvgNode)>,
}

impl LayeredOutput {
    /// Creates a new empty `LayeredOutput`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single node to the specified layer.
    pub fn add_to_layer(&mut self, layer: RenderLayer, node: SvgNode) {
        self.items.push((layer, node));
    }

    /// Merges all layers from another `LayeredOutput` into this one.
    pub fn merge(&mut self, other: LayeredOutput) {
        self.items.extend(other.items);
    }

    /// Returns `true` if there are no nodes in any layer.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of nodes collected in `layer`.
    pub fn layer_len(&self, layer: RenderLayer) -> usize {
        self.items.iter().filter(|(l, _)| *l == layer).count()
    }

    /// Renders all layers to SVG groups, consuming the output.
    ///
    /// Each non-empty layer becomes an SVG `<g>` element with a `data-layer`
    /// attribute identifying the layer. Empty layers are skipped.
    pub fn render(mut self) -> Vec<SvgNode> {
        if self.is_empty() {
            return Vec::new();
        }

        // Stable sort keeps insertion order inside a layer
        self.items.sort_by_key(|(layer, _)| *layer);

        let mut result = Vec::new();
        let mut current_layer = self.items[0].0;
        let mut current_group = svg_element::Group::new().set("data-layer", current_layer.name());

        for (layer, node) in self.items {
            if layer != current_layer {
                result.push(Box::new(current_group) as SvgNode);

                current_layer = layer;
                current_group = svg_element::Group::new().set("data-layer", layer.name());
            }

            current_group = current_group.add(node);
        }

        result.push(Box::new(current_group) as SvgNode);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svg::node::element::Rectangle;

    #[test]
    fn test_layered_output_new() {
        let output = LayeredOutput::new();
        assert!(output.is_empty());
    }

    #[test]
    fn test_layered_output_merge() {
        let mut output1 = LayeredOutput::new();
        output1.add_to_layer(RenderLayer::Line, Box::new(Rectangle::new()));

        let mut output2 = LayeredOutput::new();
        output2.add_to_layer(RenderLayer::Text, Box::new(Rectangle::new()));

        output1.merge(output2);
        assert_eq!(output1.layer_len(RenderLayer::Line), 1);
        assert_eq!(output1.layer_len(RenderLayer::Text), 1);

        let nodes = output1.render();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_layered_output_orders_layers() {
        let mut output = LayeredOutput::new();
        output.add_to_layer(RenderLayer::Overlay, Box::new(Rectangle::new()));
        output.add_to_layer(RenderLayer::Station, Box::new(Rectangle::new()));
        output.add_to_layer(RenderLayer::Line, Box::new(Rectangle::new()));

        let rendered: Vec<String> = output.render().iter().map(|n| n.to_string()).collect();

        assert_eq!(rendered.len(), 3);
        assert!(rendered[0].contains("data-layer=\"line\""));
        assert!(rendered[1].contains("data-layer=\"station\""));
        assert!(rendered[2].contains("data-layer=\"overlay\""));
    }

    #[test]
    fn test_layered_output_same_layer_single_group() {
        let mut output = LayeredOutput::new();
        output.add_to_layer(RenderLayer::Line, Box::new(Rectangle::new()));
        output.add_to_layer(RenderLayer::Line, Box::new(Rectangle::new()));

        assert_eq!(output.render().len(), 1);
    }
}
