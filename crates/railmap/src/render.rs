//! Render pipeline: graph + registry + path engine → SVG.
//!
//! The pipeline reads the graph only through a refreshed
//! [`GraphView`](crate::sync::GraphView) and memoizes the last frame by
//! `(refresh version, selection revision)`, so rendering the same state twice
//! never walks the graph again.

pub mod interaction;
pub mod label;

use log::{debug, info, warn};
use svg::{Document, node::element as svg_element};

use railmap_core::{
    color::Color,
    draw::{LayeredOutput, RenderLayer, StrokeDefinition},
    geometry::{Bounds, Point},
    identifier::ElementId,
    path::{self, PathShape},
};

use crate::{
    config::CanvasConfig,
    graph::{Edge, GraphStore, Node},
    registry::{Descriptor, LineRenderContext, StationRenderContext},
    runtime::RuntimeState,
    sync::{GraphView, SyncController},
};

/// Radius of the dashed ring drawn around selected nodes.
const SELECTION_RING_RADIUS: f32 = 9.0;

/// A rendered SVG document with the state it was rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    version: u64,
    selection_revision: u64,
    svg: String,
}

impl Frame {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn selection_revision(&self) -> u64 {
        self.selection_revision
    }

    pub fn svg(&self) -> &str {
        &self.svg
    }
}

/// Memoizing renderer.
#[derive(Debug)]
pub struct RenderPipeline {
    canvas: CanvasConfig,
    cache: Option<Frame>,
    renders: usize,
}

impl RenderPipeline {
    pub fn new(canvas: CanvasConfig) -> Self {
        Self {
            canvas,
            cache: None,
            renders: 0,
        }
    }

    /// Number of frames actually built, cache hits excluded.
    pub fn render_count(&self) -> usize {
        self.renders
    }

    /// Returns the frame for the controller's current state.
    ///
    /// While a mutation is pending refresh the last frame is returned as is;
    /// `None` only if nothing was rendered yet.
    pub fn frame(&mut self, sync: &SyncController) -> Option<&Frame> {
        let runtime = sync.runtime();
        let Some(view) = sync.view() else {
            debug!("Mutation pending refresh, keeping last frame");
            return self.cache.as_ref();
        };

        let key = (view.version(), runtime.selection_revision());
        let stale = self
            .cache
            .as_ref()
            .is_none_or(|frame| (frame.version, frame.selection_revision) != key);
        if stale {
            let svg = self.render_document(&view, runtime).to_string();
            self.renders += 1;
            info!(version = key.0, selection_revision = key.1; "Frame rendered");
            self.cache = Some(Frame {
                version: key.0,
                selection_revision: key.1,
                svg,
            });
        }
        self.cache.as_ref()
    }

    fn render_document(&self, view: &GraphView<'_>, runtime: &RuntimeState) -> Document {
        let width = self.canvas.width();
        let height = self.canvas.height();
        let graph = view.graph();

        let mut output = LayeredOutput::new();

        match self.canvas.background_color() {
            Ok(Some(color)) => {
                let background = svg_element::Rectangle::new()
                    .set("width", width)
                    .set("height", height)
                    .set("fill", &color);
                output.add_to_layer(RenderLayer::Background, Box::new(background));
            }
            Ok(None) => {}
            Err(err) => warn!(err:%; "Ignoring background color"),
        }

        for edge in graph.edges() {
            output.merge(render_edge(graph, edge, runtime.is_selected(edge.id().into())));
        }
        for node in graph.nodes() {
            output.merge(render_node(graph, node, runtime.is_selected(node.id().into())));
        }

        let mut document = Document::new()
            .set("viewBox", format!("0 0 {width} {height}"))
            .set("width", width)
            .set("height", height);
        for node in output.render() {
            document = document.add(node);
        }
        document
    }
}

fn selection_stroke() -> StrokeDefinition {
    StrokeDefinition::dashed(Color::parse_or("#1976d2", Color::default()), 1.0)
}

/// Resolves an edge's shape, falling back to `Simple` when its style does
/// not support it.
fn effective_shape(graph: &GraphStore, edge: &Edge) -> PathShape {
    let (style_tag, style) = graph.registry().line_styles().resolve(edge.line_style());
    let shape = edge.path_shape();
    if style.supports(shape) {
        shape
    } else {
        warn!(edge_id:% = edge.id(), style = style_tag, shape:%; "Unsupported path shape, drawing simple path");
        PathShape::Simple
    }
}

/// The polyline an edge is drawn along.
pub fn edge_points(graph: &GraphStore, edge: &Edge) -> Option<Vec<Point>> {
    let from = graph.node(edge.source()).ok()?.position();
    let to = graph.node(edge.target()).ok()?.position();
    let shape = effective_shape(graph, edge);
    let (_, descriptor) = graph.registry().paths().resolve(shape.tag());
    let attrs = if shape == edge.path_shape() {
        descriptor.complete(edge.active_path_attrs())
    } else {
        descriptor.complete(None)
    };
    Some(path::path_points(from, to, shape, &attrs))
}

fn render_edge(graph: &GraphStore, edge: &Edge, selected: bool) -> LayeredOutput {
    let Some(points) = edge_points(graph, edge) else {
        warn!(edge_id:% = edge.id(); "Edge endpoint missing, skipping");
        return LayeredOutput::new();
    };
    let path_data = path::path_data(&points);

    let (_, style) = graph.registry().line_styles().resolve(edge.line_style());
    let attrs = style.complete(edge.active_style_attrs());
    let ctx = LineRenderContext {
        id: edge.id(),
        path_data: &path_data,
        attrs: &attrs,
    };
    let mut output = style.renderer().render(&ctx);

    if selected {
        let overlay = svg_element::Path::new()
            .set("d", path_data.as_str())
            .set("fill", "none")
            .set("class", "selected");
        output.add_to_layer(
            RenderLayer::Overlay,
            Box::new(railmap_core::apply_stroke!(overlay, &selection_stroke())),
        );
    }
    output
}

fn render_node(graph: &GraphStore, node: &Node, selected: bool) -> LayeredOutput {
    let (_, station) = graph.registry().stations().resolve(node.station_type());
    let attrs = station.complete(node.active_attrs());
    let ctx = StationRenderContext {
        id: node.id(),
        position: node.position(),
        attrs: &attrs,
    };
    let mut output = station.renderer().render(&ctx);

    if selected {
        let ring = svg_element::Circle::new()
            .set("cx", node.position().x())
            .set("cy", node.position().y())
            .set("r", SELECTION_RING_RADIUS)
            .set("fill", "none")
            .set("class", "selected");
        output.add_to_layer(
            RenderLayer::Overlay,
            Box::new(railmap_core::apply_stroke!(ring, &selection_stroke())),
        );
    }
    output
}

/// Finds the element under `point`.
///
/// Nodes within `radius` win over edges; among candidates of the same kind
/// the closest one is returned.
pub fn hit_test(view: &GraphView<'_>, point: Point, radius: f32) -> Option<ElementId> {
    let graph = view.graph();

    let closest_node = graph
        .nodes()
        .map(|node| (node.id(), node.position().distance_to(point)))
        .filter(|(_, distance)| *distance <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((id, _)) = closest_node {
        return Some(id.into());
    }

    graph
        .edges()
        .filter_map(|edge| {
            let points = edge_points(graph, edge)?;
            if !Bounds::from_points(points.iter().copied())?
                .expand(radius)
                .contains(point)
            {
                return None;
            }
            let distance = points
                .windows(2)
                .map(|seg| point.distance_to_segment(seg[0], seg[1]))
                .fold(f32::INFINITY, f32::min);
            (distance <= radius).then_some((edge.id(), distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id.into())
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use railmap_core::{attrs::Attrs, identifier::NodeId};

    use super::*;
    use crate::{
        config::CanvasConfig,
        graph::GraphSnapshot,
        variants::{self, SHMETRO_BASIC, SHMETRO_VIRTUAL_INT, SINGLE_COLOR},
    };

    fn controller() -> SyncController {
        let mut sync = SyncController::new(Rc::new(variants::builtin_registry().unwrap()), 50);
        sync.commit(|graph| {
            graph.add_node(NodeId::new("stn_a"), Point::new(0.0, 0.0), SHMETRO_BASIC, None)?;
            graph.add_node(NodeId::new("stn_b"), Point::new(100.0, 50.0), SHMETRO_BASIC, None)?;
            graph.add_edge(
                NodeId::new("stn_a"),
                NodeId::new("stn_b"),
                PathShape::Perpendicular,
                SINGLE_COLOR,
            )
        })
        .unwrap();
        sync
    }

    #[test]
    fn test_frame_contains_layers() {
        let sync = controller();
        let mut pipeline = RenderPipeline::new(CanvasConfig::default());

        let svg = pipeline.frame(&sync).unwrap().svg().to_string();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("data-layer=\"line\""));
        assert!(svg.contains("data-layer=\"station\""));
        assert!(svg.contains("M 0 0 L 100 0 L 100 50"));
        assert!(svg.find("data-layer=\"line\"") < svg.find("data-layer=\"station\""));
    }

    #[test]
    fn test_frame_is_memoized() {
        let mut sync = controller();
        let mut pipeline = RenderPipeline::new(CanvasConfig::default());

        pipeline.frame(&sync);
        pipeline.frame(&sync);
        assert_eq!(pipeline.render_count(), 1);

        sync.runtime_mut().select_only(NodeId::new("stn_a").into());
        let svg = pipeline.frame(&sync).unwrap().svg().to_string();
        assert_eq!(pipeline.render_count(), 2);
        assert!(svg.contains("data-layer=\"overlay\""));
        assert!(svg.contains("stroke-dasharray"));
    }

    #[test]
    fn test_pending_mutation_keeps_last_frame() {
        let mut sync = controller();
        let mut pipeline = RenderPipeline::new(CanvasConfig::default());
        let before = pipeline.frame(&sync).unwrap().clone();

        sync.mutate(|graph| graph.set_node_position(NodeId::new("stn_b"), Point::new(300.0, 300.0)))
            .unwrap();
        assert_eq!(pipeline.frame(&sync), Some(&before));

        sync.refresh();
        assert!(pipeline.frame(&sync).unwrap().svg().contains("300"));
    }

    #[test]
    fn test_unknown_types_fall_back() {
        let mut sync = controller();
        let mut snapshot: GraphSnapshot = sync.graph().export();
        snapshot.nodes[0].station_type = "tokyo-metro".to_string();
        snapshot.edges[0].style = "river".to_string();
        sync.load(&snapshot).unwrap();

        let mut pipeline = RenderPipeline::new(CanvasConfig::default());
        let svg = pipeline.frame(&sync).unwrap().svg().to_string();
        assert!(svg.contains("stn_core_stn_a"));
        assert!(svg.contains("line_stn_a_stn_b"));
    }

    #[test]
    fn test_unsupported_shape_drawn_simple() {
        let mut sync = controller();
        let edge = sync.graph().edges().next().unwrap().id();
        sync.commit(|graph| graph.set_line_style(edge, SHMETRO_VIRTUAL_INT))
            .unwrap();

        let mut pipeline = RenderPipeline::new(CanvasConfig::default());
        let svg = pipeline.frame(&sync).unwrap().svg().to_string();
        assert!(svg.contains("d=\"M 0 0 L 100 50\""));
    }

    #[test]
    fn test_background_color() {
        let sync = controller();
        let canvas = CanvasConfig::new(640.0, 480.0, Some("white".to_string()));
        let mut pipeline = RenderPipeline::new(canvas);

        let svg = pipeline.frame(&sync).unwrap().svg().to_string();
        assert!(svg.contains("data-layer=\"background\""));
        assert!(svg.contains("viewBox=\"0 0 640 480\""));
    }

    #[test]
    fn test_hit_test_prefers_nodes() {
        let sync = controller();
        let view = sync.view().unwrap();

        assert_eq!(
            hit_test(&view, Point::new(2.0, 2.0), 10.0),
            Some(NodeId::new("stn_a").into())
        );
        let on_line = hit_test(&view, Point::new(50.0, 3.0), 10.0);
        assert!(matches!(on_line, Some(ElementId::Edge(_))));
        assert_eq!(hit_test(&view, Point::new(50.0, 40.0), 10.0), None);
    }

    #[test]
    fn test_edge_points_use_path_attrs() {
        let mut sync = controller();
        let edge = sync.graph().edges().next().unwrap().id();
        sync.commit(|graph| {
            graph.merge_edge_path_attributes(edge, &Attrs::new().with("bendRatio", 0.5))
        })
        .unwrap();

        let graph = sync.graph();
        let points = edge_points(graph, graph.edge(edge).unwrap()).unwrap();
        assert_eq!(points[1], Point::new(50.0, 0.0));
    }
}
