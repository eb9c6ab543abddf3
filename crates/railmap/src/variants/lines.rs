//! Built-in line styles.

use svg::node::element as svg_element;

use railmap_core::{
    attrs::Attrs,
    color::Color,
    draw::{LayeredOutput, RenderLayer, StrokeCap, StrokeDefinition},
    path::PathShape,
};

use crate::registry::{FieldSpec, LineRenderContext, LineStyleDescriptor, LineStyleRenderer};

const DEFAULT_LINE_COLOR: &str = "#e3002b";

fn stroked_path(ctx: &LineRenderContext<'_>, stroke: &StrokeDefinition) -> svg_element::Path {
    let path = svg_element::Path::new()
        .set("d", ctx.path_data)
        .set("fill", "none");
    railmap_core::apply_stroke!(path, stroke)
}

/// A solid line in the route color.
#[derive(Debug)]
struct SingleColor;

impl LineStyleRenderer for SingleColor {
    fn render(&self, ctx: &LineRenderContext<'_>) -> LayeredOutput {
        let fallback = Color::parse_or(DEFAULT_LINE_COLOR, Color::default());
        let color = Color::parse_or(ctx.attrs.text("color").unwrap_or(DEFAULT_LINE_COLOR), fallback);
        let width = ctx.attrs.number("width").unwrap_or(5.0) as f32;

        let mut stroke = StrokeDefinition::new(color, width);
        stroke.set_cap(StrokeCap::Round);

        let mut output = LayeredOutput::new();
        output.add_to_layer(
            RenderLayer::Line,
            Box::new(stroked_path(ctx, &stroke).set("id", ctx.id.to_string())),
        );
        output
    }
}

/// Thin black outline marking the paid area of an interchange.
#[derive(Debug)]
struct MtrPaidArea;

impl LineStyleRenderer for MtrPaidArea {
    fn render(&self, ctx: &LineRenderContext<'_>) -> LayeredOutput {
        let mut stroke = StrokeDefinition::new(Color::default(), 1.5);
        stroke.set_cap(StrokeCap::Round);

        let mut output = LayeredOutput::new();
        output.add_to_layer(
            RenderLayer::Line,
            Box::new(stroked_path(ctx, &stroke).set("id", ctx.id.to_string())),
        );
        output
    }
}

/// Out-of-station interchange: a black casing with a white core.
#[derive(Debug)]
struct ShmetroVirtualInt;

impl LineStyleRenderer for ShmetroVirtualInt {
    fn render(&self, ctx: &LineRenderContext<'_>) -> LayeredOutput {
        let white = Color::parse_or("white", Color::default());
        let casing = StrokeDefinition::rounded(Color::default(), 5.0);
        let core = StrokeDefinition::rounded(white, 3.0);

        let group = svg_element::Group::new()
            .set("id", ctx.id.to_string())
            .add(stroked_path(ctx, &casing))
            .add(stroked_path(ctx, &core));

        let mut output = LayeredOutput::new();
        output.add_to_layer(RenderLayer::Line, Box::new(group));
        output
    }
}

pub(super) fn single_color() -> LineStyleDescriptor {
    LineStyleDescriptor::new("Single color", SingleColor)
        .with_defaults(Attrs::new().with("color", DEFAULT_LINE_COLOR))
        .with_field(FieldSpec::text("color", "Color").with_validator(|value| Color::new(value).is_ok()))
}

pub(super) fn mtr_paid_area() -> LineStyleDescriptor {
    LineStyleDescriptor::new("MTR paid area", MtrPaidArea)
}

pub(super) fn shmetro_virtual_int() -> LineStyleDescriptor {
    LineStyleDescriptor::new("Shanghai Metro out-of-station interchange", ShmetroVirtualInt)
        .with_supported_paths(&[PathShape::Simple, PathShape::Diagonal])
}

#[cfg(test)]
mod tests {
    use railmap_core::identifier::{EdgeId, NodeId};

    use super::*;
    use crate::registry::Descriptor;

    fn render(descriptor: &LineStyleDescriptor, attrs: &Attrs) -> String {
        let ctx = LineRenderContext {
            id: EdgeId::between(NodeId::new("stn_l1"), NodeId::new("stn_l2")),
            path_data: "M 0 0 L 10 0",
            attrs,
        };
        descriptor
            .renderer()
            .render(&ctx)
            .render()
            .iter()
            .map(|n| n.to_string())
            .collect()
    }

    #[test]
    fn test_single_color_uses_color_attribute() {
        let descriptor = single_color();
        let svg = render(&descriptor, &descriptor.complete(None));

        assert!(svg.contains("d=\"M 0 0 L 10 0\""));
        assert!(svg.contains("stroke-width=\"5\""));
        assert!(svg.contains("stroke-linecap=\"round\""));
        assert!(svg.contains("line_stn_l1_stn_l2"));
    }

    #[test]
    fn test_single_color_field_validates_colors() {
        let descriptor = single_color();
        let field = &descriptor.fields()[0];

        assert_eq!(field.key(), "color");
        let bound = crate::registry::EditableField::new(field, descriptor.complete(None));
        assert!(bound.validate("#00ff00"));
        assert!(!bound.validate("not-a-color"));
    }

    #[test]
    fn test_virtual_int_draws_two_strokes() {
        let descriptor = shmetro_virtual_int();
        let svg = render(&descriptor, &descriptor.complete(None));

        assert_eq!(svg.matches("<path").count(), 2);
        assert!(!descriptor.supports(PathShape::Perpendicular));
    }

    #[test]
    fn test_mtr_paid_area_supports_every_shape() {
        let descriptor = mtr_paid_area();
        assert!(PathShape::ALL.iter().all(|shape| descriptor.supports(*shape)));
        assert!(render(&descriptor, &Attrs::new()).contains("stroke-width=\"1.5\""));
    }
}
