//! Built-in station variants.

use log::warn;
use svg::node::element as svg_element;

use railmap_core::{
    attrs::Attrs,
    color::Color,
    draw::{LayeredOutput, RenderLayer, StrokeDefinition},
    identifier::NodeKind,
};

use crate::{
    registry::{FieldSpec, StationDescriptor, StationRenderContext, StationRenderer},
    render::label::{
        self, LabelGrowth, LabelPlacement, LabelSide, PRIMARY_TEXT, SECONDARY_TEXT,
    },
};

const STATION_RADIUS: f32 = 5.0;

/// Shanghai Metro style: a hollow circle with a bilingual name.
#[derive(Debug)]
struct ShmetroBasic;

impl StationRenderer for ShmetroBasic {
    fn render(&self, ctx: &StationRenderContext<'_>) -> LayeredOutput {
        let mut output = LayeredOutput::new();
        let center = ctx.position;

        let stroke = StrokeDefinition::solid(Color::default(), 1.0);
        let circle = svg_element::Circle::new()
            .set("id", format!("stn_core_{}", ctx.id))
            .set("cx", center.x())
            .set("cy", center.y())
            .set("r", STATION_RADIUS)
            .set("fill", "white");
        let circle = railmap_core::apply_stroke!(circle, &stroke);
        output.add_to_layer(RenderLayer::Station, Box::new(circle));

        let primary = ctx.attrs.list_text("names", 0).unwrap_or_default();
        let secondary = ctx.attrs.list_text("names", 1).unwrap_or_default();
        let side = parse_or_default::<LabelSide>(ctx.attrs.text("nameOffsetX"));
        let growth = parse_or_default::<LabelGrowth>(ctx.attrs.text("nameOffsetY"));

        let placement = LabelPlacement::for_names(primary, secondary, side, growth);
        let origin = center.add_point(placement.offset);

        let mut group = svg_element::Group::new()
            .set("id", format!("name_{}", ctx.id))
            .set("class", "rmp-name-station");
        for node in label::multiline_text(
            primary,
            origin,
            PRIMARY_TEXT,
            LabelGrowth::Up,
            placement.anchor,
            "rmp-name__zh",
        )
        .into_iter()
        .chain(label::multiline_text(
            secondary,
            origin,
            SECONDARY_TEXT,
            LabelGrowth::Down,
            placement.anchor,
            "rmp-name__en",
        )) {
            group = group.add(node);
        }
        output.add_to_layer(RenderLayer::Text, Box::new(group));

        output
    }
}

/// An unlabeled helper point, drawn only as a faint marker.
#[derive(Debug)]
struct VirtualNode;

impl StationRenderer for VirtualNode {
    fn render(&self, ctx: &StationRenderContext<'_>) -> LayeredOutput {
        let mut output = LayeredOutput::new();
        let marker = svg_element::Circle::new()
            .set("id", ctx.id.to_string())
            .set("cx", ctx.position.x())
            .set("cy", ctx.position.y())
            .set("r", 2)
            .set("fill", "none");
        let stroke = StrokeDefinition::dashed(Color::default().with_alpha(0.3), 0.5);
        output.add_to_layer(
            RenderLayer::Station,
            Box::new(railmap_core::apply_stroke!(marker, &stroke)),
        );
        output
    }
}

fn parse_or_default<T>(value: Option<&str>) -> T
where
    T: std::str::FromStr<Err = String> + Default,
{
    match value.map(str::parse::<T>) {
        Some(Ok(parsed)) => parsed,
        Some(Err(err)) => {
            warn!(err:%; "Invalid label attribute, using default");
            T::default()
        }
        None => T::default(),
    }
}

pub(super) fn shmetro_basic() -> StationDescriptor {
    StationDescriptor::new("Shanghai Metro basic station", ShmetroBasic)
        .with_defaults(
            Attrs::new()
                .with("names", vec!["车站", "Stn"])
                .with("nameOffsetX", "right")
                .with("nameOffsetY", "up"),
        )
        .with_field(FieldSpec::list_item("names", 0, "Local name"))
        .with_field(FieldSpec::list_item("names", 1, "English name"))
        .with_field(FieldSpec::select(
            "nameOffsetX",
            "Horizontal name offset",
            &["left", "middle", "right"],
        ))
        .with_field(FieldSpec::select(
            "nameOffsetY",
            "Vertical name offset",
            &["up", "middle", "bottom"],
        ))
        .with_cities(&["shanghai"])
        .with_categories(&["metro"])
}

pub(super) fn virtual_node() -> StationDescriptor {
    StationDescriptor::new("Virtual node", VirtualNode).with_kind(NodeKind::Misc)
}
