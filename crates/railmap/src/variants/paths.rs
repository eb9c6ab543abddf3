//! Descriptors for the path engine's shapes.

use railmap_core::{
    attrs::Attrs,
    path::{DEFAULT_TRANSITION, PathShape},
};

use crate::registry::{FieldSpec, PathDescriptor};

pub(super) fn simple() -> PathDescriptor {
    PathDescriptor::new(PathShape::Simple, "Simple")
}

pub(super) fn diagonal() -> PathDescriptor {
    PathDescriptor::new(PathShape::Diagonal, "Diagonal")
        .with_defaults(
            Attrs::new()
                .with("transition", DEFAULT_TRANSITION)
                .with("firstAxis", "horizontal"),
        )
        .with_field(FieldSpec::number("transition", "Transition length"))
        .with_field(FieldSpec::select(
            "firstAxis",
            "First axis",
            &["horizontal", "vertical"],
        ))
}

pub(super) fn perpendicular() -> PathDescriptor {
    PathDescriptor::new(PathShape::Perpendicular, "Perpendicular")
        .with_field(FieldSpec::number("bendRatio", "Bend position"))
}

pub(super) fn rotate_perpendicular() -> PathDescriptor {
    PathDescriptor::new(PathShape::RotatePerpendicular, "Rotated perpendicular")
        .with_field(FieldSpec::number("bendRatio", "Bend position"))
}
