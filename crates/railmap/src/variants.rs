//! Built-in station, line-style and line-path variants.
//!
//! These are registered through the same public [`TypeRegistry`] contract a
//! downstream crate would use; nothing else in the editor refers to them by
//! name except as defaults.

mod lines;
mod paths;
mod stations;

use crate::{error::RailmapError, registry::TypeRegistry};

pub const SHMETRO_BASIC: &str = "shmetro-basic";
pub const VIRTUAL: &str = "virtual";

pub const SINGLE_COLOR: &str = "single-color";
pub const MTR_PAID_AREA: &str = "mtr-paid-area";
pub const SHMETRO_VIRTUAL_INT: &str = "shmetro-virtual-int";

/// Builds a registry holding every built-in variant.
///
/// # Errors
///
/// Only fails if the built-in defaults are inconsistent.
pub fn builtin_registry() -> Result<TypeRegistry, RailmapError> {
    TypeRegistry::builder()
        .station(SHMETRO_BASIC, stations::shmetro_basic())
        .station(VIRTUAL, stations::virtual_node())
        .line_style(SINGLE_COLOR, lines::single_color())
        .line_style(MTR_PAID_AREA, lines::mtr_paid_area())
        .line_style(SHMETRO_VIRTUAL_INT, lines::shmetro_virtual_int())
        .path("simple", paths::simple())
        .path("diagonal", paths::diagonal())
        .path("perpendicular", paths::perpendicular())
        .path("rotate-perpendicular", paths::rotate_perpendicular())
        .default_station(SHMETRO_BASIC)
        .default_line_style(SINGLE_COLOR)
        .default_path("simple")
        .build()
}
