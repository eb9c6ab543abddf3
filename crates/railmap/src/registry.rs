//! Variant type registry.
//!
//! Stations, line styles and line paths are polymorphic: each variant is a
//! descriptor record (renderer, default attributes, editable fields,
//! metadata) registered under a string tag. The graph only stores tags; the
//! render pipeline and the editing surface look descriptors up here, so new
//! variants never touch graph, rendering or undo logic.
//!
//! # Example
//!
//! ```
//! # use railmap::registry::TypeRegistry;
//! let registry = railmap::variants::builtin_registry().unwrap();
//!
//! assert!(registry.stations().lookup("shmetro-basic").is_ok());
//! assert!(registry.line_styles().lookup("no-such-style").is_err());
//!
//! // Unknown tags fall back to the namespace default
//! let (tag, _) = registry.line_styles().resolve("no-such-style");
//! assert_eq!(tag, "single-color");
//! ```

mod field;

pub use field::{EditableField, FieldKind, FieldSpec};

use std::fmt;

use indexmap::IndexMap;
use log::{debug, warn};

use railmap_core::{
    attrs::Attrs,
    draw::LayeredOutput,
    geometry::Point,
    identifier::{EdgeId, NodeId, NodeKind},
    path::PathShape,
};

use crate::error::{Namespace, RailmapError};

/// Everything a station renderer needs to draw one node.
#[derive(Debug)]
pub struct StationRenderContext<'a> {
    pub id: NodeId,
    pub position: Point,
    /// Attributes completed from the descriptor defaults.
    pub attrs: &'a Attrs,
}

/// Everything a line-style renderer needs to draw one edge.
#[derive(Debug)]
pub struct LineRenderContext<'a> {
    pub id: EdgeId,
    /// SVG path data produced by the path engine.
    pub path_data: &'a str,
    /// Attributes completed from the descriptor defaults.
    pub attrs: &'a Attrs,
}

/// Draws a station variant.
pub trait StationRenderer: fmt::Debug {
    fn render(&self, ctx: &StationRenderContext<'_>) -> LayeredOutput;
}

/// Strokes a line path in a particular style.
pub trait LineStyleRenderer: fmt::Debug {
    fn render(&self, ctx: &LineRenderContext<'_>) -> LayeredOutput;
}

/// Common surface of every descriptor kind.
pub trait Descriptor {
    fn display_name(&self) -> &str;

    fn defaults(&self) -> &Attrs;

    fn fields(&self) -> &[FieldSpec];

    /// Returns the defaults overlaid with `current`.
    ///
    /// Always yields a complete attribute dictionary, whatever `current`
    /// holds.
    fn complete(&self, current: Option<&Attrs>) -> Attrs {
        match current {
            Some(attrs) => attrs.completed_from(self.defaults()),
            None => self.defaults().clone(),
        }
    }
}

/// Descriptive data attached to a station variant.
#[derive(Debug, Clone, Default)]
pub struct StationMetadata {
    pub display_name: String,
    pub cities: Vec<String>,
    pub categories: Vec<String>,
}

/// Descriptor of a station variant.
#[derive(Debug)]
pub struct StationDescriptor {
    renderer: Box<dyn StationRenderer>,
    defaults: Attrs,
    fields: Vec<FieldSpec>,
    kind: NodeKind,
    metadata: StationMetadata,
}

impl StationDescriptor {
    pub fn new(display_name: &str, renderer: impl StationRenderer + 'static) -> Self {
        Self {
            renderer: Box::new(renderer),
            defaults: Attrs::new(),
            fields: Vec::new(),
            kind: NodeKind::Station,
            metadata: StationMetadata {
                display_name: display_name.to_string(),
                ..StationMetadata::default()
            },
        }
    }

    pub fn with_defaults(mut self, defaults: Attrs) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Sets the identifier namespace new nodes of this variant are created in.
    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_cities(mut self, cities: &[&str]) -> Self {
        self.metadata.cities = cities.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.metadata.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn renderer(&self) -> &dyn StationRenderer {
        self.renderer.as_ref()
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn metadata(&self) -> &StationMetadata {
        &self.metadata
    }
}

impl Descriptor for StationDescriptor {
    fn display_name(&self) -> &str {
        &self.metadata.display_name
    }

    fn defaults(&self) -> &Attrs {
        &self.defaults
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

/// Descriptive data attached to a line style.
#[derive(Debug, Clone)]
pub struct LineStyleMetadata {
    pub display_name: String,
    pub supported_paths: Vec<PathShape>,
}

/// Descriptor of a line style.
#[derive(Debug)]
pub struct LineStyleDescriptor {
    renderer: Box<dyn LineStyleRenderer>,
    defaults: Attrs,
    fields: Vec<FieldSpec>,
    metadata: LineStyleMetadata,
}

impl LineStyleDescriptor {
    /// Creates a style supporting every path shape.
    pub fn new(display_name: &str, renderer: impl LineStyleRenderer + 'static) -> Self {
        Self {
            renderer: Box::new(renderer),
            defaults: Attrs::new(),
            fields: Vec::new(),
            metadata: LineStyleMetadata {
                display_name: display_name.to_string(),
                supported_paths: PathShape::ALL.to_vec(),
            },
        }
    }

    pub fn with_defaults(mut self, defaults: Attrs) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Restricts the path shapes this style can be drawn along.
    pub fn with_supported_paths(mut self, shapes: &[PathShape]) -> Self {
        self.metadata.supported_paths = shapes.to_vec();
        self
    }

    pub fn renderer(&self) -> &dyn LineStyleRenderer {
        self.renderer.as_ref()
    }

    pub fn metadata(&self) -> &LineStyleMetadata {
        &self.metadata
    }

    pub fn supports(&self, shape: PathShape) -> bool {
        self.metadata.supported_paths.contains(&shape)
    }
}

impl Descriptor for LineStyleDescriptor {
    fn display_name(&self) -> &str {
        &self.metadata.display_name
    }

    fn defaults(&self) -> &Attrs {
        &self.defaults
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

/// Descriptor of a line path shape.
#[derive(Debug)]
pub struct PathDescriptor {
    shape: PathShape,
    display_name: String,
    defaults: Attrs,
    fields: Vec<FieldSpec>,
}

impl PathDescriptor {
    pub fn new(shape: PathShape, display_name: &str) -> Self {
        Self {
            shape,
            display_name: display_name.to_string(),
            defaults: Attrs::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_defaults(mut self, defaults: Attrs) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn shape(&self) -> PathShape {
        self.shape
    }
}

impl Descriptor for PathDescriptor {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn defaults(&self) -> &Attrs {
        &self.defaults
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

/// A tag-keyed set of descriptors with a designated default.
#[derive(Debug)]
pub struct Registry<D> {
    namespace: Namespace,
    entries: IndexMap<String, D>,
    default_tag: String,
}

impl<D: Descriptor> Registry<D> {
    /// Looks up the descriptor registered under `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`RailmapError::UnknownType`] when `tag` is not registered.
    pub fn lookup(&self, tag: &str) -> Result<&D, RailmapError> {
        self.entries
            .get(tag)
            .ok_or_else(|| RailmapError::UnknownType {
                namespace: self.namespace,
                tag: tag.to_string(),
            })
    }

    /// Looks up `tag`, falling back to the default descriptor with a warning.
    ///
    /// Returns the tag that was actually resolved alongside the descriptor.
    pub fn resolve(&self, tag: &str) -> (&str, &D) {
        match self.entries.get_key_value(tag) {
            Some((key, descriptor)) => (key.as_str(), descriptor),
            None => {
                let err = RailmapError::UnknownType {
                    namespace: self.namespace,
                    tag: tag.to_string(),
                };
                warn!(err:%, fallback = self.default_tag.as_str(); "Using default descriptor");
                (self.default_tag.as_str(), self.default_descriptor())
            }
        }
    }

    pub fn default_tag(&self) -> &str {
        &self.default_tag
    }

    pub fn default_descriptor(&self) -> &D {
        // Presence of the default is checked when the registry is built
        &self.entries[self.default_tag.as_str()]
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Registered tags in registration order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &D)> {
        self.entries.iter().map(|(tag, d)| (tag.as_str(), d))
    }

    /// Binds every editable field of `tag` to the given attributes.
    ///
    /// # Errors
    ///
    /// Returns [`RailmapError::UnknownType`] when `tag` is not registered.
    pub fn editable_fields(
        &self,
        tag: &str,
        current: Option<&Attrs>,
    ) -> Result<Vec<EditableField<'_>>, RailmapError> {
        let descriptor = self.lookup(tag)?;
        let completed = descriptor.complete(current);
        Ok(descriptor
            .fields()
            .iter()
            .map(|spec| EditableField::new(spec, completed.clone()))
            .collect())
    }
}

/// Immutable set of all registered variants.
///
/// Built once through [`TypeRegistry::builder`] and shared by `Rc`.
#[derive(Debug)]
pub struct TypeRegistry {
    stations: Registry<StationDescriptor>,
    line_styles: Registry<LineStyleDescriptor>,
    paths: Registry<PathDescriptor>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    pub fn stations(&self) -> &Registry<StationDescriptor> {
        &self.stations
    }

    pub fn line_styles(&self) -> &Registry<LineStyleDescriptor> {
        &self.line_styles
    }

    pub fn paths(&self) -> &Registry<PathDescriptor> {
        &self.paths
    }
}

/// Collects descriptors before freezing them into a [`TypeRegistry`].
#[derive(Default)]
pub struct TypeRegistryBuilder {
    stations: IndexMap<String, StationDescriptor>,
    line_styles: IndexMap<String, LineStyleDescriptor>,
    paths: IndexMap<String, PathDescriptor>,
    default_station: Option<String>,
    default_line_style: Option<String>,
    default_path: Option<String>,
}

impl TypeRegistryBuilder {
    pub fn station(mut self, tag: &str, descriptor: StationDescriptor) -> Self {
        insert_entry(&mut self.stations, Namespace::Station, tag, descriptor);
        self
    }

    pub fn line_style(mut self, tag: &str, descriptor: LineStyleDescriptor) -> Self {
        insert_entry(&mut self.line_styles, Namespace::LineStyle, tag, descriptor);
        self
    }

    pub fn path(mut self, tag: &str, descriptor: PathDescriptor) -> Self {
        insert_entry(&mut self.paths, Namespace::LinePath, tag, descriptor);
        self
    }

    pub fn default_station(mut self, tag: &str) -> Self {
        self.default_station = Some(tag.to_string());
        self
    }

    pub fn default_line_style(mut self, tag: &str) -> Self {
        self.default_line_style = Some(tag.to_string());
        self
    }

    pub fn default_path(mut self, tag: &str) -> Self {
        self.default_path = Some(tag.to_string());
        self
    }

    /// Freezes the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RailmapError::Registry`] when a namespace has no default or
    /// its default tag is not registered, or when a path descriptor is
    /// registered under a tag other than its shape's.
    pub fn build(self) -> Result<TypeRegistry, RailmapError> {
        if let Some((tag, descriptor)) = self
            .paths
            .iter()
            .find(|(tag, d)| d.shape().tag() != tag.as_str())
        {
            return Err(RailmapError::Registry(format!(
                "path descriptor `{tag}` describes shape `{}`",
                descriptor.shape()
            )));
        }

        let registry = TypeRegistry {
            stations: freeze(Namespace::Station, self.stations, self.default_station)?,
            line_styles: freeze(
                Namespace::LineStyle,
                self.line_styles,
                self.default_line_style,
            )?,
            paths: freeze(Namespace::LinePath, self.paths, self.default_path)?,
        };

        debug!(
            stations = registry.stations.entries.len(),
            line_styles = registry.line_styles.entries.len(),
            paths = registry.paths.entries.len();
            "Type registry built"
        );
        Ok(registry)
    }
}

fn insert_entry<D>(entries: &mut IndexMap<String, D>, namespace: Namespace, tag: &str, descriptor: D) {
    if entries.insert(tag.to_string(), descriptor).is_some() {
        warn!(namespace:%, tag; "Type registered twice, keeping the later descriptor");
    }
}

fn freeze<D>(
    namespace: Namespace,
    entries: IndexMap<String, D>,
    default_tag: Option<String>,
) -> Result<Registry<D>, RailmapError> {
    let default_tag = default_tag
        .ok_or_else(|| RailmapError::Registry(format!("no default {namespace} type designated")))?;
    if !entries.contains_key(&default_tag) {
        return Err(RailmapError::Registry(format!(
            "default {namespace} type `{default_tag}` is not registered"
        )));
    }
    Ok(Registry {
        namespace,
        entries,
        default_tag,
    })
}

#[cfg(test)]
mod tests {
    use railmap_core::draw::LayeredOutput;

    use super::*;

    #[derive(Debug)]
    struct Blank;

    impl StationRenderer for Blank {
        fn render(&self, _ctx: &StationRenderContext<'_>) -> LayeredOutput {
            LayeredOutput::new()
        }
    }

    impl LineStyleRenderer for Blank {
        fn render(&self, _ctx: &LineRenderContext<'_>) -> LayeredOutput {
            LayeredOutput::new()
        }
    }

    fn minimal() -> TypeRegistryBuilder {
        TypeRegistry::builder()
            .station(
                "dot",
                StationDescriptor::new("Dot", Blank)
                    .with_defaults(Attrs::new().with("names", vec!["A", "B"]).with("size", 5.0))
                    .with_field(FieldSpec::number("size", "Size")),
            )
            .line_style("plain", LineStyleDescriptor::new("Plain", Blank))
            .path("simple", PathDescriptor::new(PathShape::Simple, "Simple"))
            .default_station("dot")
            .default_line_style("plain")
            .default_path("simple")
    }

    #[test]
    fn test_lookup_unknown_type() {
        let registry = minimal().build().unwrap();

        let err = registry.stations().lookup("nope").unwrap_err();
        assert!(matches!(
            err,
            RailmapError::UnknownType { namespace: Namespace::Station, ref tag } if tag == "nope"
        ));
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let registry = minimal().build().unwrap();

        let (tag, descriptor) = registry.stations().resolve("nope");
        assert_eq!(tag, "dot");
        assert_eq!(descriptor.display_name(), "Dot");

        let (tag, _) = registry.stations().resolve("dot");
        assert_eq!(tag, "dot");
    }

    #[test]
    fn test_build_requires_registered_default() {
        let err = minimal().default_line_style("fancy").build().unwrap_err();
        assert!(matches!(err, RailmapError::Registry(_)));

        let err = TypeRegistry::builder()
            .station("dot", StationDescriptor::new("Dot", Blank))
            .default_station("dot")
            .build()
            .unwrap_err();
        assert!(matches!(err, RailmapError::Registry(_)));
    }

    #[test]
    fn test_build_rejects_mismatched_path_tag() {
        let err = minimal()
            .path("curvy", PathDescriptor::new(PathShape::Diagonal, "Curvy"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RailmapError::Registry(_)));
    }

    #[test]
    fn test_duplicate_registration_keeps_later() {
        let registry = minimal()
            .station("dot", StationDescriptor::new("Dot v2", Blank))
            .build()
            .unwrap();

        assert_eq!(registry.stations().tags().count(), 1);
        assert_eq!(
            registry.stations().lookup("dot").unwrap().display_name(),
            "Dot v2"
        );
    }

    #[test]
    fn test_complete_overlays_defaults() {
        let registry = minimal().build().unwrap();
        let descriptor = registry.stations().lookup("dot").unwrap();

        let completed = descriptor.complete(Some(&Attrs::new().with("size", 8.0)));
        assert_eq!(completed.number("size"), Some(8.0));
        assert_eq!(completed.list_text("names", 1), Some("B"));

        assert_eq!(descriptor.complete(None), *descriptor.defaults());
    }

    #[test]
    fn test_editable_fields_are_total() {
        let registry = minimal().build().unwrap();

        let fields = registry.stations().editable_fields("dot", None).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].display_value(), "5");

        let next = fields[0].commit("7").unwrap();
        assert_eq!(next.number("size"), Some(7.0));
        assert_eq!(next.list_text("names", 0), Some("A"));

        assert!(registry.stations().editable_fields("nope", None).is_err());
    }

    #[test]
    fn test_line_style_supported_paths() {
        let descriptor = LineStyleDescriptor::new("Plain", Blank)
            .with_supported_paths(&[PathShape::Simple, PathShape::Diagonal]);

        assert!(descriptor.supports(PathShape::Diagonal));
        assert!(!descriptor.supports(PathShape::Perpendicular));
    }
}
