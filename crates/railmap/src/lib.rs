//! Railmap - An editor core for transit and rail-network diagrams.
//!
//! Stations and lines form a graph whose nodes and edges carry a variant tag
//! and a per-variant attribute dictionary. Variants are registered through a
//! [`registry::TypeRegistry`]; the editor itself only ever looks them up.
//! Every change follows the mutate, refresh, persist protocol of
//! [`sync::SyncController`], and rendering reads the graph only at refreshed
//! versions.

pub mod config;
pub mod graph;
pub mod history;
pub mod registry;
pub mod render;
pub mod runtime;
pub mod sync;
pub mod variants;

mod error;

pub use railmap_core::{attrs, color, draw, geometry, identifier, path};

pub use error::{Namespace, RailmapError};

use std::rc::Rc;

use log::{debug, info};

use config::AppConfig;
use geometry::Point;
use graph::GraphSnapshot;
use registry::TypeRegistry;
use render::{
    RenderPipeline,
    interaction::{FieldTarget, Interaction, InteractionState},
};
use runtime::Mode;
use sync::SyncController;

/// A diagram being edited.
///
/// Bundles the sync controller, the render pipeline and the interaction
/// state machine behind one API.
///
/// # Examples
///
/// ```rust
/// use railmap::{Editor, config::AppConfig, geometry::Point, runtime::Mode};
///
/// let mut editor = Editor::with_builtin_variants(AppConfig::default())
///     .expect("Failed to build registry");
///
/// editor.set_mode(Mode::Station("shmetro-basic".to_string()));
/// editor.pointer_down(Point::new(100.0, 100.0), false)
///     .expect("Failed to place station");
///
/// let svg = editor.render_svg().expect("Nothing rendered");
/// assert!(svg.contains("<svg"));
/// ```
#[derive(Debug)]
pub struct Editor {
    sync: SyncController,
    pipeline: RenderPipeline,
    interaction: Interaction,
}

impl Editor {
    /// Create an editor for an empty diagram.
    ///
    /// # Arguments
    ///
    /// * `config` - Canvas, history and interaction settings
    /// * `registry` - The variants the diagram may use
    pub fn new(config: AppConfig, registry: TypeRegistry) -> Self {
        Self {
            sync: SyncController::new(Rc::new(registry), config.history().limit()),
            pipeline: RenderPipeline::new(config.canvas().clone()),
            interaction: Interaction::new(config.interaction()),
        }
    }

    /// Create an editor with every built-in variant registered.
    ///
    /// # Errors
    ///
    /// Returns `RailmapError::Registry` if the built-in registry is
    /// inconsistent.
    pub fn with_builtin_variants(config: AppConfig) -> Result<Self, RailmapError> {
        Ok(Self::new(config, variants::builtin_registry()?))
    }

    /// The sync controller, for direct graph edits and queries.
    pub fn sync(&self) -> &SyncController {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut SyncController {
        &mut self.sync
    }

    pub fn interaction_state(&self) -> &InteractionState {
        self.interaction.state()
    }

    pub fn set_mode(&mut self, mode: Mode) {
        debug!(mode:?; "Mode changed");
        self.sync.runtime_mut().set_mode(mode);
    }

    /// Replace the diagram with a serialized snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RailmapError::Serialization` for malformed JSON or an
    /// inconsistent snapshot; the current diagram is kept.
    pub fn load_json(&mut self, json: &str) -> Result<(), RailmapError> {
        info!(bytes = json.len(); "Loading diagram");
        let snapshot = GraphSnapshot::from_json(json)?;
        self.sync.load(&snapshot)?;
        self.interaction.reset();
        Ok(())
    }

    /// Serialize the last persisted state of the diagram.
    ///
    /// # Errors
    ///
    /// Returns `RailmapError::Serialization` if encoding fails.
    pub fn export_json(&self) -> Result<String, RailmapError> {
        self.sync.save().to_json()
    }

    /// Render the current state to an SVG string.
    ///
    /// Returns `None` only when a mutation is pending refresh and nothing was
    /// rendered before.
    pub fn render_svg(&mut self) -> Option<String> {
        self.pipeline
            .frame(&self.sync)
            .map(|frame| frame.svg().to_string())
    }

    /// Number of frames actually built.
    pub fn render_count(&self) -> usize {
        self.pipeline.render_count()
    }

    pub fn pointer_down(&mut self, point: Point, additive: bool) -> Result<(), RailmapError> {
        self.interaction.pointer_down(&mut self.sync, point, additive)
    }

    pub fn pointer_move(&mut self, point: Point) -> Result<(), RailmapError> {
        self.interaction.pointer_move(&mut self.sync, point)
    }

    pub fn pointer_up(&mut self, point: Point) -> Result<(), RailmapError> {
        self.interaction.pointer_up(&mut self.sync, point)
    }

    /// Abandon the current gesture or edit.
    pub fn cancel(&mut self) -> Result<(), RailmapError> {
        self.interaction.cancel(&mut self.sync)
    }

    pub fn begin_edit(&mut self, target: FieldTarget) -> Result<(), RailmapError> {
        self.interaction.begin_edit(&self.sync, target)
    }

    pub fn editing_value(&self) -> Option<String> {
        self.interaction.editing_value(&self.sync)
    }

    pub fn commit_field(&mut self, candidate: &str) -> Result<(), RailmapError> {
        self.interaction.commit_field(&mut self.sync, candidate)
    }

    /// Undo the last persisted change; returns `false` if there is none.
    pub fn undo(&mut self) -> Result<bool, RailmapError> {
        self.interaction.cancel(&mut self.sync)?;
        self.sync.undo()
    }

    /// Redo the last undone change; returns `false` if there is none.
    pub fn redo(&mut self) -> Result<bool, RailmapError> {
        self.interaction.cancel(&mut self.sync)?;
        self.sync.redo()
    }
}
