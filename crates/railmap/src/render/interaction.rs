//! Pointer and field-editing state machine.
//!
//! [`Interaction`] turns raw pointer events into graph changes through a
//! [`SyncController`]. A drag mutates and refreshes on every move and
//! persists once on release; every other completed gesture is a single
//! commit.

use std::fmt;

use log::{debug, info, trace, warn};

use railmap_core::{
    geometry::Point,
    identifier::{ElementId, NodeId},
};

use crate::{
    config::InteractionConfig,
    error::RailmapError,
    graph::GraphStore,
    registry::EditableField,
    runtime::Mode,
    sync::SyncController,
};

use super::hit_test;

/// The part of an element a field edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Attributes of the node's station variant.
    Station,
    /// Attributes of the edge's line style.
    LineStyle,
    /// Attributes of the edge's path shape.
    LinePath,
    /// Node coordinates; index 0 is `x`, index 1 is `y`.
    Position,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Station => "station",
            Self::LineStyle => "line style",
            Self::LinePath => "line path",
            Self::Position => "position",
        })
    }
}

/// One editable field of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTarget {
    element: ElementId,
    section: Section,
    index: usize,
}

impl FieldTarget {
    pub fn new(element: impl Into<ElementId>, section: Section, index: usize) -> Self {
        Self {
            element: element.into(),
            section,
            index,
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn invalid(&self, reason: &str) -> RailmapError {
        RailmapError::InvalidField(format!(
            "{} {} field #{}: {reason}",
            self.element, self.section, self.index
        ))
    }
}

/// Where the current gesture is.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionState {
    Idle,
    /// Pointer is down on an edge or on empty canvas.
    Selecting,
    /// A node follows the pointer.
    Dragging {
        target: NodeId,
        /// Node position when the gesture started.
        origin: Point,
        pointer_origin: Point,
        moved: bool,
    },
    /// A new line is being drawn from `source`.
    Connecting { source: NodeId, line_style: String },
    Editing(FieldTarget),
}

/// Pointer and field-editing state machine.
#[derive(Debug)]
pub struct Interaction {
    state: InteractionState,
    grid: Option<f32>,
    hit_radius: f32,
}

impl Interaction {
    pub fn new(config: &InteractionConfig) -> Self {
        Self {
            state: InteractionState::Idle,
            grid: config.grid(),
            hit_radius: config.hit_radius(),
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Drops the current gesture without touching the graph.
    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
    }

    fn snap(&self, point: Point) -> Point {
        match self.grid {
            Some(step) => point.snap_to_grid(step),
            None => point,
        }
    }

    fn hit(&self, sync: &mut SyncController, point: Point) -> Option<ElementId> {
        if sync.is_pending() {
            sync.refresh();
        }
        let view = sync.view()?;
        hit_test(&view, point, self.hit_radius)
    }

    /// Starts a gesture at `point`.
    ///
    /// `additive` toggles the element under the pointer in the selection
    /// instead of replacing it. A drag whose release never arrived is
    /// reverted first.
    ///
    /// # Errors
    ///
    /// Placing a station in [`Mode::Station`] fails with
    /// [`RailmapError::UnknownType`] for an unregistered variant.
    pub fn pointer_down(
        &mut self,
        sync: &mut SyncController,
        point: Point,
        additive: bool,
    ) -> Result<(), RailmapError> {
        if !point.is_finite() {
            warn!("Ignoring pointer event at non-finite position");
            return Ok(());
        }
        if matches!(self.state, InteractionState::Dragging { moved: true, .. }) {
            warn!("Pointer down during an unreleased drag, reverting it");
            self.cancel(sync)?;
        }
        let hit = self.hit(sync, point);
        trace!(x = point.x(), y = point.y(), additive; "Pointer down");

        self.state = match (hit, sync.runtime().mode().clone()) {
            (Some(ElementId::Node(source)), Mode::Line(line_style)) => {
                InteractionState::Connecting { source, line_style }
            }
            (Some(id), _) if additive => {
                sync.runtime_mut().toggle(id);
                InteractionState::Selecting
            }
            (Some(ElementId::Node(target)), _) => {
                sync.runtime_mut().select_only(target.into());
                InteractionState::Dragging {
                    target,
                    origin: sync.graph().node(target)?.position(),
                    pointer_origin: point,
                    moved: false,
                }
            }
            (Some(id), _) => {
                sync.runtime_mut().select_only(id);
                InteractionState::Selecting
            }
            (None, Mode::Station(station_type)) => {
                let id = self.place_station(sync, point, &station_type)?;
                sync.runtime_mut().select_only(id.into());
                InteractionState::Idle
            }
            (None, _) => {
                if !additive {
                    sync.runtime_mut().clear_selection();
                }
                InteractionState::Selecting
            }
        };
        Ok(())
    }

    fn place_station(
        &self,
        sync: &mut SyncController,
        point: Point,
        station_type: &str,
    ) -> Result<NodeId, RailmapError> {
        let kind = sync.graph().registry().stations().lookup(station_type)?.kind();
        let position = self.snap(point);
        let id = sync.commit(|graph| {
            let id = graph.next_node_id(kind);
            graph.add_node(id, position, station_type, None)?;
            Ok(id)
        })?;
        info!(node_id:% = id, station_type; "Station placed");
        Ok(id)
    }

    /// Moves the dragged node, if any.
    ///
    /// Each move is mutated and refreshed but not persisted.
    pub fn pointer_move(&mut self, sync: &mut SyncController, point: Point) -> Result<(), RailmapError> {
        let InteractionState::Dragging {
            target,
            origin,
            pointer_origin,
            moved,
        } = &mut self.state
        else {
            return Ok(());
        };
        if !point.is_finite() {
            warn!("Ignoring pointer event at non-finite position");
            return Ok(());
        }

        let delta = point.sub_point(*pointer_origin);
        let position = match self.grid {
            Some(step) => origin.add_point(delta).snap_to_grid(step),
            None => origin.add_point(delta),
        };
        let target = *target;
        if sync.graph().node(target)?.position() == position {
            return Ok(());
        }

        sync.mutate(|graph| graph.set_node_position(target, position))?;
        sync.refresh();
        *moved = true;
        trace!(node_id:% = target, x = position.x(), y = position.y(); "Node dragged");
        Ok(())
    }

    /// Completes the current gesture.
    ///
    /// A drag that moved its node persists once; a connection released over
    /// another node commits a new edge.
    ///
    /// # Errors
    ///
    /// Connecting two nodes that are already connected fails with
    /// [`RailmapError::AlreadyExists`]; the state still returns to idle.
    pub fn pointer_up(&mut self, sync: &mut SyncController, point: Point) -> Result<(), RailmapError> {
        match std::mem::replace(&mut self.state, InteractionState::Idle) {
            InteractionState::Dragging { target, moved, .. } => {
                if moved {
                    sync.persist();
                    debug!(node_id:% = target; "Drag persisted");
                }
            }
            InteractionState::Connecting { source, line_style } => {
                let Some(ElementId::Node(target)) = self.hit(sync, point) else {
                    debug!(node_id:% = source; "Connection released over no node");
                    return Ok(());
                };
                if target == source {
                    return Ok(());
                }
                let shape = sync.graph().registry().paths().default_descriptor().shape();
                let id = sync.commit(|graph| graph.add_edge(source, target, shape, &line_style))?;
                sync.runtime_mut().select_only(id.into());
                info!(edge_id:% = id, line_style; "Line connected");
            }
            InteractionState::Editing(target) => {
                self.state = InteractionState::Editing(target);
            }
            InteractionState::Idle | InteractionState::Selecting => {}
        }
        Ok(())
    }

    /// Abandons the current gesture without persisting.
    ///
    /// A drag in progress is reverted to the last persisted entry.
    pub fn cancel(&mut self, sync: &mut SyncController) -> Result<(), RailmapError> {
        let state = std::mem::replace(&mut self.state, InteractionState::Idle);
        if let InteractionState::Dragging { target, moved: true, .. } = state {
            sync.revert_to_saved()?;
            debug!(node_id:% = target; "Drag cancelled");
        }
        Ok(())
    }

    /// Enters editing for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`RailmapError::NotFound`] for a missing element and
    /// [`RailmapError::InvalidField`] when the element has no such field.
    pub fn begin_edit(&mut self, sync: &SyncController, target: FieldTarget) -> Result<(), RailmapError> {
        let current = current_value(sync.graph(), &target)?;
        debug!(element:% = target.element, section:% = target.section, current:%; "Editing field");
        self.state = InteractionState::Editing(target);
        Ok(())
    }

    /// The display value of the field being edited.
    pub fn editing_value(&self, sync: &SyncController) -> Option<String> {
        let InteractionState::Editing(target) = &self.state else {
            return None;
        };
        current_value(sync.graph(), target).ok()
    }

    /// Validates `candidate` and commits it to the edited field.
    ///
    /// On success the state returns to idle. A rejected candidate leaves the
    /// graph untouched and the state in editing.
    ///
    /// # Errors
    ///
    /// Returns [`RailmapError::Validation`] for a rejected candidate and
    /// [`RailmapError::InvalidField`] when not editing.
    pub fn commit_field(&mut self, sync: &mut SyncController, candidate: &str) -> Result<(), RailmapError> {
        let InteractionState::Editing(target) = self.state else {
            return Err(RailmapError::InvalidField("no field is being edited".to_string()));
        };

        let element = target.element;
        match (target.section, element) {
            (Section::Position, ElementId::Node(id)) => {
                let axis = if target.index == 0 { "x" } else { "y" };
                let value = candidate
                    .trim()
                    .parse::<f32>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| RailmapError::Validation {
                        field: axis.to_string(),
                        value: candidate.to_string(),
                    })?;
                let current = sync.graph().node(id)?.position();
                let position = match target.index {
                    0 => current.with_x(value),
                    _ => current.with_y(value),
                };
                sync.commit(|graph| graph.set_node_position(id, position))?;
            }
            (section, element) => {
                let attrs = with_field(sync.graph(), &target, |field| field.commit(candidate))?;
                sync.commit(|graph| match (section, element) {
                    (Section::Station, ElementId::Node(id)) => graph.replace_node_attributes(id, attrs),
                    (Section::LineStyle, ElementId::Edge(id)) => {
                        graph.replace_edge_style_attributes(id, attrs)
                    }
                    (Section::LinePath, ElementId::Edge(id)) => {
                        graph.replace_edge_path_attributes(id, attrs)
                    }
                    _ => Err(target.invalid("section does not apply to this element")),
                })?;
            }
        }

        info!(element:% = element, section:% = target.section; "Field committed");
        self.state = InteractionState::Idle;
        Ok(())
    }
}

/// Binds the variant field `target` names and hands it to `f`.
fn with_field<T>(
    graph: &GraphStore,
    target: &FieldTarget,
    f: impl FnOnce(&EditableField<'_>) -> Result<T, RailmapError>,
) -> Result<T, RailmapError> {
    let registry = graph.registry();
    let fields = match (target.section, target.element) {
        (Section::Station, ElementId::Node(id)) => {
            let node = graph.node(id)?;
            registry
                .stations()
                .editable_fields(node.station_type(), node.active_attrs())?
        }
        (Section::LineStyle, ElementId::Edge(id)) => {
            let edge = graph.edge(id)?;
            registry
                .line_styles()
                .editable_fields(edge.line_style(), edge.active_style_attrs())?
        }
        (Section::LinePath, ElementId::Edge(id)) => {
            let edge = graph.edge(id)?;
            registry
                .paths()
                .editable_fields(edge.path_shape().tag(), edge.active_path_attrs())?
        }
        _ => return Err(target.invalid("section does not apply to this element")),
    };
    let field = fields
        .get(target.index)
        .ok_or_else(|| target.invalid("index out of range"))?;
    f(field)
}

fn current_value(graph: &GraphStore, target: &FieldTarget) -> Result<String, RailmapError> {
    match (target.section, target.element) {
        (Section::Position, ElementId::Node(id)) => {
            let position = graph.node(id)?.position();
            match target.index {
                0 => Ok(position.x().to_string()),
                1 => Ok(position.y().to_string()),
                _ => Err(target.invalid("index out of range")),
            }
        }
        (Section::Position, ElementId::Edge(_)) => {
            Err(target.invalid("section does not apply to this element"))
        }
        _ => with_field(graph, target, |field| Ok(field.display_value())),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use railmap_core::identifier::EdgeId;

    use super::*;
    use crate::variants::{self, MTR_PAID_AREA, SHMETRO_BASIC, VIRTUAL};

    fn setup(grid: Option<f32>) -> (SyncController, Interaction) {
        let mut sync = SyncController::new(Rc::new(variants::builtin_registry().unwrap()), 50);
        sync.commit(|graph| {
            graph.add_node(NodeId::new("stn_a"), Point::new(0.0, 0.0), SHMETRO_BASIC, None)?;
            graph.add_node(NodeId::new("stn_b"), Point::new(200.0, 0.0), SHMETRO_BASIC, None)
        })
        .unwrap();
        (sync, Interaction::new(&InteractionConfig::new(grid, 10.0)))
    }

    fn a() -> NodeId {
        NodeId::new("stn_a")
    }

    fn b() -> NodeId {
        NodeId::new("stn_b")
    }

    #[test]
    fn test_drag_persists_once() {
        let (mut sync, mut interaction) = setup(None);
        let history_len = sync.history().len();

        interaction.pointer_down(&mut sync, Point::new(1.0, 1.0), false).unwrap();
        assert!(matches!(interaction.state(), InteractionState::Dragging { .. }));
        for step in 1..=5 {
            let t = step as f32 / 5.0;
            interaction
                .pointer_move(&mut sync, Point::new(1.0 + 10.0 * t, 1.0 + 20.0 * t))
                .unwrap();
        }
        assert_eq!(sync.history().len(), history_len);

        interaction.pointer_up(&mut sync, Point::new(11.0, 21.0)).unwrap();
        assert_eq!(interaction.state(), &InteractionState::Idle);
        assert_eq!(sync.history().len(), history_len + 1);
        assert_eq!(sync.graph().node(a()).unwrap().position(), Point::new(10.0, 20.0));
    }

    #[test]
    fn test_click_without_move_does_not_persist() {
        let (mut sync, mut interaction) = setup(None);
        let history_len = sync.history().len();

        interaction.pointer_down(&mut sync, Point::new(0.0, 0.0), false).unwrap();
        interaction.pointer_up(&mut sync, Point::new(0.0, 0.0)).unwrap();

        assert_eq!(sync.history().len(), history_len);
        assert!(sync.runtime().is_selected(a().into()));
    }

    #[test]
    fn test_drag_snaps_to_grid() {
        let (mut sync, mut interaction) = setup(Some(25.0));

        interaction.pointer_down(&mut sync, Point::new(0.0, 0.0), false).unwrap();
        interaction.pointer_move(&mut sync, Point::new(37.0, 11.0)).unwrap();

        assert_eq!(sync.graph().node(a()).unwrap().position(), Point::new(25.0, 0.0));
    }

    #[test]
    fn test_cancel_reverts_drag() {
        let (mut sync, mut interaction) = setup(None);

        interaction.pointer_down(&mut sync, Point::new(0.0, 0.0), false).unwrap();
        interaction.pointer_move(&mut sync, Point::new(50.0, 50.0)).unwrap();
        interaction.cancel(&mut sync).unwrap();

        assert_eq!(interaction.state(), &InteractionState::Idle);
        assert_eq!(sync.graph().node(a()).unwrap().position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_unreleased_drag_is_reverted_by_next_gesture() {
        let (mut sync, mut interaction) = setup(None);
        let history_len = sync.history().len();

        interaction.pointer_down(&mut sync, Point::new(0.0, 0.0), false).unwrap();
        interaction.pointer_move(&mut sync, Point::new(50.0, 50.0)).unwrap();

        interaction.pointer_down(&mut sync, Point::new(200.0, 0.0), false).unwrap();
        interaction.pointer_move(&mut sync, Point::new(210.0, 0.0)).unwrap();
        interaction.pointer_up(&mut sync, Point::new(210.0, 0.0)).unwrap();

        assert_eq!(sync.history().len(), history_len + 1);
        assert_eq!(sync.graph().node(a()).unwrap().position(), Point::new(0.0, 0.0));
        assert_eq!(sync.graph().node(b()).unwrap().position(), Point::new(210.0, 0.0));
    }

    #[test]
    fn test_empty_canvas_clears_selection() {
        let (mut sync, mut interaction) = setup(None);
        sync.runtime_mut().select_only(a().into());

        interaction.pointer_down(&mut sync, Point::new(100.0, 100.0), true).unwrap();
        assert_eq!(sync.runtime().selection_len(), 1);

        interaction.pointer_down(&mut sync, Point::new(100.0, 100.0), false).unwrap();
        assert_eq!(interaction.state(), &InteractionState::Selecting);
        assert_eq!(sync.runtime().selection_len(), 0);
    }

    #[test]
    fn test_additive_click_toggles() {
        let (mut sync, mut interaction) = setup(None);

        interaction.pointer_down(&mut sync, Point::new(0.0, 0.0), false).unwrap();
        interaction.pointer_up(&mut sync, Point::new(0.0, 0.0)).unwrap();
        interaction.pointer_down(&mut sync, Point::new(200.0, 0.0), true).unwrap();
        interaction.pointer_up(&mut sync, Point::new(200.0, 0.0)).unwrap();

        assert_eq!(sync.runtime().selection_len(), 2);
    }

    #[test]
    fn test_station_mode_places_node() {
        let (mut sync, mut interaction) = setup(Some(10.0));
        sync.runtime_mut().set_mode(Mode::Station(VIRTUAL.to_string()));

        interaction.pointer_down(&mut sync, Point::new(104.0, 96.0), false).unwrap();

        let placed = sync.graph().nodes().last().unwrap();
        assert!(placed.id().to_string().starts_with("misc_node_"));
        assert_eq!(placed.position(), Point::new(100.0, 100.0));
        assert_eq!(placed.station_type(), VIRTUAL);
        assert!(sync.runtime().is_selected(placed.id().into()));
        assert_eq!(interaction.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_station_mode_unknown_variant() {
        let (mut sync, mut interaction) = setup(None);
        sync.runtime_mut().set_mode(Mode::Station("tokyo-metro".to_string()));

        let err = interaction
            .pointer_down(&mut sync, Point::new(100.0, 100.0), false)
            .unwrap_err();
        assert!(matches!(err, RailmapError::UnknownType { .. }));
        assert_eq!(sync.graph().node_count(), 2);
    }

    #[test]
    fn test_line_mode_connects_nodes() {
        let (mut sync, mut interaction) = setup(None);
        sync.runtime_mut().set_mode(Mode::Line(MTR_PAID_AREA.to_string()));
        let history_len = sync.history().len();

        interaction.pointer_down(&mut sync, Point::new(0.0, 0.0), false).unwrap();
        assert!(matches!(interaction.state(), InteractionState::Connecting { .. }));
        interaction.pointer_up(&mut sync, Point::new(198.0, 2.0)).unwrap();

        let edge = sync.graph().edge(EdgeId::between(a(), b())).unwrap();
        assert_eq!(edge.line_style(), MTR_PAID_AREA);
        assert_eq!(sync.history().len(), history_len + 1);

        interaction.pointer_down(&mut sync, Point::new(0.0, 0.0), false).unwrap();
        let err = interaction.pointer_up(&mut sync, Point::new(200.0, 0.0)).unwrap_err();
        assert!(matches!(err, RailmapError::AlreadyExists(_)));
        assert_eq!(interaction.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_line_mode_released_on_canvas() {
        let (mut sync, mut interaction) = setup(None);
        sync.runtime_mut().set_mode(Mode::Line(MTR_PAID_AREA.to_string()));

        interaction.pointer_down(&mut sync, Point::new(0.0, 0.0), false).unwrap();
        interaction.pointer_up(&mut sync, Point::new(100.0, 100.0)).unwrap();

        assert_eq!(sync.graph().edge_count(), 0);
    }

    #[test]
    fn test_commit_field_station_name() {
        let (mut sync, mut interaction) = setup(None);
        let target = FieldTarget::new(a(), Section::Station, 1);

        interaction.begin_edit(&sync, target).unwrap();
        assert_eq!(interaction.editing_value(&sync).as_deref(), Some("Stn"));
        interaction.commit_field(&mut sync, "Central").unwrap();

        assert_eq!(interaction.state(), &InteractionState::Idle);
        let attrs = sync.graph().node_attrs(a()).unwrap();
        assert_eq!(attrs.list_text("names", 1), Some("Central"));
    }

    #[test]
    fn test_rejected_field_keeps_editing() {
        let (mut sync, mut interaction) = setup(None);
        let history_len = sync.history().len();
        let target = FieldTarget::new(a(), Section::Station, 2);

        interaction.begin_edit(&sync, target).unwrap();
        let err = interaction.commit_field(&mut sync, "diagonal").unwrap_err();

        assert!(matches!(err, RailmapError::Validation { .. }));
        assert_eq!(interaction.state(), &InteractionState::Editing(target));
        assert_eq!(sync.history().len(), history_len);

        interaction.cancel(&mut sync).unwrap();
        assert_eq!(interaction.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_commit_position_field() {
        let (mut sync, mut interaction) = setup(None);

        interaction
            .begin_edit(&sync, FieldTarget::new(b(), Section::Position, 1))
            .unwrap();
        assert!(interaction.commit_field(&mut sync, "down").is_err());
        interaction.commit_field(&mut sync, "42.5").unwrap();

        assert_eq!(sync.graph().node(b()).unwrap().position(), Point::new(200.0, 42.5));
    }

    #[test]
    fn test_commit_path_field() {
        let (mut sync, mut interaction) = setup(None);
        let edge = sync
            .commit(|graph| {
                graph.add_edge(a(), b(), railmap_core::path::PathShape::Diagonal, MTR_PAID_AREA)
            })
            .unwrap();

        interaction
            .begin_edit(&sync, FieldTarget::new(edge, Section::LinePath, 0))
            .unwrap();
        interaction.commit_field(&mut sync, "25").unwrap();

        assert_eq!(sync.graph().edge_path_attrs(edge).unwrap().number("transition"), Some(25.0));
    }

    #[test]
    fn test_begin_edit_rejects_bad_target() {
        let (sync, mut interaction) = setup(None);

        let err = interaction
            .begin_edit(&sync, FieldTarget::new(a(), Section::LineStyle, 0))
            .unwrap_err();
        assert!(matches!(err, RailmapError::InvalidField(_)));

        let err = interaction
            .begin_edit(&sync, FieldTarget::new(a(), Section::Station, 9))
            .unwrap_err();
        assert!(matches!(err, RailmapError::InvalidField(_)));
        assert_eq!(interaction.state(), &InteractionState::Idle);
    }
}
