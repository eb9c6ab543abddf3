//! Ephemeral editor state.
//!
//! [`RuntimeState`] holds what the UI needs besides the graph itself: the
//! selection, the active tool and the refresh version. It is never persisted
//! and is reset whenever a graph is loaded.

use indexmap::IndexSet;

use railmap_core::identifier::ElementId;

/// The active editing tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Mode {
    /// Select and drag existing elements.
    #[default]
    Free,
    /// Clicking on empty canvas places a station of the given variant.
    Station(String),
    /// Dragging from one node to another connects them in the given style.
    Line(String),
}

/// Selection, active tool and refresh version.
#[derive(Debug, Clone, Default)]
pub struct RuntimeState {
    selection: IndexSet<ElementId>,
    selection_revision: u64,
    version: u64,
    mode: Mode,
}

impl RuntimeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic counter bumped on every committed mutation batch.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    /// Monotonic counter bumped on every selection change.
    pub fn selection_revision(&self) -> u64 {
        self.selection_revision
    }

    pub fn selection(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.selection.iter().copied()
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selection.contains(&id)
    }

    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    /// Replaces the selection with a single element.
    pub fn select_only(&mut self, id: ElementId) {
        if self.selection.len() == 1 && self.selection.contains(&id) {
            return;
        }
        self.selection.clear();
        self.selection.insert(id);
        self.selection_revision += 1;
    }

    /// Adds `id` to the selection, or removes it if already selected.
    pub fn toggle(&mut self, id: ElementId) {
        if !self.selection.shift_remove(&id) {
            self.selection.insert(id);
        }
        self.selection_revision += 1;
    }

    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.selection_revision += 1;
        }
    }

    /// Drops selected elements for which `exists` returns false.
    pub fn retain_selection(&mut self, exists: impl Fn(ElementId) -> bool) {
        let before = self.selection.len();
        self.selection.retain(|id| exists(*id));
        if self.selection.len() != before {
            self.selection_revision += 1;
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Clears selection and tool for a freshly loaded graph.
    ///
    /// The version keeps counting so views memoized on an older graph are
    /// never mistaken for current ones.
    pub fn reset(&mut self) {
        self.clear_selection();
        self.mode = Mode::Free;
    }
}
