//! Configuration types for the Railmap editor.
//!
//! All types implement [`serde::Deserialize`] and fill unspecified fields
//! with defaults, so an empty TOML document is a valid configuration.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`CanvasConfig`] - Output canvas size and background color.
//! - [`HistoryConfig`] - Undo history bound.
//! - [`InteractionConfig`] - Grid snapping and hit-test radius.
//!
//! # Example
//!
//! ```
//! # use railmap::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.history().limit(), 50);
//! assert!(config.canvas().background_color().is_ok());
//! ```

use serde::Deserialize;

use railmap_core::color::Color;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Canvas configuration section.
    #[serde(default)]
    canvas: CanvasConfig,

    /// History configuration section.
    #[serde(default)]
    history: HistoryConfig,

    /// Interaction configuration section.
    #[serde(default)]
    interaction: InteractionConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        canvas: CanvasConfig,
        history: HistoryConfig,
        interaction: InteractionConfig,
    ) -> Self {
        Self {
            canvas,
            history,
            interaction,
        }
    }

    /// Returns the canvas configuration.
    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    /// Returns the history configuration.
    pub fn history(&self) -> &HistoryConfig {
        &self.history
    }

    /// Returns the interaction configuration.
    pub fn interaction(&self) -> &InteractionConfig {
        &self.interaction
    }
}

/// Output canvas settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    width: f32,
    height: f32,
    /// Background color as a CSS color string.
    background_color: Option<String>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background_color: None,
        }
    }
}

impl CanvasConfig {
    pub fn new(width: f32, height: f32, background_color: Option<String>) -> Self {
        Self {
            width,
            height,
            background_color,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed
    /// into a valid [`Color`].
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_ref()
            .map(|color| Color::new(color))
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }
}

/// Undo history settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { limit: 50 }
    }
}

impl HistoryConfig {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Maximum number of retained history entries, never less than one.
    pub fn limit(&self) -> usize {
        self.limit.max(1)
    }
}

/// Pointer interaction settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Snap step for dragged positions; `None` disables snapping.
    grid: Option<f32>,
    /// Distance within which the pointer hits a node or an edge.
    hit_radius: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            grid: None,
            hit_radius: 10.0,
        }
    }
}

impl InteractionConfig {
    pub fn new(grid: Option<f32>, hit_radius: f32) -> Self {
        Self { grid, hit_radius }
    }

    pub fn grid(&self) -> Option<f32> {
        self.grid.filter(|step| step.is_finite() && *step > 0.0)
    }

    pub fn hit_radius(&self) -> f32 {
        self.hit_radius
    }
}
