//! CLI logic for the Railmap diagram tool.
//!
//! Reads a diagram snapshot, loads it into an [`Editor`] and writes one
//! rendered frame as SVG.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, io};

use log::info;

use railmap::{Editor, RailmapError};

/// Run the Railmap CLI application
///
/// # Errors
///
/// Returns `RailmapError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed or inconsistent snapshots
pub fn run(args: &Args) -> Result<(), RailmapError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing diagram"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;

    let mut editor = Editor::with_builtin_variants(app_config)?;
    editor.load_json(&source)?;
    let Some(svg) = editor.render_svg() else {
        return Err(io::Error::other("no frame was rendered").into());
    };

    fs::write(&args.output, svg)?;

    info!(output_file = args.output; "SVG exported successfully");

    Ok(())
}
