//! Command-line argument definitions for the Railmap CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Railmap diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input diagram snapshot (JSON)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output SVG file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["railmap", "line2.json"]);

        assert_eq!(args.input, "line2.json");
        assert_eq!(args.output, "out.svg");
        assert_eq!(args.config, None);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_all_flags() {
        let args = Args::parse_from([
            "railmap",
            "line2.json",
            "-o",
            "line2.svg",
            "-c",
            "railmap.toml",
            "--log-level",
            "debug",
        ]);

        assert_eq!(args.output, "line2.svg");
        assert_eq!(args.config.as_deref(), Some("railmap.toml"));
        assert_eq!(args.log_level, "debug");
    }
}
