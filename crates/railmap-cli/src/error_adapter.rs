//! Error adapter for converting RailmapError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error type
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use railmap::RailmapError;

/// Adapter giving a [`RailmapError`] a stable diagnostic code and help text.
pub struct ErrorAdapter<'a>(pub &'a RailmapError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            RailmapError::UnknownType { .. } => "railmap::unknown_type",
            RailmapError::NotFound(_) => "railmap::not_found",
            RailmapError::AlreadyExists(_) => "railmap::already_exists",
            RailmapError::InvalidEdge { .. } => "railmap::invalid_edge",
            RailmapError::Serialization(_) => "railmap::serialization",
            RailmapError::Validation { .. } => "railmap::validation",
            RailmapError::InvalidField(_) => "railmap::invalid_field",
            RailmapError::Registry(_) => "railmap::registry",
            RailmapError::Io(_) => "railmap::io",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            RailmapError::UnknownType { .. } => {
                "register the variant in the type registry or use one of the built-in tags"
            }
            RailmapError::NotFound(_) => "check that every edge endpoint names an existing node",
            RailmapError::AlreadyExists(_) => "node ids must be unique and each node pair holds one line",
            RailmapError::InvalidEdge { .. } => "lines must connect two different nodes",
            RailmapError::Serialization(_) => {
                "the input must be a JSON object with `nodes` and `edges` arrays"
            }
            RailmapError::Validation { .. } | RailmapError::InvalidField(_) => return None,
            RailmapError::Registry(_) | RailmapError::Io(_) => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use railmap::identifier::NodeId;

    use super::*;

    fn code(err: &RailmapError) -> Option<String> {
        ErrorAdapter(err).code().map(|c| c.to_string())
    }

    #[test]
    fn test_codes_are_namespaced() {
        let err = RailmapError::Serialization("missing field `nodes`".to_string());
        assert_eq!(code(&err).as_deref(), Some("railmap::serialization"));

        let err = RailmapError::NotFound(NodeId::new("stn_9").into());
        assert_eq!(code(&err).as_deref(), Some("railmap::not_found"));
    }

    #[test]
    fn test_display_passes_through() {
        let err = RailmapError::Registry("no default line style".to_string());
        let adapter = ErrorAdapter(&err);

        assert_eq!(adapter.to_string(), err.to_string());
        assert!(adapter.help().is_none());
    }

    #[test]
    fn test_renders_with_graphical_handler() {
        let err = RailmapError::Serialization("expected value".to_string());
        let mut out = String::new();
        miette::GraphicalReportHandler::new_themed(miette::GraphicalTheme::unicode_nocolor())
            .render_report(&mut out, &ErrorAdapter(&err))
            .unwrap();

        assert!(out.contains("railmap::serialization"));
        assert!(out.contains("invalid snapshot: expected value"));
    }
}
