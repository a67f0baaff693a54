//! Diagnostic reporting for recoverable problems found while parsing headers.
//!
//! Hard failures are typed errors in the crates that raise them; everything
//! the parser can recover from becomes a [`Diagnostic`] collected by the
//! driver and rendered through miette.

use crate::location::Location;
use miette::Diagnostic as MietteDiagnostic;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Error => f.write_str("error"),
            DiagnosticLevel::Warning => f.write_str("warning"),
            DiagnosticLevel::Info => f.write_str("info"),
        }
    }
}

#[derive(Debug, Clone, Error, MietteDiagnostic)]
#[error("{}{message}", .location.as_ref().map(|l| format!("{l}: ")).unwrap_or_default())]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub location: Option<Location>,
    #[help]
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            message: message.into(),
            location: None,
            help: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            message: message.into(),
            location: None,
            help: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            message: message.into(),
            location: None,
            help: None,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagnosticLevel::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_location() {
        let diag = Diagnostic::warning("skipping include").with_location(Location::fragment(3));
        assert_eq!(diag.to_string(), "<fragment>:3: skipping include");
        assert!(!diag.is_error());
    }

    #[test]
    fn test_display_without_location() {
        let diag = Diagnostic::error("boom").with_help("check the rule file");
        assert_eq!(diag.to_string(), "boom");
        assert_eq!(diag.help.as_deref(), Some("check the rule file"));
    }
}
