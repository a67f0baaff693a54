//! Error types for peerbind-parser.

use miette::Diagnostic;
use peerbind_common::Location;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Fatal parse failures. Everything recoverable is reported as a warning instead.
#[derive(Error, Debug, Diagnostic)]
pub enum ParseError {
    /// A token did not match what the grammar requires at this point.
    #[error("{location}: Unexpected token '{token}'")]
    #[diagnostic(code(peerbind::unexpected_token))]
    UnexpectedToken { location: Location, token: String },

    /// No recognizer matched and no attribute could be consumed.
    #[error("{location}: Could not parse declaration at '{token}'")]
    #[diagnostic(
        code(peerbind::unrecognized_declaration),
        help("add a skip rule for the offending name, or exclude the header")
    )]
    Unrecognized { location: Location, token: String },

    /// An include could not be found on the search path.
    #[error("Could not parse \"{}\": File does not exist", .path.display())]
    #[diagnostic(code(peerbind::missing_include))]
    MissingInclude { path: PathBuf },

    /// Failed to read a header.
    #[error("Failed to read {}: {source}", .path.display())]
    #[diagnostic(code(peerbind::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line filter pattern is not a valid regular expression.
    #[error("Invalid line filter pattern: {0}")]
    #[diagnostic(code(peerbind::line_filter))]
    LineFilter(#[from] regex::Error),
}

impl ParseError {
    /// The header position the error points at, if any.
    pub fn location(&self) -> Option<&Location> {
        match self {
            ParseError::UnexpectedToken { location, .. } | ParseError::Unrecognized { location, .. } => {
                Some(location)
            }
            _ => None,
        }
    }
}
