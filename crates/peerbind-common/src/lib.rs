mod location;
mod source;
mod diagnostic;

pub use location::Location;
pub use source::{Dialect, SourceFile, SourceId, SourceMap};
pub use diagnostic::{Diagnostic, DiagnosticLevel};
