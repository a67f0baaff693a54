use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A position in a header, as reported in diagnostics.
///
/// Tokens only carry a line number; columns are not tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Location {
    /// The header this position belongs to, `None` for text fragments.
    pub file: Option<Arc<Path>>,
    /// 1-based line number.
    pub line: u32,
}

impl Location {
    pub fn new(file: Option<Arc<Path>>, line: u32) -> Self {
        Self { file, line }
    }

    /// A location inside a text fragment that has no backing file.
    pub fn fragment(line: u32) -> Self {
        Self { file: None, line }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}", file.display(), self.line),
            None => write!(f, "<fragment>:{}", self.line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_file() {
        let path: Arc<Path> = Arc::from(Path::new("include/zlib.h"));
        let loc = Location::new(Some(path), 42);
        assert_eq!(loc.to_string(), "include/zlib.h:42");
    }

    #[test]
    fn test_display_fragment() {
        assert_eq!(Location::fragment(1).to_string(), "<fragment>:1");
    }
}
