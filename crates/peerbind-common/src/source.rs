use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Unique identifier for a header registered in a [`SourceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u32);

impl SourceId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// The language dialect a header is parsed as.
///
/// C headers get no constructor, destructor or operator recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    C,
    #[default]
    Cpp,
}

impl Dialect {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "c" => Some(Dialect::C),
            "h" | "hh" | "hpp" | "hxx" | "h++" | "cpp" | "cc" | "cxx" | "c++" | "inl" => {
                Some(Dialect::Cpp)
            }
            _ => None,
        }
    }
}

/// A header with its contents.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: SourceId,
    pub path: Arc<Path>,
    pub content: String,
    pub dialect: Dialect,
    line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn new(id: SourceId, path: Arc<Path>, content: String, dialect: Dialect) -> Self {
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i as u32 + 1))
            .collect();

        Self {
            id,
            path,
            content,
            dialect,
            line_starts,
        }
    }

    /// Number of lines in the file.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Get the content of a 1-based line, without its terminator.
    pub fn line(&self, line: u32) -> Option<&str> {
        let index = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(index)? as usize;
        let end = self
            .line_starts
            .get(index + 1)
            .map(|&e| e as usize)
            .unwrap_or(self.content.len());
        Some(self.content[start..end].trim_end_matches(['\n', '\r']))
    }
}

/// Registry of every header read during one build.
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
    path_to_id: FxHashMap<PathBuf, SourceId>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a header, returning the existing id if the path is already known.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: String, dialect: Dialect) -> SourceId {
        let path = path.as_ref();
        if let Some(&id) = self.path_to_id.get(path) {
            return id;
        }

        let id = SourceId(self.files.len() as u32);
        self.files
            .push(SourceFile::new(id, Arc::from(path), content, dialect));
        self.path_to_id.insert(path.to_path_buf(), id);
        id
    }

    pub fn get(&self, id: SourceId) -> Option<&SourceFile> {
        self.files.get(id.0 as usize)
    }

    pub fn get_by_path(&self, path: impl AsRef<Path>) -> Option<&SourceFile> {
        let id = self.path_to_id.get(path.as_ref())?;
        self.get(*id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_lookup() {
        let mut map = SourceMap::new();
        let id = map.add_file("a.h", "int a;\r\nint b;\nint c;".to_string(), Dialect::Cpp);
        let file = map.get(id).unwrap();
        assert_eq!(file.line_count(), 3);
        assert_eq!(file.line(1), Some("int a;"));
        assert_eq!(file.line(2), Some("int b;"));
        assert_eq!(file.line(3), Some("int c;"));
        assert_eq!(file.line(0), None);
        assert_eq!(file.line(4), None);
    }

    #[test]
    fn test_add_file_twice_reuses_id() {
        let mut map = SourceMap::new();
        let a = map.add_file("a.h", String::new(), Dialect::C);
        let b = map.add_file("a.h", String::new(), Dialect::C);
        assert_eq!(a, b);
        assert_eq!(map.len(), 1);
        assert!(map.get_by_path("a.h").is_some());
    }

    #[test]
    fn test_dialect_from_extension() {
        assert_eq!(Dialect::from_extension("c"), Some(Dialect::C));
        assert_eq!(Dialect::from_extension("hpp"), Some(Dialect::Cpp));
        assert_eq!(Dialect::from_extension("rs"), None);
    }
}
