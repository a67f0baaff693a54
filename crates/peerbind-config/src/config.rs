//! Project configuration types (peerbind.toml format).

use crate::error::{ConfigError, Result};
use peerbind_parser::{Info, InfoMap, LineFilter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Root project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project metadata.
    pub project: ProjectSection,

    /// Which headers to parse and how to read them.
    #[serde(default)]
    pub parse: ParseConfig,

    /// User rules, layered over the built-in defaults.
    #[serde(rename = "rule", default)]
    pub rules: Vec<Info>,

    /// Directory of the file this configuration was loaded from.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Project metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    /// Project name.
    pub name: String,

    /// Qualified name of the generated peer class (optional).
    #[serde(default)]
    pub target: Option<String>,

    /// Project root directory (default: config file directory).
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Header selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Directories searched for includes, in order.
    #[serde(default)]
    pub include_paths: Vec<String>,

    /// C++ headers, parsed in order.
    #[serde(default)]
    pub includes: Vec<String>,

    /// C headers: no constructors, destructors or operators.
    #[serde(default)]
    pub c_includes: Vec<String>,

    /// Headers never parsed, even when listed.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Begin/end regex pairs selecting line ranges of each header.
    #[serde(default)]
    pub line_patterns: Vec<String>,

    /// Remove the selected ranges instead of keeping only them.
    #[serde(default)]
    pub skip_lines: bool,
}

impl ProjectConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        debug!(path = %path.display(), rules = config.rules.len(), "loaded config");
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: ProjectConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.project.name.trim().is_empty() {
            return Err(ConfigError::Validation("project name is empty".to_string()));
        }
        if self.parse.includes.is_empty() && self.parse.c_includes.is_empty() {
            return Err(ConfigError::Validation(
                "no headers listed in parse.includes or parse.c_includes".to_string(),
            ));
        }
        for (i, rule) in self.rules.iter().enumerate() {
            if rule.cpp_names.is_empty() && rule.target_text.is_none() {
                return Err(ConfigError::Validation(format!(
                    "rule #{} has neither cpp_names nor target_text",
                    i + 1
                )));
            }
        }
        self.line_filter()?;
        Ok(())
    }

    /// Directory relative paths are resolved against.
    pub fn root(&self) -> PathBuf {
        let base = self.base_dir.clone().unwrap_or_default();
        match &self.project.root {
            Some(root) => base.join(root),
            None => base,
        }
    }

    /// Include search path with relative entries resolved against the root.
    pub fn search_path(&self) -> Vec<PathBuf> {
        let root = self.root();
        self.parse.include_paths.iter().map(|p| root.join(p)).collect()
    }

    /// The line filter, if any patterns are configured.
    pub fn line_filter(&self) -> Result<Option<LineFilter>> {
        if self.parse.line_patterns.is_empty() {
            return Ok(None);
        }
        LineFilter::new(&self.parse.line_patterns, self.parse.skip_lines)
            .map(Some)
            .map_err(|e| ConfigError::Validation(format!("invalid line pattern: {e}")))
    }

    /// Builds the user rule table: exclusions become skip rules, then the
    /// configured rules in file order, all layered over the defaults.
    pub fn info_map(&self) -> InfoMap {
        let mut map = InfoMap::new();
        if !self.parse.exclude.is_empty() {
            map.put(Info::new(self.parse.exclude.iter().cloned()).skip(true));
        }
        for rule in &self.rules {
            map.put(rule.clone());
        }
        map
    }
}
