//! Project configuration for peerbind.
//!
//! This crate provides:
//! - The project file format (`peerbind.toml`)
//! - User rules deserialized straight into [`Info`](peerbind_parser::Info)
//! - The rule table and line filter a build starts from
//!
//! # Example
//!
//! ```toml
//! # peerbind.toml
//! [project]
//! name = "zlib"
//! target = "org.example.zlib"
//!
//! [parse]
//! include_paths = ["/usr/include"]
//! includes = ["zlib.h"]
//! c_includes = ["zconf.h"]
//! exclude = ["optional.h"]
//! line_patterns = ["#if A", "#endif"]
//! skip_lines = false
//!
//! [[rule]]
//! cpp_names = ["ZEXTERN"]
//! annotations = []
//! ```

mod config;
mod error;

pub use config::{ParseConfig, ProjectConfig, ProjectSection};
pub use error::{ConfigError, Result};

/// Conventional name of the project file.
pub const CONFIG_FILE: &str = "peerbind.toml";
