//! Scaffold domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A reusable project template: static files plus named injection points.
/// Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scaffold {
    pub name: String,
    pub version: String,
    pub description: String,
    /// Copied verbatim, sorted by path
    pub static_files: Vec<ScaffoldFile>,
    /// Rendered in manifest order
    pub injection_points: Vec<InjectionPoint>,
    pub source: ScaffoldSource,
}

impl Scaffold {
    pub fn injection_point(&self, name: &str) -> Option<&InjectionPoint> {
        self.injection_points.iter().find(|p| p.name == name)
    }
}

/// A file copied into every generated project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldFile {
    /// Path relative to the output directory
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

/// A named place where blueprint-derived content is generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionPoint {
    /// e.g. `endpoint_handlers`
    pub name: String,
    /// Tera template source
    pub template: String,
    /// Output path, itself a Tera template (`server/handlers/{{ endpoint.handler_name }}.py`)
    pub destination: String,
    /// Render once per blueprint item instead of once per project
    pub for_each: Option<ForEach>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForEach {
    Resource,
    Endpoint,
}

impl fmt::Display for ForEach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForEach::Resource => write!(f, "resource"),
            ForEach::Endpoint => write!(f, "endpoint"),
        }
    }
}

/// Where a scaffold was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaffoldSource {
    Embedded,
    FileSystem(PathBuf),
}

impl fmt::Display for ScaffoldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaffoldSource::Embedded => write!(f, "embedded"),
            ScaffoldSource::FileSystem(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A raw file from a scaffold bundle, path relative to the bundle root with
/// `/` separators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawScaffoldFile {
    pub relative_path: String,
    pub contents: Vec<u8>,
}

/// One generated file, path relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

/// What a render wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedProject {
    pub output_dir: PathBuf,
    /// Relative paths of every file written, in write order
    pub files: Vec<PathBuf>,
    /// Number of per-endpoint handler units generated
    pub handler_count: usize,
}
