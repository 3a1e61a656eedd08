//! Error types for the scaffold domain

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a scaffold or rendering a project
#[derive(Error, Debug)]
pub enum ScaffoldError {
    /// Scaffold directory or embedded bundle not found
    #[error("Scaffold not found: {0}")]
    NotFound(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// An injection point names a template file the scaffold does not contain
    #[error("Injection point '{point}' references missing template '{template}'")]
    MissingTemplate { point: String, template: String },

    #[error("Failed to render injection point '{point}': {message}")]
    Render { point: String, message: String },

    /// A rendered destination would escape the output directory
    #[error("Unsafe output path '{0}'")]
    UnsafePath(String),

    #[error("Two scaffold outputs map to '{0}'")]
    DuplicateOutput(String),

    /// The output directory already holds something and overwrite is off
    #[error("Refusing to render into {}: {reason}", path.display())]
    RenderConflict { path: PathBuf, reason: String },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScaffoldError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_manifest<S: Into<String>>(message: S) -> Self {
        Self::InvalidManifest(message.into())
    }
}
