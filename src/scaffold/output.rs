//! Output service for rendered projects

use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::scaffold::{Artifact, ScaffoldError};

/// Writes rendered artifacts below an output root
#[async_trait]
pub trait OutputService: Send + Sync {
    async fn write_artifacts(&self, root: &Path, artifacts: &[Artifact]) -> Result<(), ScaffoldError>;

    async fn ensure_directory(&self, path: &Path) -> Result<(), ScaffoldError>;
}

/// Output service that writes artifacts to the filesystem
#[derive(Debug, Default)]
pub struct FileSystemOutputService;

impl FileSystemOutputService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OutputService for FileSystemOutputService {
    async fn write_artifacts(&self, root: &Path, artifacts: &[Artifact]) -> Result<(), ScaffoldError> {
        for artifact in artifacts {
            let path = root.join(&artifact.path);

            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ScaffoldError::io(parent, e))?;
            }

            let mut file = fs::File::create(&path)
                .await
                .map_err(|e| ScaffoldError::io(&path, e))?;
            file.write_all(&artifact.contents)
                .await
                .map_err(|e| ScaffoldError::io(&path, e))?;
            file.flush().await.map_err(|e| ScaffoldError::io(&path, e))?;

            debug!("Wrote {}", path.display());
        }

        Ok(())
    }

    async fn ensure_directory(&self, path: &Path) -> Result<(), ScaffoldError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| ScaffoldError::io(path, e))
    }
}
