//! Filesystem-based scaffold loader
//!
//! Loads a scaffold bundle with the same layout as the embedded one from a
//! directory, typically given through `--scaffold-dir`.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::scaffold::{
    MANIFEST_FILE, RawScaffoldFile, STATIC_PREFIX, Scaffold, ScaffoldError, ScaffoldSource,
    parse_manifest_yaml, scaffold_from_bundle,
};

/// Load a scaffold bundle from `dir`
pub async fn load_scaffold_from_dir(dir: &Path) -> Result<Scaffold, ScaffoldError> {
    if !fs::try_exists(dir).await.unwrap_or(false) {
        return Err(ScaffoldError::NotFound(dir.display().to_string()));
    }

    // Read the manifest first so template paths can be resolved
    let manifest_path = dir.join(MANIFEST_FILE);
    let manifest_bytes = fs::read(&manifest_path)
        .await
        .map_err(|e| ScaffoldError::io(&manifest_path, e))?;
    let manifest = parse_manifest_yaml(&String::from_utf8_lossy(&manifest_bytes))?;

    let mut files = vec![RawScaffoldFile {
        relative_path: MANIFEST_FILE.to_string(),
        contents: manifest_bytes,
    }];

    for point in &manifest.injection_points {
        let path = dir.join(&point.template);
        match fs::read(&path).await {
            Ok(contents) => files.push(RawScaffoldFile {
                relative_path: point.template.clone(),
                contents,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ScaffoldError::MissingTemplate {
                    point: point.name.clone(),
                    template: point.template.clone(),
                });
            }
            Err(e) => return Err(ScaffoldError::io(path, e)),
        }
    }

    let static_root = dir.join(STATIC_PREFIX.trim_end_matches('/'));
    if fs::try_exists(&static_root).await.unwrap_or(false) {
        for path in walk_files(&static_root).await? {
            let relative = path
                .strip_prefix(dir)
                .map_err(|_| ScaffoldError::UnsafePath(path.display().to_string()))?;
            let relative_path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let contents = fs::read(&path).await.map_err(|e| ScaffoldError::io(&path, e))?;
            files.push(RawScaffoldFile {
                relative_path,
                contents,
            });
        }
    }

    scaffold_from_bundle(files, ScaffoldSource::FileSystem(dir.to_path_buf()))
}

/// Every regular file below `root`, sorted by path
async fn walk_files(root: &Path) -> Result<Vec<PathBuf>, ScaffoldError> {
    let mut pending = vec![root.to_path_buf()];
    let mut files = Vec::new();

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await.map_err(|e| ScaffoldError::io(&dir, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ScaffoldError::io(&dir, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| ScaffoldError::io(&path, e))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
