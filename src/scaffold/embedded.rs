//! Scaffold embedded in the binary at compile time

use once_cell::sync::OnceCell;
use rust_embed::RustEmbed;
use std::sync::Arc;
use tracing::{debug, info};

use crate::scaffold::{RawScaffoldFile, Scaffold, ScaffoldError, ScaffoldSource, scaffold_from_bundle};

/// The default MCP server scaffold
#[derive(RustEmbed)]
#[folder = "templates/mcp_server/"]
struct EmbeddedScaffold;

static DEFAULT_SCAFFOLD: OnceCell<Arc<Scaffold>> = OnceCell::new();

/// Load the embedded scaffold. Each call parses the bundle again; use
/// [`default_scaffold`] for the shared instance.
pub fn load_embedded_scaffold() -> Result<Scaffold, ScaffoldError> {
    let mut paths: Vec<String> = EmbeddedScaffold::iter().map(|p| p.to_string()).collect();
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        if let Some(file) = EmbeddedScaffold::get(&path) {
            debug!("Embedded scaffold file: {path}");
            files.push(RawScaffoldFile {
                relative_path: path,
                contents: file.data.to_vec(),
            });
        }
    }

    scaffold_from_bundle(files, ScaffoldSource::Embedded)
}

/// The process-wide default scaffold, loaded on first use and never mutated
pub fn default_scaffold() -> Result<Arc<Scaffold>, ScaffoldError> {
    DEFAULT_SCAFFOLD
        .get_or_try_init(|| {
            let scaffold = load_embedded_scaffold()?;
            info!(
                "Loaded scaffold '{}' v{} ({} static files, {} injection points)",
                scaffold.name,
                scaffold.version,
                scaffold.static_files.len(),
                scaffold.injection_points.len()
            );
            Ok(Arc::new(scaffold))
        })
        .cloned()
}
