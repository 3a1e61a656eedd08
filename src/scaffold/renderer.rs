//! Tera-based scaffold renderer
//!
//! Rendering happens fully in memory first. Nothing is written until the
//! output directory has been checked and every artifact path has been
//! rendered and validated, so a failure never leaves a half-written project.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tera::{Context, Tera};
use tokio::fs;
use tracing::{debug, info};

use crate::blueprint::Blueprint;
use crate::scaffold::{
    Artifact, FileSystemOutputService, ForEach, InjectionPoint, OutputService, ProjectContext,
    RenderedProject, Scaffold, ScaffoldError,
};

/// Name of the blueprint copy written into every project
pub const BLUEPRINT_FILE: &str = "blueprint.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Render into a non-empty directory, replacing files with the same path
    pub overwrite: bool,
}

pub struct ScaffoldRenderer {
    options: RenderOptions,
    output: Arc<dyn OutputService>,
}

impl ScaffoldRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self::with_output(options, Arc::new(FileSystemOutputService::new()))
    }

    pub fn with_output(options: RenderOptions, output: Arc<dyn OutputService>) -> Self {
        Self { options, output }
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Render `blueprint` through `scaffold` into `output_dir`
    pub async fn render(
        &self,
        blueprint: &Blueprint,
        scaffold: &Scaffold,
        output_dir: &Path,
    ) -> Result<RenderedProject, ScaffoldError> {
        info!(
            "Rendering {} into {} with scaffold '{}'",
            blueprint.service_name,
            output_dir.display(),
            scaffold.name
        );

        // 1. Fail fast on an occupied output directory
        check_output_dir(output_dir, self.options.overwrite).await?;

        // 2. Render every artifact in memory
        let (artifacts, handler_count) = render_artifacts(blueprint, scaffold)?;

        // 3. Write
        self.output.ensure_directory(output_dir).await?;
        self.output.write_artifacts(output_dir, &artifacts).await?;

        info!(
            "Wrote {} files ({} handlers) to {}",
            artifacts.len(),
            handler_count,
            output_dir.display()
        );

        Ok(RenderedProject {
            output_dir: output_dir.to_path_buf(),
            files: artifacts.into_iter().map(|a| a.path).collect(),
            handler_count,
        })
    }
}

/// Fails with [`ScaffoldError::RenderConflict`] when `output_dir` is a file,
/// or a non-empty directory and `overwrite` is off
pub async fn check_output_dir(output_dir: &Path, overwrite: bool) -> Result<(), ScaffoldError> {
    let metadata = match fs::metadata(output_dir).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(ScaffoldError::io(output_dir, e)),
    };

    if !metadata.is_dir() {
        return Err(ScaffoldError::RenderConflict {
            path: output_dir.to_path_buf(),
            reason: "path exists and is not a directory".to_string(),
        });
    }

    if overwrite {
        return Ok(());
    }

    let mut entries = fs::read_dir(output_dir)
        .await
        .map_err(|e| ScaffoldError::io(output_dir, e))?;
    let occupied = entries
        .next_entry()
        .await
        .map_err(|e| ScaffoldError::io(output_dir, e))?
        .is_some();

    if occupied {
        return Err(ScaffoldError::RenderConflict {
            path: output_dir.to_path_buf(),
            reason: "directory is not empty (use --overwrite to render anyway)".to_string(),
        });
    }

    Ok(())
}

/// Static files, then injection points in manifest order, then the
/// blueprint itself. Returns the artifacts and the number of per-endpoint
/// files among them.
pub fn render_artifacts(
    blueprint: &Blueprint,
    scaffold: &Scaffold,
) -> Result<(Vec<Artifact>, usize), ScaffoldError> {
    let project = ProjectContext::from_blueprint(blueprint);
    let base_context = project.to_tera_context().map_err(|e| ScaffoldError::Render {
        point: "<context>".to_string(),
        message: describe(&e),
    })?;

    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    for point in &scaffold.injection_points {
        tera.add_raw_template(&point.name, &point.template)
            .map_err(|e| render_error(point, &e))?;
    }

    let mut artifacts: Vec<Artifact> = scaffold
        .static_files
        .iter()
        .map(|f| Artifact {
            path: f.path.clone(),
            contents: f.contents.clone(),
        })
        .collect();

    let mut handler_count = 0;
    for point in &scaffold.injection_points {
        match point.for_each {
            None => {
                artifacts.push(render_point(&tera, point, &base_context)?);
            }
            Some(ForEach::Resource) => {
                for resource in &project.resources {
                    let mut context = base_context.clone();
                    context.insert("resource", resource);
                    artifacts.push(render_point(&tera, point, &context)?);
                }
            }
            Some(ForEach::Endpoint) => {
                let mut endpoints = project.endpoints.iter();
                for resource in &project.resources {
                    for endpoint in endpoints.by_ref().take(resource.handlers.len()) {
                        let mut context = base_context.clone();
                        context.insert("resource", resource);
                        context.insert("endpoint", endpoint);
                        artifacts.push(render_point(&tera, point, &context)?);
                        handler_count += 1;
                    }
                }
            }
        }
        debug!("Rendered injection point '{}'", point.name);
    }

    let mut json = blueprint.to_json_pretty()?;
    json.push('\n');
    artifacts.push(Artifact {
        path: PathBuf::from(BLUEPRINT_FILE),
        contents: json.into_bytes(),
    });

    let mut seen = HashSet::new();
    for artifact in &artifacts {
        if !is_safe_relative(&artifact.path) {
            return Err(ScaffoldError::UnsafePath(artifact.path.display().to_string()));
        }
        if !seen.insert(artifact.path.clone()) {
            return Err(ScaffoldError::DuplicateOutput(artifact.path.display().to_string()));
        }
    }

    Ok((artifacts, handler_count))
}

fn render_point(
    tera: &Tera,
    point: &InjectionPoint,
    context: &Context,
) -> Result<Artifact, ScaffoldError> {
    let contents = tera
        .render(&point.name, context)
        .map_err(|e| render_error(point, &e))?;
    let destination = Tera::one_off(&point.destination, context, false)
        .map_err(|e| render_error(point, &e))?;

    Ok(Artifact {
        path: PathBuf::from(destination.trim()),
        contents: contents.into_bytes(),
    })
}

/// Relative, non-empty and made of plain components only
fn is_safe_relative(path: &Path) -> bool {
    path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}

fn render_error(point: &InjectionPoint, error: &tera::Error) -> ScaffoldError {
    ScaffoldError::Render {
        point: point.name.clone(),
        message: describe(error),
    }
}

/// Tera nests the useful message in the source chain
fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = std::error::Error::source(inner);
    }
    message
}
