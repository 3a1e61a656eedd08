//! Scaffold manifest parsing shared by the embedded and filesystem sources
//!
//! A scaffold bundle is laid out as:
//!
//! ```text
//! manifest.yml        name, version, injection points
//! static/**           copied verbatim into the output
//! points/*.tera       one template per injection point
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::scaffold::{
    ForEach, InjectionPoint, RawScaffoldFile, Scaffold, ScaffoldError, ScaffoldFile, ScaffoldSource,
};

pub const MANIFEST_FILE: &str = "manifest.yml";
pub const STATIC_PREFIX: &str = "static/";

/// Internal representation matching the manifest YAML structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ManifestData {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
    pub injection_points: Vec<InjectionPointData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct InjectionPointData {
    pub name: String,
    /// Template path relative to the bundle root
    pub template: String,
    /// Output path relative to the output directory; may use Tera syntax
    pub destination: String,
    #[serde(default)]
    pub for_each: Option<ForEach>,
}

/// Parse manifest YAML content
pub(crate) fn parse_manifest_yaml(content: &str) -> Result<ManifestData, ScaffoldError> {
    let manifest: ManifestData = serde_yaml::from_str(content).map_err(|e| {
        ScaffoldError::invalid_manifest(format!("Failed to parse manifest YAML: {e}"))
    })?;

    let mut names = HashSet::new();
    for point in &manifest.injection_points {
        if point.name.trim().is_empty() {
            return Err(ScaffoldError::invalid_manifest("injection point with empty name"));
        }
        if !names.insert(point.name.as_str()) {
            return Err(ScaffoldError::invalid_manifest(format!(
                "duplicate injection point '{}'",
                point.name
            )));
        }
    }

    Ok(manifest)
}

/// Assemble a scaffold from the raw files of a bundle
pub fn scaffold_from_bundle(
    files: Vec<RawScaffoldFile>,
    source: ScaffoldSource,
) -> Result<Scaffold, ScaffoldError> {
    let manifest_file = files
        .iter()
        .find(|f| f.relative_path == MANIFEST_FILE)
        .ok_or_else(|| ScaffoldError::NotFound(format!("{MANIFEST_FILE} in {source} scaffold")))?;
    let content = std::str::from_utf8(&manifest_file.contents)
        .map_err(|e| ScaffoldError::invalid_manifest(format!("{MANIFEST_FILE} is not UTF-8: {e}")))?;
    let manifest = parse_manifest_yaml(content)?;

    let mut injection_points = Vec::with_capacity(manifest.injection_points.len());
    for point in manifest.injection_points {
        let template_file = files
            .iter()
            .find(|f| f.relative_path == point.template)
            .ok_or_else(|| ScaffoldError::MissingTemplate {
                point: point.name.clone(),
                template: point.template.clone(),
            })?;
        let template = String::from_utf8(template_file.contents.clone()).map_err(|e| {
            ScaffoldError::invalid_manifest(format!("template '{}' is not UTF-8: {e}", point.template))
        })?;

        injection_points.push(InjectionPoint {
            name: point.name,
            template,
            destination: point.destination,
            for_each: point.for_each,
        });
    }

    let mut static_files: Vec<ScaffoldFile> = files
        .into_iter()
        .filter_map(|f| {
            let relative = f.relative_path.strip_prefix(STATIC_PREFIX)?;
            (!relative.is_empty()).then(|| ScaffoldFile {
                path: PathBuf::from(relative),
                contents: f.contents,
            })
        })
        .collect();
    static_files.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(Scaffold {
        name: manifest.name,
        version: manifest.version,
        description: manifest.description,
        static_files,
        injection_points,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(path: &str, contents: &str) -> RawScaffoldFile {
        RawScaffoldFile {
            relative_path: path.to_string(),
            contents: contents.as_bytes().to_vec(),
        }
    }

    const MANIFEST: &str = r#"
name: demo
description: Demo scaffold
version: 1.2.0
injection_points:
  - name: endpoint_handlers
    template: points/handler.tera
    destination: "handlers/{{ endpoint.handler_name }}.txt"
    for_each: endpoint
  - name: readme
    template: points/readme.tera
    destination: README.md
"#;

    #[test]
    fn test_scaffold_from_bundle() {
        let scaffold = scaffold_from_bundle(
            vec![
                raw("static/z.txt", "z"),
                raw(MANIFEST_FILE, MANIFEST),
                raw("points/handler.tera", "{{ endpoint.method }}"),
                raw("points/readme.tera", "# {{ service_title }}"),
                raw("static/a/b.txt", "b"),
            ],
            ScaffoldSource::Embedded,
        )
        .unwrap();

        assert_eq!(scaffold.name, "demo");
        assert_eq!(scaffold.version, "1.2.0");
        assert_eq!(scaffold.injection_points.len(), 2);
        assert_eq!(scaffold.injection_points[0].for_each, Some(ForEach::Endpoint));
        assert_eq!(scaffold.injection_point("readme").unwrap().destination, "README.md");

        let paths: Vec<_> = scaffold.static_files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("a/b.txt"), PathBuf::from("z.txt")]);
    }

    #[test]
    fn test_missing_template_is_reported() {
        let error = scaffold_from_bundle(vec![raw(MANIFEST_FILE, MANIFEST)], ScaffoldSource::Embedded)
            .unwrap_err();
        assert!(matches!(
            error,
            ScaffoldError::MissingTemplate { ref point, .. } if point == "endpoint_handlers"
        ));
    }

    #[test]
    fn test_missing_manifest() {
        let error = scaffold_from_bundle(vec![raw("static/a.txt", "a")], ScaffoldSource::Embedded)
            .unwrap_err();
        assert!(matches!(error, ScaffoldError::NotFound(_)));
    }

    #[test]
    fn test_invalid_manifests() {
        assert!(parse_manifest_yaml("name: [unclosed").is_err());

        let duplicate = r#"
name: dup
version: 0.1.0
injection_points:
  - {name: a, template: t, destination: x}
  - {name: a, template: t, destination: y}
"#;
        let error = parse_manifest_yaml(duplicate).unwrap_err();
        assert!(error.to_string().contains("duplicate injection point 'a'"));

        let bad_for_each = r#"
name: bad
version: 0.1.0
injection_points:
  - {name: a, template: t, destination: x, for_each: operation}
"#;
        assert!(parse_manifest_yaml(bad_for_each).is_err());
    }
}
