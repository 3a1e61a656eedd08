//! Merging per-chunk blueprints into one

use std::collections::BTreeSet;
use tracing::warn;

use crate::blueprint::{Blueprint, Endpoint, Resource};

/// Folds partial blueprints together in chunk order.
///
/// Resources are keyed by name and their endpoints unioned by method and
/// path template. The first value seen wins for every scalar field; an
/// endpoint that reappears with a different parameter set keeps its first
/// definition and the conflict is reported as a warning.
#[derive(Debug, Default)]
pub struct BlueprintMerger {
    service_name: Option<String>,
    base_url: Option<String>,
    auth_hints: Vec<String>,
    resources: Vec<Resource>,
    warnings: Vec<String>,
}

impl BlueprintMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the blueprint parsed from chunk `chunk_index`
    pub fn add(&mut self, chunk_index: usize, blueprint: Blueprint) {
        if self.service_name.is_none() && !blueprint.service_name.is_empty() {
            self.service_name = Some(blueprint.service_name);
        }
        if self.base_url.is_none() && !blueprint.base_url.is_empty() {
            self.base_url = Some(blueprint.base_url);
        }
        for hint in blueprint.auth_hints {
            if !hint.is_empty() && !self.auth_hints.contains(&hint) {
                self.auth_hints.push(hint);
            }
        }

        for resource in blueprint.resources {
            self.add_resource(chunk_index, resource);
        }
    }

    fn add_resource(&mut self, chunk_index: usize, incoming: Resource) {
        let Some(index) = self.resources.iter().position(|r| r.name == incoming.name) else {
            self.resources.push(incoming);
            return;
        };
        let existing = &mut self.resources[index];

        if existing.description.is_empty() {
            existing.description = incoming.description;
        }

        for endpoint in incoming.endpoints {
            let duplicate = existing.endpoints.iter().find(|e| {
                e.method == endpoint.method && e.path_template == endpoint.path_template
            });
            match duplicate {
                None => existing.endpoints.push(endpoint),
                Some(first) if parameter_set(first) != parameter_set(&endpoint) => {
                    let message = format!(
                        "chunk {}: '{}' in resource '{}' was described with different parameters; kept the first definition",
                        chunk_index + 1,
                        endpoint.signature(),
                        existing.name
                    );
                    warn!("{message}");
                    self.warnings.push(message);
                }
                Some(_) => {}
            }
        }
    }

    /// The merged blueprint (resources without endpoints dropped) and the
    /// warnings raised while merging. `None` when nothing usable was merged.
    pub fn finish(
        self,
        default_service_name: &str,
        default_base_url: &str,
    ) -> (Option<Blueprint>, Vec<String>) {
        let resources: Vec<Resource> = self
            .resources
            .into_iter()
            .filter(|r| !r.endpoints.is_empty())
            .collect();

        if resources.is_empty() {
            return (None, self.warnings);
        }

        let blueprint = Blueprint {
            service_name: self
                .service_name
                .unwrap_or_else(|| default_service_name.to_string()),
            base_url: self.base_url.unwrap_or_else(|| default_base_url.to_string()),
            resources,
            auth_hints: self.auth_hints,
        };
        (Some(blueprint), self.warnings)
    }
}

fn parameter_set(endpoint: &Endpoint) -> BTreeSet<(&str, &'static str)> {
    endpoint
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.location.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{HttpMethod, Parameter, ParameterLocation};

    fn endpoint(method: HttpMethod, path: &str, params: &[&str], description: &str) -> Endpoint {
        Endpoint {
            method,
            path_template: path.to_string(),
            parameters: params.iter().map(|p| Parameter::path(*p)).collect(),
            description: description.to_string(),
        }
    }

    fn blueprint(service: &str, resources: Vec<Resource>) -> Blueprint {
        Blueprint {
            service_name: service.to_string(),
            base_url: format!("https://{service}.example"),
            resources,
            auth_hints: Vec::new(),
        }
    }

    fn resource(name: &str, description: &str, endpoints: Vec<Endpoint>) -> Resource {
        Resource {
            name: name.to_string(),
            description: description.to_string(),
            endpoints,
        }
    }

    #[test]
    fn test_resources_with_same_name_are_unioned() {
        let mut merger = BlueprintMerger::new();
        merger.add(
            0,
            blueprint(
                "first",
                vec![resource(
                    "users",
                    "People",
                    vec![endpoint(HttpMethod::Get, "/users", &[], "List")],
                )],
            ),
        );
        merger.add(
            1,
            blueprint(
                "second",
                vec![
                    resource(
                        "users",
                        "Accounts",
                        vec![
                            endpoint(HttpMethod::Get, "/users", &[], "List again"),
                            endpoint(HttpMethod::Get, "/users/{id}", &["id"], "Fetch"),
                        ],
                    ),
                    resource("orders", "", vec![endpoint(HttpMethod::Post, "/orders", &[], "Create")]),
                ],
            ),
        );

        let (merged, warnings) = merger.finish("fallback", "https://fallback.example");
        let merged = merged.unwrap();
        assert!(warnings.is_empty());
        assert_eq!(merged.service_name, "first");
        assert_eq!(merged.base_url, "https://first.example");
        assert_eq!(merged.resources.len(), 2);

        let users = &merged.resources[0];
        assert_eq!(users.description, "People");
        assert_eq!(users.endpoints.len(), 2);
        assert_eq!(users.endpoints[0].description, "List");
    }

    #[test]
    fn test_conflicting_parameters_keep_first_and_warn() {
        let mut merger = BlueprintMerger::new();
        merger.add(
            0,
            blueprint("svc", vec![resource("items", "", vec![endpoint(HttpMethod::Get, "/items/{id}", &["id"], "a")])]),
        );
        let mut conflicting = endpoint(HttpMethod::Get, "/items/{id}", &["id"], "b");
        conflicting.parameters.push(Parameter {
            name: "expand".to_string(),
            location: ParameterLocation::Query,
            required: false,
            type_hint: "boolean".to_string(),
        });
        merger.add(1, blueprint("svc", vec![resource("items", "", vec![conflicting])]));

        let (merged, warnings) = merger.finish("svc", "https://svc.example");
        let merged = merged.unwrap();
        assert_eq!(merged.resources[0].endpoints[0].parameters.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("chunk 2"));
        assert!(warnings[0].contains("GET /items/{id}"));
    }

    #[test]
    fn test_merge_is_independent_of_arrival_when_fed_in_chunk_order() {
        let parts = vec![
            blueprint("a", vec![resource("r", "", vec![endpoint(HttpMethod::Get, "/r", &[], "")])]),
            blueprint("b", vec![resource("s", "", vec![endpoint(HttpMethod::Get, "/s", &[], "")])]),
        ];

        let run = || {
            let mut merger = BlueprintMerger::new();
            for (i, part) in parts.iter().cloned().enumerate() {
                merger.add(i, part);
            }
            merger.finish("x", "https://x.example").0
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_empty_resources_are_not_usable() {
        let mut merger = BlueprintMerger::new();
        merger.add(0, blueprint("svc", vec![resource("empty", "nothing here", Vec::new())]));
        let (merged, _) = merger.finish("svc", "https://svc.example");
        assert!(merged.is_none());
    }

    #[test]
    fn test_auth_hints_are_unioned_in_order() {
        let mut merger = BlueprintMerger::new();
        let mut first = blueprint("svc", vec![resource("r", "", vec![endpoint(HttpMethod::Get, "/r", &[], "")])]);
        first.auth_hints = vec!["API key".to_string()];
        let mut second = blueprint("svc", Vec::new());
        second.auth_hints = vec!["OAuth".to_string(), "API key".to_string()];
        merger.add(0, first);
        merger.add(1, second);

        let merged = merger.finish("svc", "https://svc.example").0.unwrap();
        assert_eq!(merged.auth_hints, vec!["API key", "OAuth"]);
    }
}
