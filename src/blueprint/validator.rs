//! Blueprint Schema & Validator
//!
//! Candidate blueprints arrive as untyped JSON (from a completion service, a
//! file, or a planner) and only become a [`Blueprint`] after every field has
//! been type-checked and every invariant holds. All violations are collected
//! in one pass.

use serde_json::{Map, Value};
use std::collections::HashSet;
use url::Url;

use super::errors::{ValidationError, Violation};
use super::types::{Blueprint, Endpoint, HttpMethod, Parameter, ParameterLocation, Resource};

/// Type-check an untyped candidate and validate its invariants.
///
/// Invariants are checked on every piece that typed, even when a sibling
/// failed, so one bad field never hides unrelated violations.
pub fn validate(candidate: &Value) -> Result<Blueprint, ValidationError> {
    let mut checker = Checker::default();
    let blueprint = checker.blueprint(candidate);

    match blueprint {
        Some(blueprint) if checker.violations.is_empty() => Ok(blueprint),
        _ => Err(ValidationError::new(checker.violations)),
    }
}

/// Validate the invariants of an already typed blueprint
pub fn validate_blueprint(blueprint: Blueprint) -> Result<Blueprint, ValidationError> {
    let mut checker = Checker::default();
    checker.invariants(&blueprint);
    if checker.violations.is_empty() {
        Ok(blueprint)
    } else {
        Err(ValidationError::new(checker.violations))
    }
}

#[derive(Default)]
struct Checker {
    violations: Vec<Violation>,
}

impl Checker {
    fn violation(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    // Structural pass. Returns `None` when some field could not be typed; the
    // pass still continues so sibling problems are reported too, and the
    // invariants of the pieces that did type are checked along the way.

    fn blueprint(&mut self, value: &Value) -> Option<Blueprint> {
        let Some(object) = value.as_object() else {
            self.violation("", "blueprint must be a JSON object");
            return None;
        };

        let service_name = self.required_string(object, "service_name", "");
        let base_url = self.required_string(object, "base_url", "");
        self.service_invariants(service_name.as_deref(), base_url.as_deref());

        let resources = match object.get("resources") {
            None | Some(Value::Null) => {
                self.violation("resources", "missing required field");
                None
            }
            Some(Value::Array(items)) => {
                let mut names: Vec<(usize, String)> = Vec::new();
                let mut typed = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    typed.push(self.resource(item, &format!("resources[{i}]"), i, &mut names));
                }
                self.unique_resource_names(names.iter().map(|(i, name)| (*i, name.as_str())));
                typed.into_iter().collect::<Option<Vec<_>>>()
            }
            Some(_) => {
                self.violation("resources", "must be an array");
                None
            }
        };
        let auth_hints = self.string_list(object, "auth_hints", "");

        Some(Blueprint {
            service_name: service_name?,
            base_url: base_url?,
            resources: resources?,
            auth_hints: auth_hints?,
        })
    }

    /// Types one resource; its name is pushed onto `names` whenever it typed
    fn resource(
        &mut self,
        value: &Value,
        path: &str,
        index: usize,
        names: &mut Vec<(usize, String)>,
    ) -> Option<Resource> {
        let Some(object) = value.as_object() else {
            self.violation(path, "resource must be an object");
            return None;
        };

        let name = self.required_string(object, "name", path);
        if let Some(name) = &name {
            names.push((index, name.clone()));
        }
        let description = self.optional_string(object, "description", path);
        let endpoints = match object.get("endpoints") {
            None | Some(Value::Null) => Some(Vec::new()),
            Some(Value::Array(items)) => {
                let mut typed: Vec<(usize, Endpoint)> = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    if let Some(endpoint) = self.endpoint(item, &format!("{path}.endpoints[{i}]")) {
                        typed.push((i, endpoint));
                    }
                }
                self.endpoint_set(path, name.as_deref(), typed.iter().map(|(i, e)| (*i, e)));
                (typed.len() == items.len()).then(|| typed.into_iter().map(|(_, e)| e).collect())
            }
            Some(_) => {
                self.violation(format!("{path}.endpoints"), "must be an array");
                None
            }
        };

        Some(Resource {
            name: name?,
            description: description?,
            endpoints: endpoints?,
        })
    }

    fn endpoint(&mut self, value: &Value, path: &str) -> Option<Endpoint> {
        let Some(object) = value.as_object() else {
            self.violation(path, "endpoint must be an object");
            return None;
        };

        let method = self
            .required_string(object, "method", path)
            .and_then(|raw| match raw.parse::<HttpMethod>() {
                Ok(method) => Some(method),
                Err(_) => {
                    self.violation(
                        format!("{path}.method"),
                        format!("'{raw}' is not one of GET, POST, PUT, PATCH, DELETE"),
                    );
                    None
                }
            });
        let path_template = self.required_string(object, "path_template", path);
        let description = self.optional_string(object, "description", path);
        let parameters = match object.get("parameters") {
            None | Some(Value::Null) => Some(Vec::new()),
            Some(Value::Array(items)) => {
                let typed: Vec<Option<Parameter>> = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.parameter(item, &format!("{path}.parameters[{i}]")))
                    .collect();
                typed.into_iter().collect::<Option<Vec<_>>>()
            }
            Some(_) => {
                self.violation(format!("{path}.parameters"), "must be an array");
                None
            }
        };

        Some(Endpoint {
            method: method?,
            path_template: path_template?,
            parameters: parameters?,
            description: description?,
        })
    }

    fn parameter(&mut self, value: &Value, path: &str) -> Option<Parameter> {
        let Some(object) = value.as_object() else {
            self.violation(path, "parameter must be an object");
            return None;
        };

        let name = self.required_string(object, "name", path);
        let location = self
            .required_string(object, "location", path)
            .and_then(|raw| match raw.parse::<ParameterLocation>() {
                Ok(location) => Some(location),
                Err(_) => {
                    self.violation(
                        format!("{path}.location"),
                        format!("'{raw}' is not one of path, query, body, header"),
                    );
                    None
                }
            });
        let required = match object.get("required") {
            None | Some(Value::Null) => location.map(|l| l == ParameterLocation::Path),
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => {
                self.violation(format!("{path}.required"), "must be a boolean");
                None
            }
        };
        let type_hint = match object.get("type_hint") {
            None | Some(Value::Null) => Some("string".to_string()),
            Some(Value::String(s)) if s.trim().is_empty() => Some("string".to_string()),
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(_) => {
                self.violation(format!("{path}.type_hint"), "must be a string");
                None
            }
        };

        Some(Parameter {
            name: name?,
            location: location?,
            required: required?,
            type_hint: type_hint?,
        })
    }

    fn required_string(&mut self, object: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        let field = join_path(path, key);
        match object.get(key) {
            None | Some(Value::Null) => {
                self.violation(field, "missing required field");
                None
            }
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(_) => {
                self.violation(field, "must be a string");
                None
            }
        }
    }

    fn optional_string(&mut self, object: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        match object.get(key) {
            None | Some(Value::Null) => Some(String::new()),
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(_) => {
                self.violation(join_path(path, key), "must be a string");
                None
            }
        }
    }

    fn string_list(&mut self, object: &Map<String, Value>, key: &str, path: &str) -> Option<Vec<String>> {
        match object.get(key) {
            None | Some(Value::Null) => Some(Vec::new()),
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                let mut ok = true;
                for (i, item) in items.iter().enumerate() {
                    match item.as_str() {
                        Some(s) => out.push(s.trim().to_string()),
                        None => {
                            self.violation(format!("{}[{i}]", join_path(path, key)), "must be a string");
                            ok = false;
                        }
                    }
                }
                ok.then_some(out)
            }
            Some(_) => {
                self.violation(join_path(path, key), "must be an array of strings");
                None
            }
        }
    }

    // Invariant checks, shared by the structural pass and typed blueprints

    fn invariants(&mut self, blueprint: &Blueprint) {
        self.service_invariants(
            Some(blueprint.service_name.as_str()),
            Some(blueprint.base_url.as_str()),
        );
        self.unique_resource_names(
            blueprint
                .resources
                .iter()
                .enumerate()
                .map(|(i, resource)| (i, resource.name.as_str())),
        );
        for (r, resource) in blueprint.resources.iter().enumerate() {
            self.endpoint_set(
                &format!("resources[{r}]"),
                Some(resource.name.as_str()),
                resource.endpoints.iter().enumerate(),
            );
        }
    }

    fn service_invariants(&mut self, service_name: Option<&str>, base_url: Option<&str>) {
        if service_name.is_some_and(|name| name.trim().is_empty()) {
            self.violation("service_name", "must not be empty");
        }

        let Some(base_url) = base_url else {
            return;
        };
        match Url::parse(base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {}
            Ok(_) => self.violation("base_url", "must be an absolute http(s) URL"),
            Err(e) => self.violation("base_url", format!("'{base_url}' is not a URL: {e}")),
        }
    }

    /// `names` pairs each resource's position with its name
    fn unique_resource_names<'a>(&mut self, names: impl IntoIterator<Item = (usize, &'a str)>) {
        let mut seen = HashSet::new();
        for (r, name) in names {
            let path = format!("resources[{r}].name");
            if name.trim().is_empty() {
                self.violation(path, "must not be empty");
            } else if !seen.insert(name) {
                self.violation(path, format!("duplicate resource name '{name}'"));
            }
        }
    }

    /// Endpoints of the resource at `path`, each paired with its position
    fn endpoint_set<'a>(
        &mut self,
        path: &str,
        resource_name: Option<&str>,
        endpoints: impl IntoIterator<Item = (usize, &'a Endpoint)>,
    ) {
        let mut signatures = HashSet::new();
        for (e, endpoint) in endpoints {
            let path = format!("{path}.endpoints[{e}]");
            if !signatures.insert((endpoint.method, endpoint.path_template.as_str())) {
                let message = match resource_name {
                    Some(name) => format!(
                        "duplicate endpoint '{}' in resource '{name}'",
                        endpoint.signature()
                    ),
                    None => format!("duplicate endpoint '{}'", endpoint.signature()),
                };
                self.violation(path.clone(), message);
            }
            self.endpoint_invariants(endpoint, &path);
        }
    }

    fn endpoint_invariants(&mut self, endpoint: &Endpoint, path: &str) {
        let template = &endpoint.path_template;
        if !template.starts_with('/') {
            self.violation(format!("{path}.path_template"), format!("'{template}' must start with '/'"));
        }
        if !braces_balanced(template) {
            self.violation(
                format!("{path}.path_template"),
                format!("'{template}' has unbalanced placeholder braces"),
            );
        }

        let mut parameter_names = HashSet::new();
        for (p, parameter) in endpoint.parameters.iter().enumerate() {
            let ppath = format!("{path}.parameters[{p}]");
            if parameter.name.is_empty() {
                self.violation(format!("{ppath}.name"), "must not be empty");
            } else if !parameter_names.insert((parameter.location, parameter.name.as_str())) {
                self.violation(
                    format!("{ppath}.name"),
                    format!("duplicate {} parameter '{}'", parameter.location, parameter.name),
                );
            }
        }

        for placeholder in endpoint.placeholders() {
            if placeholder.is_empty() {
                self.violation(format!("{path}.path_template"), "empty placeholder '{}'");
                continue;
            }
            let declared = endpoint
                .parameters
                .iter()
                .any(|p| p.location == ParameterLocation::Path && p.name == placeholder);
            if !declared {
                self.violation(
                    format!("{path}.parameters"),
                    format!("placeholder '{{{placeholder}}}' has no matching path parameter"),
                );
            }
        }
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

pub(crate) fn braces_balanced(template: &str) -> bool {
    let mut open = false;
    for c in template.chars() {
        match c {
            '{' if open => return false,
            '{' => open = true,
            '}' if !open => return false,
            '}' => open = false,
            _ => {}
        }
    }
    !open
}
