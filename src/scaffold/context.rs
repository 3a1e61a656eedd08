//! Render context derived from a blueprint
//!
//! Every name the templates emit as Python source is computed here, so
//! templates only interpolate values and never transform them.

use serde::Serialize;
use std::collections::HashMap;

use crate::blueprint::{Blueprint, Endpoint, Parameter, ParameterLocation};
use crate::scaffold::sanitize_docstring;
use crate::utils::{to_identifier, to_title_case};

/// Project-level values available to every injection point
#[derive(Debug, Clone, Serialize)]
pub struct ProjectContext {
    pub service_name: String,
    /// Human readable name, e.g. `Example Docs`
    pub service_title: String,
    /// Python identifier for the service
    pub project_slug: String,
    /// Distribution name for `pyproject.toml`
    pub package_name: String,
    pub base_url: String,
    pub base_url_env: String,
    pub api_key_env: String,
    pub auth_hints: Vec<String>,
    pub summary: String,
    pub resources: Vec<ResourceContext>,
    pub endpoints: Vec<EndpointContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceContext {
    pub name: String,
    pub identifier: String,
    pub description: String,
    /// Handler names of this resource's endpoints, in blueprint order
    pub handlers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointContext {
    /// Unique across the project; also the module and tool name
    pub handler_name: String,
    pub resource: String,
    pub method: String,
    pub path_template: String,
    pub description: String,
    /// Description made safe for a docstring
    pub doc: String,
    /// All parameters, required ones first
    pub parameters: Vec<ParamContext>,
    pub path_params: Vec<ParamContext>,
    pub query_params: Vec<ParamContext>,
    pub body_params: Vec<ParamContext>,
    pub header_params: Vec<ParamContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamContext {
    /// Name as it appears on the wire
    pub name: String,
    /// Python argument name, unique within the handler
    pub arg_name: String,
    pub location: String,
    pub required: bool,
    pub type_hint: String,
    pub py_type: String,
}

impl ProjectContext {
    pub fn from_blueprint(blueprint: &Blueprint) -> Self {
        let project_slug = to_identifier(&blueprint.service_name);
        let env_prefix = project_slug.to_uppercase();

        let mut used_handlers: HashMap<String, usize> = HashMap::new();
        let mut resources = Vec::with_capacity(blueprint.resources.len());
        let mut endpoints = Vec::with_capacity(blueprint.endpoint_count());

        for resource in &blueprint.resources {
            let mut handlers = Vec::with_capacity(resource.endpoints.len());
            for endpoint in &resource.endpoints {
                let base = to_identifier(&format!(
                    "{} {} {}",
                    resource.name,
                    endpoint.method.as_str(),
                    endpoint.path_template
                ));
                let handler_name = unique_name(&mut used_handlers, base);
                handlers.push(handler_name.clone());
                endpoints.push(EndpointContext::new(handler_name, &resource.name, endpoint));
            }

            resources.push(ResourceContext {
                name: resource.name.clone(),
                identifier: to_identifier(&resource.name),
                description: sanitize_docstring(&resource.description),
                handlers,
            });
        }

        let summary = format!(
            "{} resource(s), {} endpoint(s)",
            resources.len(),
            endpoints.len()
        );

        Self {
            service_name: blueprint.service_name.clone(),
            service_title: to_title_case(&blueprint.service_name),
            package_name: format!("{}-mcp", project_slug.replace('_', "-")),
            base_url: blueprint.base_url.clone(),
            base_url_env: format!("{env_prefix}_BASE_URL"),
            api_key_env: format!("{env_prefix}_API_KEY"),
            auth_hints: blueprint.auth_hints.iter().map(|h| sanitize_docstring(h)).collect(),
            project_slug,
            summary,
            resources,
            endpoints,
        }
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, tera::Error> {
        tera::Context::from_serialize(self)
    }
}

impl EndpointContext {
    fn new(handler_name: String, resource: &str, endpoint: &Endpoint) -> Self {
        let mut used_args: HashMap<String, usize> = HashMap::new();
        let mut parameters: Vec<ParamContext> = endpoint
            .parameters
            .iter()
            .map(|p| ParamContext::new(p, &mut used_args))
            .collect();
        // Stable, so declaration order holds within each group
        parameters.sort_by_key(|p| !p.required);

        let by_location = |location: ParameterLocation| -> Vec<ParamContext> {
            parameters
                .iter()
                .filter(|p| p.location == location.as_str())
                .cloned()
                .collect()
        };

        Self {
            path_params: by_location(ParameterLocation::Path),
            query_params: by_location(ParameterLocation::Query),
            body_params: by_location(ParameterLocation::Body),
            header_params: by_location(ParameterLocation::Header),
            handler_name,
            resource: resource.to_string(),
            method: endpoint.method.as_str().to_string(),
            path_template: endpoint.path_template.clone(),
            description: endpoint.description.clone(),
            doc: sanitize_docstring(&endpoint.description),
            parameters,
        }
    }
}

impl ParamContext {
    fn new(parameter: &Parameter, used: &mut HashMap<String, usize>) -> Self {
        Self {
            name: parameter.name.clone(),
            arg_name: unique_name(used, to_identifier(&parameter.name)),
            location: parameter.location.as_str().to_string(),
            required: parameter.required,
            type_hint: parameter.type_hint.clone(),
            py_type: python_type(&parameter.type_hint).to_string(),
        }
    }
}

/// Maps a blueprint type hint onto a Python annotation
pub fn python_type(type_hint: &str) -> &'static str {
    match type_hint.trim().to_ascii_lowercase().as_str() {
        "integer" | "int" | "int32" | "int64" | "long" => "int",
        "number" | "float" | "double" | "decimal" => "float",
        "boolean" | "bool" => "bool",
        "array" | "list" => "list",
        "object" | "dict" | "map" | "json" => "dict",
        _ => "str",
    }
}

/// `base`, or `base_2`, `base_3`, ... when already taken
fn unique_name(used: &mut HashMap<String, usize>, base: String) -> String {
    let count = used.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        return base;
    }
    let mut n = *count;
    loop {
        let candidate = format!("{base}_{n}");
        if !used.contains_key(&candidate) {
            used.insert(candidate.clone(), 1);
            return candidate;
        }
        n += 1;
    }
}
