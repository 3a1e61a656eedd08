//! Blueprint data model and its structured (JSON) format

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP methods a blueprint endpoint may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    /// Exact, upper-case match only. `get` is rejected rather than coerced.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown HTTP method '{s}'"))
    }
}

/// Where a parameter is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Body,
    Header,
}

impl ParameterLocation {
    pub const ALL: [ParameterLocation; 4] = [
        ParameterLocation::Path,
        ParameterLocation::Query,
        ParameterLocation::Body,
        ParameterLocation::Header,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Body => "body",
            ParameterLocation::Header => "header",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParameterLocation::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| format!("unknown parameter location '{s}'"))
    }
}

/// One endpoint parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    /// Free-form type name such as `string`, `integer` or `object`
    pub type_hint: String,
}

impl Parameter {
    /// A required string path parameter
    pub fn path(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: ParameterLocation::Path,
            required: true,
            type_hint: "string".to_string(),
        }
    }
}

/// A callable operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub method: HttpMethod,
    /// Path relative to the base URL, e.g. `/users/{id}`
    pub path_template: String,
    pub parameters: Vec<Parameter>,
    pub description: String,
}

impl Endpoint {
    /// Placeholder names in `path_template`, in order of appearance
    pub fn placeholders(&self) -> Vec<&str> {
        placeholders(&self.path_template)
    }

    /// `"GET /users/{id}"`
    pub fn signature(&self) -> String {
        format!("{} {}", self.method, self.path_template)
    }
}

/// A named group of endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub description: String,
    pub endpoints: Vec<Endpoint>,
}

/// The structured integration plan handed to the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    pub service_name: String,
    pub base_url: String,
    pub resources: Vec<Resource>,
    /// Credentials or setup the target API needs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auth_hints: Vec<String>,
}

impl Blueprint {
    /// A blueprint with no resources
    pub fn empty(service_name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            base_url: base_url.into(),
            resources: Vec::new(),
            auth_hints: Vec::new(),
        }
    }

    pub fn endpoint_count(&self) -> usize {
        self.resources.iter().map(|r| r.endpoints.len()).sum()
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse the structured format. The result is not validated; use
    /// [`crate::blueprint::validate`] for untrusted input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Names between `{` and `}` in a path template. Unterminated braces are
/// ignored here and reported by the validator.
pub fn placeholders(path_template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = path_template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        names.push(after[..close].trim());
        rest = &after[close + 1..];
    }
    names
}
