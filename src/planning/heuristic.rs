//! Heuristic Planner
//!
//! Offline fallback that reads endpoints straight out of corpus text. A line
//! such as `GET /users/{id} - fetch a user` becomes an endpoint; the headings
//! above it name the resource. Recall is low on purpose: anything that does
//! not look like a method keyword followed by a path is ignored, and body
//! parameters are never guessed from prose.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

use crate::blueprint::{Blueprint, Endpoint, HttpMethod, Parameter, Resource, placeholders};
use crate::blueprint::validator::braces_balanced;
use crate::ingestion::{Corpus, domain_stem};
use crate::utils::to_snake_case;

/// Method keyword (upper case only), optional absolute origin, then a path
static ENDPOINT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(GET|POST|PUT|PATCH|DELETE)\s+(https?://[^\s/]+)?(/[A-Za-z0-9_\-./{}:~%]*)")
        .expect("static regex is valid")
});

/// Express-style `:name` path segments
static COLON_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:([A-Za-z_][A-Za-z0-9_]*)$").expect("static regex is valid"));

static VERSION_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v\d+(\.\d+)*$").expect("static regex is valid"));

const FALLBACK_SERVICE_NAME: &str = "generated_service";
const FALLBACK_RESOURCE_NAME: &str = "root";

/// Phrases that suggest the API needs credentials, with the hint recorded
const AUTH_MARKERS: &[(&str, &str)] = &[
    ("authorization", "Requests carry credentials in the Authorization header"),
    ("bearer", "Bearer token authentication"),
    ("api key", "An API key is required"),
    ("api_key", "An API key is required"),
    ("apikey", "An API key is required"),
];

/// Derive a blueprint from corpus text. Never fails; an unrecognizable corpus
/// yields a blueprint with no resources.
pub fn plan_heuristic(corpus: &Corpus) -> Blueprint {
    let mut builder = HeuristicBuilder::default();

    for page in &corpus.pages {
        let mut headings: Vec<(usize, String)> = Vec::new();
        for line in page.text.lines() {
            let line = line.trim();
            if let Some((level, text)) = parse_heading(line) {
                while headings.last().is_some_and(|(l, _)| *l >= level) {
                    headings.pop();
                }
                headings.push((level, text));
                continue;
            }
            builder.scan_line(line, &headings);
        }
        builder.scan_auth(&page.text);
    }

    let service_name = service_name_for(&corpus.root_url);
    let base_url = builder
        .api_origin
        .clone()
        .unwrap_or_else(|| origin_of(&corpus.root_url));

    debug!(
        "Heuristic planner found {} endpoints in {} resources",
        builder.seen.len(),
        builder.resources.len()
    );

    Blueprint {
        service_name,
        base_url,
        resources: builder.resources,
        auth_hints: builder.auth_hints,
    }
}

/// Snake-cased first label of the root's registrable domain
pub fn service_name_for(root: &Url) -> String {
    domain_stem(root)
        .map(|stem| to_snake_case(&stem))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_SERVICE_NAME.to_string())
}

/// `scheme://host[:port]` without a trailing slash
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

#[derive(Default)]
struct HeuristicBuilder {
    resources: Vec<Resource>,
    seen: HashSet<(HttpMethod, String)>,
    api_origin: Option<String>,
    auth_hints: Vec<String>,
}

impl HeuristicBuilder {
    fn scan_line(&mut self, line: &str, headings: &[(usize, String)]) {
        let matches: Vec<_> = ENDPOINT_PATTERN.captures_iter(line).collect();
        let single = matches.len() == 1;

        for captures in &matches {
            let (Some(method), Some(raw_path), Some(whole)) =
                (captures.get(1), captures.get(3), captures.get(0))
            else {
                continue;
            };
            let Ok(method) = method.as_str().parse::<HttpMethod>() else {
                continue;
            };
            let Some(path_template) = clean_path(raw_path.as_str()) else {
                debug!("Skipping malformed path '{}'", raw_path.as_str());
                continue;
            };

            if let Some(origin) = captures.get(2) {
                if self.api_origin.is_none() {
                    self.api_origin = Some(origin.as_str().to_string());
                }
            }

            if !self.seen.insert((method, path_template.clone())) {
                continue;
            }

            let trailing = if single {
                trailing_description(&line[whole.end()..])
            } else {
                None
            };
            let description = trailing
                .or_else(|| (headings.len() >= 2).then(|| headings[headings.len() - 1].1.clone()))
                .unwrap_or_else(|| format!("{method} {path_template}"));

            let mut parameters = Vec::new();
            for name in placeholders(&path_template) {
                if !parameters.iter().any(|p: &Parameter| p.name == name) {
                    parameters.push(Parameter::path(name));
                }
            }

            let endpoint = Endpoint {
                method,
                path_template,
                parameters,
                description,
            };
            self.push(resource_for(headings, &endpoint.path_template), endpoint);
        }
    }

    fn push(&mut self, (name, description): (String, String), endpoint: Endpoint) {
        match self.resources.iter_mut().find(|r| r.name == name) {
            Some(resource) => resource.endpoints.push(endpoint),
            None => self.resources.push(Resource {
                name,
                description,
                endpoints: vec![endpoint],
            }),
        }
    }

    fn scan_auth(&mut self, text: &str) {
        let lowered = text.to_lowercase();
        for (marker, hint) in AUTH_MARKERS {
            if lowered.contains(marker) && !self.auth_hints.iter().any(|h| h == hint) {
                self.auth_hints.push(hint.to_string());
            }
        }
    }
}

/// `## Users` → `(2, "Users")`
fn parse_heading(line: &str) -> Option<(usize, String)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let text = line[level..].trim();
    (!text.is_empty()).then(|| (level, text.to_string()))
}

/// Trim trailing punctuation, rewrite `:param` segments as `{param}` and
/// reject templates the validator would refuse
fn clean_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim_end_matches(['.', ',', ':', ';']);
    let path = if trimmed.is_empty() { "/" } else { trimmed };

    let rewritten = path
        .split('/')
        .map(|segment| match COLON_PARAM.captures(segment) {
            Some(c) => format!("{{{}}}", &c[1]),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/");

    if !braces_balanced(&rewritten) {
        return None;
    }
    if placeholders(&rewritten).iter().any(|name| name.is_empty()) {
        return None;
    }
    Some(rewritten)
}

/// Prose after the path, e.g. ` — fetch a user` → `fetch a user`
fn trailing_description(rest: &str) -> Option<String> {
    let text = rest
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | '—' | ':' | '|'))
        .trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Resource name and description for an endpoint found under `headings`
fn resource_for(headings: &[(usize, String)], path_template: &str) -> (String, String) {
    let heading = match headings.len() {
        0 => None,
        1 => Some(&headings[0].1),
        n => Some(&headings[n - 2].1),
    };

    if let Some(heading) = heading {
        let name = to_snake_case(heading);
        if !name.is_empty() {
            return (name, heading.clone());
        }
    }

    let segment = path_template
        .split('/')
        .filter(|s| !s.is_empty())
        .find(|s| !VERSION_SEGMENT.is_match(s) && *s != "api" && !s.starts_with('{'))
        .map(to_snake_case)
        .filter(|s| !s.is_empty());

    match segment {
        Some(name) => {
            let description = format!("Endpoints under /{name}");
            (name, description)
        }
        None => (FALLBACK_RESOURCE_NAME.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{ParameterLocation, validate_blueprint};
    use crate::ingestion::Page;

    fn corpus(root: &str, texts: &[&str]) -> Corpus {
        let root = Url::parse(root).unwrap();
        let mut corpus = Corpus::new(root.clone());
        for (i, text) in texts.iter().enumerate() {
            corpus.pages.push(Page {
                url: root.join(&format!("/page{i}")).unwrap(),
                title: None,
                text: text.to_string(),
                outbound_links: Vec::new(),
                depth: 0,
            });
        }
        corpus.visited_count = texts.len();
        corpus
    }

    #[test]
    fn test_literal_endpoint_line() {
        let blueprint = plan_heuristic(&corpus(
            "https://docs.example.com/",
            &["GET /users/{id} — fetch a user"],
        ));

        assert_eq!(blueprint.service_name, "example");
        assert_eq!(blueprint.base_url, "https://docs.example.com");
        assert_eq!(blueprint.resources.len(), 1);

        let endpoint = &blueprint.resources[0].endpoints[0];
        assert_eq!(endpoint.method, HttpMethod::Get);
        assert_eq!(endpoint.path_template, "/users/{id}");
        assert_eq!(endpoint.description, "fetch a user");
        assert_eq!(endpoint.parameters.len(), 1);
        assert_eq!(endpoint.parameters[0].name, "id");
        assert_eq!(endpoint.parameters[0].location, ParameterLocation::Path);
        assert!(endpoint.parameters[0].required);
        assert_eq!(blueprint.resources[0].name, "users");
    }

    #[test]
    fn test_headings_name_resources_and_describe_endpoints() {
        let text = "# Users\nManage users.\n## Fetch a user\nGET /users/{id} returns one user.\n## Delete a user\nUse DELETE /users/{id}\n# Orders\n## List orders\nGET /orders";
        let blueprint = plan_heuristic(&corpus("https://docs.shop.example/", &[text]));

        let names: Vec<&str> = blueprint.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["users", "orders"]);

        let users = blueprint.resource("users").unwrap();
        assert_eq!(users.description, "Users");
        assert_eq!(users.endpoints.len(), 2);
        assert_eq!(users.endpoints[0].description, "returns one user.");
        assert_eq!(users.endpoints[1].method, HttpMethod::Delete);

        let orders = blueprint.resource("orders").unwrap();
        assert_eq!(orders.endpoints[0].description, "List orders");
        assert!(orders.endpoints[0].parameters.is_empty());
    }

    #[test]
    fn test_multiple_matches_on_one_line() {
        let text = "The API exposes GET /users and POST /users endpoints. Use DELETE /users/{id} to remove.";
        let blueprint = plan_heuristic(&corpus("https://api.example.com/", &[text]));

        let endpoints = &blueprint.resources[0].endpoints;
        let signatures: Vec<String> = endpoints.iter().map(Endpoint::signature).collect();
        assert_eq!(signatures, vec!["GET /users", "POST /users", "DELETE /users/{id}"]);
        // Several matches on a line means no trailing prose is attributed
        assert_eq!(endpoints[0].description, "GET /users");
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let blueprint = plan_heuristic(&corpus(
            "https://docs.example.com/",
            &["# Users\nGET /users - list users", "# Admin\nGET /users - again"],
        ));
        assert_eq!(blueprint.endpoint_count(), 1);
        assert_eq!(blueprint.resources[0].name, "users");
    }

    #[test]
    fn test_colon_params_and_absolute_urls() {
        let blueprint = plan_heuristic(&corpus(
            "https://docs.example.com/",
            &["PATCH https://api.example.com/v1/projects/:project_id."],
        ));

        assert_eq!(blueprint.base_url, "https://api.example.com");
        let endpoint = &blueprint.resources[0].endpoints[0];
        assert_eq!(endpoint.path_template, "/v1/projects/{project_id}");
        assert_eq!(endpoint.parameters[0].name, "project_id");
        assert_eq!(blueprint.resources[0].name, "projects");
    }

    #[test]
    fn test_lowercase_and_malformed_candidates_are_ignored() {
        let blueprint = plan_heuristic(&corpus(
            "https://docs.example.com/",
            &["get /users\nGET /broken/{id\nGET /empty/{}/x\nGETTING /nope"],
        ));
        assert!(blueprint.resources.is_empty());
    }

    #[test]
    fn test_empty_corpus_still_validates() {
        let blueprint = plan_heuristic(&corpus("https://127.0.0.1:8080/", &[]));
        assert!(blueprint.resources.is_empty());
        assert_eq!(blueprint.service_name, "127_0_0_1");
        assert!(validate_blueprint(blueprint).is_ok());
    }

    #[test]
    fn test_output_always_validates() {
        let text = "# Items\nGET /items/{id}/{id}\nPOST /\nPUT /items/{item_id}:\n# \nDELETE /v2/{x}";
        let blueprint = plan_heuristic(&corpus("https://docs.example.co.uk/", &[text]));
        assert_eq!(blueprint.service_name, "example");
        assert!(validate_blueprint(blueprint).is_ok());
    }

    #[test]
    fn test_auth_hints() {
        let blueprint = plan_heuristic(&corpus(
            "https://docs.example.com/",
            &["Send your API key as a Bearer token in the Authorization header."],
        ));
        assert_eq!(
            blueprint.auth_hints,
            vec![
                "Requests carry credentials in the Authorization header",
                "Bearer token authentication",
                "An API key is required",
            ]
        );
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("/users,").as_deref(), Some("/users"));
        assert_eq!(clean_path("/a/:b/c").as_deref(), Some("/a/{b}/c"));
        assert_eq!(clean_path("/a/{b"), None);
        assert_eq!(clean_path("/.").as_deref(), Some("/"));
    }
}
