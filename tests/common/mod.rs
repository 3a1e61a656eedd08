//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use mcp_builder::ingestion::CrawlOptions;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ROOT_HTML: &str = r#"<html><head><title>Fixture Docs</title></head>
<body>
  <h1>Fixture Docs</h1>
  <p>Welcome. Requests carry a Bearer token.</p>
  <a href="/guide">Guide</a>
  <a href="/reference">Reference</a>
  <a href="https://example.org/elsewhere">Elsewhere</a>
</body></html>"#;

pub const GUIDE_HTML: &str = r#"<html><head><title>Guide</title></head>
<body>
  <h1>Guide</h1>
  <p>Read the reference.</p>
  <a href="/reference#users">Users</a>
  <a href="/">Home</a>
</body></html>"#;

pub const REFERENCE_HTML: &str = r#"<html><head><title>Reference</title></head>
<body>
  <h1>Users</h1>
  <p>GET /users/{id} — fetch a user</p>
  <a href="https://example.org/outside">Outside</a>
</body></html>"#;

/// A three page documentation site: the root links to two same-domain pages
/// and one external page; the reference page links externally again
pub async fn fixture_site() -> MockServer {
    let server = MockServer::start().await;
    for (route, body) in [("/", ROOT_HTML), ("/guide", GUIDE_HTML), ("/reference", REFERENCE_HTML)] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
            .mount(&server)
            .await;
    }
    server
}

pub fn root_url(server: &MockServer) -> String {
    format!("{}/", server.uri())
}

/// Crawl options suitable for a local fixture: no delay, short timeout
pub fn fast_options(max_pages: usize, max_depth: usize) -> CrawlOptions {
    CrawlOptions {
        max_pages,
        max_depth,
        delay: Duration::ZERO,
        timeout: Duration::from_secs(5),
        ..CrawlOptions::default()
    }
}

/// Every file below `root`, as sorted relative paths
pub fn list_files(root: &Path) -> Vec<PathBuf> {
    fn walk(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, files);
            } else {
                files.push(path.strip_prefix(root).unwrap().to_path_buf());
            }
        }
    }

    let mut files = Vec::new();
    walk(root, root, &mut files);
    files.sort();
    files
}
