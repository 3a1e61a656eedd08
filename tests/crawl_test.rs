//! Crawler behavior against a local fixture documentation site

mod common;

use common::{fast_options, fixture_site, root_url};
use mcp_builder::ingestion::{Crawler, registrable_domain};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_three_page_site_is_crawled_completely() {
    let server = fixture_site().await;
    let crawler = Crawler::http(fast_options(10, 3)).unwrap();

    let corpus = crawler.crawl(&root_url(&server)).await.unwrap();

    let urls: Vec<String> = corpus.pages.iter().map(|p| p.url.path().to_string()).collect();
    assert_eq!(urls, vec!["/", "/guide", "/reference"]);
    assert_eq!(corpus.len(), 3);
    assert!(!corpus.truncated);
    assert!(corpus.warnings.is_empty(), "{:?}", corpus.warnings);
    assert_eq!(corpus.title(), Some("Fixture Docs"));

    let root_domain = registrable_domain(&corpus.root_url);
    for page in &corpus.pages {
        assert_eq!(registrable_domain(&page.url), root_domain);
    }
    // External links are recorded on the page but never crawled
    assert!(
        corpus.pages[0]
            .outbound_links
            .contains(&Url::parse("https://example.org/elsewhere").unwrap())
    );
}

#[tokio::test]
async fn test_crawl_is_deterministic() {
    let server = fixture_site().await;
    let crawler = Crawler::http(fast_options(10, 3)).unwrap();

    let first = crawler.crawl(&root_url(&server)).await.unwrap();
    let second = crawler.crawl(&root_url(&server)).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_bounds_are_respected() {
    let server = fixture_site().await;

    let corpus = Crawler::http(fast_options(2, 3))
        .unwrap()
        .crawl(&root_url(&server))
        .await
        .unwrap();
    assert!(corpus.visited_count <= 2);
    assert_eq!(corpus.len(), 2);
    assert!(corpus.truncated);

    let corpus = Crawler::http(fast_options(10, 0))
        .unwrap()
        .crawl(&root_url(&server))
        .await
        .unwrap();
    assert_eq!(corpus.len(), 1);
    assert!(corpus.pages.iter().all(|p| p.depth == 0));
    assert!(corpus.truncated);
}

#[tokio::test]
async fn test_robots_disallow_is_honored() {
    let server = fixture_site().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("User-agent: *\nDisallow: /reference\n", "text/plain"),
        )
        .mount(&server)
        .await;

    let corpus = Crawler::http(fast_options(10, 3))
        .unwrap()
        .crawl(&root_url(&server))
        .await
        .unwrap();
    let urls: Vec<&str> = corpus.pages.iter().map(|p| p.url.path()).collect();
    assert_eq!(urls, vec!["/", "/guide"]);

    let mut options = fast_options(10, 3);
    options.respect_robots = false;
    let corpus = Crawler::http(options)
        .unwrap()
        .crawl(&root_url(&server))
        .await
        .unwrap();
    assert_eq!(corpus.len(), 3);
}

#[tokio::test]
async fn test_failed_page_is_skipped_with_warning() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><body><a href="/missing">Missing</a><a href="/ok">Ok</a></body></html>"#,
            "text/html",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("plain docs", "text/plain"))
        .mount(&server)
        .await;

    let corpus = Crawler::http(fast_options(10, 3))
        .unwrap()
        .crawl(&root_url(&server))
        .await
        .unwrap();

    let urls: Vec<&str> = corpus.pages.iter().map(|p| p.url.path()).collect();
    assert_eq!(urls, vec!["/", "/ok"]);
    assert_eq!(corpus.visited_count, 3);
    assert_eq!(corpus.warnings.len(), 1);
    assert!(corpus.warnings[0].contains("/missing"));
    assert!(!corpus.truncated);
}

#[tokio::test]
async fn test_configured_user_agent_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "fixture-bot/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("hello", "text/plain"))
        .expect(1)
        .mount(&server)
        .await;

    let mut options = fast_options(10, 3);
    options.user_agent = "fixture-bot/1.0".to_string();
    let corpus = Crawler::http(options)
        .unwrap()
        .crawl(&root_url(&server))
        .await
        .unwrap();

    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus.pages[0].text, "hello");
}

#[tokio::test]
async fn test_deny_pattern_excludes_pages() {
    let server = fixture_site().await;
    let mut options = fast_options(10, 3);
    options.deny_patterns = vec![".*/guide".to_string()];

    let corpus = Crawler::http(options)
        .unwrap()
        .crawl(&root_url(&server))
        .await
        .unwrap();

    let urls: Vec<&str> = corpus.pages.iter().map(|p| p.url.path()).collect();
    assert_eq!(urls, vec!["/", "/reference"]);
}

#[tokio::test]
async fn test_redirects_are_followed_only_within_the_domain() {
    let foreign = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/foreign"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("# Foreign\nGET /secret - foreign content", "text/plain"),
        )
        .mount(&foreign)
        .await;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><body><a href="/go">Away</a><a href="/moved">Moved</a></body></html>"#,
            "text/html",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/go"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/foreign", foreign.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/docs/landing"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/landing"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><body><h1>Landing</h1><a href="next">Next</a></body></html>"#,
            "text/html",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/next"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("next page", "text/plain"))
        .mount(&server)
        .await;

    // `localhost` and the foreign server's `127.0.0.1` are different domains
    let root = format!("http://localhost:{}/", server.address().port());
    let corpus = Crawler::http(fast_options(10, 3)).unwrap().crawl(&root).await.unwrap();

    let urls: Vec<&str> = corpus.pages.iter().map(|p| p.url.path()).collect();
    assert_eq!(urls, vec!["/", "/docs/landing", "/docs/next"]);
    assert!(corpus.pages.iter().all(|p| p.url.host_str() == Some("localhost")));
    assert!(corpus.pages.iter().all(|p| !p.text.contains("Foreign")));
    assert_eq!(corpus.warnings.len(), 1, "{:?}", corpus.warnings);
    assert!(corpus.warnings[0].contains("/go"));
    assert!(corpus.warnings[0].contains("outside the crawl scope"));
}
