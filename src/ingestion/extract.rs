//! Text and link extraction from fetched documents
//!
//! HTML is flattened into plain text line by line: block elements end a line,
//! headings get a line of their own prefixed with `#` markers, and the content
//! of script/style-like elements is dropped. Planners depend on those line
//! boundaries to tell sections apart.

use once_cell::sync::Lazy;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("static selector is valid"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector is valid"));

/// Elements whose content never reaches the corpus
const SKIPPED_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "svg", "iframe", "object", "canvas",
];

/// Elements that start and end a line of text
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "caption", "dd", "details", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "summary", "table", "tbody", "tfoot", "thead",
    "tr", "ul",
];

/// Elements separated from their neighbours by a space
const CELL_TAGS: &[&str] = &["td", "th"];

/// Text and raw links pulled out of one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub title: Option<String>,
    pub text: String,
    /// `href` values in document order, unresolved
    pub links: Vec<String>,
}

/// Extract normalized text, title and links from an HTML document
pub fn extract_html(html: &str) -> ExtractedDocument {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&TITLE_SELECTOR)
        .next()
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let mut builder = TextBuilder::default();
    walk(doc.root_element(), &mut builder, false);

    let links = doc
        .select(&LINK_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect();

    ExtractedDocument {
        title,
        text: builder.finish(),
        links,
    }
}

/// Normalize a plain-text document: whitespace collapsed within lines, blank
/// lines removed
pub fn normalize_plain_text(text: &str) -> String {
    text.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn walk(element: ElementRef<'_>, out: &mut TextBuilder, preformatted: bool) {
    let name = element.value().name();
    if SKIPPED_TAGS.contains(&name) {
        return;
    }

    let heading = heading_level(name);
    let block = BLOCK_TAGS.contains(&name);
    let preformatted = preformatted || name == "pre";

    if let Some(level) = heading {
        out.start_heading(level);
    } else if block {
        out.break_line();
    } else if CELL_TAGS.contains(&name) {
        out.pending_space = true;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                if preformatted {
                    out.push_preformatted(text);
                } else {
                    out.push_text(text);
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    walk(child_element, out, preformatted);
                }
            }
            _ => {}
        }
    }

    if heading.is_some() || block {
        out.break_line();
    } else if CELL_TAGS.contains(&name) {
        out.pending_space = true;
    }
}

#[derive(Default)]
struct TextBuilder {
    lines: Vec<String>,
    current: String,
    pending_space: bool,
}

impl TextBuilder {
    fn push_text(&mut self, text: &str) {
        if text.trim().is_empty() {
            if !text.is_empty() {
                self.pending_space = true;
            }
            return;
        }

        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }
        for (i, word) in text.split_whitespace().enumerate() {
            let needs_space = (i > 0 || self.pending_space)
                && !self.current.is_empty()
                && !self.current.ends_with(' ');
            if needs_space {
                self.current.push(' ');
            }
            self.current.push_str(word);
        }
        self.pending_space = text.ends_with(char::is_whitespace);
    }

    fn push_preformatted(&mut self, text: &str) {
        let mut segments = text.split('\n').peekable();
        while let Some(segment) = segments.next() {
            self.push_text(segment);
            if segments.peek().is_some() {
                self.break_line();
            }
        }
    }

    fn start_heading(&mut self, level: usize) {
        self.break_line();
        self.current.push_str(&"#".repeat(level));
        self.current.push(' ');
    }

    fn break_line(&mut self) {
        let line = self.current.trim().to_string();
        self.current.clear();
        self.pending_space = false;
        if !line.is_empty() && !line.chars().all(|c| c == '#') {
            self.lines.push(line);
        }
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_html_keeps_block_boundaries() {
        let html = r#"
            <html>
              <head><title> Users API </title><style>body { color: red }</style></head>
              <body>
                <nav><a href="/">Home</a> <a href="/users">Users</a></nav>
                <h1>Users</h1>
                <p>Manage   the <b>users</b>
                   of your account.</p>
                <h2>Fetch a user</h2>
                <p><code>GET</code> <code>/users/{id}</code> returns one user.</p>
                <script>var secret = "GET /hidden";</script>
              </body>
            </html>
        "#;

        let extracted = extract_html(html);
        assert_eq!(extracted.title.as_deref(), Some("Users API"));
        assert_eq!(
            extracted.text,
            "Home Users\n# Users\nManage the users of your account.\n## Fetch a user\nGET /users/{id} returns one user."
        );
        assert_eq!(extracted.links, vec!["/".to_string(), "/users".to_string()]);
        assert!(!extracted.text.contains("hidden"));
        assert!(!extracted.text.contains("color"));
    }

    #[test]
    fn test_extract_html_inline_elements_do_not_split_words() {
        let extracted = extract_html("<p>Use <a href='/a'>POST</a>/orders<em>!</em></p>");
        assert_eq!(extracted.text, "Use POST/orders!");
    }

    #[test]
    fn test_extract_html_preformatted_lines_survive() {
        let html = "<pre>GET /users\nPOST /users\n\nDELETE /users/{id}</pre>";
        let extracted = extract_html(html);
        assert_eq!(extracted.text, "GET /users\nPOST /users\nDELETE /users/{id}");
    }

    #[test]
    fn test_extract_html_table_cells() {
        let html = "<table><tr><td>GET</td><td>/items</td></tr><tr><td>POST</td><td>/items</td></tr></table>";
        let extracted = extract_html(html);
        assert_eq!(extracted.text, "GET /items\nPOST /items");
    }

    #[test]
    fn test_extract_html_without_title() {
        let extracted = extract_html("<p>hello</p>");
        assert_eq!(extracted.title, None);
        assert_eq!(extracted.text, "hello");
        assert!(extracted.links.is_empty());
    }

    #[test]
    fn test_normalize_plain_text() {
        let text = "  GET   /users \n\n\tPOST /users\n   \n";
        assert_eq!(normalize_plain_text(text), "GET /users\nPOST /users");
    }
}
