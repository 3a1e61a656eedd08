//! Sanitizers for text interpolated into generated Python source

use once_cell::sync::Lazy;
use regex::Regex;

static UNICODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{2018}\u{2019}\u{201C}\u{201D}\u{2013}\u{2014}]").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Sanitizes free text for use inside a triple-quoted Python docstring
///
/// This function:
/// - Replaces smart quotes with plain quotes and en/em-dashes with `-`
/// - Collapses whitespace and drops empty lines
/// - Escapes backslashes and any `"""` sequence
///
/// # Examples
/// ```
/// use mcp_builder::scaffold::sanitize_docstring;
///
/// let output = sanitize_docstring("Fetch a \u{201C}user\u{201D}\u{2014}by id");
/// assert_eq!(output, "Fetch a \"user\"-by id");
/// ```
pub fn sanitize_docstring(input: &str) -> String {
    let joined = input
        .lines()
        .map(|line| {
            let line = UNICODE_RE.replace_all(line, |caps: &regex::Captures| match &caps[0] {
                "\u{2018}" | "\u{2019}" => "'",
                "\u{201C}" | "\u{201D}" => "\"",
                _ => "-",
            });
            WS_RE.replace_all(line.trim(), " ").to_string()
        })
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let mut safe = joined.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"");
    // A trailing quote would close the docstring early
    if safe.ends_with('"') {
        safe.push(' ');
    }
    safe
}
