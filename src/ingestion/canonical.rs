//! URL canonicalization and registrable-domain comparison
//!
//! Every URL the crawler touches goes through [`canonicalize`] so the visited
//! set and the corpus are keyed consistently: fragments are dropped, trailing
//! slashes are normalized and relative links are resolved against the page
//! they were found on.

use url::{Host, Url};

/// Resolve `href` against `base` and canonicalize the result.
///
/// Returns `None` for links that cannot be crawled: empty or fragment-only
/// hrefs, non-HTTP schemes (`mailto:`, `javascript:`, ...) and unparseable
/// values.
pub fn canonicalize(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let resolved = base.join(href).ok()?;
    normalize(resolved)
}

/// Parse and canonicalize an absolute URL
pub fn canonicalize_absolute(raw: &str) -> Result<Url, String> {
    let parsed = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    normalize(parsed).ok_or_else(|| "only http and https URLs can be crawled".to_string())
}

fn normalize(mut url: Url) -> Option<Url> {
    if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
        return None;
    }

    url.set_fragment(None);

    // "/docs/" and "/docs" are the same page; the bare root keeps its slash
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
        url.set_path(&trimmed);
    }

    if url.query() == Some("") {
        url.set_query(None);
    }

    Some(url)
}

/// The registrable domain of a URL's host: the public suffix plus one label,
/// looked up in the public suffix list including its private section
/// (`github.io`, `readthedocs.io`, ...).
///
/// IP addresses, single-label hosts and hosts that are themselves a public
/// suffix are returned whole. Ports never take part in the comparison.
pub fn registrable_domain(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Ipv4(ip) => Some(ip.to_string()),
        Host::Ipv6(ip) => Some(ip.to_string()),
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            if !domain.contains('.') {
                return Some(domain);
            }
            let registrable = psl::domain_str(&domain).unwrap_or(domain.as_str());
            Some(registrable.to_string())
        }
    }
}

/// True when both URLs share a registrable domain
pub fn same_registrable_domain(a: &Url, b: &Url) -> bool {
    match (registrable_domain(a), registrable_domain(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// The first label of the registrable domain, e.g. `stripe` for
/// `docs.stripe.com`. IP hosts are returned whole.
pub fn domain_stem(url: &Url) -> Option<String> {
    let registrable = registrable_domain(url)?;
    match url.host()? {
        Host::Domain(_) => registrable.split('.').next().map(str::to_string),
        _ => Some(registrable),
    }
}
