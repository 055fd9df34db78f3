//! Utility functions for handling hosts and URLs found in scraped pages.

use url::Url;

/// Reduces a URL to its site root (`scheme://host[:port]/`).
pub(crate) fn site_root(url: &Url) -> Url {
    let mut root = url.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    root
}

/// Parses an href that must already be absolute `http`/`https`.
pub(crate) fn parse_absolute_http(href: &str) -> Option<Url> {
    let href = href.trim();
    if !href.starts_with("http") {
        return None;
    }
    let url = Url::parse(href).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Resolves a possibly-relative href against the page it was found on.
pub(crate) fn resolve_href(page: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.starts_with("http") {
        return parse_absolute_http(href);
    }
    match page.join(href) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        Ok(url) => {
            tracing::debug!("Ignoring non-web link {} on {}", url, page);
            None
        }
        Err(e) => {
            tracing::debug!("Failed to join {} with href '{}': {}", page, href, e);
            None
        }
    }
}

/// Case-insensitive host comparison that ignores a leading `www.`.
pub(crate) fn same_host(url: &Url, host: &str) -> bool {
    let strip = |h: &str| h.trim_start_matches("www.").to_ascii_lowercase();
    url.host_str().is_some_and(|h| strip(h) == strip(host))
}
