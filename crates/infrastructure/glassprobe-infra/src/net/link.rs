//! Locator helpers shared by the orchestrator and the page resolver.

use reqwest::Url;

/// Resolves `href` against `base`. Absolute links pass through unchanged.
pub fn resolve_link(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if let Ok(abs) = Url::parse(href) {
        return matches!(abs.scheme(), "http" | "https").then(|| abs.to_string());
    }
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

/// True when `link` points at a provider detail page rather than a test file.
pub fn is_detail_page(link: &str, marker: &str) -> bool {
    link.contains(marker)
}
