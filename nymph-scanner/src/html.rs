// Shared HTML helpers for the listing and specimen extractors.

use crate::error::{Result, ScanError};
use scraper::{ElementRef, Selector};
use url::Url;

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|_| ScanError::ParseError(format!("invalid selector: {}", css)))
}

/// Collapsed, trimmed text content of an element.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve `href` against `base`, dropping the fragment.
/// Returns `None` for hrefs that never point at a page.
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let base_url = Url::parse(base).ok()?;
    let mut resolved = base_url.join(href).ok()?;
    resolved.set_fragment(None);

    Some(resolved.to_string())
}
