// Listing page extraction: page ceiling from the navigation bar and the
// specimen topic links.

use crate::error::Result;
use crate::html::{element_text, resolve_url, selector};
use crate::result::ListingPage;
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Navigation block at the foot of every listing page.
pub const NAV_SELECTOR: &str = "div.pld";
/// Anchor class used for specimen topic links.
pub const SPECIMEN_LINK_SELECTOR: &str = "a.vl[href]";

static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)$").expect("static regex"));

/// Parse a listing page. The page ceiling is only read when `first_page` is
/// set; later pages are assumed to carry the same navigation bar.
pub fn parse_listing(html: &str, page_url: &str, first_page: bool) -> Result<ListingPage> {
    let document = Html::parse_document(html);

    let page_ceiling = if first_page {
        let nav_selector = selector(NAV_SELECTOR)?;
        let nav_text = document.select(&nav_selector).next().map(|el| element_text(&el));
        match nav_text.as_deref().and_then(page_ceiling_from_nav) {
            Some(ceiling) => Some(ceiling),
            None => {
                warn!("No page count in navigation of {}, treating as a single page", page_url);
                Some(1)
            }
        }
    } else {
        None
    };

    let link_selector = selector(SPECIMEN_LINK_SELECTOR)?;
    let mut specimen_urls = Vec::new();
    for element in document.select(&link_selector) {
        if let Some(href) = element.value().attr("href")
            && let Some(absolute) = resolve_url(page_url, href)
        {
            debug!("Found specimen link: {}", absolute);
            specimen_urls.push(absolute);
        }
    }

    Ok(ListingPage {
        url: page_url.to_string(),
        specimen_urls,
        page_ceiling,
    })
}

/// Highest page number: the number the navigation text ends with.
pub fn page_ceiling_from_nav(text: &str) -> Option<u32> {
    TRAILING_NUMBER
        .captures(text.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "http://www.troutnut.com/hatch/13/Insect-Plecoptera/";

    #[test]
    fn test_page_ceiling_from_nav() {
        assert_eq!(page_ceiling_from_nav("Page 1 of 12"), Some(12));
        assert_eq!(page_ceiling_from_nav("  1 2 3 ... 7 \n"), Some(7));
        assert_eq!(page_ceiling_from_nav("Next page"), None);
        assert_eq!(page_ceiling_from_nav(""), None);
    }

    #[test]
    fn test_parse_first_page() {
        let html = r#"<html><body>
            <a class="vl" href="/specimen/1">One</a>
            <a class="other" href="/elsewhere">Skip</a>
            <a class="vl" href="http://www.troutnut.com/specimen/2">Two</a>
            <div class="pld">Pages: 1 2 <b>3</b></div>
        </body></html>"#;

        let page = parse_listing(html, PAGE_URL, true).unwrap();
        assert_eq!(page.page_ceiling, Some(3));
        assert_eq!(
            page.specimen_urls,
            vec![
                "http://www.troutnut.com/specimen/1".to_string(),
                "http://www.troutnut.com/specimen/2".to_string(),
            ]
        );
    }

    #[test]
    fn test_later_page_skips_ceiling() {
        let html = r#"<div class="pld">1 2 3 4</div><a class="vl" href="/specimen/9">9</a>"#;
        let page = parse_listing(html, PAGE_URL, false).unwrap();
        assert_eq!(page.page_ceiling, None);
        assert_eq!(page.specimen_urls.len(), 1);
    }

    #[test]
    fn test_missing_nav_is_single_page() {
        let html = r#"<a class="vl" href="/specimen/9">9</a>"#;
        let page = parse_listing(html, PAGE_URL, true).unwrap();
        assert_eq!(page.page_ceiling, Some(1));
    }
}
