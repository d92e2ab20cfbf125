// Specimen page extraction: images, owning order and taxonomy labels.

use crate::error::{Result, ScanError};
use crate::html::{element_text, resolve_url, selector};
use crate::result::{SpecimenImage, SpecimenPage};
use scraper::Html;
use url::Url;

pub const IMAGE_SELECTOR: &str = "img.i";
pub const BREADCRUMB_SELECTOR: &str = "a[itemprop=url]";
pub const TAXONOMY_SELECTOR: &str = "span[itemprop=title]";

/// The breadcrumb trail reads site > hatches > class > order > ...
pub const ORDER_BREADCRUMB_INDEX: usize = 3;
/// Leading `itemprop=title` spans that belong to the site header, not the specimen.
pub const TAXONOMY_SKIP: usize = 3;

pub fn parse_specimen(html: &str, page_url: &str) -> Result<SpecimenPage> {
    let document = Html::parse_document(html);

    let breadcrumb_selector = selector(BREADCRUMB_SELECTOR)?;
    let order_href = document
        .select(&breadcrumb_selector)
        .nth(ORDER_BREADCRUMB_INDEX)
        .and_then(|el| el.value().attr("href"))
        .ok_or_else(|| {
            ScanError::ParseError(format!("no order breadcrumb on {}", page_url))
        })?;
    let order_url = resolve_url(page_url, order_href)
        .ok_or_else(|| ScanError::InvalidUrl(order_href.to_string()))?;
    let order = order_from_hatch_url(&order_url)?;

    let mut page = SpecimenPage::new(page_url.to_string(), order);

    let taxonomy_selector = selector(TAXONOMY_SELECTOR)?;
    page.taxonomy = document
        .select(&taxonomy_selector)
        .skip(TAXONOMY_SKIP)
        .map(|el| element_text(&el))
        .collect();

    let image_selector = selector(IMAGE_SELECTOR)?;
    for element in document.select(&image_selector) {
        let attrs = element.value();
        let name = attrs
            .attr("name")
            .ok_or_else(|| ScanError::ParseError(format!("image without name on {}", page_url)))?;
        let src = attrs
            .attr("src")
            .ok_or_else(|| ScanError::ParseError(format!("image {} has no src", name)))?;
        let src = resolve_url(page_url, src).ok_or_else(|| ScanError::InvalidUrl(src.to_string()))?;

        page.images.push(SpecimenImage {
            name: name.to_string(),
            title: attrs.attr("title").unwrap_or_default().to_string(),
            alt: attrs.attr("alt").unwrap_or_default().to_string(),
            src,
        });
    }

    Ok(page)
}

/// Order name from a `.../hatch/<id>/<orderName>/...` URL.
pub fn order_from_hatch_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    segments
        .iter()
        .position(|seg| *seg == "hatch")
        .and_then(|idx| segments.get(idx + 2))
        .map(|name| name.to_string())
        .ok_or_else(|| ScanError::ParseError(format!("not a hatch URL: {}", url)))
}
