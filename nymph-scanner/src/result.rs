use serde::{Deserialize, Serialize};

/// What a single forum listing page yields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingPage {
    pub url: String,
    /// Specimen detail URLs in document order.
    pub specimen_urls: Vec<String>,
    /// Highest page number in the navigation bar. Only read on the first page
    /// of an order.
    pub page_ceiling: Option<u32>,
}

/// One `img.i` element on a specimen page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecimenImage {
    pub name: String,
    pub title: String,
    pub alt: String,
    /// Absolute image URL, resolved against the specimen page.
    pub src: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecimenPage {
    pub url: String,
    /// Order name as it appears in the breadcrumb URL, e.g. `Insect-Plecoptera`.
    pub order: String,
    pub images: Vec<SpecimenImage>,
    /// Taxonomic labels, broadest first.
    pub taxonomy: Vec<String>,
}

impl SpecimenPage {
    pub fn new(url: String, order: String) -> Self {
        Self {
            url,
            order,
            images: Vec::new(),
            taxonomy: Vec::new(),
        }
    }
}
