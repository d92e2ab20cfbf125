// Discovery: walk each order's paginated listing and queue its specimen pages.

use crate::config::{OrderDescriptor, OrderTable};
use crate::error::{Result, TrawlError};
use crate::options::TrawlOptions;
use crate::queue::WorkQueue;
use crate::snapshot::{Slot, SnapshotStore};
use nymph_scanner::Fetcher;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, info};

/// Fragment every listing page after the first is addressed with.
pub const PAGE_FRAGMENT: &str = "#specimens";

/// Callback for reporting discovery progress
pub type DiscoveryProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

// Always matches; both groups are absent when the URL has no page suffix.
static PAGE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<page>[0-9]+)?(?P<frag>#[^/#]*)?$").expect("static regex"));

/// First listing page of an order: `{base}/hatch/{id}/{name}/`.
pub fn listing_url(base: &str, order: &OrderDescriptor) -> String {
    format!(
        "{}/hatch/{}/{}/",
        base.trim_end_matches('/'),
        order.tn_num,
        order.order
    )
}

/// URL of the listing page after `url`.
///
/// `.../4#specimens` becomes `.../5#specimens`, a bare `.../#specimens` counts
/// as page 1, and anything else gets `2#specimens` appended. Page numbers are
/// incremented as digit strings, so their width is unbounded.
pub fn next_listing_url(url: &str) -> String {
    let Some(caps) = PAGE_SUFFIX.captures(url) else {
        return format!("{}2{}", url, PAGE_FRAGMENT);
    };

    let suffix_start = caps.get(0).map_or(url.len(), |m| m.start());
    let prefix = &url[..suffix_start];

    match (caps.name("page"), caps.name("frag")) {
        (Some(page), _) => {
            format!("{}{}{}", prefix, increment_digits(page.as_str()), PAGE_FRAGMENT)
        }
        (None, Some(_)) => format!("{}2{}", prefix, PAGE_FRAGMENT),
        (None, None) => format!("{}2{}", url, PAGE_FRAGMENT),
    }
}

/// Add one to a string of ASCII digits.
fn increment_digits(digits: &str) -> String {
    let mut out: Vec<u8> = digits.bytes().collect();
    let mut carry = true;
    for digit in out.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            carry = false;
            break;
        }
    }
    if carry {
        out.insert(0, b'1');
    }
    out.into_iter().map(char::from).collect()
}

/// Where discovery is within one order. Lives for a single `discover_order`
/// call and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCursor {
    url: String,
    page: u32,
    ceiling: Option<u32>,
}

impl ListingCursor {
    pub fn new(url: String) -> Self {
        Self {
            url,
            page: 1,
            ceiling: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn ceiling(&self) -> Option<u32> {
        self.ceiling
    }

    /// Whether the page count for this order has been read yet.
    pub fn is_established(&self) -> bool {
        self.ceiling.is_some()
    }

    pub fn establish(&mut self, ceiling: u32) {
        self.ceiling = Some(ceiling.max(1));
    }

    pub fn has_next(&self) -> bool {
        self.ceiling.is_some_and(|ceiling| self.page < ceiling)
    }

    pub fn advance(&mut self) {
        self.url = next_listing_url(&self.url);
        self.page += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDiscovery {
    pub order: String,
    pub pages: u32,
    pub added: usize,
}

pub struct Discoverer {
    fetcher: Fetcher,
    base_url: String,
    page_delay: Duration,
    progress_callback: Option<DiscoveryProgressCallback>,
}

impl Discoverer {
    pub fn new(fetcher: Fetcher, options: &TrawlOptions) -> Self {
        Self {
            fetcher,
            base_url: options.base_url.clone(),
            page_delay: options.page_delay,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: DiscoveryProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn report(&self, msg: String) {
        if let Some(ref callback) = self.progress_callback {
            callback(msg);
        }
    }

    /// Fetch the cursor's page and return its specimen URLs. The first call
    /// for a cursor also establishes the order's page ceiling.
    pub async fn scan_listing(&self, cursor: &mut ListingCursor) -> Result<Vec<String>> {
        let first_page = !cursor.is_established();
        let page = self.fetcher.fetch_listing(cursor.url(), first_page).await?;

        if first_page {
            cursor.establish(page.page_ceiling.unwrap_or(1));
            debug!("{} has {:?} listing pages", cursor.url(), cursor.ceiling());
        }
        Ok(page.specimen_urls)
    }

    async fn scan_and_enqueue(
        &self,
        queue: &mut WorkQueue,
        cursor: &mut ListingCursor,
        store: &SnapshotStore,
    ) -> Result<usize> {
        let urls = self.scan_listing(cursor).await?;
        let found = urls.len();
        let added = queue.enqueue_new(urls);
        store.save(Slot::Current, queue)?;

        self.report(format!(
            "page {} of {}: {} new of {} found, {} queued",
            cursor.page(),
            cursor.ceiling().unwrap_or(1),
            added,
            found,
            queue.len()
        ));
        Ok(added)
    }

    /// Walk every listing page of one order, saving the current slot after
    /// each page.
    pub async fn discover_order(
        &self,
        queue: &mut WorkQueue,
        order: &OrderDescriptor,
        store: &SnapshotStore,
    ) -> Result<OrderDiscovery> {
        info!("Beginning {}", order.order);
        let mut cursor = ListingCursor::new(listing_url(&self.base_url, order));

        let mut added = self.scan_and_enqueue(queue, &mut cursor, store).await?;
        while cursor.has_next() {
            tokio::time::sleep(self.page_delay).await;
            cursor.advance();
            debug!("Advancing to {}", cursor.url());
            added += self.scan_and_enqueue(queue, &mut cursor, store).await?;
        }

        info!(
            "Finished {}: {} pages, {} new URLs",
            order.order,
            cursor.page(),
            added
        );
        Ok(OrderDiscovery {
            order: order.order.clone(),
            pages: cursor.page(),
            added,
        })
    }

    /// Discover every order in table order, then checkpoint the queue into
    /// the master slot.
    pub async fn discover_all(
        &self,
        queue: &mut WorkQueue,
        orders: &OrderTable,
        store: &SnapshotStore,
    ) -> Result<Vec<OrderDiscovery>> {
        let mut summaries = Vec::with_capacity(orders.len());
        for order in orders.iter() {
            self.report(format!("Beginning {}", order.order));
            summaries.push(self.discover_order(queue, order, store).await?);
        }
        store.checkpoint(queue)?;
        info!("Discovery complete, {} URLs queued", queue.len());
        Ok(summaries)
    }

    /// Rebuild the queue for the single order at `row`, on top of the
    /// current slot, then checkpoint.
    pub async fn repopulate(
        &self,
        orders: &OrderTable,
        row: usize,
        store: &SnapshotStore,
    ) -> Result<(WorkQueue, OrderDiscovery)> {
        let order = orders.row(row).ok_or(TrawlError::InvalidRow {
            index: row,
            len: orders.len(),
        })?;

        let mut queue = store.load(Slot::Current)?;
        let summary = self.discover_order(&mut queue, order, store).await?;
        store.checkpoint(&queue)?;
        Ok((queue, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_listing_url_increments_page() {
        assert_eq!(
            next_listing_url("http://www.troutnut.com/hatch/13/Insect-Plecoptera/4#specimens"),
            "http://www.troutnut.com/hatch/13/Insect-Plecoptera/5#specimens"
        );
        assert_eq!(
            next_listing_url("http://host/hatch/13/Plecoptera/9"),
            "http://host/hatch/13/Plecoptera/10#specimens"
        );
    }

    #[test]
    fn test_next_listing_url_wide_page_numbers() {
        assert_eq!(
            next_listing_url("http://host/hatch/13/P/18446744073709551615#specimens"),
            "http://host/hatch/13/P/18446744073709551616#specimens"
        );
        assert_eq!(
            next_listing_url("http://host/hatch/13/P/99999999999999999999#specimens"),
            "http://host/hatch/13/P/100000000000000000000#specimens"
        );
        assert_eq!(
            next_listing_url("http://host/hatch/13/P/99999999999999999999"),
            "http://host/hatch/13/P/100000000000000000000#specimens"
        );
    }

    #[test]
    fn test_increment_digits() {
        assert_eq!(increment_digits("0"), "1");
        assert_eq!(increment_digits("09"), "10");
        assert_eq!(increment_digits("199"), "200");
        assert_eq!(increment_digits("999"), "1000");
    }

    #[test]
    fn test_next_listing_url_first_page() {
        assert_eq!(
            next_listing_url("http://www.troutnut.com/hatch/13/Insect-Plecoptera/"),
            "http://www.troutnut.com/hatch/13/Insect-Plecoptera/2#specimens"
        );
        assert_eq!(
            next_listing_url("http://host/hatch/13/Plecoptera/#specimens"),
            "http://host/hatch/13/Plecoptera/2#specimens"
        );
    }

    #[test]
    fn test_listing_url() {
        let order = OrderDescriptor {
            order: "Insect-Plecoptera".to_string(),
            tn_num: 13,
            directory: "stoneflies".to_string(),
        };
        assert_eq!(
            listing_url("http://www.troutnut.com/", &order),
            "http://www.troutnut.com/hatch/13/Insect-Plecoptera/"
        );
    }

    #[test]
    fn test_cursor_walks_to_ceiling() {
        let mut cursor = ListingCursor::new("http://host/hatch/13/Plecoptera/".to_string());
        assert!(!cursor.is_established());
        assert!(!cursor.has_next());

        cursor.establish(3);
        let mut urls = vec![cursor.url().to_string()];
        while cursor.has_next() {
            cursor.advance();
            urls.push(cursor.url().to_string());
        }

        assert_eq!(cursor.page(), 3);
        assert_eq!(
            urls,
            vec![
                "http://host/hatch/13/Plecoptera/",
                "http://host/hatch/13/Plecoptera/2#specimens",
                "http://host/hatch/13/Plecoptera/3#specimens",
            ]
        );
    }

    #[test]
    fn test_zero_ceiling_is_one_page() {
        let mut cursor = ListingCursor::new("http://host/".to_string());
        cursor.establish(0);
        assert_eq!(cursor.ceiling(), Some(1));
        assert!(!cursor.has_next());
    }
}
