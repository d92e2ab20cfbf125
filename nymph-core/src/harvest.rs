// Harvest: drain the queue one specimen page at a time, saving every image
// and its metadata line under the owning order's directory.

use crate::config::OrderTable;
use crate::error::{Result, TrawlError};
use crate::options::{FailurePolicy, TrawlOptions};
use crate::queue::WorkQueue;
use crate::snapshot::{Slot, SnapshotStore};
use image::{DynamicImage, ImageFormat};
use nymph_scanner::{Fetcher, SpecimenImage};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const META_FILE: &str = "meta.txt";
pub const QUARANTINE_FILE: &str = "quarantine.txt";
pub const FIELD_DELIMITER: char = ';';

/// Called after every specimen page with its outcome and the remaining queue length.
pub type HarvestProgressCallback = Arc<dyn Fn(&HarvestOutcome, usize) + Send + Sync>;

/// One line of an order's `meta.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub name: String,
    pub title: String,
    pub alt: String,
    pub source: String,
    pub taxonomy: Vec<String>,
}

impl MetadataRecord {
    pub fn new(image: &SpecimenImage, taxonomy: &[String]) -> Self {
        Self {
            name: image.name.clone(),
            title: image.title.clone(),
            alt: image.alt.clone(),
            source: image.src.clone(),
            taxonomy: taxonomy.to_vec(),
        }
    }

    /// Every field is followed by the delimiter, then a newline:
    /// `img42;Baetis sp.;stonefly nymph;http://x/42.jpg;Plecoptera;Perlidae;`
    pub fn to_line(&self) -> String {
        let mut line = String::new();
        let fields = [&self.name, &self.title, &self.alt, &self.source]
            .into_iter()
            .chain(self.taxonomy.iter());
        for field in fields {
            line.push_str(field);
            line.push(FIELD_DELIMITER);
        }
        line.push('\n');
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestOutcome {
    Harvested {
        url: String,
        directory: String,
        images: usize,
    },
    Failed {
        url: String,
        reason: String,
        policy: FailurePolicy,
    },
}

impl HarvestOutcome {
    pub fn url(&self) -> &str {
        match self {
            HarvestOutcome::Harvested { url, .. } | HarvestOutcome::Failed { url, .. } => url,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub pages: usize,
    pub images: usize,
    pub failed: usize,
}

struct PageHarvest {
    directory: String,
    images: usize,
}

pub struct Harvester {
    fetcher: Fetcher,
    orders: OrderTable,
    data_root: PathBuf,
    delay: Duration,
    policy: FailurePolicy,
    progress_callback: Option<HarvestProgressCallback>,
}

impl Harvester {
    pub fn new(fetcher: Fetcher, orders: OrderTable, options: &TrawlOptions) -> Self {
        Self {
            fetcher,
            orders,
            data_root: options.data_root.clone(),
            delay: options.harvest_delay,
            policy: options.failure_policy,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: HarvestProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Pop the head URL, harvest its page and save the current slot.
    ///
    /// Page-level failures are handled by the failure policy and reported as
    /// [`HarvestOutcome::Failed`]. Storage failures put the URL back at the
    /// head and propagate.
    pub async fn harvest_one(
        &self,
        queue: &mut WorkQueue,
        store: &SnapshotStore,
    ) -> Result<HarvestOutcome> {
        let url = queue.pop_front().ok_or(TrawlError::EmptyQueue)?;

        let result = self.harvest_page(&url).await;
        let outcome = match result {
            Ok(page) => HarvestOutcome::Harvested {
                url,
                directory: page.directory,
                images: page.images,
            },
            Err(e) if e.is_recoverable() => {
                warn!("Harvest of {} failed ({}): {}", url, self.policy, e);
                let reason = e.to_string();
                if let Err(storage) = self.apply_policy(queue, &url, &reason) {
                    queue.push_front(url);
                    return Err(storage);
                }
                HarvestOutcome::Failed {
                    url,
                    reason,
                    policy: self.policy,
                }
            }
            Err(e) => {
                queue.push_front(url);
                return Err(e);
            }
        };

        store.save(Slot::Current, queue)?;
        Ok(outcome)
    }

    /// Load the current slot and harvest until the queue is empty.
    pub async fn drain(&self, store: &SnapshotStore) -> Result<DrainSummary> {
        let mut queue = store.load(Slot::Current)?;
        info!("Image queue loaded, {} specimen pages", queue.len());

        let mut summary = DrainSummary::default();
        let mut consecutive_failures = 0;

        while !queue.is_empty() {
            let outcome = self.harvest_one(&mut queue, store).await?;
            match &outcome {
                HarvestOutcome::Harvested { images, .. } => {
                    summary.pages += 1;
                    summary.images += *images;
                    consecutive_failures = 0;
                }
                HarvestOutcome::Failed { .. } => {
                    summary.failed += 1;
                    consecutive_failures += 1;
                }
            }

            if let Some(ref callback) = self.progress_callback {
                callback(&outcome, queue.len());
            }

            if self.policy == FailurePolicy::Requeue
                && consecutive_failures > 0
                && consecutive_failures >= queue.len()
            {
                return Err(TrawlError::Stalled(queue.len()));
            }

            if !queue.is_empty() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(
            "Harvest complete: {} pages, {} images, {} failed",
            summary.pages, summary.images, summary.failed
        );
        Ok(summary)
    }

    async fn harvest_page(&self, url: &str) -> Result<PageHarvest> {
        let page = self.fetcher.fetch_specimen(url).await?;
        let directory = self
            .orders
            .directory_for(&page.order)
            .ok_or_else(|| TrawlError::UnknownOrder(page.order.clone()))?
            .to_string();
        debug!("Found {} images in {} ({})", page.images.len(), url, page.order);

        let out_dir = self.data_root.join(&directory);
        fs::create_dir_all(&out_dir)?;

        let mut lines = Vec::with_capacity(page.images.len());
        let mut written = HashSet::new();
        for image in &page.images {
            lines.push(MetadataRecord::new(image, &page.taxonomy).to_line());

            let file_name = image_file_name(&image.name);
            if !is_safe_image_name(&image.name) {
                warn!("Image name {:?} on {} saved as {}", image.name, url, file_name);
            }
            if !written.insert(file_name.clone()) {
                warn!("{} is written twice by {}, keeping the later image", file_name, url);
            }

            let bytes = self.fetcher.get_bytes(&image.src).await?;
            save_jpeg(&bytes, &out_dir.join(&file_name))?;
        }
        append_lines(&out_dir.join(META_FILE), &lines)?;

        Ok(PageHarvest {
            directory,
            images: page.images.len(),
        })
    }

    fn apply_policy(&self, queue: &mut WorkQueue, url: &str, reason: &str) -> Result<()> {
        match self.policy {
            FailurePolicy::Drop => {}
            FailurePolicy::Requeue => {
                queue.push_back(url.to_string());
            }
            FailurePolicy::Quarantine => {
                fs::create_dir_all(&self.data_root)?;
                let line = format!("{}\t{}\n", url, reason.replace(['\n', '\t'], " "));
                append_lines(&self.data_root.join(QUARANTINE_FILE), &[line])?;
            }
        }
        Ok(())
    }
}

/// `<name>.jpg`, with path separators and other unsafe characters replaced.
pub fn image_file_name(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_start_matches('.');
    if stem.is_empty() {
        "_.jpg".to_string()
    } else {
        format!("{}.jpg", stem)
    }
}

/// Whether `name` is used unchanged as the stem of its image file.
pub fn is_safe_image_name(name: &str) -> bool {
    image_file_name(name) == format!("{}.jpg", name)
}

/// Decode any supported image and write it back out as JPEG.
pub fn save_jpeg(bytes: &[u8], path: &Path) -> Result<()> {
    let decoded = image::load_from_memory(bytes)?;
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let mut encoded = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Jpeg)?;
    fs::write(path, encoded)?;
    Ok(())
}

fn append_lines(path: &Path, lines: &[String]) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writer.write_all(line.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_line_format() {
        let image = SpecimenImage {
            name: "img42".to_string(),
            title: "Baetis sp.".to_string(),
            alt: "stonefly nymph".to_string(),
            src: "http://x/42.jpg".to_string(),
        };
        let taxonomy = vec!["Plecoptera".to_string(), "Perlidae".to_string()];

        assert_eq!(
            MetadataRecord::new(&image, &taxonomy).to_line(),
            "img42;Baetis sp.;stonefly nymph;http://x/42.jpg;Plecoptera;Perlidae;\n"
        );
    }

    #[test]
    fn test_metadata_line_without_taxonomy() {
        let image = SpecimenImage {
            name: "a".to_string(),
            title: String::new(),
            alt: String::new(),
            src: "http://x/a.jpg".to_string(),
        };
        assert_eq!(MetadataRecord::new(&image, &[]).to_line(), "a;;;http://x/a.jpg;\n");
    }

    #[test]
    fn test_image_file_name() {
        assert_eq!(image_file_name("img42"), "img42.jpg");
        assert_eq!(image_file_name("../../etc/passwd"), "_.._etc_passwd.jpg");
        assert_eq!(image_file_name("a b/c"), "a_b_c.jpg");
        assert_eq!(image_file_name(""), "_.jpg");
    }

    #[test]
    fn test_is_safe_image_name() {
        assert!(is_safe_image_name("img42"));
        assert!(is_safe_image_name("a_b"));
        assert!(!is_safe_image_name("a/b"));
        assert!(!is_safe_image_name(".hidden"));
        assert!(!is_safe_image_name(""));
    }

    #[test]
    fn test_save_jpeg_rejects_garbage() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = save_jpeg(b"not an image", &dir.path().join("x.jpg")).unwrap_err();
        assert!(matches!(err, TrawlError::Image(_)));
        assert!(err.is_recoverable());
    }
}
