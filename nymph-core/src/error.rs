use nymph_scanner::ScanError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrawlError {
    #[error("Order table error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Order '{0}' is not in the order table")]
    UnknownOrder(String),

    #[error("Work queue is empty")]
    EmptyQueue,

    #[error("Queue snapshot not found: {}", .0.display())]
    SlotMissing(PathBuf),

    #[error("No order table row {index} (table has {len} rows)")]
    InvalidRow { index: usize, len: usize },

    #[error("Every one of the {0} remaining URLs failed in a row, giving up")]
    Stalled(usize),
}

impl TrawlError {
    /// Failures confined to a single specimen page. Everything else means the
    /// order table or local storage is broken and the crawl should stop.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TrawlError::Scan(_) | TrawlError::Image(_) | TrawlError::UnknownOrder(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TrawlError>;
