pub mod config;
pub mod discovery;
pub mod error;
pub mod harvest;
pub mod options;
pub mod queue;
pub mod snapshot;

pub use config::{OrderDescriptor, OrderTable};
pub use discovery::{Discoverer, ListingCursor, OrderDiscovery, listing_url, next_listing_url};
pub use error::TrawlError;
pub use harvest::{DrainSummary, HarvestOutcome, Harvester, MetadataRecord};
pub use options::{FailurePolicy, TrawlOptions};
pub use queue::WorkQueue;
pub use snapshot::{Slot, SlotStatus, SnapshotStore};

pub fn print_banner() {
    println!(
        r#"
     _ __  _   _ _ __ ___  _ __ | |__
    | '_ \| | | | '_ ` _ \| '_ \| '_ \
    | | | | |_| | | | | | | |_) | | | |
    |_| |_|\__, |_| |_| |_| .__/|_| |_|
           |___/          |_|    v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
