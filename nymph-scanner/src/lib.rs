pub mod error;
pub mod fetcher;
pub mod html;
pub mod listing;
pub mod result;
pub mod specimen;

pub use error::ScanError;
pub use fetcher::Fetcher;
pub use result::{ListingPage, SpecimenImage, SpecimenPage};
