//! Core data model definitions shared across rewebp crates.

pub mod batch;
pub mod filter;
pub mod format;
pub mod item;
pub mod locators;

// Intentionally curated re-exports for downstream consumers.
pub use batch::{BatchReport, BatchRequest, ConversionResult, ReconcileReport};
pub use filter::DateFilter;
pub use format::{
    SourceFormat, WEBP_EXTENSION, WEBP_MIME, is_image_mime, replace_extension,
};
pub use item::{CatalogItem, ItemStatus, SizeVariant};
pub use locators::{LocatorPair, RenameLocatorSet, relative_locator};
