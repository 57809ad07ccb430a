//! Catalog records for convertible media items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Attachment status within the catalog. Only `Attached` items are
/// visible to the convertible-item predicate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Attached,
    Detached,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Attached => "attached",
            ItemStatus::Detached => "detached",
        }
    }
}

/// A generated size rendition of a catalog item, stored alongside the
/// original in the same directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeVariant {
    /// Rendition name, e.g. `thumbnail` or `medium`.
    pub name: String,
    /// File name within the item's directory (no path component).
    pub file: String,
}

/// One image registered in the catalog.
///
/// `path` is relative to the storage root and doubles as the item's
/// primary locator; the engine never owns these records, it only updates
/// the locator and MIME type after a conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub path: String,
    pub mime: String,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub sizes: Vec<SizeVariant>,
}

impl CatalogItem {
    /// Directory portion of `path`, empty for root-level files.
    pub fn dir(&self) -> &str {
        self.path.rsplit_once('/').map(|(d, _)| d).unwrap_or("")
    }

    /// Relative path of a file stored in the item's directory.
    pub fn sibling_path(&self, file: &str) -> String {
        let dir = self.dir();
        if dir.is_empty() {
            file.to_string()
        } else {
            format!("{dir}/{file}")
        }
    }
}
