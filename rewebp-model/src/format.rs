//! Source raster formats and the old-extension → `.webp` rename rule.

use serde::{Deserialize, Serialize};

/// MIME type of the conversion target.
pub const WEBP_MIME: &str = "image/webp";

/// File extension of the conversion target.
pub const WEBP_EXTENSION: &str = "webp";

/// Raster formats the converter accepts as input.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum SourceFormat {
    Jpeg,
    Png,
    Gif,
}

impl SourceFormat {
    /// Parse a declared MIME type into a convertible source format.
    ///
    /// `image/jpg` is accepted as a legacy alias for `image/jpeg`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" | "image/jpg" => Some(SourceFormat::Jpeg),
            "image/png" => Some(SourceFormat::Png),
            "image/gif" => Some(SourceFormat::Gif),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(SourceFormat::Jpeg),
            "png" => Some(SourceFormat::Png),
            "gif" => Some(SourceFormat::Gif),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "image/jpeg",
            SourceFormat::Png => "image/png",
            SourceFormat::Gif => "image/gif",
        }
    }

    /// The MIME types matched by the convertible-item predicate,
    /// including the legacy `image/jpg` alias.
    pub fn all_mimes() -> &'static [&'static str] {
        &["image/jpeg", "image/jpg", "image/png", "image/gif"]
    }

    pub fn all_extensions() -> &'static [&'static str] {
        &["jpg", "jpeg", "png", "gif"]
    }

    /// Whether alpha must survive the transcode.
    pub fn has_alpha(&self) -> bool {
        matches!(self, SourceFormat::Png | SourceFormat::Gif)
    }
}

/// True for any MIME type this engine recognizes as a raster image,
/// the target type included.
pub fn is_image_mime(mime: &str) -> bool {
    mime == WEBP_MIME || SourceFormat::from_mime(mime).is_some()
}

/// Rewrite a locator's source extension to `.webp`.
///
/// Returns `None` when the locator does not end in a convertible
/// extension; matching is case-insensitive (`photo.JPG` → `photo.webp`).
pub fn replace_extension(locator: &str) -> Option<String> {
    let (stem, ext) = locator.rsplit_once('.')?;
    SourceFormat::from_extension(ext)?;
    Some(format!("{stem}.{WEBP_EXTENSION}"))
}
