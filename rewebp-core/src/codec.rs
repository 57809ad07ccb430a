//! Image codec capability: decode a source raster, encode WebP.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rewebp_model::SourceFormat;
use tracing::debug;

use crate::error::{ConvertError, Result};

/// Opaque transcoding capability consumed by the converter.
///
/// Backend selection happens at construction time; the core logic never
/// branches on codec internals.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageCodec: Send + Sync {
    /// Decode the file at `path` as `format` and encode it as WebP at
    /// the given quality (0.0–100.0).
    async fn transcode(
        &self,
        path: &Path,
        format: SourceFormat,
        quality: f32,
    ) -> Result<Vec<u8>>;
}

/// Default backend: `image` for decoding, lossy WebP encoding with
/// alpha preserved for the formats that carry it. GIF inputs are
/// flattened to their first frame.
#[derive(Debug, Clone, Default)]
pub struct RasterCodec;

impl RasterCodec {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageCodec for RasterCodec {
    async fn transcode(
        &self,
        path: &Path,
        format: SourceFormat,
        quality: f32,
    ) -> Result<Vec<u8>> {
        let path: PathBuf = path.to_owned();
        let quality = quality.clamp(0.0, 100.0);

        // Decode/encode is CPU-bound; keep it off the async workers.
        tokio::task::spawn_blocking(move || encode_webp(&path, format, quality))
            .await
            .map_err(|e| {
                ConvertError::Internal(format!("Failed to join codec task: {e}"))
            })?
    }
}

fn encode_webp(path: &Path, format: SourceFormat, quality: f32) -> Result<Vec<u8>> {
    let img = image::ImageReader::open(path)
        .map_err(ConvertError::Io)?
        .decode()
        .map_err(|e| {
            ConvertError::ConversionFailed(format!(
                "Failed to decode {}: {e}",
                path.display()
            ))
        })?;

    debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        ?format,
        "encoding webp"
    );

    let encoded = if format.has_alpha() {
        let rgba = img.to_rgba8();
        let (w, h) = rgba.dimensions();
        webp::Encoder::from_rgba(&rgba, w, h).encode(quality).to_vec()
    } else {
        let rgb = img.to_rgb8();
        let (w, h) = rgb.dimensions();
        webp::Encoder::from_rgb(&rgb, w, h).encode(quality).to_vec()
    };

    if encoded.is_empty() {
        return Err(ConvertError::ConversionFailed(format!(
            "Encoder produced no output for {}",
            path.display()
        )));
    }
    Ok(encoded)
}
