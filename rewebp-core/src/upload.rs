//! Upload interception: transcode new uploads in place before they are
//! catalogued, so fresh content never needs the batch migration.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rewebp_model::{SourceFormat, WEBP_MIME, replace_extension};
use tracing::{debug, warn};

use crate::codec::ImageCodec;
use crate::error::Result;

/// A file sitting in the staging area, not yet catalogued. The
/// interceptor may rewrite all three fields.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    /// Absolute path of the staged file on disk.
    pub temp_path: PathBuf,
    /// Client-facing file name, extension included.
    pub file_name: String,
    /// Declared MIME type.
    pub mime: String,
}

/// Converts convertible uploads to WebP before the catalog ever sees
/// them.
///
/// Failures are never surfaced to the uploader: a file the codec cannot
/// handle passes through in its original format and remains eligible
/// for the batch migration later.
#[derive(Clone)]
pub struct UploadInterceptor {
    codec: Arc<dyn ImageCodec>,
    quality: f32,
    /// Items created before this instant belong to the pre-existing
    /// library and are left to the batch migration.
    installed_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for UploadInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadInterceptor")
            .field("codec", &"dyn ImageCodec")
            .field("quality", &self.quality)
            .field("installed_at", &self.installed_at)
            .finish()
    }
}

impl UploadInterceptor {
    pub fn new(
        codec: Arc<dyn ImageCodec>,
        quality: f32,
        installed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self { codec, quality, installed_at }
    }

    /// Transcode a staged upload in place. Returns whether the upload
    /// was converted; `false` always means the upload passes through
    /// unchanged.
    pub async fn intercept(
        &self,
        upload: &mut StagedUpload,
        created_at: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(format) = SourceFormat::from_mime(&upload.mime) else {
            return Ok(false);
        };

        if let Some(installed_at) = self.installed_at
            && created_at < installed_at
        {
            debug!(file = %upload.file_name, "predates installation, leaving to batch migration");
            return Ok(false);
        }

        let Some(new_name) = replace_extension(&upload.file_name) else {
            return Ok(false);
        };

        let bytes = match self
            .codec
            .transcode(&upload.temp_path, format, self.quality)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = %upload.file_name, error = %e, "upload transcode failed, passing through");
                return Ok(false);
            }
        };

        if let Err(e) = tokio::fs::write(&upload.temp_path, &bytes).await {
            warn!(file = %upload.file_name, error = %e, "failed to write converted upload, passing through");
            return Ok(false);
        }

        upload.file_name = new_name;
        upload.mime = WEBP_MIME.to_string();
        Ok(true)
    }
}
