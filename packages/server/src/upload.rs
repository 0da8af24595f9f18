//! Upload Handler: validates a single uploaded file against a bucket policy
//! and persists it through the configured [`UploadStore`].

use axum::body::Bytes;
use axum::extract::multipart::Field;
use common::storage::{StorageError, UploadBucket, UploadStore};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AppError;

const OCTET_STREAM: &str = "application/octet-stream";

const IMAGE_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

const MEDIA_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "video/mp4",
    "video/webm",
    "video/ogg",
];

/// Accepted types and size for one kind of upload.
#[derive(Clone, Copy, Debug)]
pub struct UploadPolicy {
    pub bucket: UploadBucket,
    /// `None` accepts any type.
    pub allowed_types: Option<&'static [&'static str]>,
    /// `None` leaves the request body limit as the only cap.
    pub max_size: Option<usize>,
}

impl UploadPolicy {
    pub const BANNER: UploadPolicy = UploadPolicy {
        bucket: UploadBucket::Banner,
        allowed_types: Some(IMAGE_TYPES),
        max_size: Some(2 * 1024 * 1024),
    };

    pub const MEDIA: UploadPolicy = UploadPolicy {
        bucket: UploadBucket::Media,
        allowed_types: Some(MEDIA_TYPES),
        max_size: Some(20 * 1024 * 1024),
    };

    pub const ATTACHMENT: UploadPolicy = UploadPolicy {
        bucket: UploadBucket::Attachment,
        allowed_types: None,
        max_size: None,
    };

    pub const EDITOR_IMAGE: UploadPolicy = UploadPolicy {
        bucket: UploadBucket::Tinymce,
        allowed_types: Some(IMAGE_TYPES),
        max_size: None,
    };

    /// Check type and size, returning the detected MIME type.
    pub fn check(&self, file: &UploadedFile) -> Result<String, UploadError> {
        let mime = file.mime_type();

        if let Some(allowed) = self.allowed_types
            && !allowed.contains(&mime.as_str())
        {
            return Err(UploadError::UnsupportedType(mime));
        }

        if let Some(limit) = self.max_size
            && file.bytes.len() > limit
        {
            return Err(UploadError::TooLarge {
                size: file.bytes.len(),
                limit,
            });
        }

        Ok(mime)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    Missing,
    #[error("File type '{0}' is not allowed")]
    UnsupportedType(String),
    #[error("File is too large ({size} bytes, limit {limit} bytes)")]
    TooLarge { size: usize, limit: usize },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Storage(e) => AppError::from(e),
            other => AppError::Validation(other.to_string()),
        }
    }
}

/// A file part read from a multipart form.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Read a file part. An empty part without a file name (an unfilled file
    /// input) yields `None`.
    pub async fn from_field(field: Field<'_>) -> Result<Option<Self>, AppError> {
        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.is_empty());
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;

        if file_name.is_none() && bytes.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self {
            file_name,
            content_type,
            bytes,
        }))
    }

    /// Declared content type, falling back to a guess from the file name.
    pub fn mime_type(&self) -> String {
        let declared = self
            .content_type
            .as_deref()
            .map(|c| c.split(';').next().unwrap_or(c).trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty() && c != OCTET_STREAM);

        declared
            .or_else(|| {
                self.file_name
                    .as_deref()
                    .and_then(|n| mime_guess::from_path(n).first())
                    .map(|m| m.essence_str().to_string())
            })
            .unwrap_or_else(|| OCTET_STREAM.to_string())
    }

    /// Extension for the stored copy.
    pub fn extension(&self, mime: &str) -> String {
        if let Some(ext) = known_extension(mime) {
            return ext.to_string();
        }
        if let Some(ext) = self.file_name.as_deref().and_then(client_extension) {
            return ext;
        }
        mime_guess::get_mime_extensions_str(mime)
            .and_then(|exts| exts.first())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "bin".to_string())
    }
}

fn known_extension(mime: &str) -> Option<&'static str> {
    Some(match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/ogg" => "ogv",
        "application/pdf" => "pdf",
        "application/zip" => "zip",
        _ => return None,
    })
}

fn client_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ok = !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    ok.then(|| ext.to_ascii_lowercase())
}

/// Result of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedUpload {
    /// Public reference, e.g. `/uploads/hackathon_banners/banner_3_<token>.png`.
    pub url: String,
    /// Generated name inside the bucket directory.
    pub file_name: String,
    pub mime_type: String,
}

/// Validate `file` against `policy` and persist it.
///
/// The stored name is `{bucket prefix}_{owner}_{token}.{ext}`, or
/// `{bucket prefix}_{token}.{ext}` when there is no owner.
pub async fn store_upload(
    store: &dyn UploadStore,
    policy: UploadPolicy,
    owner: Option<i32>,
    file: Option<&UploadedFile>,
) -> Result<SavedUpload, UploadError> {
    let file = file.ok_or(UploadError::Missing)?;
    let mime_type = policy.check(file)?;
    let extension = file.extension(&mime_type);

    let stem = match owner {
        Some(id) => format!("{}_{id}", policy.bucket.file_prefix()),
        None => policy.bucket.file_prefix().to_string(),
    };

    let stored = store
        .put(policy.bucket, &stem, &extension, &file.bytes)
        .await?;
    info!(
        bucket = %policy.bucket,
        path = %stored.public_path,
        size = stored.size,
        "Stored upload"
    );

    Ok(SavedUpload {
        url: stored.public_path,
        file_name: stored.file_name,
        mime_type,
    })
}

/// Remove files stored earlier in a request whose database write failed.
///
/// Failures are logged; the caller has already reported the original error.
pub async fn discard_uploads(store: &dyn UploadStore, urls: &[String]) {
    for url in urls {
        match store.delete(url).await {
            Ok(_) => info!(path = %url, "Discarded upload"),
            Err(e) => warn!(path = %url, error = %e, "Failed to discard upload"),
        }
    }
}

/// Rough classification used for media metadata records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    pub fn of(mime: &str) -> Self {
        if mime.starts_with("image/") {
            MediaKind::Image
        } else if mime.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Other => "other",
        }
    }

    /// HTML snippet for embedding the uploaded media in a description.
    pub fn snippet(&self, url: &str) -> String {
        match self {
            MediaKind::Image => format!("<img src=\"{url}\" alt=\"Media\">"),
            MediaKind::Video => format!("<video src=\"{url}\" controls></video>"),
            MediaKind::Other => url.to_string(),
        }
    }
}
