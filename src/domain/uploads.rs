//! Upload acceptance rules for news images.

use std::num::NonZeroU64;
use std::path::Path;

use bytes::Bytes;
use thiserror::Error;

/// Default ceiling for an attached image: 2 MiB.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 2 * 1024 * 1024;

const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif"];
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// A file attached to a create/edit submission, fully buffered.
#[derive(Debug, Clone)]
pub struct IncomingImage {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl IncomingImage {
    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("file must be a valid type")]
    InvalidType,
    #[error("file must not be empty")]
    Empty,
    #[error("file size must be less than {limit_bytes} bytes")]
    TooLarge { limit_bytes: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    max_image_bytes: NonZeroU64,
}

impl UploadPolicy {
    pub fn new(max_image_bytes: NonZeroU64) -> Self {
        Self { max_image_bytes }
    }

    pub fn max_image_bytes(&self) -> u64 {
        self.max_image_bytes.get()
    }

    /// Type, then emptiness, then size; the first failing check is reported.
    pub fn check(&self, image: &IncomingImage) -> Result<(), UploadRejection> {
        if !is_allowed_file_type(&image.content_type, &image.filename) {
            return Err(UploadRejection::InvalidType);
        }
        if image.data.is_empty() {
            return Err(UploadRejection::Empty);
        }
        if !self.is_under_size_limit(image.size_bytes()) {
            return Err(UploadRejection::TooLarge {
                limit_bytes: self.max_image_bytes(),
            });
        }
        Ok(())
    }

    pub fn is_under_size_limit(&self, size_bytes: u64) -> bool {
        size_bytes < self.max_image_bytes.get()
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_image_bytes: NonZeroU64::new(DEFAULT_MAX_IMAGE_BYTES)
                .unwrap_or(NonZeroU64::MIN),
        }
    }
}

/// Both the declared MIME type and the filename extension must name an accepted image format.
pub fn is_allowed_file_type(mimetype: &str, filename: &str) -> bool {
    let mimetype = mimetype.trim().to_ascii_lowercase();
    if !ALLOWED_MIME_TYPES.contains(&mimetype.as_str()) {
        return false;
    }

    let filename = filename.trim().to_ascii_lowercase();
    let Some(extension) = Path::new(&filename)
        .extension()
        .and_then(|value| value.to_str())
    else {
        return false;
    };
    if !ALLOWED_EXTENSIONS.contains(&extension) {
        return false;
    }

    mime_guess::from_ext(extension)
        .iter()
        .any(|guess| ALLOWED_MIME_TYPES.contains(&guess.essence_str()))
}
