//! Filesystem storage for accepted news images.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use slug::slugify;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::application::repos::{ImageStore, ImageStoreError};

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded file is empty")]
    EmptyPayload,
}

/// Flat directory of uploaded images; stored names are relative to `root`.
#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Write `data` under a fresh `<uuid>-<slug>.<ext>` name and return that name.
    pub async fn store(
        &self,
        original_name: &str,
        data: Bytes,
    ) -> Result<String, UploadStorageError> {
        if data.is_empty() {
            return Err(UploadStorageError::EmptyPayload);
        }

        let stored_name = build_stored_name(original_name);
        let absolute = self.resolve(&stored_name)?;

        let mut file = fs::File::create(&absolute).await?;
        let written = async {
            file.write_all(&data).await?;
            file.flush().await
        }
        .await;
        if let Err(err) = written {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(err.into());
        }

        Ok(stored_name)
    }

    /// Remove a stored image. Missing files are treated as success.
    pub async fn delete(&self, stored_name: &str) -> Result<(), UploadStorageError> {
        let absolute = self.resolve(stored_name)?;
        match fs::remove_file(&absolute).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(UploadStorageError::Io(err)),
        }
    }

    fn resolve(&self, stored_name: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_name);
        if stored_name.is_empty()
            || relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ImageStore for UploadStorage {
    async fn store_image(
        &self,
        original_name: &str,
        data: Bytes,
    ) -> Result<String, ImageStoreError> {
        self.store(original_name, data)
            .await
            .map_err(|err| ImageStoreError(err.to_string()))
    }

    async fn discard_image(&self, stored_name: &str) -> Result<(), ImageStoreError> {
        self.delete(stored_name)
            .await
            .map_err(|err| ImageStoreError(err.to_string()))
    }
}

fn build_stored_name(original_name: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), sanitize_filename(original_name))
}

fn sanitize_filename(original: &str) -> String {
    // Browsers on Windows may send full client paths.
    let original = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("upload");
    let mut base = slugify(stem);
    if base.is_empty() {
        base = "upload".to_string();
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty());

    match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}
