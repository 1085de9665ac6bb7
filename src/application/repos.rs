//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::access::{AccessKeyRecord, Role};
use crate::domain::news::NewsRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateNewsParams {
    pub title: String,
    pub summary: String,
    pub body: String,
    pub image: String,
}

/// Full overwrite of the mutable columns. `image: None` keeps the stored value.
#[derive(Debug, Clone)]
pub struct UpdateNewsParams {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub image: Option<String>,
}

#[async_trait]
pub trait NewsRepo: Send + Sync {
    /// All posts, newest `created_at` first.
    async fn list_news(&self) -> Result<Vec<NewsRecord>, RepoError>;

    async fn find_news(&self, id: i64) -> Result<Option<NewsRecord>, RepoError>;

    async fn ping(&self) -> Result<(), RepoError>;
}

#[async_trait]
pub trait NewsWriteRepo: Send + Sync {
    async fn create_news(&self, params: CreateNewsParams) -> Result<NewsRecord, RepoError>;

    /// Returns `None` when no row carries `params.id`.
    async fn update_news(&self, params: UpdateNewsParams)
    -> Result<Option<NewsRecord>, RepoError>;

    /// Returns whether a row was removed.
    async fn delete_news(&self, id: i64) -> Result<bool, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateAccessKeyParams {
    pub name: String,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub role: Role,
}

#[async_trait]
pub trait AccessKeysRepo: Send + Sync {
    async fn create_key(&self, params: CreateAccessKeyParams)
    -> Result<AccessKeyRecord, RepoError>;

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<AccessKeyRecord>, RepoError>;

    async fn revoke_by_prefix(&self, prefix: &str, at: OffsetDateTime) -> Result<bool, RepoError>;

    async fn update_last_used(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError>;
}

#[derive(Debug, Error)]
#[error("image storage failed: {0}")]
pub struct ImageStoreError(pub String);

/// Destination for accepted news images. Stored names are what `news.image` records.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn store_image(&self, original_name: &str, data: Bytes)
    -> Result<String, ImageStoreError>;

    async fn discard_image(&self, stored_name: &str) -> Result<(), ImageStoreError>;
}
