//! News service: validation guards in front of single-statement persistence.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::repos::{
    CreateNewsParams, ImageStore, ImageStoreError, NewsRepo, NewsWriteRepo, RepoError,
    UpdateNewsParams,
};
use crate::domain::news::{DEFAULT_IMAGE, NewsRecord};
use crate::domain::uploads::{IncomingImage, UploadPolicy, UploadRejection};

const LOG_TARGET: &str = "newsdesk::application::news";

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("`{0}` is required")]
    MissingField(&'static str),
    #[error(transparent)]
    Upload(#[from] UploadRejection),
    #[error("news post not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] ImageStoreError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateNewsCommand {
    pub title: String,
    pub summary: String,
    pub body: String,
    pub image: Option<IncomingImage>,
}

#[derive(Debug, Clone)]
pub struct UpdateNewsCommand {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub image: Option<IncomingImage>,
}

#[derive(Clone)]
pub struct NewsService {
    reader: Arc<dyn NewsRepo>,
    writer: Arc<dyn NewsWriteRepo>,
    images: Arc<dyn ImageStore>,
    policy: UploadPolicy,
}

impl NewsService {
    pub fn new(
        reader: Arc<dyn NewsRepo>,
        writer: Arc<dyn NewsWriteRepo>,
        images: Arc<dyn ImageStore>,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            reader,
            writer,
            images,
            policy,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub async fn list_news(&self) -> Result<Vec<NewsRecord>, NewsError> {
        Ok(self.reader.list_news().await?)
    }

    pub async fn load_news(&self, id: i64) -> Result<Option<NewsRecord>, NewsError> {
        Ok(self.reader.find_news(id).await?)
    }

    pub async fn health(&self) -> Result<(), RepoError> {
        self.reader.ping().await
    }

    pub async fn create_news(
        &self,
        actor: &str,
        command: CreateNewsCommand,
    ) -> Result<NewsRecord, NewsError> {
        ensure_content(&command.title, &command.summary, &command.body)?;
        self.check_image(command.image.as_ref())?;

        let stored = self.store_image(command.image).await?;
        let params = CreateNewsParams {
            title: command.title,
            summary: command.summary,
            body: command.body,
            image: stored.clone().unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
        };

        let record = match self.writer.create_news(params).await {
            Ok(record) => record,
            Err(err) => {
                self.discard_quietly(stored.as_deref()).await;
                return Err(err.into());
            }
        };

        counter!("newsdesk_news_created_total").increment(1);
        info!(
            target = LOG_TARGET,
            actor,
            news_id = record.id,
            image = %record.image,
            "news post created"
        );
        Ok(record)
    }

    pub async fn update_news(
        &self,
        actor: &str,
        command: UpdateNewsCommand,
    ) -> Result<NewsRecord, NewsError> {
        ensure_content(&command.title, &command.summary, &command.body)?;
        self.check_image(command.image.as_ref())?;

        let stored = self.store_image(command.image).await?;
        let params = UpdateNewsParams {
            id: command.id,
            title: command.title,
            summary: command.summary,
            body: command.body,
            image: stored.clone(),
        };

        let outcome = self.writer.update_news(params).await;
        let record = match outcome {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.discard_quietly(stored.as_deref()).await;
                return Err(NewsError::NotFound);
            }
            Err(err) => {
                self.discard_quietly(stored.as_deref()).await;
                return Err(err.into());
            }
        };

        counter!("newsdesk_news_updated_total").increment(1);
        info!(
            target = LOG_TARGET,
            actor,
            news_id = record.id,
            image = %record.image,
            replaced_image = stored.is_some(),
            "news post updated"
        );
        Ok(record)
    }

    pub async fn delete_news(&self, actor: &str, id: i64) -> Result<(), NewsError> {
        if !self.writer.delete_news(id).await? {
            return Err(NewsError::NotFound);
        }

        counter!("newsdesk_news_deleted_total").increment(1);
        info!(target = LOG_TARGET, actor, news_id = id, "news post deleted");
        Ok(())
    }

    fn check_image(&self, image: Option<&IncomingImage>) -> Result<(), NewsError> {
        let Some(image) = image else {
            return Ok(());
        };
        self.policy.check(image).map_err(|rejection| {
            counter!("newsdesk_upload_rejected_total").increment(1);
            NewsError::Upload(rejection)
        })
    }

    async fn store_image(&self, image: Option<IncomingImage>) -> Result<Option<String>, NewsError> {
        match image {
            Some(image) => {
                let name = self
                    .images
                    .store_image(&image.filename, image.data)
                    .await?;
                Ok(Some(name))
            }
            None => Ok(None),
        }
    }

    async fn discard_quietly(&self, stored: Option<&str>) {
        let Some(name) = stored else {
            return;
        };
        if let Err(err) = self.images.discard_image(name).await {
            warn!(
                target = LOG_TARGET,
                image = name,
                error = %err,
                "failed to roll back stored image"
            );
        }
    }
}

fn ensure_content(title: &str, summary: &str, body: &str) -> Result<(), NewsError> {
    ensure_non_empty(title, "title")?;
    ensure_non_empty(summary, "summary")?;
    ensure_non_empty(body, "body")
}

fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), NewsError> {
    if value.trim().is_empty() {
        return Err(NewsError::MissingField(field));
    }
    Ok(())
}
