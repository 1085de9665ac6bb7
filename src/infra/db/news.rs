use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::application::repos::{
    CreateNewsParams, NewsRepo, NewsWriteRepo, RepoError, UpdateNewsParams,
};
use crate::domain::news::NewsRecord;

use super::{PostgresRepositories, map_sqlx_error};

const NEWS_COLUMNS: &str = "id, title, summary, body, image, created_at";

#[derive(Debug, FromRow)]
struct NewsRow {
    id: i64,
    title: String,
    summary: String,
    body: String,
    image: String,
    created_at: OffsetDateTime,
}

impl From<NewsRow> for NewsRecord {
    fn from(row: NewsRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            summary: row.summary,
            body: row.body,
            image: row.image,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl NewsRepo for PostgresRepositories {
    async fn list_news(&self) -> Result<Vec<NewsRecord>, RepoError> {
        let sql = format!("SELECT {NEWS_COLUMNS} FROM news ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, NewsRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(NewsRecord::from).collect())
    }

    async fn find_news(&self, id: i64) -> Result<Option<NewsRecord>, RepoError> {
        let sql = format!("SELECT {NEWS_COLUMNS} FROM news WHERE id = $1");
        let row = sqlx::query_as::<_, NewsRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(NewsRecord::from))
    }

    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl NewsWriteRepo for PostgresRepositories {
    async fn create_news(&self, params: CreateNewsParams) -> Result<NewsRecord, RepoError> {
        let sql = format!(
            "INSERT INTO news (title, summary, body, image) VALUES ($1, $2, $3, $4) \
             RETURNING {NEWS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, NewsRow>(&sql)
            .bind(params.title)
            .bind(params.summary)
            .bind(params.body)
            .bind(params.image)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_news(
        &self,
        params: UpdateNewsParams,
    ) -> Result<Option<NewsRecord>, RepoError> {
        // `image` stays untouched when no replacement was uploaded.
        let sql = format!(
            "UPDATE news SET title = $2, summary = $3, body = $4, image = COALESCE($5, image) \
             WHERE id = $1 RETURNING {NEWS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, NewsRow>(&sql)
            .bind(params.id)
            .bind(params.title)
            .bind(params.summary)
            .bind(params.body)
            .bind(params.image)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(NewsRecord::from))
    }

    async fn delete_news(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM news WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
