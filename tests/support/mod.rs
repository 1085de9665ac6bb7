#![allow(dead_code)]

use std::collections::BTreeMap;
use std::num::NonZeroU64;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use chrono_tz::Tz;
use http_body_util::BodyExt;
use time::{Duration, OffsetDateTime, macros::datetime};
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use newsdesk::application::access::AccessKeyService;
use newsdesk::application::news::NewsService;
use newsdesk::application::repos::{
    AccessKeysRepo, CreateAccessKeyParams, CreateNewsParams, NewsRepo, NewsWriteRepo, RepoError,
    UpdateNewsParams,
};
use newsdesk::config::SiteSettings;
use newsdesk::domain::access::{AccessKeyRecord, Role};
use newsdesk::domain::news::NewsRecord;
use newsdesk::domain::uploads::UploadPolicy;
use newsdesk::infra::http::{HttpState, build_router};
use newsdesk::infra::uploads::UploadStorage;

pub const BOUNDARY: &str = "newsdesk-test-boundary";
pub const IMAGE_LIMIT_BYTES: u64 = 64;
pub const REQUEST_LIMIT_BYTES: usize = 2048;

#[derive(Default)]
pub struct MemoryNews {
    pub rows: Mutex<BTreeMap<i64, NewsRecord>>,
}

impl MemoryNews {
    pub async fn seed(&self, count: i64) {
        let mut rows = self.rows.lock().await;
        for id in 1..=count {
            rows.insert(
                id,
                NewsRecord {
                    id,
                    title: format!("Post {id}"),
                    summary: format!("Summary {id}"),
                    body: format!("Body {id}"),
                    image: "default.jpg".to_string(),
                    created_at: datetime!(2025-01-06 09:30:00 UTC) + Duration::hours(id),
                },
            );
        }
    }

    pub async fn get(&self, id: i64) -> Option<NewsRecord> {
        self.rows.lock().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }
}

#[async_trait]
impl NewsRepo for MemoryNews {
    async fn list_news(&self) -> Result<Vec<NewsRecord>, RepoError> {
        let mut rows: Vec<_> = self.rows.lock().await.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_news(&self, id: i64) -> Result<Option<NewsRecord>, RepoError> {
        Ok(self.rows.lock().await.get(&id).cloned())
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[async_trait]
impl NewsWriteRepo for MemoryNews {
    async fn create_news(&self, params: CreateNewsParams) -> Result<NewsRecord, RepoError> {
        let mut rows = self.rows.lock().await;
        let id = rows.keys().next_back().copied().unwrap_or(0) + 1;
        let record = NewsRecord {
            id,
            title: params.title,
            summary: params.summary,
            body: params.body,
            image: params.image,
            created_at: OffsetDateTime::now_utc(),
        };
        rows.insert(id, record.clone());
        Ok(record)
    }

    async fn update_news(&self, params: UpdateNewsParams) -> Result<Option<NewsRecord>, RepoError> {
        let mut rows = self.rows.lock().await;
        let Some(row) = rows.get_mut(&params.id) else {
            return Ok(None);
        };
        row.title = params.title;
        row.summary = params.summary;
        row.body = params.body;
        if let Some(image) = params.image {
            row.image = image;
        }
        Ok(Some(row.clone()))
    }

    async fn delete_news(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.rows.lock().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryKeys {
    keys: Mutex<Vec<AccessKeyRecord>>,
    offline: AtomicBool,
}

impl MemoryKeys {
    /// Make every later lookup fail as if the database stopped answering.
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccessKeysRepo for MemoryKeys {
    async fn create_key(&self, params: CreateAccessKeyParams) -> Result<AccessKeyRecord, RepoError> {
        let record = AccessKeyRecord {
            id: Uuid::new_v4(),
            name: params.name,
            prefix: params.prefix,
            hashed_secret: params.hashed_secret,
            role: params.role,
            revoked_at: None,
            last_used_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        self.keys.lock().await.push(record.clone());
        Ok(record)
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<AccessKeyRecord>, RepoError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        Ok(self
            .keys
            .lock()
            .await
            .iter()
            .find(|key| key.prefix == prefix)
            .cloned())
    }

    async fn revoke_by_prefix(&self, prefix: &str, at: OffsetDateTime) -> Result<bool, RepoError> {
        let mut keys = self.keys.lock().await;
        match keys.iter_mut().find(|key| key.prefix == prefix) {
            Some(key) => {
                key.revoked_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_last_used(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        if let Some(key) = self.keys.lock().await.iter_mut().find(|key| key.id == id) {
            key.last_used_at = Some(at);
        }
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub news: Arc<MemoryNews>,
    pub access: Arc<AccessKeyService>,
    pub keys: Arc<MemoryKeys>,
    pub uploads: tempfile::TempDir,
    pub admin_token: String,
    pub viewer_token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let uploads = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(uploads.path().to_path_buf()).expect("upload storage");
        let news = Arc::new(MemoryNews::default());
        let keys = Arc::new(MemoryKeys::default());
        let access = Arc::new(AccessKeyService::new(keys.clone()));

        let service = NewsService::new(
            news.clone(),
            news.clone(),
            Arc::new(storage),
            UploadPolicy::new(NonZeroU64::new(IMAGE_LIMIT_BYTES).expect("non-zero")),
        );

        let state = HttpState {
            news: Arc::new(service),
            access: access.clone(),
            site: Arc::new(SiteSettings {
                title: "Newsroom".to_string(),
                timezone: Tz::UTC,
            }),
            upload_limit_bytes: REQUEST_LIMIT_BYTES,
        };

        let admin_token = access
            .issue("editor", Role::Admin)
            .await
            .expect("admin key")
            .token;
        let viewer_token = access
            .issue("reader", Role::Viewer)
            .await
            .expect("viewer key")
            .token;

        Self {
            router: build_router(state),
            news,
            access,
            keys,
            uploads,
            admin_token,
            viewer_token,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub fn stored_files(&self) -> Vec<String> {
        list_files(self.uploads.path())
    }
}

fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read uploads dir")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

pub fn post_empty(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

pub struct FilePart<'a> {
    pub filename: &'a str,
    pub content_type: &'a str,
    pub data: Vec<u8>,
}

pub fn multipart_body(fields: &[(&str, &str)], file: Option<FilePart<'_>>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.filename, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(&file.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn post_multipart(uri: &str, token: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub fn jpeg(len: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.resize(len.max(4), 0x11);
    data
}
