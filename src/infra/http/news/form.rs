//! Multipart reader for the create/edit submissions.

use axum::http::StatusCode;
use axum_extra::extract::Multipart;
use tracing::warn;

use crate::domain::uploads::IncomingImage;

const LOG_TARGET: &str = "newsdesk::http::news";
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Default)]
pub(super) struct NewsForm {
    pub title: String,
    pub summary: String,
    pub body: String,
    pub image: Option<IncomingImage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum NewsFormError {
    /// The request body hit the transport limit.
    TooLarge,
    Malformed,
}

/// Drain the multipart body. Missing text fields read as empty; unknown fields are skipped.
pub(super) async fn read_news_form(multipart: &mut Multipart) -> Result<NewsForm, NewsFormError> {
    let mut form = NewsForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return Err(classify(err.status(), &err)),
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" | "summary" | "body" => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| classify(err.status(), &err))?;
                match name.as_str() {
                    "title" => form.title = value,
                    "summary" => form.summary = value,
                    _ => form.body = value,
                }
            }
            IMAGE_FIELD => {
                let filename = field.file_name().unwrap_or_default().trim().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| classify(err.status(), &err))?;

                // Browsers submit an empty part when no file was chosen.
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                form.image = Some(IncomingImage {
                    filename,
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

fn classify(status: StatusCode, err: &dyn std::fmt::Display) -> NewsFormError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return NewsFormError::TooLarge;
    }
    warn!(
        target = LOG_TARGET,
        status = status.as_u16(),
        error = %err,
        "failed to read multipart payload"
    );
    NewsFormError::Malformed
}
