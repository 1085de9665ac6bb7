//! Status codes carried across redirects as `?status=<code>`.

use axum::response::Redirect;

use crate::presentation::views::FlashMessage;
use crate::util::bytes::format_bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FlashStatus {
    Added,
    Updated,
    Deleted,
    NotFound,
    InvalidType,
    EmptyFile,
    TooLarge,
    MissingTitle,
    MissingSummary,
    MissingBody,
    UploadFailed,
}

impl FlashStatus {
    pub(super) fn code(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::NotFound => "not_found",
            Self::InvalidType => "invalid_type",
            Self::EmptyFile => "empty_file",
            Self::TooLarge => "too_large",
            Self::MissingTitle => "missing_title",
            Self::MissingSummary => "missing_summary",
            Self::MissingBody => "missing_body",
            Self::UploadFailed => "upload_failed",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        let status = match code {
            "added" => Self::Added,
            "updated" => Self::Updated,
            "deleted" => Self::Deleted,
            "not_found" => Self::NotFound,
            "invalid_type" => Self::InvalidType,
            "empty_file" => Self::EmptyFile,
            "too_large" => Self::TooLarge,
            "missing_title" => Self::MissingTitle,
            "missing_summary" => Self::MissingSummary,
            "missing_body" => Self::MissingBody,
            "upload_failed" => Self::UploadFailed,
            _ => return None,
        };
        Some(status)
    }

    pub(super) fn missing_field(field: &str) -> Self {
        match field {
            "title" => Self::MissingTitle,
            "summary" => Self::MissingSummary,
            _ => Self::MissingBody,
        }
    }

    fn message(self, image_limit_bytes: u64) -> FlashMessage {
        match self {
            Self::Added => FlashMessage::success("News added"),
            Self::Updated => FlashMessage::success("News updated"),
            Self::Deleted => FlashMessage::success("News deleted"),
            Self::NotFound => FlashMessage::error("News not found"),
            Self::InvalidType => FlashMessage::error("File must be a valid type"),
            Self::EmptyFile => FlashMessage::error("File must not be empty"),
            Self::TooLarge => FlashMessage::error(format!(
                "File size must be less than {}",
                format_bytes(image_limit_bytes)
            )),
            Self::MissingTitle => FlashMessage::error("Title is required"),
            Self::MissingSummary => FlashMessage::error("Summary is required"),
            Self::MissingBody => FlashMessage::error("Body is required"),
            Self::UploadFailed => {
                FlashMessage::error("Could not store uploaded file, please retry later")
            }
        }
    }
}

/// Unknown codes yield no flash.
pub(super) fn flash_from_status(
    status: Option<&str>,
    image_limit_bytes: u64,
) -> Option<FlashMessage> {
    status
        .and_then(FlashStatus::from_code)
        .map(|status| status.message(image_limit_bytes))
}

pub(super) fn redirect_with(path: &str, status: FlashStatus) -> Redirect {
    Redirect::to(&format!("{path}?status={}", status.code()))
}
