//! `/news` pages: listing, single post, and the admin create/edit/delete flow.

mod flash;
mod form;

use axum::{
    Extension,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Multipart;
use serde::Deserialize;
use tracing::{error, warn};

use crate::application::access::Principal;
use crate::application::error::HttpError;
use crate::application::news::{CreateNewsCommand, NewsError, UpdateNewsCommand};
use crate::domain::access::Role;
use crate::domain::news::NewsRecord;
use crate::domain::uploads::UploadRejection;
use crate::presentation::news::{
    NewsDeleteTemplate, NewsDetailView, NewsFormTemplate, NewsFormView, NewsListTemplate,
    NewsListView, NewsRowView, NewsShowTemplate,
};
use crate::presentation::views::{
    FlashMessage, LayoutChrome, LayoutContext, render_not_found_response,
    render_template_response,
};
use crate::util::bytes::format_bytes;

use self::flash::{FlashStatus, flash_from_status, redirect_with};
use self::form::{NewsForm, NewsFormError, read_news_form};

use super::{HttpState, repo_error_to_http};

const LOG_TARGET: &str = "newsdesk::http::news";
const LIST_PATH: &str = "/news/";
const CREATE_PATH: &str = "/news/create";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct StatusQuery {
    status: Option<String>,
}

pub(super) async fn list(
    State(state): State<HttpState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<StatusQuery>,
) -> Response {
    let records = match state.news.list_news().await {
        Ok(records) => records,
        Err(err) => return news_error_response("infra::http::news::list", err),
    };

    let tz = state.site.timezone;
    let content = NewsListView {
        items: records
            .iter()
            .map(|record| NewsRowView::from_record(record, tz))
            .collect(),
    };
    let view = LayoutContext::new(
        chrome(&state, &principal),
        "News",
        flash(&state, &query),
        content,
    );
    render_template_response(NewsListTemplate { view }, StatusCode::OK)
}

pub(super) async fn show(
    State(state): State<HttpState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Response {
    let record = match load_record(&state, &id, "infra::http::news::show").await {
        Ok(Some(record)) => record,
        Ok(None) => return render_not_found_response(chrome(&state, &principal)),
        Err(response) => return response,
    };

    let page_title = record.title.clone();
    let content = NewsDetailView::from_record(record, state.site.timezone);
    let view = LayoutContext::new(chrome(&state, &principal), page_title, None, content);
    render_template_response(NewsShowTemplate { view }, StatusCode::OK)
}

pub(super) async fn create_form(
    State(state): State<HttpState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<StatusQuery>,
) -> Response {
    let content = NewsFormView::create(image_limit_label(&state));
    let view = LayoutContext::new(
        chrome(&state, &principal),
        "Add news",
        flash(&state, &query),
        content,
    );
    render_template_response(NewsFormTemplate { view }, StatusCode::OK)
}

pub(super) async fn create(
    State(state): State<HttpState>,
    Extension(principal): Extension<Principal>,
    mut multipart: Multipart,
) -> Response {
    let form = match read_news_form(&mut multipart).await {
        Ok(form) => form,
        Err(err) => return form_error_response(CREATE_PATH, err),
    };

    let NewsForm {
        title,
        summary,
        body,
        image,
    } = form;
    let command = CreateNewsCommand {
        title,
        summary,
        body,
        image,
    };

    match state.news.create_news(&principal.name, command).await {
        Ok(_) => redirect_with(LIST_PATH, FlashStatus::Added).into_response(),
        Err(err) => submission_error_response("infra::http::news::create", CREATE_PATH, err),
    }
}

pub(super) async fn edit_form(
    State(state): State<HttpState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Response {
    let record = match load_record(&state, &id, "infra::http::news::edit_form").await {
        Ok(Some(record)) => record,
        Ok(None) => return render_not_found_response(chrome(&state, &principal)),
        Err(response) => return response,
    };

    let content = NewsFormView::edit(&record, image_limit_label(&state));
    let view = LayoutContext::new(
        chrome(&state, &principal),
        "Edit news",
        flash(&state, &query),
        content,
    );
    render_template_response(NewsFormTemplate { view }, StatusCode::OK)
}

pub(super) async fn edit(
    State(state): State<HttpState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return redirect_with(LIST_PATH, FlashStatus::NotFound).into_response();
    };
    let edit_path = format!("/news/edit/{id}");

    let form = match read_news_form(&mut multipart).await {
        Ok(form) => form,
        Err(err) => return form_error_response(&edit_path, err),
    };

    let NewsForm {
        title,
        summary,
        body,
        image,
    } = form;
    let command = UpdateNewsCommand {
        id,
        title,
        summary,
        body,
        image,
    };

    match state.news.update_news(&principal.name, command).await {
        Ok(_) => redirect_with(LIST_PATH, FlashStatus::Updated).into_response(),
        Err(err) => submission_error_response("infra::http::news::edit", &edit_path, err),
    }
}

pub(super) async fn delete_confirm(
    State(state): State<HttpState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Response {
    let record = match load_record(&state, &id, "infra::http::news::delete_confirm").await {
        Ok(Some(record)) => record,
        Ok(None) => return render_not_found_response(chrome(&state, &principal)),
        Err(response) => return response,
    };

    let content = NewsDetailView::from_record(record, state.site.timezone);
    let view = LayoutContext::new(chrome(&state, &principal), "Delete news", None, content);
    render_template_response(NewsDeleteTemplate { view }, StatusCode::OK)
}

pub(super) async fn delete(
    State(state): State<HttpState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return redirect_with(LIST_PATH, FlashStatus::NotFound).into_response();
    };

    match state.news.delete_news(&principal.name, id).await {
        Ok(()) => redirect_with(LIST_PATH, FlashStatus::Deleted).into_response(),
        Err(NewsError::NotFound) => redirect_with(LIST_PATH, FlashStatus::NotFound).into_response(),
        Err(err) => news_error_response("infra::http::news::delete", err),
    }
}

fn chrome(state: &HttpState, principal: &Principal) -> LayoutChrome {
    LayoutChrome {
        site_title: state.site.title.clone(),
        viewer_name: principal.name.clone(),
        is_admin: principal.role == Role::Admin,
    }
}

fn flash(state: &HttpState, query: &StatusQuery) -> Option<FlashMessage> {
    flash_from_status(
        query.status.as_deref(),
        state.news.policy().max_image_bytes(),
    )
}

fn image_limit_label(state: &HttpState) -> String {
    format_bytes(state.news.policy().max_image_bytes())
}

/// Ids that do not parse can never match a row.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

async fn load_record(
    state: &HttpState,
    raw_id: &str,
    source: &'static str,
) -> Result<Option<NewsRecord>, Response> {
    let Some(id) = parse_id(raw_id) else {
        return Ok(None);
    };
    state
        .news
        .load_news(id)
        .await
        .map_err(|err| news_error_response(source, err))
}

fn form_error_response(back_to: &str, err: NewsFormError) -> Response {
    match err {
        NewsFormError::TooLarge => {
            warn!(
                target = LOG_TARGET,
                path = back_to,
                "submission exceeded the request size limit"
            );
            redirect_with(back_to, FlashStatus::TooLarge).into_response()
        }
        NewsFormError::Malformed => HttpError::new(
            "infra::http::news::read_news_form",
            StatusCode::BAD_REQUEST,
            "Form data was invalid",
            "multipart payload could not be read",
        )
        .into_response(),
    }
}

/// Validation failures send the author back to the form they came from.
fn submission_error_response(source: &'static str, back_to: &str, err: NewsError) -> Response {
    let status = match err {
        NewsError::MissingField(field) => FlashStatus::missing_field(field),
        NewsError::Upload(UploadRejection::InvalidType) => FlashStatus::InvalidType,
        NewsError::Upload(UploadRejection::Empty) => FlashStatus::EmptyFile,
        NewsError::Upload(UploadRejection::TooLarge { .. }) => FlashStatus::TooLarge,
        NewsError::NotFound => return redirect_with(LIST_PATH, FlashStatus::NotFound).into_response(),
        NewsError::Storage(storage) => {
            error!(target = LOG_TARGET, error = %storage, "failed to store uploaded image");
            FlashStatus::UploadFailed
        }
        NewsError::Repo(repo) => return repo_error_to_http(source, repo).into_response(),
    };

    warn!(
        target = LOG_TARGET,
        path = back_to,
        reason = status.code(),
        "news submission rejected"
    );
    redirect_with(back_to, status).into_response()
}

fn news_error_response(source: &'static str, err: NewsError) -> Response {
    match err {
        NewsError::Repo(repo) => repo_error_to_http(source, repo).into_response(),
        NewsError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "News not found",
            "news post not found",
        )
        .into_response(),
        other => HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            &other,
        )
        .into_response(),
    }
}
