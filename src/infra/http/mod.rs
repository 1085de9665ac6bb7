mod auth;
mod middleware;
mod news;

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};

use crate::application::access::AccessKeyService;
use crate::application::error::{ErrorReport, HttpError};
use crate::application::news::NewsService;
use crate::application::repos::RepoError;
use crate::config::SiteSettings;

use self::auth::{require_admin, require_viewer};
use self::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub news: Arc<NewsService>,
    pub access: Arc<AccessKeyService>,
    pub site: Arc<SiteSettings>,
    /// Transport ceiling for multipart submissions.
    pub upload_limit_bytes: usize,
}

pub fn build_router(state: HttpState) -> Router {
    let body_limit = state.upload_limit_bytes;

    let viewer_routes = Router::new()
        .route("/news", get(news::list))
        .route("/news/", get(news::list))
        .route("/news/show/{id}", get(news::show))
        .route_layer(from_fn_with_state(state.clone(), require_viewer));

    let admin_routes = Router::new()
        .route(
            "/news/create",
            get(news::create_form).post(news::create).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/news/edit/{id}",
            get(news::edit_form).post(news::edit).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/news/delete/{id}",
            get(news::delete_confirm).post(news::delete),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/", get(root_redirect))
        .route("/_health/db", get(db_health))
        .merge(viewer_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(from_fn(log_responses))
        .layer(from_fn(set_request_context))
}

async fn root_redirect() -> Redirect {
    Redirect::to("/news/")
}

async fn db_health(State(state): State<HttpState>) -> Response {
    match state.news.health().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

/// Map a repository error to a consistent HTTP error response.
pub fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    match err {
        RepoError::Duplicate { constraint } => {
            HttpError::new(source, StatusCode::CONFLICT, "Duplicate record", constraint)
        }
        RepoError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "Resource not found",
            "resource not found",
        ),
        RepoError::InvalidInput { message } => {
            HttpError::new(source, StatusCode::BAD_REQUEST, "Invalid input", message)
        }
        RepoError::Timeout => HttpError::new(
            source,
            StatusCode::SERVICE_UNAVAILABLE,
            "Database timeout",
            "Database timeout",
        ),
        RepoError::Persistence(message) => HttpError::new(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Persistence error",
            message,
        ),
    }
}
