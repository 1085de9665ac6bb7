use axum::{
    body::Body,
    extract::State,
    http::{
        HeaderMap, HeaderValue, Request, StatusCode,
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use crate::application::access::AccessAuthError;
use crate::application::error::HttpError;
use crate::domain::access::Capability;

use super::HttpState;

pub(super) const ACCESS_KEY_COOKIE: &str = "newsdesk_key";
const API_KEY_HEADER: &str = "x-api-key";
const SOURCE: &str = "infra::http::auth";

pub(super) async fn require_viewer(
    State(state): State<HttpState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    authorize(&state, Capability::ViewerOnly, request, next).await
}

pub(super) async fn require_admin(
    State(state): State<HttpState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    authorize(&state, Capability::AdminOnly, request, next).await
}

async fn authorize(
    state: &HttpState,
    needed: Capability,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_token(request.headers()) else {
        return auth_error(AccessAuthError::Missing);
    };

    let principal = match state.access.authenticate(&token).await {
        Ok(principal) => principal,
        Err(err) => return auth_error(err),
    };

    if let Err(err) = principal.requires(needed) {
        let mut response = auth_error(err);
        response.extensions_mut().insert(principal);
        return response;
    }

    debug!(
        target = "newsdesk::auth",
        key_id = %principal.key_id,
        role = principal.role.as_str(),
        "request authorized"
    );

    request.extensions_mut().insert(principal.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(principal);
    response
}

/// Bearer header first, then `x-api-key`, then the session cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.strip_prefix("Bearer "));
    let api_key = || {
        headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
    };

    bearer
        .or_else(api_key)
        .map(str::to_string)
        .or_else(|| {
            CookieJar::from_headers(headers)
                .get(ACCESS_KEY_COOKIE)
                .map(|cookie| cookie.value().to_string())
        })
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn auth_error(err: AccessAuthError) -> Response {
    let (status, public_message) = match &err {
        AccessAuthError::Missing => (StatusCode::UNAUTHORIZED, "Access key required"),
        AccessAuthError::Invalid => (StatusCode::UNAUTHORIZED, "Invalid access key"),
        AccessAuthError::Revoked => (StatusCode::UNAUTHORIZED, "Access key revoked"),
        AccessAuthError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient role"),
        AccessAuthError::Unavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Service temporarily unavailable",
        ),
    };

    let mut response = HttpError::from_error(SOURCE, status, public_message, &err).into_response();
    if status == StatusCode::UNAUTHORIZED {
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    response
}
