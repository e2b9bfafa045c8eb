use axum::extract::{OriginalUri, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use domains::DomainError;

use super::html;
use crate::error::{ApiError, ApiResult};
use crate::extractors::Viewer;
use crate::state::AppState;
use crate::views::{Layout, MessagePage};

const ABOUT: &str = "Marginalia is a place for slow reading. We publish long essays on economics, \
history, society, geopolitics, philosophy and technology, written to be read in one sitting and \
thought about for much longer.

Every essay is open to everyone. Conversation around it is kept among signed-in readers: sign in \
to read the replies under a comment and to join the discussion.

Write to hello@marginalia.com with ideas, corrections or just to say hello.";

const TERMS: &str = "By using Marginalia you agree to comment in good faith. You remain the \
author of what you write, and you can delete your own comments at any time; deleted comments are \
replaced by a placeholder so that the replies around them keep their context.

Essays are published for personal reading. Please ask before republishing them.";

const PRIVACY: &str = "We store the email address you sign up with, a salted hash of your \
password and the comments you post. Newsletter addresses are kept only to send the newsletter.

We never sell or share this data. Ask us and we will delete your account.";

const COOKIES: &str = "Marginalia sets a single cookie: the session cookie that keeps you signed \
in. It is HttpOnly, scoped to this site and expires with your session.

There are no tracking or advertising cookies.";

fn page(viewer: &Viewer, heading: &str, body: &str) -> ApiResult<Html<String>> {
    html(MessagePage::new(Layout::new(heading, viewer.identity.as_ref()), heading, body))
}

pub async fn about(viewer: Viewer) -> ApiResult<Html<String>> {
    page(&viewer, "About Marginalia", ABOUT)
}

pub async fn terms(viewer: Viewer) -> ApiResult<Html<String>> {
    page(&viewer, "Terms of use", TERMS)
}

pub async fn privacy(viewer: Viewer) -> ApiResult<Html<String>> {
    page(&viewer, "Privacy", PRIVACY)
}

pub async fn cookies(viewer: Viewer) -> ApiResult<Html<String>> {
    page(&viewer, "Cookies", COOKIES)
}

/// Liveness check.
pub async fn health() -> &'static str {
    "ok"
}

pub async fn metrics(State(state): State<AppState>) -> ApiResult<Response> {
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::Internal(format!("encoding metrics: {e}")))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/openmetrics-text; version=1.0.0; charset=utf-8")],
        body,
    )
        .into_response())
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::Domain(DomainError::not_found("page", uri.path()))
}
