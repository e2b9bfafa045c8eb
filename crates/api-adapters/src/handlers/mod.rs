//! # Handlers
//!
//! This module coordinates the flow between HTTP requests and the services.
//! Every mutation answers with a 303 so a reload never re-submits a form.

pub mod auth;
pub mod comments;
pub mod essays;
pub mod newsletter;
pub mod pages;

use askama::Template;
use axum::response::Html;

use crate::error::ApiResult;

pub(crate) fn html(page: impl Template) -> ApiResult<Html<String>> {
    Ok(Html(page.render()?))
}

/// Only same-site paths are accepted as post-login destinations.
pub(crate) fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}
