use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use domains::DomainError;

use crate::views::{Layout, MessagePage};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Domain(err) => match err {
                DomainError::NotAuthenticated => StatusCode::UNAUTHORIZED,
                DomainError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DomainError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
                DomainError::NotFound(..) => StatusCode::NOT_FOUND,
                DomainError::Conflict(_) => StatusCode::CONFLICT,
            },
            ApiError::Render(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Domain(err) => err.user_message(),
            ApiError::Render(_) | ApiError::Internal(_) => {
                "Something went wrong on our side. Please try again.".to_string()
            }
        }
    }

    fn heading(&self) -> &'static str {
        match self.status_code() {
            StatusCode::NOT_FOUND => "Page not found",
            StatusCode::FORBIDDEN => "Not allowed",
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => "Please check your input",
            _ => "Something went wrong",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, ApiError::Domain(DomainError::NotAuthenticated)) {
            return Redirect::to("/login").into_response();
        }

        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "internal server error");
        } else {
            tracing::info!("returning error to client: {self}");
        }

        let page = MessagePage::new(Layout::new(self.heading(), None), self.heading(), &self.message());
        match page.render() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(err) => {
                tracing::error!(error = %err, "failed to render error page");
                (status, self.message()).into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (DomainError::validation("empty"), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::unavailable("down"), StatusCode::SERVICE_UNAVAILABLE),
            (DomainError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (DomainError::not_found("essay", "x"), StatusCode::NOT_FOUND),
            (DomainError::Conflict("dup".into()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_unauthenticated_redirects_to_login() {
        let response = ApiError::from(DomainError::NotAuthenticated).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");
    }
}
