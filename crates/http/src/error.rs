//! Centralized error handling for the HTTP layer
//!
//! Every failure a controller does not handle inline ends up here and is
//! rendered as an HTML error page. Details are only shown outside production.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use locallib_db::StoreError;
use locallib_kernel::Environment;
use maud::{html, Markup, DOCTYPE};
use once_cell::sync::OnceCell;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

static SHOW_DETAILS: OnceCell<bool> = OnceCell::new();

/// Decide once per process whether error pages include error details.
///
/// Without a call, details follow `debug_assertions`.
pub fn configure(environment: Environment) {
    let _ = SHOW_DETAILS.set(show_details_for(environment));
}

/// Error details are hidden in production.
pub fn show_details_for(environment: Environment) -> bool {
    !environment.is_production()
}

fn show_details() -> bool {
    *SHOW_DETAILS.get_or_init(|| cfg!(debug_assertions))
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "not_found",
            AppError::BadRequest { .. } => "bad_request",
            AppError::Store(_) => "store_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let timestamp = OffsetDateTime::now_utc().to_string();
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                error_code = self.code(),
                status_code = %status.as_u16(),
                error = %self,
                "request failed"
            );
        } else {
            tracing::warn!(
                error_id = %error_id,
                error_code = self.code(),
                status_code = %status.as_u16(),
                error = %self,
                "request rejected"
            );
        }

        let page = self.render_page(show_details(), &error_id, &timestamp);
        (status, Html(page.into_string())).into_response()
    }
}

impl AppError {
    fn render_page(&self, show_details: bool, error_id: &Uuid, timestamp: &str) -> Markup {
        let detail = show_details.then(|| format!("{:#?}", self));
        error_page(self.status(), &self.to_string(), detail.as_deref(), error_id, timestamp)
    }
}

fn error_page(status: StatusCode, message: &str, detail: Option<&str>, error_id: &Uuid, timestamp: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Local Library - Error" }
            }
            body {
                h1 { (message) }
                h2 { (status.as_u16()) }
                @if let Some(detail) = detail {
                    pre { (detail) }
                }
                p class="error-ref" { "Reference " (error_id) " at " (timestamp) }
                p { a href="/catalog" { "Back to the catalog" } }
            }
        }
    }
}

/// Fallback for paths no route matches
pub async fn not_found_fallback() -> AppError {
    AppError::not_found("Not Found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_error_response_mapping() {
        let error = AppError::not_found("Author not found");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_store_error_mapping() {
        let error = AppError::from(StoreError::Backend("socket closed".to_string()));
        assert_eq!(error.to_string(), "backend error: socket closed");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_error_mapping() {
        let internal_error = anyhow::anyhow!("template missing");
        let error = AppError::Internal(internal_error);
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_bad_request_mapping() {
        assert_eq!(AppError::bad_request("malformed form").status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_page_shows_message_and_status() {
        let id = Uuid::new_v4();
        let page = error_page(StatusCode::NOT_FOUND, "Book not found", Some("NotFound"), &id, "now")
            .into_string();
        assert!(page.contains("<h1>Book not found</h1>"));
        assert!(page.contains("<h2>404</h2>"));
        assert!(page.contains("<pre>NotFound</pre>"));

        let hidden = error_page(StatusCode::NOT_FOUND, "Book not found", None, &id, "now").into_string();
        assert!(!hidden.contains("<pre>"));
    }

    #[test]
    fn test_details_only_outside_production() {
        assert!(show_details_for(Environment::Local));
        assert!(show_details_for(Environment::Staging));
        assert!(!show_details_for(Environment::Production));
    }

    #[test]
    fn test_store_error_detail_follows_environment() {
        let id = Uuid::new_v4();
        let error = AppError::from(StoreError::Backend("socket closed".to_string()));

        let local = error
            .render_page(show_details_for(Environment::Local), &id, "now")
            .into_string();
        assert!(local.contains("<h1>backend error: socket closed</h1>"));
        assert!(local.contains("<h2>500</h2>"));
        assert!(local.contains("<pre>Store("));

        let production = error
            .render_page(show_details_for(Environment::Production), &id, "now")
            .into_string();
        assert!(production.contains("<h1>backend error: socket closed</h1>"));
        assert!(!production.contains("<pre>"));
        assert!(!production.contains("Backend("));
    }
}
