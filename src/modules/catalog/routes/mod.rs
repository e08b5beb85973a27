//! Catalog routes and the response and extractor types the controllers share.

pub mod author;
pub mod book;

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use locallib_db::{DocumentStore, ObjectId};
use locallib_http::AppError;

use super::forms::RawForm;
use super::views::View;

/// The catalog route table, bound to the store.
pub fn router(store: DocumentStore) -> Router {
    Router::new()
        .route("/", get(book::index))
        .route("/authors", get(author::list))
        .route("/author/create", get(author::create_get).post(author::create_post))
        .route("/author/{id}", get(author::detail))
        .route("/author/{id}/delete", get(author::delete_get).post(author::delete_post))
        .route("/author/{id}/update", get(author::update_get).post(author::update_post))
        .route("/books", get(book::list))
        .route("/books/api", get(book::list_api))
        .route("/book/create", get(book::create_get).post(book::create_post))
        .route("/book/{id}", get(book::detail))
        .route("/book/{id}/delete", get(book::delete_get).post(book::delete_post))
        .route("/book/{id}/update", get(book::update_get).post(book::update_post))
        .route("/book/{id}/cover", get(book::cover))
        .with_state(store)
}

/// What a form-handling controller decided to do.
#[derive(Debug)]
pub enum Outcome {
    Render(View),
    Redirect(String),
}

impl From<View> for Outcome {
    fn from(view: View) -> Self {
        Outcome::Render(view)
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Render(view) => view.into_response(),
            Outcome::Redirect(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        }
    }
}

/// Parses a path identifier. A malformed id names no entity, so it is a 404.
pub(crate) fn parse_id(raw: &str, missing: &'static str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::not_found(missing))
}

/// Identifier posted by a delete confirmation form, falling back to the path.
pub(crate) fn posted_id(form: &RawForm, field: &str, path_id: &str) -> Option<ObjectId> {
    let raw = form
        .value(field)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(path_id);
    ObjectId::parse_str(raw).ok()
}

/// Urlencoded form bodies. A rejected body goes through the HTML error page.
impl<S> FromRequest<S> for RawForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        Ok(RawForm::from(fields))
    }
}

/// An uploaded cover image.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// A book form body, urlencoded or multipart. In multipart bodies the `cover`
/// part is the optional upload; an empty part counts as no upload.
#[derive(Debug, Clone, Default)]
pub struct BookSubmission {
    pub form: RawForm,
    pub cover: Option<Upload>,
}

const COVER_FIELD: &str = "cover";

impl<S> FromRequest<S> for BookSubmission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if !is_multipart {
            return Ok(Self {
                form: RawForm::from_request(req, state).await?,
                cover: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;

        let mut fields = Vec::new();
        let mut cover = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == COVER_FIELD {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(e.body_text()))?;
                if !bytes.is_empty() {
                    cover = Some(Upload {
                        bytes: bytes.to_vec(),
                        content_type,
                    });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::bad_request(e.body_text()))?;
                fields.push((name, value));
            }
        }

        Ok(Self {
            form: RawForm::from(fields),
            cover,
        })
    }
}
