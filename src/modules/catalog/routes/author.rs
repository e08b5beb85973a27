//! Author controllers.

use axum::extract::{Path, State};
use locallib_db::{DocumentStore, Filter, ObjectId, Query, SortDirection, StoreResult};
use locallib_http::AppError;

use super::{parse_id, posted_id, Outcome};
use crate::modules::catalog::forms::{author_submission, RawForm, Submission};
use crate::modules::catalog::models::{Author, Book};
use crate::modules::catalog::views::View;

const AUTHOR_NOT_FOUND: &str = "Author not found";
const CREATE_TITLE: &str = "Create Author";
const UPDATE_TITLE: &str = "Update Author";
const AUTHOR_LIST_URL: &str = "/catalog/authors";

/// Fetches an author and the books referencing it concurrently.
async fn author_with_books(store: &DocumentStore, id: ObjectId) -> StoreResult<(Option<Author>, Vec<Book>)> {
    let authors = store.collection::<Author>();
    let books = store.collection::<Book>();
    tokio::try_join!(
        authors.find_by_id(&id),
        books.find_all(Query::filtered(Filter::eq("author", id)))
    )
}

pub async fn list(State(store): State<DocumentStore>) -> Result<View, AppError> {
    let query = Query::builder().sort("family_name", SortDirection::Asc).build();
    let authors = store.collection::<Author>().find_all(query).await?;
    Ok(View::AuthorList { authors })
}

pub async fn detail(State(store): State<DocumentStore>, Path(id): Path<String>) -> Result<View, AppError> {
    let id = parse_id(&id, AUTHOR_NOT_FOUND)?;
    let (author, books) = author_with_books(&store, id).await?;
    let author = author.ok_or_else(|| AppError::not_found(AUTHOR_NOT_FOUND))?;
    Ok(View::AuthorDetail { author, books })
}

pub async fn create_get() -> View {
    View::AuthorForm {
        title: CREATE_TITLE,
        author: None,
        errors: Vec::new(),
    }
}

pub async fn create_post(
    State(store): State<DocumentStore>,
    form: RawForm,
) -> Result<Outcome, AppError> {
    let Submission { value, errors } = author_submission(&form);
    let author = value.into_author(ObjectId::new());

    if !errors.is_empty() {
        return Ok(View::AuthorForm {
            title: CREATE_TITLE,
            author: Some(author),
            errors,
        }
        .into());
    }

    let authors = store.collection::<Author>();
    let same_name = Filter::eq("first_name", author.first_name.as_str())
        .and(Filter::eq("family_name", author.family_name.as_str()));
    if let Some(existing) = authors.find_one(same_name).await? {
        tracing::debug!(author_id = %existing.id, "author already exists");
        return Ok(Outcome::Redirect(existing.url()));
    }

    authors.insert(&author).await?;
    tracing::info!(author_id = %author.id, "author created");
    Ok(Outcome::Redirect(author.url()))
}

pub async fn delete_get(State(store): State<DocumentStore>, Path(id): Path<String>) -> Result<Outcome, AppError> {
    let id = parse_id(&id, AUTHOR_NOT_FOUND)?;
    let (author, books) = author_with_books(&store, id).await?;
    let Some(author) = author else {
        return Ok(Outcome::Redirect(AUTHOR_LIST_URL.to_string()));
    };
    Ok(View::AuthorDelete {
        author: Some(author),
        books,
    }
    .into())
}

pub async fn delete_post(
    State(store): State<DocumentStore>,
    Path(path_id): Path<String>,
    form: RawForm,
) -> Result<Outcome, AppError> {
    let id = posted_id(&form, "authorid", &path_id).ok_or_else(|| AppError::not_found(AUTHOR_NOT_FOUND))?;

    let (author, books) = author_with_books(&store, id).await?;
    if !books.is_empty() {
        tracing::info!(author_id = %id, dependents = books.len(), "author delete blocked");
        return Ok(View::AuthorDelete { author, books }.into());
    }

    store.collection::<Author>().delete_by_id(&id).await?;
    tracing::info!(author_id = %id, "author deleted");
    Ok(Outcome::Redirect(AUTHOR_LIST_URL.to_string()))
}

pub async fn update_get(State(store): State<DocumentStore>, Path(id): Path<String>) -> Result<View, AppError> {
    let id = parse_id(&id, AUTHOR_NOT_FOUND)?;
    let author = store
        .collection::<Author>()
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(AUTHOR_NOT_FOUND))?;
    Ok(View::AuthorForm {
        title: UPDATE_TITLE,
        author: Some(author),
        errors: Vec::new(),
    })
}

pub async fn update_post(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
    form: RawForm,
) -> Result<Outcome, AppError> {
    let id = parse_id(&id, AUTHOR_NOT_FOUND)?;
    let Submission { value, errors } = author_submission(&form);
    let author = value.into_author(id);

    if !errors.is_empty() {
        if store.collection::<Author>().find_by_id(&id).await?.is_none() {
            return Err(AppError::not_found(AUTHOR_NOT_FOUND));
        }
        return Ok(View::AuthorForm {
            title: UPDATE_TITLE,
            author: Some(author),
            errors,
        }
        .into());
    }

    if !store.collection::<Author>().update_by_id(&id, &author).await? {
        return Err(AppError::not_found(AUTHOR_NOT_FOUND));
    }
    tracing::info!(author_id = %id, "author updated");
    Ok(Outcome::Redirect(author.url()))
}
