//! Book controllers, including the catalog home page.

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use locallib_db::{DocumentStore, Filter, ObjectId, Query, StoreResult};
use locallib_http::AppError;

use super::{parse_id, posted_id, BookSubmission, Outcome};
use crate::modules::catalog::forms::{book_submission, BookInput, FieldError, RawForm, Submission};
use crate::modules::catalog::models::{Author, Book, BookInstance, BookSummary, BookWithAuthor, Genre};
use crate::modules::catalog::queries::{catalog_counts, mark_checked, populate_authors, populate_book};
use crate::modules::catalog::views::View;

const BOOK_NOT_FOUND: &str = "Book not found";
const COVER_NOT_FOUND: &str = "Cover not found";
const CREATE_TITLE: &str = "Create Book";
const UPDATE_TITLE: &str = "Update Book";
const BOOK_LIST_URL: &str = "/catalog/books";

/// Fetches a book and its copies concurrently.
async fn book_with_instances(store: &DocumentStore, id: ObjectId) -> StoreResult<(Option<Book>, Vec<BookInstance>)> {
    let books = store.collection::<Book>();
    let instances = store.collection::<BookInstance>();
    tokio::try_join!(
        books.find_by_id(&id),
        instances.find_all(Query::filtered(Filter::eq("book", id)))
    )
}

async fn authors_and_genres(store: &DocumentStore) -> StoreResult<(Vec<Author>, Vec<Genre>)> {
    let authors = store.collection::<Author>();
    let genres = store.collection::<Genre>();
    tokio::try_join!(authors.find_all(Query::new()), genres.find_all(Query::new()))
}

/// Re-displays the book form with the submitted values and their errors.
async fn rerender_form(
    store: &DocumentStore,
    title: &'static str,
    input: BookInput,
    errors: Vec<FieldError>,
) -> Result<Outcome, AppError> {
    let (authors, genres) = authors_and_genres(store).await?;
    let genres = mark_checked(genres, input.genre.iter().map(String::as_str));
    Ok(View::BookForm {
        title,
        book: Some(input),
        authors,
        genres,
        errors,
    }
    .into())
}

/// Runs the book pipeline and builds the stored book, attaching any upload.
fn build_book(submission: &BookSubmission, id: ObjectId) -> (BookInput, Result<Book, Vec<FieldError>>) {
    let Submission { value, mut errors } = book_submission(&submission.form);
    if !errors.is_empty() {
        return (value, Err(errors));
    }

    match value.clone().into_book(id) {
        Ok(mut book) => {
            if let Some(upload) = &submission.cover {
                book.set_cover(upload.bytes.clone(), upload.content_type.clone());
            }
            (value, Ok(book))
        }
        Err(error) => {
            errors.push(error);
            (value, Err(errors))
        }
    }
}

/// The home page. A failed count is shown on the page rather than raised.
pub async fn index(State(store): State<DocumentStore>) -> View {
    match catalog_counts(&store).await {
        Ok(counts) => View::Index {
            counts: Some(counts),
            error: None,
        },
        Err(e) => {
            tracing::error!(error = %e, "failed to count catalog documents");
            View::Index {
                counts: None,
                error: Some(e.to_string()),
            }
        }
    }
}

pub async fn list(State(store): State<DocumentStore>) -> Result<View, AppError> {
    let books = store.collection::<Book>().find_all(Query::new()).await?;
    let books = populate_authors(&store, books).await?;
    Ok(View::BookList { books })
}

pub async fn list_api(State(store): State<DocumentStore>) -> Result<Json<Vec<BookSummary>>, AppError> {
    let books = store.collection::<Book>().find_all(Query::new()).await?;
    let books = populate_authors(&store, books).await?;
    Ok(Json(books.iter().map(BookSummary::from).collect()))
}

pub async fn detail(State(store): State<DocumentStore>, Path(id): Path<String>) -> Result<View, AppError> {
    let id = parse_id(&id, BOOK_NOT_FOUND)?;
    let (book, instances) = book_with_instances(&store, id).await?;
    let book = book.ok_or_else(|| AppError::not_found(BOOK_NOT_FOUND))?;
    let (author, genres) = populate_book(&store, &book).await?;
    Ok(View::BookDetail {
        book,
        author,
        genres,
        instances,
    })
}

pub async fn create_get(State(store): State<DocumentStore>) -> Result<View, AppError> {
    let (authors, genres) = authors_and_genres(&store).await?;
    Ok(View::BookForm {
        title: CREATE_TITLE,
        book: None,
        authors,
        genres: mark_checked(genres, std::iter::empty()),
        errors: Vec::new(),
    })
}

pub async fn create_post(
    State(store): State<DocumentStore>,
    submission: BookSubmission,
) -> Result<Outcome, AppError> {
    let (input, book) = build_book(&submission, ObjectId::new());
    let book = match book {
        Ok(book) => book,
        Err(errors) => return rerender_form(&store, CREATE_TITLE, input, errors).await,
    };

    store.collection::<Book>().insert(&book).await?;
    tracing::info!(book_id = %book.id, cover = book.has_cover(), "book created");
    Ok(Outcome::Redirect(book.url()))
}

pub async fn delete_get(State(store): State<DocumentStore>, Path(id): Path<String>) -> Result<Outcome, AppError> {
    let id = parse_id(&id, BOOK_NOT_FOUND)?;
    let (book, instances) = book_with_instances(&store, id).await?;
    let Some(book) = book else {
        return Ok(Outcome::Redirect(BOOK_LIST_URL.to_string()));
    };
    let author = store.collection::<Author>().find_by_id(&book.author).await?;
    Ok(View::BookDelete {
        book: Some(BookWithAuthor { book, author }),
        instances,
    }
    .into())
}

pub async fn delete_post(
    State(store): State<DocumentStore>,
    Path(path_id): Path<String>,
    form: RawForm,
) -> Result<Outcome, AppError> {
    let id = posted_id(&form, "bookid", &path_id).ok_or_else(|| AppError::not_found(BOOK_NOT_FOUND))?;

    let (book, instances) = book_with_instances(&store, id).await?;
    if !instances.is_empty() {
        tracing::info!(book_id = %id, dependents = instances.len(), "book delete blocked");
        let book = match book {
            Some(book) => populate_authors(&store, vec![book]).await?.pop(),
            None => None,
        };
        return Ok(View::BookDelete { book, instances }.into());
    }

    store.collection::<Book>().delete_by_id(&id).await?;
    tracing::info!(book_id = %id, "book deleted");
    Ok(Outcome::Redirect(BOOK_LIST_URL.to_string()))
}

pub async fn update_get(State(store): State<DocumentStore>, Path(id): Path<String>) -> Result<View, AppError> {
    let id = parse_id(&id, BOOK_NOT_FOUND)?;
    let books = store.collection::<Book>();
    let genres = store.collection::<Genre>();
    let authors = store.collection::<Author>();
    let (book, genres, authors) = tokio::try_join!(
        books.find_by_id(&id),
        genres.find_all(Query::new()),
        authors.find_all(Query::new())
    )?;
    let book = book.ok_or_else(|| AppError::not_found(BOOK_NOT_FOUND))?;

    let input = BookInput::from(&book);
    let genres = mark_checked(genres, input.genre.iter().map(String::as_str));
    Ok(View::BookForm {
        title: UPDATE_TITLE,
        book: Some(input),
        authors,
        genres,
        errors: Vec::new(),
    })
}

pub async fn update_post(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
    submission: BookSubmission,
) -> Result<Outcome, AppError> {
    let id = parse_id(&id, BOOK_NOT_FOUND)?;
    let (input, book) = build_book(&submission, id);
    let book = match book {
        Ok(book) => book,
        Err(errors) => {
            if store.collection::<Book>().find_by_id(&id).await?.is_none() {
                return Err(AppError::not_found(BOOK_NOT_FOUND));
            }
            return rerender_form(&store, UPDATE_TITLE, input, errors).await;
        }
    };

    if !store.collection::<Book>().update_by_id(&id, &book).await? {
        return Err(AppError::not_found(BOOK_NOT_FOUND));
    }
    tracing::info!(book_id = %id, cover = book.has_cover(), "book updated");
    Ok(Outcome::Redirect(book.url()))
}

/// Serves the stored cover with its recorded content type.
pub async fn cover(State(store): State<DocumentStore>, Path(id): Path<String>) -> Result<Response, AppError> {
    let id = parse_id(&id, BOOK_NOT_FOUND)?;
    let book = store
        .collection::<Book>()
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(BOOK_NOT_FOUND))?;

    let (Some(cover), Some(cover_type)) = (book.cover, book.cover_type) else {
        return Err(AppError::not_found(COVER_NOT_FOUND));
    };
    let content_type = HeaderValue::from_str(&cover_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok(([(header::CONTENT_TYPE, content_type)], cover.bytes).into_response())
}
