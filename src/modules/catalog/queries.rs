//! Store lookups shared by several controllers.

use std::collections::{HashMap, HashSet};

use locallib_db::{DocumentStore, Filter, ObjectId, StoreResult};

use super::models::{Author, Book, BookInstance, BookStatus, BookWithAuthor, CatalogCounts, Genre, GenreOption};

/// Resolves the author reference of every book with one batched lookup.
pub async fn populate_authors(store: &DocumentStore, books: Vec<Book>) -> StoreResult<Vec<BookWithAuthor>> {
    let ids: Vec<ObjectId> = books
        .iter()
        .map(|book| book.author)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let authors: HashMap<ObjectId, Author> = store
        .collection::<Author>()
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|author| (author.id, author))
        .collect();

    Ok(books
        .into_iter()
        .map(|book| {
            let author = authors.get(&book.author).cloned();
            BookWithAuthor { book, author }
        })
        .collect())
}

/// Resolves a book's author and genres concurrently.
pub async fn populate_book(store: &DocumentStore, book: &Book) -> StoreResult<(Option<Author>, Vec<Genre>)> {
    let authors = store.collection::<Author>();
    let genres = store.collection::<Genre>();
    tokio::try_join!(authors.find_by_id(&book.author), genres.find_by_ids(&book.genre))
}

/// Flags each genre whose id is in `selected`.
pub fn mark_checked<'a>(genres: Vec<Genre>, selected: impl IntoIterator<Item = &'a str>) -> Vec<GenreOption> {
    let selected: HashSet<&str> = selected.into_iter().collect();
    genres
        .into_iter()
        .map(|genre| {
            let checked = selected.contains(genre.id.to_hex().as_str());
            GenreOption { genre, checked }
        })
        .collect()
}

/// Issues the five home page counts concurrently; the first failure wins.
pub async fn catalog_counts(store: &DocumentStore) -> StoreResult<CatalogCounts> {
    let books = store.collection::<Book>();
    let instances = store.collection::<BookInstance>();
    let authors = store.collection::<Author>();
    let genres = store.collection::<Genre>();

    let (book_count, book_instance_count, book_instance_available_count, author_count, genre_count) = tokio::try_join!(
        books.count(None),
        instances.count(None),
        instances.count(Some(Filter::eq("status", BookStatus::Available.as_str()))),
        authors.count(None),
        genres.count(None),
    )?;

    Ok(CatalogCounts {
        book_count,
        book_instance_count,
        book_instance_available_count,
        author_count,
        genre_count,
    })
}
