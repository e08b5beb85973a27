//! Sample catalog for development stores.
//!
//! Records go through the same form pipeline as submitted forms, so seeded
//! text is stored trimmed and escaped like everything else.

use anyhow::{bail, Context};
use chrono::NaiveDate;
use locallib_db::{DocumentStore, ObjectId};

use crate::modules::catalog::forms::{author_submission, book_submission, sanitize_text, RawForm};
use crate::modules::catalog::models::{Author, Book, BookInstance, BookStatus, Genre};

/// How many documents of each kind were written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub authors: usize,
    pub genres: usize,
    pub books: usize,
    pub copies: usize,
}

const AUTHORS: &[(&str, &str, &str, &str)] = &[
    ("Patrick", "Rothfuss", "1973-06-06", ""),
    ("Ben", "Bova", "1932-11-08", ""),
    ("Isaac", "Asimov", "1920-01-02", "1992-04-06"),
    ("Bob", "Billings", "", ""),
    ("Jim", "Jones", "1971-12-16", ""),
];

const GENRES: &[&str] = &["Fantasy", "Science Fiction", "French Poetry"];

/// Title, author index, summary, ISBN, genre indexes.
const BOOKS: &[(&str, usize, &str, &str, &[usize])] = &[
    (
        "The Name of the Wind (The Kingkiller Chronicle, #1)",
        0,
        "I have stolen princesses back from sleeping barrow kings. I burned down the town of Trebon.",
        "9781473211896",
        &[0],
    ),
    (
        "The Wise Man's Fear (The Kingkiller Chronicle, #2)",
        0,
        "Picking up the tale of Kvothe Kingkiller once again, we follow him into exile.",
        "9788401352836",
        &[0],
    ),
    (
        "The Slow Regard of Silent Things (Kingkiller Chronicle)",
        0,
        "Deep below the University, there is a dark place.",
        "9780756411336",
        &[0],
    ),
    (
        "Apes and Angels",
        1,
        "Humankind headed out to the stars not for conquest, nor exploration, nor even for curiosity.",
        "9780765379528",
        &[1],
    ),
    (
        "Death Wave",
        1,
        "In Ben Bova's previous novel New Earth, Jordan Kell led the first human mission beyond the solar system.",
        "9780765379504",
        &[1],
    ),
    ("Test Book 1", 3, "Summary of test book 1", "ISBN111111", &[0, 1]),
    ("Test Book 2", 3, "Summary of test book 2", "ISBN222222", &[]),
];

/// Book index, imprint, status, due back.
const COPIES: &[(usize, &str, BookStatus, Option<(i32, u32, u32)>)] = &[
    (0, "London Gollancz, 2014.", BookStatus::Available, None),
    (1, "Gollancz, 2011.", BookStatus::Loaned, Some((2026, 11, 1))),
    (2, "Gollancz, 2015.", BookStatus::Available, None),
    (3, "New York Tom Doherty Associates, 2016.", BookStatus::Available, None),
    (3, "New York Tom Doherty Associates, 2016.", BookStatus::Maintenance, None),
    (4, "New York, NY Tom Doherty Associates, LLC, 2015.", BookStatus::Loaned, None),
    (5, "Imprint XXX2", BookStatus::Available, None),
    (6, "Imprint XXX3", BookStatus::Reserved, None),
];

fn form(pairs: &[(&str, &str)]) -> RawForm {
    RawForm::from(
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect::<Vec<_>>(),
    )
}

/// Writes the sample catalog into `store`.
pub async fn seed_catalog(store: &DocumentStore) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();

    let mut authors = Vec::with_capacity(AUTHORS.len());
    for &(first_name, family_name, born, died) in AUTHORS {
        let submission = author_submission(&form(&[
            ("first_name", first_name),
            ("family_name", family_name),
            ("date_of_birth", born),
            ("date_of_death", died),
        ]));
        if !submission.is_valid() {
            bail!("sample author {} {} is invalid: {:?}", first_name, family_name, submission.errors);
        }
        let author: Author = submission.value.into_author(ObjectId::new());
        store
            .collection::<Author>()
            .insert(&author)
            .await
            .with_context(|| format!("failed to insert author {}", author.name()))?;
        authors.push(author);
        report.authors += 1;
    }

    let mut genres = Vec::with_capacity(GENRES.len());
    for name in GENRES {
        let genre = Genre {
            id: ObjectId::new(),
            name: sanitize_text(name),
        };
        store
            .collection::<Genre>()
            .insert(&genre)
            .await
            .with_context(|| format!("failed to insert genre {}", name))?;
        genres.push(genre);
        report.genres += 1;
    }

    let mut books = Vec::with_capacity(BOOKS.len());
    for &(title, author, summary, isbn, genre_indexes) in BOOKS {
        let author_id = authors[author].id.to_hex();
        let genre_ids: Vec<String> = genre_indexes.iter().map(|i| genres[*i].id.to_hex()).collect();
        let mut pairs = vec![
            ("title", title),
            ("author", author_id.as_str()),
            ("summary", summary),
            ("isbn", isbn),
        ];
        pairs.extend(genre_ids.iter().map(|id| ("genre", id.as_str())));

        let submission = book_submission(&form(&pairs));
        if !submission.is_valid() {
            bail!("sample book {} is invalid: {:?}", title, submission.errors);
        }
        let book: Book = submission
            .value
            .into_book(ObjectId::new())
            .map_err(|e| anyhow::anyhow!("sample book {} is invalid: {}", title, e.msg))?;
        store
            .collection::<Book>()
            .insert(&book)
            .await
            .with_context(|| format!("failed to insert book {}", title))?;
        books.push(book);
        report.books += 1;
    }

    for &(book, imprint, status, due_back) in COPIES {
        let copy = BookInstance {
            id: ObjectId::new(),
            book: books[book].id,
            imprint: sanitize_text(imprint),
            status,
            due_back: due_back.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        };
        store
            .collection::<BookInstance>()
            .insert(&copy)
            .await
            .with_context(|| format!("failed to insert copy of {}", books[book].title))?;
        report.copies += 1;
    }

    tracing::info!(
        authors = report.authors,
        genres = report.genres,
        books = report.books,
        copies = report.copies,
        "sample catalog written"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::queries::catalog_counts;

    #[tokio::test]
    async fn seeding_populates_every_collection() {
        let store = DocumentStore::in_memory();
        let report = seed_catalog(&store).await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                authors: AUTHORS.len(),
                genres: GENRES.len(),
                books: BOOKS.len(),
                copies: COPIES.len(),
            }
        );

        let counts = catalog_counts(&store).await.unwrap();
        assert_eq!(counts.book_count, BOOKS.len() as u64);
        assert_eq!(counts.book_instance_available_count, 4);
    }

    #[tokio::test]
    async fn seeded_text_is_escaped() {
        let store = DocumentStore::in_memory();
        seed_catalog(&store).await.unwrap();

        let books = store
            .collection::<Book>()
            .find_all(locallib_db::Query::new())
            .await
            .unwrap();
        assert!(books.iter().any(|b| b.title == "The Wise Man&#x27;s Fear (The Kingkiller Chronicle, #2)"));
    }
}
