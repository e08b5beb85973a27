//! Catalog entities as they are persisted in the document store.
//!
//! String fields hold sanitized text: trimmed and HTML-escaped at ingest, so
//! views emit them without escaping a second time.

use bson::{spec::BinarySubtype, Binary};
use chrono::NaiveDate;
use locallib_db::{Document, ObjectId};
use serde::{Deserialize, Serialize};

const DISPLAY_DATE: &str = "%b %-d, %Y";
const FORM_DATE: &str = "%Y-%m-%d";

/// Formats a date the way list and detail pages show it, e.g. `Dec 16, 1775`.
pub fn display_date(date: &NaiveDate) -> String {
    date.format(DISPLAY_DATE).to_string()
}

/// Formats a date for an `<input type="date">` value.
pub fn form_date(date: &NaiveDate) -> String {
    date.format(FORM_DATE).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub first_name: String,
    pub family_name: String,
    // Serialized as null when absent so an update can clear a date.
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "family_name, first_name", or empty when either part is missing.
    pub fn name(&self) -> String {
        if self.first_name.is_empty() || self.family_name.is_empty() {
            String::new()
        } else {
            format!("{}, {}", self.family_name, self.first_name)
        }
    }

    /// "<birth> - <death>" with empty parts for unknown dates.
    pub fn lifespan(&self) -> String {
        let birth = self.date_of_birth.as_ref().map(display_date).unwrap_or_default();
        let death = self.date_of_death.as_ref().map(display_date).unwrap_or_default();
        format!("{} - {}", birth, death)
    }

    pub fn url(&self) -> String {
        format!("/catalog/author/{}", self.id.to_hex())
    }
}

impl Document for Author {
    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn collection_name() -> &'static str {
        "authors"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub author: ObjectId,
    pub summary: String,
    pub isbn: String,
    #[serde(default)]
    pub genre: Vec<ObjectId>,
    // Left out of the document when absent so an update without an upload
    // keeps the stored cover.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<Binary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_type: Option<String>,
}

impl Book {
    pub fn url(&self) -> String {
        format!("/catalog/book/{}", self.id.to_hex())
    }

    pub fn cover_url(&self) -> String {
        format!("{}/cover", self.url())
    }

    pub fn has_cover(&self) -> bool {
        self.cover.is_some() && self.cover_type.is_some()
    }

    pub fn set_cover(&mut self, bytes: Vec<u8>, content_type: String) {
        self.cover = Some(Binary {
            subtype: BinarySubtype::Generic,
            bytes,
        });
        self.cover_type = Some(content_type);
    }
}

impl Document for Book {
    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn collection_name() -> &'static str {
        "books"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
}

impl Genre {
    pub fn url(&self) -> String {
        format!("/catalog/genre/{}", self.id.to_hex())
    }
}

impl Document for Genre {
    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn collection_name() -> &'static str {
        "genres"
    }
}

/// Circulation state of one physical copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BookStatus {
    Available,
    #[default]
    Maintenance,
    Loaned,
    Reserved,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Maintenance => "Maintenance",
            BookStatus::Loaned => "Loaned",
            BookStatus::Reserved => "Reserved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookInstance {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub book: ObjectId,
    pub imprint: String,
    #[serde(default)]
    pub status: BookStatus,
    #[serde(default)]
    pub due_back: Option<NaiveDate>,
}

impl BookInstance {
    pub fn url(&self) -> String {
        format!("/catalog/bookinstance/{}", self.id.to_hex())
    }
}

impl Document for BookInstance {
    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn collection_name() -> &'static str {
        "bookinstances"
    }
}

/// A book with its author reference resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct BookWithAuthor {
    pub book: Book,
    pub author: Option<Author>,
}

/// A genre offered in the book form, flagged when currently selected.
#[derive(Debug, Clone, PartialEq)]
pub struct GenreOption {
    pub genre: Genre,
    pub checked: bool,
}

/// Document totals shown on the catalog home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CatalogCounts {
    pub book_count: u64,
    pub book_instance_count: u64,
    pub book_instance_available_count: u64,
    pub author_count: u64,
    pub genre_count: u64,
}

/// JSON shape of `/catalog/books/api`. Cover bytes are not included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub author: Option<AuthorSummary>,
    pub summary: String,
    pub isbn: String,
    pub genre: Vec<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub name: String,
    pub lifespan: String,
    pub url: String,
}

impl From<&Author> for AuthorSummary {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id.to_hex(),
            first_name: author.first_name.clone(),
            family_name: author.family_name.clone(),
            date_of_birth: author.date_of_birth,
            date_of_death: author.date_of_death,
            name: author.name(),
            lifespan: author.lifespan(),
            url: author.url(),
        }
    }
}

impl From<&BookWithAuthor> for BookSummary {
    fn from(entry: &BookWithAuthor) -> Self {
        let book = &entry.book;
        Self {
            id: book.id.to_hex(),
            title: book.title.clone(),
            author: entry.author.as_ref().map(AuthorSummary::from),
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            genre: book.genre.iter().map(|id| id.to_hex()).collect(),
            url: book.url(),
        }
    }
}
