//! Form pipeline for catalog submissions.
//!
//! Every submission runs the same ordered stages: `normalize` turns the raw
//! multi-valued form into typed fields, `validate` collects field errors,
//! `sanitize` trims and escapes text and coerces dates. The controller is the
//! terminal stage and the only one touching the store.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use locallib_db::ObjectId;
use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use super::models::{Author, Book};

/// A decoded form body. Field names may repeat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawForm {
    fields: Vec<(String, String)>,
}

impl From<Vec<(String, String)>> for RawForm {
    fn from(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }
}

impl RawForm {
    /// First value submitted under `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value submitted under `name`, in submission order.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    fn text(&self, name: &str) -> String {
        self.value(name).unwrap_or_default().trim().to_string()
    }
}

/// A field-level validation failure, shown next to the re-rendered form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub param: &'static str,
    pub msg: String,
    pub value: String,
}

impl FieldError {
    fn new(param: &'static str, msg: impl Into<String>, value: &str) -> Self {
        Self {
            param,
            msg: msg.into(),
            value: value.to_string(),
        }
    }
}

/// Flattens `validator` output into field errors, in form order.
fn field_errors(result: Result<(), ValidationErrors>, fields: &[(&'static str, &str)]) -> Vec<FieldError> {
    let Err(errors) = result else {
        return Vec::new();
    };

    let mut flattened = Vec::new();
    for &(param, value) in fields {
        let Some(ValidationErrorsKind::Field(failures)) = errors.errors().get(param) else {
            continue;
        };
        for failure in failures {
            let msg = failure
                .message
                .as_ref()
                .map(|msg| msg.to_string())
                .unwrap_or_else(|| failure.code.to_string());
            flattened.push(FieldError::new(param, msg, value));
        }
    }
    flattened
}

/// Output of the pipeline: the sanitized value plus any validation errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission<T> {
    pub value: T,
    pub errors: Vec<FieldError>,
}

impl<T> Submission<T> {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// HTML-escapes markup-significant characters.
pub fn escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Trim then escape.
pub fn sanitize_text(input: &str) -> String {
    escape(input.trim())
}

/// Parses an ISO 8601 date.
///
/// Accepts calendar (`1775-12-16`, `17751216`), reduced precision (`1775`,
/// `1775-12`), ordinal (`1775-350`) and week (`1775-W50-6`, `1775-W50`)
/// forms, plus date-times with or without an offset. A reduced date resolves
/// to the first day of its period.
pub fn parse_iso_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.contains('T') {
        return DateTime::parse_from_rfc3339(input)
            .map(|dt| dt.date_naive())
            .ok()
            .or_else(|| {
                ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
                    .iter()
                    .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
                    .map(|dt| dt.date())
            });
    }

    let shape: String = input
        .chars()
        .map(|c| if c.is_ascii_digit() { '9' } else { c })
        .collect();
    match shape.as_str() {
        "9999-99-99" => NaiveDate::parse_from_str(input, "%Y-%m-%d").ok(),
        "99999999" => NaiveDate::parse_from_str(input, "%Y%m%d").ok(),
        "9999-999" => NaiveDate::parse_from_str(input, "%Y-%j").ok(),
        "9999-W99-9" => NaiveDate::parse_from_str(input, "%G-W%V-%u").ok(),
        "9999-W99" => NaiveDate::parse_from_str(&format!("{input}-1"), "%G-W%V-%u").ok(),
        "9999-99" => NaiveDate::parse_from_str(&format!("{input}-01"), "%Y-%m-%d").ok(),
        "9999" => input.parse().ok().and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1)),
        _ => None,
    }
}

/// Empty dates are optional and pass.
fn iso_date(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || parse_iso_date(value).is_some() {
        Ok(())
    } else {
        Err(ValidationError::new("iso_date"))
    }
}

/// Empty references are left to the required check.
fn object_id(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || ObjectId::parse_str(value).is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("object_id"))
    }
}

fn object_ids(values: &[String]) -> Result<(), ValidationError> {
    values.iter().try_for_each(|value| object_id(value))
}

/// Author form fields after normalization. Text is already trimmed.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct AuthorFields {
    #[validate(length(min = 1, message = "First name must be specified."))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Family name must be specified."))]
    pub family_name: String,
    #[validate(custom(function = "iso_date", message = "Invalid date of birth"))]
    pub date_of_birth: String,
    #[validate(custom(function = "iso_date", message = "Invalid date of death"))]
    pub date_of_death: String,
}

/// Author form fields after sanitization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorInput {
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl AuthorFields {
    pub fn normalize(form: &RawForm) -> Self {
        Self {
            first_name: form.text("first_name"),
            family_name: form.text("family_name"),
            date_of_birth: form.text("date_of_birth"),
            date_of_death: form.text("date_of_death"),
        }
    }

    pub fn errors(&self) -> Vec<FieldError> {
        field_errors(
            self.validate(),
            &[
                ("first_name", self.first_name.as_str()),
                ("family_name", self.family_name.as_str()),
                ("date_of_birth", self.date_of_birth.as_str()),
                ("date_of_death", self.date_of_death.as_str()),
            ],
        )
    }

    pub fn sanitize(self) -> AuthorInput {
        AuthorInput {
            first_name: sanitize_text(&self.first_name),
            family_name: sanitize_text(&self.family_name),
            date_of_birth: parse_iso_date(&self.date_of_birth),
            date_of_death: parse_iso_date(&self.date_of_death),
        }
    }
}

impl AuthorInput {
    pub fn into_author(self, id: ObjectId) -> Author {
        Author {
            id,
            first_name: self.first_name,
            family_name: self.family_name,
            date_of_birth: self.date_of_birth,
            date_of_death: self.date_of_death,
        }
    }
}

/// Runs the author pipeline over a raw form.
pub fn author_submission(form: &RawForm) -> Submission<AuthorInput> {
    let fields = AuthorFields::normalize(form);
    let errors = fields.errors();
    Submission {
        value: fields.sanitize(),
        errors,
    }
}

/// Book form fields after normalization. `genre` is always a list.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct BookFields {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(
        length(min = 1, message = "Author must not be empty"),
        custom(function = "object_id", message = "Author must be a valid selection")
    )]
    pub author: String,
    #[validate(length(min = 1, message = "Summary must not be empty"))]
    pub summary: String,
    #[validate(length(min = 1, message = "ISBN must not be empty"))]
    pub isbn: String,
    #[validate(custom(function = "object_ids", message = "Genre selection is invalid"))]
    pub genre: Vec<String>,
}

/// Book form fields after sanitization; also what the form re-displays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub summary: String,
    pub isbn: String,
    pub genre: Vec<String>,
}

impl BookFields {
    /// Absent genre becomes an empty list, a single value a one-element list.
    pub fn normalize(form: &RawForm) -> Self {
        Self {
            title: form.text("title"),
            author: form.text("author"),
            summary: form.text("summary"),
            isbn: form.text("isbn"),
            genre: form
                .values("genre")
                .into_iter()
                .map(|genre| genre.trim().to_string())
                .collect(),
        }
    }

    pub fn errors(&self) -> Vec<FieldError> {
        let bad_genre = self
            .genre
            .iter()
            .find(|genre| object_id(genre).is_err())
            .map(String::as_str)
            .unwrap_or_default();
        field_errors(
            self.validate(),
            &[
                ("title", self.title.as_str()),
                ("author", self.author.as_str()),
                ("summary", self.summary.as_str()),
                ("isbn", self.isbn.as_str()),
                ("genre", bad_genre),
            ],
        )
    }

    pub fn sanitize(self) -> BookInput {
        BookInput {
            title: sanitize_text(&self.title),
            author: sanitize_text(&self.author),
            summary: sanitize_text(&self.summary),
            isbn: sanitize_text(&self.isbn),
            genre: self.genre.iter().map(|genre| sanitize_text(genre)).collect(),
        }
    }
}

impl BookInput {
    /// Builds the stored book, without cover fields.
    pub fn into_book(self, id: ObjectId) -> Result<Book, FieldError> {
        let author = ObjectId::parse_str(&self.author)
            .map_err(|_| FieldError::new("author", "Author must be a valid selection", &self.author))?;
        let genre = self
            .genre
            .iter()
            .map(|genre| {
                ObjectId::parse_str(genre)
                    .map_err(|_| FieldError::new("genre", "Genre selection is invalid", genre))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Book {
            id,
            title: self.title,
            author,
            summary: self.summary,
            isbn: self.isbn,
            genre,
            cover: None,
            cover_type: None,
        })
    }
}

impl From<&Book> for BookInput {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.to_hex(),
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            genre: book.genre.iter().map(|id| id.to_hex()).collect(),
        }
    }
}

/// Runs the book pipeline over a raw form.
pub fn book_submission(form: &RawForm) -> Submission<BookInput> {
    let fields = BookFields::normalize(form);
    let errors = fields.errors();
    Submission {
        value: fields.sanitize(),
        errors,
    }
}
