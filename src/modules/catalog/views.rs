//! Server-rendered catalog pages.
//!
//! Controllers return a [`View`]: the template to use plus its data. Rendering
//! happens when the view is turned into a response, which keeps the
//! render-or-redirect decision observable in tests.

use axum::response::{Html, IntoResponse, Response};
use maud::{html, Markup, PreEscaped, DOCTYPE};

use super::forms::{BookInput, FieldError};
use super::models::{
    display_date, form_date, Author, Book, BookInstance, BookStatus, BookWithAuthor, CatalogCounts, Genre,
    GenreOption,
};

const STYLESHEET: &str = "\
body{font-family:\"Helvetica Neue\",Helvetica,Arial,sans-serif;margin:0}\
.container{display:flex}\
.sidebar{min-width:12rem;padding:1rem}\
.sidebar ul{list-style:none;padding:0}\
main{padding:1rem;flex:1}\
.text-success{color:#28a745}.text-danger{color:#dc3545}.text-warning{color:#ffc107}\
.errors{color:#dc3545}\
img.cover{max-width:12rem}";

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Index {
        counts: Option<CatalogCounts>,
        error: Option<String>,
    },
    AuthorList {
        authors: Vec<Author>,
    },
    AuthorDetail {
        author: Author,
        books: Vec<Book>,
    },
    AuthorForm {
        title: &'static str,
        author: Option<Author>,
        errors: Vec<FieldError>,
    },
    AuthorDelete {
        author: Option<Author>,
        books: Vec<Book>,
    },
    BookList {
        books: Vec<BookWithAuthor>,
    },
    BookDetail {
        book: Book,
        author: Option<Author>,
        genres: Vec<Genre>,
        instances: Vec<BookInstance>,
    },
    BookForm {
        title: &'static str,
        book: Option<BookInput>,
        authors: Vec<Author>,
        genres: Vec<GenreOption>,
        errors: Vec<FieldError>,
    },
    BookDelete {
        book: Option<BookWithAuthor>,
        instances: Vec<BookInstance>,
    },
}

impl View {
    /// Template name, stable across releases.
    pub fn template(&self) -> &'static str {
        match self {
            View::Index { .. } => "index",
            View::AuthorList { .. } => "author_list",
            View::AuthorDetail { .. } => "author_detail",
            View::AuthorForm { .. } => "author_form",
            View::AuthorDelete { .. } => "author_delete",
            View::BookList { .. } => "book_list",
            View::BookDetail { .. } => "book_detail",
            View::BookForm { .. } => "book_form",
            View::BookDelete { .. } => "book_delete",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Index { .. } => "Local Library Home",
            View::AuthorList { .. } => "Author List",
            View::AuthorDetail { .. } => "Author Detail",
            View::AuthorForm { title, .. } | View::BookForm { title, .. } => *title,
            View::AuthorDelete { .. } => "Delete Author",
            View::BookList { .. } => "Book List",
            View::BookDetail { .. } => "Title",
            View::BookDelete { .. } => "Delete Book",
        }
    }

    pub fn render(&self) -> Markup {
        let title = self.title();
        let content = match self {
            View::Index { counts, error } => index(title, counts.as_ref(), error.as_deref()),
            View::AuthorList { authors } => author_list(title, authors),
            View::AuthorDetail { author, books } => author_detail(author, books),
            View::AuthorForm { title, author, errors } => author_form(title, author.as_ref(), errors),
            View::AuthorDelete { author, books } => author_delete(title, author.as_ref(), books),
            View::BookList { books } => book_list(title, books),
            View::BookDetail {
                book,
                author,
                genres,
                instances,
            } => book_detail(book, author.as_ref(), genres, instances),
            View::BookForm {
                title,
                book,
                authors,
                genres,
                errors,
            } => book_form(title, book.as_ref(), authors, genres, errors),
            View::BookDelete { book, instances } => book_delete(title, book.as_ref(), instances),
        };
        layout(title, content)
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        Html(self.render().into_string()).into_response()
    }
}

/// Stored text is escaped at ingest.
fn stored(text: &str) -> PreEscaped<&str> {
    PreEscaped(text)
}

fn layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style { (PreEscaped(STYLESHEET)) }
            }
            body {
                div class="container" {
                    nav class="sidebar" {
                        ul {
                            li { a href="/catalog" { "Home" } }
                            li { a href="/catalog/books" { "All books" } }
                            li { a href="/catalog/authors" { "All authors" } }
                        }
                        hr;
                        ul {
                            li { a href="/catalog/author/create" { "Create new author" } }
                            li { a href="/catalog/book/create" { "Create new book" } }
                        }
                    }
                    main { (content) }
                }
            }
        }
    }
}

fn error_list(errors: &[FieldError]) -> Markup {
    html! {
        @if !errors.is_empty() {
            ul class="errors" {
                @for error in errors {
                    li { (error.msg) }
                }
            }
        }
    }
}

fn index(title: &str, counts: Option<&CatalogCounts>, error: Option<&str>) -> Markup {
    html! {
        h1 { (title) }
        p { "Welcome to " em { "LocalLibrary" } ", a very basic website for browsing the catalog." }
        h2 { "Dynamic content" }
        @if let Some(error) = error {
            p class="text-danger" { "Error: " (error) }
        } @else if let Some(counts) = counts {
            p { "The library has the following record counts:" }
            ul {
                li { strong { "Books:" } " " (counts.book_count) }
                li { strong { "Copies:" } " " (counts.book_instance_count) }
                li { strong { "Copies available:" } " " (counts.book_instance_available_count) }
                li { strong { "Authors:" } " " (counts.author_count) }
                li { strong { "Genres:" } " " (counts.genre_count) }
            }
        }
    }
}

fn author_list(title: &str, authors: &[Author]) -> Markup {
    html! {
        h1 { (title) }
        @if authors.is_empty() {
            p { "There are no authors." }
        } @else {
            ul {
                @for author in authors {
                    li {
                        a href=(author.url()) { (stored(&author.name())) }
                        " (" (author.lifespan()) ")"
                    }
                }
            }
        }
    }
}

fn book_entries(books: &[Book]) -> Markup {
    html! {
        dl {
            @for book in books {
                dt { a href=(book.url()) { (stored(&book.title)) } }
                dd { (stored(&book.summary)) }
            }
        }
    }
}

fn author_detail(author: &Author, books: &[Book]) -> Markup {
    html! {
        h1 { "Author: " (stored(&author.name())) }
        p { (author.lifespan()) }
        div {
            h4 { "Books" }
            @if books.is_empty() {
                p { "This author has no books." }
            } @else {
                (book_entries(books))
            }
        }
    }
}

fn author_form(title: &str, author: Option<&Author>, errors: &[FieldError]) -> Markup {
    let first_name = author.map(|a| a.first_name.as_str()).unwrap_or_default();
    let family_name = author.map(|a| a.family_name.as_str()).unwrap_or_default();
    let date_of_birth = author.and_then(|a| a.date_of_birth.as_ref()).map(form_date).unwrap_or_default();
    let date_of_death = author.and_then(|a| a.date_of_death.as_ref()).map(form_date).unwrap_or_default();

    html! {
        h1 { (title) }
        form method="POST" action="" {
            div class="form-group" {
                label for="first_name" { "First Name:" }
                input id="first_name" type="text" name="first_name" placeholder="First name" required value=(stored(first_name));
                label for="family_name" { "Family Name:" }
                input id="family_name" type="text" name="family_name" placeholder="Family name" required value=(stored(family_name));
            }
            div class="form-group" {
                label for="date_of_birth" { "Date of birth:" }
                input id="date_of_birth" type="date" name="date_of_birth" value=(date_of_birth);
            }
            div class="form-group" {
                label for="date_of_death" { "Date of death:" }
                input id="date_of_death" type="date" name="date_of_death" value=(date_of_death);
            }
            button type="submit" { "Submit" }
        }
        (error_list(errors))
    }
}

fn author_delete(title: &str, author: Option<&Author>, books: &[Book]) -> Markup {
    html! {
        h1 { (title) }
        @if let Some(author) = author {
            h2 { "Author: " (stored(&author.name())) }
            p { (author.lifespan()) }
        }
        @if !books.is_empty() {
            p { strong { "Delete the following books before attempting to delete this author." } }
            div {
                h4 { "Books" }
                (book_entries(books))
            }
        } @else if let Some(author) = author {
            p { "Do you really want to delete this Author?" }
            form method="POST" action="" {
                input id="authorid" type="hidden" name="authorid" required value=(author.id.to_hex());
                button type="submit" { "Delete" }
            }
        }
    }
}

fn book_list(title: &str, books: &[BookWithAuthor]) -> Markup {
    html! {
        h1 { (title) }
        @if books.is_empty() {
            p { "There are no books." }
        } @else {
            ul {
                @for entry in books {
                    li {
                        a href=(entry.book.url()) { (stored(&entry.book.title)) }
                        @if let Some(author) = &entry.author {
                            " (" (stored(&author.name())) ")"
                        }
                    }
                }
            }
        }
    }
}

fn status_class(status: BookStatus) -> &'static str {
    match status {
        BookStatus::Available => "text-success",
        BookStatus::Maintenance => "text-danger",
        BookStatus::Loaned | BookStatus::Reserved => "text-warning",
    }
}

fn instance_entries(instances: &[BookInstance]) -> Markup {
    html! {
        @for instance in instances {
            hr;
            p class=(status_class(instance.status)) { (instance.status.as_str()) }
            p { strong { "Imprint:" } " " (stored(&instance.imprint)) }
            @if instance.status != BookStatus::Available {
                @if let Some(due_back) = &instance.due_back {
                    p { strong { "Due back:" } " " (display_date(due_back)) }
                }
            }
            p { strong { "Id:" } " " a href=(instance.url()) { (instance.id.to_hex()) } }
        }
    }
}

fn book_summary(book: &Book, author: Option<&Author>, genres: &[Genre]) -> Markup {
    html! {
        p {
            strong { "Author:" } " "
            @if let Some(author) = author {
                a href=(author.url()) { (stored(&author.name())) }
            }
        }
        p { strong { "Summary:" } " " (stored(&book.summary)) }
        p { strong { "ISBN:" } " " (stored(&book.isbn)) }
        @if !genres.is_empty() {
            p {
                strong { "Genre:" } " "
                @for (index, genre) in genres.iter().enumerate() {
                    @if index > 0 { ", " }
                    a href=(genre.url()) { (stored(&genre.name)) }
                }
            }
        }
    }
}

fn book_detail(book: &Book, author: Option<&Author>, genres: &[Genre], instances: &[BookInstance]) -> Markup {
    html! {
        h1 { "Title: " (stored(&book.title)) }
        (book_summary(book, author, genres))
        @if book.has_cover() {
            img class="cover" src=(book.cover_url()) alt="Cover";
        }
        div {
            h4 { "Copies" }
            @if instances.is_empty() {
                p { "There are no copies of this book in the library." }
            } @else {
                (instance_entries(instances))
            }
        }
    }
}

fn book_form(
    title: &str,
    book: Option<&BookInput>,
    authors: &[Author],
    genres: &[GenreOption],
    errors: &[FieldError],
) -> Markup {
    let field = |pick: fn(&BookInput) -> &str| book.map(pick).unwrap_or_default();
    let selected_author = field(|b| b.author.as_str());

    html! {
        h1 { (title) }
        form method="POST" action="" enctype="multipart/form-data" {
            div class="form-group" {
                label for="title" { "Title:" }
                input id="title" type="text" name="title" placeholder="Name of book" required value=(stored(field(|b| b.title.as_str())));
            }
            div class="form-group" {
                label for="author" { "Author:" }
                select id="author" name="author" required {
                    option value="" { "--Please select an author--" }
                    @for author in authors {
                        option value=(author.id.to_hex()) selected[author.id.to_hex() == selected_author] {
                            (stored(&author.name()))
                        }
                    }
                }
            }
            div class="form-group" {
                label for="summary" { "Summary:" }
                textarea id="summary" name="summary" placeholder="Summary" required { (stored(field(|b| b.summary.as_str()))) }
            }
            div class="form-group" {
                label for="isbn" { "ISBN:" }
                input id="isbn" type="text" name="isbn" placeholder="ISBN13" required value=(stored(field(|b| b.isbn.as_str())));
            }
            div class="form-group" {
                label { "Genre:" }
                div {
                    @for option in genres {
                        div style="display: inline; padding-right:10px;" {
                            input type="checkbox" name="genre" id=(option.genre.id.to_hex()) value=(option.genre.id.to_hex()) checked[option.checked];
                            label for=(option.genre.id.to_hex()) { (stored(&option.genre.name)) }
                        }
                    }
                }
            }
            div class="form-group" {
                label for="cover" { "Cover:" }
                input id="cover" type="file" name="cover" accept="image/*";
            }
            button type="submit" { "Submit" }
        }
        (error_list(errors))
    }
}

fn book_delete(title: &str, entry: Option<&BookWithAuthor>, instances: &[BookInstance]) -> Markup {
    html! {
        h1 { (title) }
        @if let Some(entry) = entry {
            h2 { "Title: " (stored(&entry.book.title)) }
            (book_summary(&entry.book, entry.author.as_ref(), &[]))
        }
        @if !instances.is_empty() {
            p { strong { "Delete the following copies before attempting to delete this book." } }
            div {
                h4 { "Copies" }
                (instance_entries(instances))
            }
        } @else if let Some(entry) = entry {
            p { "Do you really want to delete this Book?" }
            form method="POST" action="" {
                input id="bookid" type="hidden" name="bookid" required value=(entry.book.id.to_hex());
                button type="submit" { "Delete" }
            }
        }
    }
}
